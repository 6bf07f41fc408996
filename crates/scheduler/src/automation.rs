//! The trigger half of an automation (§3 "Automation").
//!
//! `db::models::AutomationRow` is the persisted shape; [`TriggerSpec`] is
//! the validated, not-yet-persisted shape a caller builds before asking
//! the scheduler to create a row, keeping the "exactly one of
//! `cron_expression` / `webhook_path` / neither" invariant in one place
//! instead of scattered across call sites.

use crate::cron;
use crate::error::SchedulerError;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TriggerSpec {
    Cron(String),
    Webhook(String),
    Immediate,
}

impl TriggerSpec {
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Cron(_) => "cron",
            Self::Webhook(_) => "webhook",
            Self::Immediate => "immediate",
        }
    }

    pub fn cron_expression(&self) -> Option<&str> {
        match self {
            Self::Cron(expr) => Some(expr.as_str()),
            _ => None,
        }
    }

    pub fn webhook_path(&self) -> Option<&str> {
        match self {
            Self::Webhook(path) => Some(path.as_str()),
            _ => None,
        }
    }

    /// Reject malformed cron expressions and empty webhook paths before
    /// anything is persisted.
    pub fn validate(&self) -> Result<(), SchedulerError> {
        match self {
            Self::Cron(expr) => cron::validate(expr),
            Self::Webhook(path) if path.trim().is_empty() => {
                Err(SchedulerError::InvalidWorkflowDefinition("webhook path must not be empty".into()))
            }
            Self::Webhook(_) | Self::Immediate => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cron_trigger_validates_its_expression() {
        assert!(TriggerSpec::Cron("0 0 * * * *".into()).validate().is_ok());
        assert!(TriggerSpec::Cron("garbage".into()).validate().is_err());
    }

    #[test]
    fn webhook_trigger_rejects_empty_path() {
        assert!(TriggerSpec::Webhook("".into()).validate().is_err());
        assert!(TriggerSpec::Webhook("/hooks/deploy".into()).validate().is_ok());
    }

    #[test]
    fn immediate_trigger_always_validates() {
        assert!(TriggerSpec::Immediate.validate().is_ok());
    }

    #[test]
    fn kind_and_field_accessors_agree_with_the_variant() {
        let t = TriggerSpec::Cron("0 0 * * * *".into());
        assert_eq!(t.kind(), "cron");
        assert_eq!(t.cron_expression(), Some("0 0 * * * *"));
        assert_eq!(t.webhook_path(), None);
    }
}

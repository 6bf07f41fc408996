//! Cron next-fire-time computation (§4.5 "Cron trigger").
//!
//! §4.5 accepts "a cron expression in standard 5- or 6-field form," but the
//! `cron` crate only parses its own six-field dialect (`sec min hour
//! day-of-month month day-of-week`, optionally followed by a year). A
//! 5-field expression (`min hour day-of-month month day-of-week`, the
//! conventional crontab form used by scenario S6's `"0 * * * *"`) is
//! normalized to six fields by prepending a `0` seconds field before
//! handing it to `Schedule::from_str`.

use std::str::FromStr;

use chrono::{DateTime, Utc};
use cron::Schedule;

use crate::error::SchedulerError;

/// Prepend a `0` seconds field to a 5-field crontab expression; a 6- (or
/// 7-, with year) field expression passes through unchanged.
fn normalize(expression: &str) -> String {
    let field_count = expression.split_whitespace().count();
    if field_count == 5 {
        format!("0 {expression}")
    } else {
        expression.to_string()
    }
}

/// The next time `expression` fires strictly after `after`.
pub fn next_run_after(expression: &str, after: DateTime<Utc>) -> Result<DateTime<Utc>, SchedulerError> {
    let schedule = Schedule::from_str(&normalize(expression))
        .map_err(|e| SchedulerError::InvalidCronExpression(e.to_string()))?;
    schedule.after(&after).next().ok_or(SchedulerError::NoUpcomingRun)
}

/// Validate a cron expression without computing a run time — used when
/// creating an automation, so a typo is rejected at creation time rather
/// than silently never firing.
pub fn validate(expression: &str) -> Result<(), SchedulerError> {
    Schedule::from_str(&normalize(expression))
        .map(|_| ())
        .map_err(|e| SchedulerError::InvalidCronExpression(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn computes_the_next_minute_boundary() {
        let after = Utc.with_ymd_and_hms(2026, 1, 1, 12, 0, 30).unwrap();
        let next = next_run_after("0 * * * * *", after).unwrap();
        assert_eq!(next, Utc.with_ymd_and_hms(2026, 1, 1, 12, 1, 0).unwrap());
    }

    #[test]
    fn computes_the_next_daily_run() {
        let after = Utc.with_ymd_and_hms(2026, 1, 1, 9, 0, 0).unwrap();
        let next = next_run_after("0 0 0 * * *", after).unwrap();
        assert_eq!(next, Utc.with_ymd_and_hms(2026, 1, 2, 0, 0, 0).unwrap());
    }

    /// Scenario S6: a 5-field crontab expression, `"0 * * * *"` (top of
    /// every hour), fired from `12:30:00` must land on `13:00:00`.
    #[test]
    fn five_field_expression_fires_on_the_hour() {
        let after = Utc.with_ymd_and_hms(2026, 1, 1, 12, 30, 0).unwrap();
        let next = next_run_after("0 * * * *", after).unwrap();
        assert_eq!(next, Utc.with_ymd_and_hms(2026, 1, 1, 13, 0, 0).unwrap());
    }

    #[test]
    fn five_field_expression_validates() {
        assert!(validate("0 * * * *").is_ok());
    }

    #[test]
    fn malformed_expression_is_rejected() {
        let err = next_run_after("not a cron expression", Utc::now()).unwrap_err();
        assert!(matches!(err, SchedulerError::InvalidCronExpression(_)));
    }

    #[test]
    fn validate_accepts_well_formed_expressions() {
        assert!(validate("0 */15 * * * *").is_ok());
    }
}

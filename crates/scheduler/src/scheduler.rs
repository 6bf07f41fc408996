//! The Automation Scheduler (§4.5) — binds a workflow to a trigger,
//! dispatches runs through the `engine` crate, and keeps each
//! automation's run/success/failure counters in lockstep with what
//! actually happened.

use chrono::{DateTime, Utc};
use tracing::{info, instrument, warn};
use uuid::Uuid;

use db::models::AutomationRow;
use db::DbPool;
use engine::{ExecutorConfig, RunOutcome, WorkflowExecutor};
use nodes::NodeRegistry;

use crate::automation::TriggerSpec;
use crate::cron;
use crate::error::SchedulerError;

/// Owns the pool and registry a running scheduler needs; cheap to clone
/// since both of its fields are themselves `Arc`-backed handles.
#[derive(Clone)]
pub struct AutomationScheduler {
    pool: DbPool,
    registry: NodeRegistry,
    executor_config: ExecutorConfig,
}

impl AutomationScheduler {
    pub fn new(pool: DbPool, registry: NodeRegistry, executor_config: ExecutorConfig) -> Self {
        Self {
            pool,
            registry,
            executor_config,
        }
    }

    /// Register a new automation. Computes an initial `next_run_at` for
    /// cron triggers; webhook and immediate triggers leave it `None`.
    pub async fn create(
        &self,
        workflow_id: Uuid,
        name: &str,
        trigger: TriggerSpec,
    ) -> Result<AutomationRow, SchedulerError> {
        trigger.validate()?;
        let next_run_at = match &trigger {
            TriggerSpec::Cron(expr) => Some(cron::next_run_after(expr, Utc::now())?),
            TriggerSpec::Webhook(_) | TriggerSpec::Immediate => None,
        };

        let row = db::repository::automations::create_automation(
            &self.pool,
            workflow_id,
            name,
            trigger.kind(),
            trigger.cron_expression(),
            trigger.webhook_path(),
            next_run_at,
        )
        .await?;

        Ok(row)
    }

    pub async fn list(&self) -> Result<Vec<AutomationRow>, SchedulerError> {
        Ok(db::repository::automations::list_automations(&self.pool).await?)
    }

    pub async fn enable(&self, id: Uuid) -> Result<(), SchedulerError> {
        db::repository::automations::set_enabled(&self.pool, id, true).await?;
        Ok(())
    }

    pub async fn disable(&self, id: Uuid) -> Result<(), SchedulerError> {
        db::repository::automations::set_enabled(&self.pool, id, false).await?;
        Ok(())
    }

    pub async fn delete(&self, id: Uuid) -> Result<(), SchedulerError> {
        db::repository::automations::delete_automation(&self.pool, id).await?;
        Ok(())
    }

    /// Run an automation on demand, bypassing its trigger entirely (the
    /// CLI/API "trigger now" action). `payload`, if given, is merged over
    /// the workflow's own `initialState` as trigger data (§4.5 per-run
    /// protocol step 2).
    #[instrument(skip(self, payload))]
    pub async fn trigger_now(
        &self,
        id: Uuid,
        payload: Option<serde_json::Map<String, serde_json::Value>>,
    ) -> Result<RunOutcome, SchedulerError> {
        let automation = db::repository::automations::get_automation(&self.pool, id).await?;
        self.dispatch(&automation, payload).await
    }

    /// Invoked by the API's webhook handler. `payload` is the inbound
    /// request body, merged over the workflow's `initialState` as trigger
    /// data. Returns `NotFound` if no automation is registered for `path`.
    pub async fn handle_webhook(
        &self,
        path: &str,
        payload: serde_json::Map<String, serde_json::Value>,
    ) -> Result<RunOutcome, SchedulerError> {
        let automation = db::repository::automations::find_by_webhook_path(&self.pool, path)
            .await?
            .ok_or_else(|| SchedulerError::NotFound(format!("no automation registered for webhook path '{path}'")))?;

        if !automation.enabled {
            return Err(SchedulerError::NotFound(format!("automation for '{path}' is disabled")));
        }

        self.dispatch(&automation, Some(payload)).await
    }

    /// One scheduler tick (§5 "single-threaded scheduler loop, polling at
    /// a configurable interval"): dispatch every cron automation whose
    /// `next_run_at` has arrived, and roll each one's clock forward.
    /// Returns the automation IDs dispatched this tick.
    #[instrument(skip(self))]
    pub async fn tick(&self, now: DateTime<Utc>) -> Result<Vec<Uuid>, SchedulerError> {
        let due = db::repository::automations::list_due(&self.pool, now).await?;
        let mut dispatched = Vec::with_capacity(due.len());

        for automation in due {
            if let Some(expr) = automation.cron_expression.as_deref() {
                match cron::next_run_after(expr, now) {
                    Ok(next) => {
                        db::repository::automations::update_next_run_at(&self.pool, automation.id, Some(next))
                            .await?;
                    }
                    Err(e) => {
                        warn!(automation_id = %automation.id, error = %e, "could not compute next run; disabling");
                        db::repository::automations::set_enabled(&self.pool, automation.id, false).await?;
                        continue;
                    }
                }
            }

            if let Err(e) = self.dispatch(&automation, None).await {
                warn!(automation_id = %automation.id, error = %e, "automation dispatch failed");
            }
            dispatched.push(automation.id);
        }

        Ok(dispatched)
    }

    /// `trigger_payload` is merged over the referenced workflow's own
    /// `initialState` before the run starts (§4.5 per-run protocol step 2);
    /// cron ticks have none.
    async fn dispatch(
        &self,
        automation: &AutomationRow,
        trigger_payload: Option<serde_json::Map<String, serde_json::Value>>,
    ) -> Result<RunOutcome, SchedulerError> {
        let workflow_row = db::repository::workflows::get_workflow(&self.pool, automation.workflow_id).await?;
        let definition: engine::WorkflowDefinition = serde_json::from_value(workflow_row.definition.clone())
            .map_err(|e| SchedulerError::InvalidWorkflowDefinition(e.to_string()))?;
        let ast = engine::parse_workflow(&definition, &self.registry)?;

        db::repository::automations::record_dispatch(&self.pool, automation.id).await?;

        let exec_row = db::repository::executions::create_execution(&self.pool, automation.workflow_id).await?;
        db::repository::executions::update_execution_status(&self.pool, exec_row.id, "running", false).await?;

        let trigger_payload_value = trigger_payload.clone().map(serde_json::Value::Object);
        let automation_exec = db::repository::automation_executions::record_automation_execution(
            &self.pool,
            automation.id,
            exec_row.id,
            trigger_payload_value.as_ref(),
        )
        .await?;
        db::repository::automation_executions::mark_running(&self.pool, automation_exec.id).await?;

        let executor = WorkflowExecutor::new(self.registry.clone(), self.executor_config.clone());
        let result = executor
            .run(&ast, automation.workflow_id, exec_row.id, trigger_payload.as_ref())
            .await;

        match result {
            Ok(outcome) => {
                db::repository::executions::update_execution_status(&self.pool, exec_row.id, "succeeded", true)
                    .await?;
                db::repository::automations::record_outcome(&self.pool, automation.id, true, None).await?;
                let result_value =
                    serde_json::Value::Object(engine::state::public_state(&outcome.final_state));
                db::repository::automation_executions::mark_completed(&self.pool, automation_exec.id, &result_value)
                    .await?;
                info!(automation_id = %automation.id, execution_id = %exec_row.id, "automation run succeeded");
                Ok(outcome)
            }
            Err(failure) => {
                db::repository::executions::update_execution_status(&self.pool, exec_row.id, "failed", true).await?;
                let error_text = failure.to_string();
                db::repository::automations::record_outcome(&self.pool, automation.id, false, Some(&error_text))
                    .await?;
                db::repository::automation_executions::mark_failed(&self.pool, automation_exec.id, &error_text)
                    .await?;
                warn!(automation_id = %automation.id, execution_id = %exec_row.id, %failure, "automation run failed");
                Err(SchedulerError::Run(failure))
            }
        }
    }
}

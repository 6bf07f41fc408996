//! Join records between an automation and the workflow executions it
//! dispatched — the audit trail behind the scheduler's counters.
//!
//! Each row walks its own `pending → running → (completed | failed)` state
//! machine (§4.5 "State machine of an automation execution"), independent
//! of the `workflow_executions` row it points at.

use chrono::Utc;
use serde_json::Value;
use sqlx::PgPool;
use uuid::Uuid;

use crate::{models::AutomationExecutionRow, DbError};

/// Insert a new `pending` automation execution, carrying the trigger
/// payload that started it (§3 "Automation execution record", `triggerData`).
pub async fn record_automation_execution(
    pool: &PgPool,
    automation_id: Uuid,
    execution_id: Uuid,
    trigger_payload: Option<&Value>,
) -> Result<AutomationExecutionRow, DbError> {
    let id = Uuid::new_v4();
    let now = Utc::now();

    let row = sqlx::query_as!(
        AutomationExecutionRow,
        r#"
        INSERT INTO automation_executions
            (id, automation_id, execution_id, status, trigger_payload, triggered_at)
        VALUES ($1, $2, $3, 'pending', $4, $5)
        RETURNING id, automation_id, execution_id, status, trigger_payload, result, error,
                  triggered_at, started_at, completed_at
        "#,
        id,
        automation_id,
        execution_id,
        trigger_payload,
        now,
    )
    .fetch_one(pool)
    .await?;

    Ok(row)
}

/// `pending -> running`, stamping `started_at`.
pub async fn mark_running(pool: &PgPool, id: Uuid) -> Result<(), DbError> {
    sqlx::query!(
        "UPDATE automation_executions SET status = 'running', started_at = $1 WHERE id = $2",
        Utc::now(),
        id,
    )
    .execute(pool)
    .await?;
    Ok(())
}

/// `running -> completed`, storing the run's final state (or a caller
/// configured projection of it) as `result` (§4.5 per-run protocol step 3).
pub async fn mark_completed(pool: &PgPool, id: Uuid, result: &Value) -> Result<(), DbError> {
    sqlx::query!(
        "UPDATE automation_executions SET status = 'completed', result = $1, completed_at = $2 WHERE id = $3",
        result,
        Utc::now(),
        id,
    )
    .execute(pool)
    .await?;
    Ok(())
}

/// `running -> failed`, storing the failure's error text (§4.5 per-run
/// protocol step 4).
pub async fn mark_failed(pool: &PgPool, id: Uuid, error: &str) -> Result<(), DbError> {
    sqlx::query!(
        "UPDATE automation_executions SET status = 'failed', error = $1, completed_at = $2 WHERE id = $3",
        error,
        Utc::now(),
        id,
    )
    .execute(pool)
    .await?;
    Ok(())
}

/// Execution history for one automation, most recent first (administrative
/// API / CLI listing).
pub async fn list_for_automation(
    pool: &PgPool,
    automation_id: Uuid,
) -> Result<Vec<AutomationExecutionRow>, DbError> {
    let rows = sqlx::query_as!(
        AutomationExecutionRow,
        r#"
        SELECT id, automation_id, execution_id, status, trigger_payload, result, error,
               triggered_at, started_at, completed_at
        FROM automation_executions
        WHERE automation_id = $1
        ORDER BY triggered_at DESC
        "#,
        automation_id,
    )
    .fetch_all(pool)
    .await?;

    Ok(rows)
}

//! Automation CRUD and scheduling queries.

use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use crate::{models::AutomationRow, DbError};

/// Create a new automation bound to `workflow_id`. `enabled` defaults to
/// `true`; the caller should already have validated `trigger_kind` against
/// its paired field (`cron_expression` for `"cron"`, `webhook_path` for
/// `"webhook"`, neither for `"immediate"`).
#[allow(clippy::too_many_arguments)]
pub async fn create_automation(
    pool: &PgPool,
    workflow_id: Uuid,
    name: &str,
    trigger_kind: &str,
    cron_expression: Option<&str>,
    webhook_path: Option<&str>,
    next_run_at: Option<DateTime<Utc>>,
) -> Result<AutomationRow, DbError> {
    let id = Uuid::new_v4();
    let now = Utc::now();

    let row = sqlx::query_as!(
        AutomationRow,
        r#"
        INSERT INTO automations
            (id, workflow_id, name, trigger_kind, cron_expression, webhook_path,
             enabled, next_run_at, last_run_at, last_error, last_error_at,
             run_count, success_count, failure_count, created_at, updated_at)
        VALUES ($1, $2, $3, $4, $5, $6, true, $7, NULL, NULL, NULL, 0, 0, 0, $8, $8)
        RETURNING id, workflow_id, name, trigger_kind, cron_expression, webhook_path,
                  enabled, next_run_at, last_run_at, last_error, last_error_at,
                  run_count, success_count, failure_count,
                  created_at, updated_at
        "#,
        id,
        workflow_id,
        name,
        trigger_kind,
        cron_expression,
        webhook_path,
        next_run_at,
        now,
    )
    .fetch_one(pool)
    .await?;

    Ok(row)
}

pub async fn get_automation(pool: &PgPool, id: Uuid) -> Result<AutomationRow, DbError> {
    let row = sqlx::query_as!(
        AutomationRow,
        r#"
        SELECT id, workflow_id, name, trigger_kind, cron_expression, webhook_path,
               enabled, next_run_at, last_run_at, last_error, last_error_at,
               run_count, success_count, failure_count,
               created_at, updated_at
        FROM automations WHERE id = $1
        "#,
        id,
    )
    .fetch_optional(pool)
    .await?
    .ok_or(DbError::NotFound)?;

    Ok(row)
}

pub async fn list_automations(pool: &PgPool) -> Result<Vec<AutomationRow>, DbError> {
    let rows = sqlx::query_as!(
        AutomationRow,
        r#"
        SELECT id, workflow_id, name, trigger_kind, cron_expression, webhook_path,
               enabled, next_run_at, last_run_at, last_error, last_error_at,
               run_count, success_count, failure_count,
               created_at, updated_at
        FROM automations ORDER BY created_at DESC
        "#,
    )
    .fetch_all(pool)
    .await?;

    Ok(rows)
}

/// Find the (at most one) automation registered for an inbound webhook
/// path. Disabled automations are still matched — a disabled webhook
/// should answer with a clear "disabled" response rather than a 404.
pub async fn find_by_webhook_path(pool: &PgPool, path: &str) -> Result<Option<AutomationRow>, DbError> {
    let row = sqlx::query_as!(
        AutomationRow,
        r#"
        SELECT id, workflow_id, name, trigger_kind, cron_expression, webhook_path,
               enabled, next_run_at, last_run_at, last_error, last_error_at,
               run_count, success_count, failure_count,
               created_at, updated_at
        FROM automations WHERE webhook_path = $1
        "#,
        path,
    )
    .fetch_optional(pool)
    .await?;

    Ok(row)
}

/// Cron automations whose `next_run_at` has arrived, for the scheduler's
/// tick (§4.5 "Cron trigger").
pub async fn list_due(pool: &PgPool, now: DateTime<Utc>) -> Result<Vec<AutomationRow>, DbError> {
    let rows = sqlx::query_as!(
        AutomationRow,
        r#"
        SELECT id, workflow_id, name, trigger_kind, cron_expression, webhook_path,
               enabled, next_run_at, last_run_at, last_error, last_error_at,
               run_count, success_count, failure_count,
               created_at, updated_at
        FROM automations
        WHERE enabled = true AND trigger_kind = 'cron' AND next_run_at <= $1
        ORDER BY next_run_at ASC
        "#,
        now,
    )
    .fetch_all(pool)
    .await?;

    Ok(rows)
}

pub async fn set_enabled(pool: &PgPool, id: Uuid, enabled: bool) -> Result<(), DbError> {
    sqlx::query!(
        "UPDATE automations SET enabled = $1, updated_at = $2 WHERE id = $3",
        enabled,
        Utc::now(),
        id,
    )
    .execute(pool)
    .await?;
    Ok(())
}

pub async fn update_next_run_at(
    pool: &PgPool,
    id: Uuid,
    next_run_at: Option<DateTime<Utc>>,
) -> Result<(), DbError> {
    sqlx::query!(
        "UPDATE automations SET next_run_at = $1, updated_at = $2 WHERE id = $3",
        next_run_at,
        Utc::now(),
        id,
    )
    .execute(pool)
    .await?;
    Ok(())
}

/// Record that a run has been dispatched: increments `run_count`
/// unconditionally, before the run's outcome is known (§8 counter
/// monotonicity — `run_count` always moves first).
pub async fn record_dispatch(pool: &PgPool, id: Uuid) -> Result<(), DbError> {
    sqlx::query!(
        "UPDATE automations SET run_count = run_count + 1, updated_at = $1 WHERE id = $2",
        Utc::now(),
        id,
    )
    .execute(pool)
    .await?;
    Ok(())
}

/// Record a dispatched run's outcome (§4.5 per-run protocol steps 3-4):
/// exactly one of `success_count` or `failure_count` is incremented,
/// `last_run_at` is updated unconditionally, and on failure `last_error`/
/// `last_error_at` capture what went wrong (§7 "Reported to the automation
/// owner via `lastError`"). `error` is ignored when `succeeded` is `true`.
pub async fn record_outcome(
    pool: &PgPool,
    id: Uuid,
    succeeded: bool,
    error: Option<&str>,
) -> Result<(), DbError> {
    let now = Utc::now();
    if succeeded {
        sqlx::query!(
            "UPDATE automations SET success_count = success_count + 1, last_run_at = $1, updated_at = $1 \
             WHERE id = $2",
            now,
            id,
        )
        .execute(pool)
        .await?;
    } else {
        sqlx::query!(
            "UPDATE automations SET failure_count = failure_count + 1, last_run_at = $1, \
             last_error = $2, last_error_at = $1, updated_at = $1 WHERE id = $3",
            now,
            error,
            id,
        )
        .execute(pool)
        .await?;
    }
    Ok(())
}

pub async fn delete_automation(pool: &PgPool, id: Uuid) -> Result<(), DbError> {
    let result = sqlx::query!("DELETE FROM automations WHERE id = $1", id)
        .execute(pool)
        .await?;

    if result.rows_affected() == 0 {
        return Err(DbError::NotFound);
    }
    Ok(())
}

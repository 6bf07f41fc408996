use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use uuid::Uuid;

use super::AppState;
use db::models::AutomationRow;
use scheduler::{SchedulerError, TriggerSpec};

#[derive(serde::Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum TriggerDto {
    Cron { expression: String },
    Webhook { path: String },
    Immediate,
}

impl From<TriggerDto> for TriggerSpec {
    fn from(dto: TriggerDto) -> Self {
        match dto {
            TriggerDto::Cron { expression } => TriggerSpec::Cron(expression),
            TriggerDto::Webhook { path } => TriggerSpec::Webhook(path),
            TriggerDto::Immediate => TriggerSpec::Immediate,
        }
    }
}

#[derive(serde::Deserialize)]
pub struct CreateAutomationDto {
    pub workflow_id: Uuid,
    pub name: String,
    pub trigger: TriggerDto,
}

pub async fn list(State(state): State<AppState>) -> Result<Json<Vec<AutomationRow>>, StatusCode> {
    state
        .scheduler
        .list()
        .await
        .map(Json)
        .map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)
}

pub async fn create(
    State(state): State<AppState>,
    Json(payload): Json<CreateAutomationDto>,
) -> Result<(StatusCode, Json<AutomationRow>), StatusCode> {
    match state
        .scheduler
        .create(payload.workflow_id, &payload.name, payload.trigger.into())
        .await
    {
        Ok(row) => Ok((StatusCode::CREATED, Json(row))),
        Err(SchedulerError::InvalidCronExpression(_)) | Err(SchedulerError::InvalidWorkflowDefinition(_)) => {
            Err(StatusCode::BAD_REQUEST)
        }
        Err(_) => Err(StatusCode::INTERNAL_SERVER_ERROR),
    }
}

pub async fn enable(Path(id): Path<Uuid>, State(state): State<AppState>) -> Result<StatusCode, StatusCode> {
    state
        .scheduler
        .enable(id)
        .await
        .map(|_| StatusCode::NO_CONTENT)
        .map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)
}

pub async fn disable(Path(id): Path<Uuid>, State(state): State<AppState>) -> Result<StatusCode, StatusCode> {
    state
        .scheduler
        .disable(id)
        .await
        .map(|_| StatusCode::NO_CONTENT)
        .map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)
}

/// An optional JSON object body becomes trigger data merged over the
/// workflow's own `initialState` (§4.5). A missing or empty body runs with
/// no overrides.
pub async fn trigger(
    Path(id): Path<Uuid>,
    State(state): State<AppState>,
    body: axum::body::Bytes,
) -> Result<(StatusCode, Json<serde_json::Value>), StatusCode> {
    let payload = if body.is_empty() {
        None
    } else {
        match serde_json::from_slice::<serde_json::Value>(&body) {
            Ok(serde_json::Value::Object(map)) => Some(map),
            Ok(_) => return Err(StatusCode::BAD_REQUEST),
            Err(_) => return Err(StatusCode::BAD_REQUEST),
        }
    };

    match state.scheduler.trigger_now(id, payload).await {
        Ok(outcome) => Ok((
            StatusCode::ACCEPTED,
            Json(serde_json::json!({ "steps_executed": outcome.steps_executed })),
        )),
        Err(SchedulerError::NotFound(_)) => Err(StatusCode::NOT_FOUND),
        Err(SchedulerError::Run(_)) => Err(StatusCode::UNPROCESSABLE_ENTITY),
        Err(_) => Err(StatusCode::INTERNAL_SERVER_ERROR),
    }
}

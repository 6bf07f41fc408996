use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde_json::Value;

use super::AppState;
use scheduler::SchedulerError;

/// Inbound webhook trigger (§4.5 "Webhook trigger"). The request body
/// becomes the run's `initialState` overrides, merged over the workflow's
/// own declared `initialState` (§4.5 per-run protocol step 2).
pub async fn handle_webhook(
    Path(path): Path<String>,
    State(state): State<AppState>,
    Json(payload): Json<Value>,
) -> Result<(StatusCode, Json<Value>), StatusCode> {
    let payload = match payload {
        Value::Object(map) => map,
        Value::Null => serde_json::Map::new(),
        _ => return Err(StatusCode::BAD_REQUEST),
    };

    match state.scheduler.handle_webhook(&path, payload).await {
        Ok(outcome) => Ok((
            StatusCode::ACCEPTED,
            Json(serde_json::json!({ "steps_executed": outcome.steps_executed })),
        )),
        Err(SchedulerError::NotFound(_)) => Err(StatusCode::NOT_FOUND),
        Err(SchedulerError::Run(_)) => Err(StatusCode::UNPROCESSABLE_ENTITY),
        Err(_) => Err(StatusCode::INTERNAL_SERVER_ERROR),
    }
}

//! `fetch` — a deterministic stand-in for an HTTP-fetch-shaped node.
//!
//! Real HTTP fetch nodes are external collaborators (§1 of the spec: "Node
//! implementations... are external collaborators specified only by the
//! contract they must satisfy"); this implementation exists so the engine
//! and its tests can exercise the "node-emitted error edge recovered
//! locally" pattern (scenario S5) without a live network dependency. It
//! reads `config.simulateStatus` (defaulting to 200) instead of making a
//! real request.

use async_trait::async_trait;
use serde_json::{json, Value};

use crate::{
    traits::{EdgeMap, ExecutionContext},
    ExecutableNode, NodeError,
};

pub struct RequestNode;

#[async_trait]
impl ExecutableNode for RequestNode {
    async fn execute(&self, _ctx: &mut ExecutionContext<'_>, config: Value) -> Result<EdgeMap, NodeError> {
        let status = config
            .get("simulateStatus")
            .and_then(Value::as_u64)
            .unwrap_or(200);

        let url = config.get("url").and_then(Value::as_str).unwrap_or("");

        let edge = match status {
            200..=299 => "success",
            400..=499 => "clientError",
            _ => "serverError",
        };

        Ok(EdgeMap::single_value(
            edge,
            json!({ "status": status, "url": url }),
        ))
    }
}

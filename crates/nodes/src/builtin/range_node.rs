//! `range…` — a re-entrant node that walks `start..stop` (exclusive) in
//! steps of `step`, writing the current value to `state.rangeValue` on
//! each invocation and emitting `next` until exhausted, then `complete`.
//! Used by scenario S4.

use async_trait::async_trait;
use serde_json::{json, Value};

use crate::{
    traits::{EdgeMap, ExecutionContext},
    ExecutableNode, NodeError,
};

pub struct RangeNode;

#[async_trait]
impl ExecutableNode for RangeNode {
    async fn execute(&self, ctx: &mut ExecutionContext<'_>, config: Value) -> Result<EdgeMap, NodeError> {
        let start = config.get("start").and_then(Value::as_i64).unwrap_or(0);
        let stop = config.get("stop").and_then(Value::as_i64).unwrap_or(0);
        let step = config.get("step").and_then(Value::as_i64).unwrap_or(1).max(1);

        let cursor_key = ctx.reserved_key("range_cursor");
        let cursor = ctx
            .state
            .get(&cursor_key)
            .and_then(Value::as_i64)
            .unwrap_or(start);

        if cursor >= stop {
            ctx.state.remove(&cursor_key);
            return Ok(EdgeMap::single_value("complete", json!({})));
        }

        ctx.state.insert("rangeValue".into(), json!(cursor));
        ctx.state.insert(cursor_key, json!(cursor + step));

        Ok(EdgeMap::single_value("next", json!({ "rangeValue": cursor })))
    }
}

//! `loop-node…` — a re-entrant node that increments `state.loopCount`
//! (initialised to 0 by the caller) on every invocation, emitting `again`
//! while `loopCount < 5` and `stop` once it reaches 5. Used by scenarios
//! S2 and S3.
//!
//! The node only ever touches its own domain key (`loopCount`); the
//! engine's separate `_loop_<instanceId>` re-entry bookkeeping (§4.4.3) is
//! orthogonal and invisible to this node body.

use async_trait::async_trait;
use serde_json::{json, Value};

use crate::{
    traits::{EdgeMap, ExecutionContext},
    ExecutableNode, NodeError,
};

const BOUND: i64 = 5;

pub struct LoopNode;

#[async_trait]
impl ExecutableNode for LoopNode {
    async fn execute(&self, ctx: &mut ExecutionContext<'_>, _config: Value) -> Result<EdgeMap, NodeError> {
        let count = ctx
            .state
            .get("loopCount")
            .and_then(Value::as_i64)
            .unwrap_or(0);

        let next = count + 1;
        ctx.state.insert("loopCount".into(), json!(next));

        let edge = if next < BOUND { "again" } else { "stop" };
        Ok(EdgeMap::single_value(edge, json!({ "loopCount": next })))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::Map;

    #[tokio::test]
    async fn stops_after_five_reentries() {
        let mut state = Map::new();
        state.insert("loopCount".into(), json!(0));

        let mut last_edge = String::new();
        for _ in 0..BOUND {
            let mut ctx = ExecutionContext {
                workflow_id: uuid::Uuid::new_v4(),
                execution_id: uuid::Uuid::new_v4(),
                node_id: "l1".into(),
                state: &mut state,
                inputs: Value::Null,
            };
            let outcome = LoopNode.execute(&mut ctx, Value::Null).await.unwrap();
            last_edge = outcome.into_single().unwrap().0;
        }

        assert_eq!(last_edge, "stop");
        assert_eq!(state["loopCount"], json!(5));
    }
}

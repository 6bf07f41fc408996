//! `decision-node` — emits `big` iff `state.randomNumber > 50`, else
//! `small`. Used by scenarios S1 and S3.

use async_trait::async_trait;
use serde_json::{json, Value};

use crate::{
    traits::{EdgeMap, ExecutionContext},
    ExecutableNode, NodeError,
};

pub struct DecisionNode;

#[async_trait]
impl ExecutableNode for DecisionNode {
    async fn execute(&self, ctx: &mut ExecutionContext<'_>, _config: Value) -> Result<EdgeMap, NodeError> {
        let number = ctx
            .state
            .get("randomNumber")
            .and_then(Value::as_i64)
            .unwrap_or(0);

        let edge = if number > 50 { "big" } else { "small" };
        Ok(EdgeMap::single_value(edge, json!({ "randomNumber": number })))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::Map;

    async fn run(number: i64) -> String {
        let mut state = Map::new();
        state.insert("randomNumber".into(), json!(number));
        let mut ctx = ExecutionContext {
            workflow_id: uuid::Uuid::new_v4(),
            execution_id: uuid::Uuid::new_v4(),
            node_id: "d1".into(),
            state: &mut state,
            inputs: Value::Null,
        };
        let outcome = DecisionNode.execute(&mut ctx, Value::Null).await.unwrap();
        outcome.into_single().unwrap().0
    }

    #[tokio::test]
    async fn big_branch_above_fifty() {
        assert_eq!(run(51).await, "big");
        assert_eq!(run(99).await, "big");
    }

    #[tokio::test]
    async fn small_branch_at_or_below_fifty() {
        assert_eq!(run(50).await, "small");
        assert_eq!(run(0).await, "small");
    }
}

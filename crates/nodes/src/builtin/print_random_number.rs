//! `print-random-number` — writes a random integer in `[0, 99]` to
//! `state.randomNumber` and emits `success`. Used by scenarios S1 and S3.

use async_trait::async_trait;
use serde_json::{json, Value};

use crate::{
    traits::{EdgeMap, ExecutionContext},
    ExecutableNode, NodeError,
};

pub struct PrintRandomNumber;

#[async_trait]
impl ExecutableNode for PrintRandomNumber {
    async fn execute(&self, ctx: &mut ExecutionContext<'_>, _config: Value) -> Result<EdgeMap, NodeError> {
        // Draw randomness from a fresh UUIDv4 rather than pulling in a
        // dedicated `rand` dependency just for one demo node.
        let byte = uuid::Uuid::new_v4().as_bytes()[0];
        let number = (byte as u32 % 100) as i64;

        ctx.state.insert("randomNumber".into(), json!(number));

        Ok(EdgeMap::single_value("success", json!({ "randomNumber": number })))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::Map;

    #[tokio::test]
    async fn writes_number_in_range() {
        let mut state = Map::new();
        let mut ctx = ExecutionContext {
            workflow_id: uuid::Uuid::new_v4(),
            execution_id: uuid::Uuid::new_v4(),
            node_id: "n1".into(),
            state: &mut state,
            inputs: Value::Null,
        };

        let outcome = PrintRandomNumber.execute(&mut ctx, Value::Null).await.unwrap();
        let (edge, payload) = outcome.into_single().unwrap();
        assert_eq!(edge, "success");
        let _ = payload.await;

        let n = state["randomNumber"].as_i64().unwrap();
        assert!((0..100).contains(&n));
    }
}

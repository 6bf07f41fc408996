//! `print-message` — writes `config.message` to `state.message` and emits
//! `success`. Used by scenarios S1, S2, S3.

use async_trait::async_trait;
use serde_json::{json, Value};

use crate::{
    traits::{EdgeMap, ExecutionContext},
    ExecutableNode, NodeError,
};

pub struct PrintMessage;

#[async_trait]
impl ExecutableNode for PrintMessage {
    async fn execute(&self, ctx: &mut ExecutionContext<'_>, config: Value) -> Result<EdgeMap, NodeError> {
        let message = config
            .get("message")
            .cloned()
            .unwrap_or(Value::Null);

        ctx.state.insert("message".into(), message.clone());

        Ok(EdgeMap::single_value("success", json!({ "message": message })))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::Map;

    #[tokio::test]
    async fn writes_config_message_to_state() {
        let mut state = Map::new();
        let mut ctx = ExecutionContext {
            workflow_id: uuid::Uuid::new_v4(),
            execution_id: uuid::Uuid::new_v4(),
            node_id: "m1".into(),
            state: &mut state,
            inputs: Value::Null,
        };

        let outcome = PrintMessage
            .execute(&mut ctx, json!({ "message": "large" }))
            .await
            .unwrap();
        assert_eq!(outcome.into_single().unwrap().0, "success");
        assert_eq!(state["message"], json!("large"));
    }
}

pub mod automations;
pub mod executions;
pub mod webhooks;
pub mod workflows;

pub(crate) use crate::AppState;

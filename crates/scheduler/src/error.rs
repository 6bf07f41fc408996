//! Scheduler-level error type.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum SchedulerError {
    #[error("invalid cron expression: {0}")]
    InvalidCronExpression(String),

    #[error("cron expression has no upcoming run")]
    NoUpcomingRun,

    #[error("{0}")]
    NotFound(String),

    #[error("stored workflow definition is not valid: {0}")]
    InvalidWorkflowDefinition(String),

    #[error("workflow failed to parse: {0}")]
    Parse(#[from] engine::ParseError),

    #[error(transparent)]
    Db(#[from] db::DbError),

    #[error("run aborted: {0}")]
    Run(#[from] engine::EngineFailure),
}

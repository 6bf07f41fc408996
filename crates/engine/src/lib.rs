//! `engine` crate — the Workflow Parser, the State Manager, and the
//! Execution Engine. Depends only on the `nodes` crate (the Node Contract
//! and Node Registry); persistence is the caller's concern.

pub mod error;
pub mod executor;
pub mod models;
pub mod parser;
pub mod state;

pub use error::{EngineFailure, FailureCause, ParseError};
pub use executor::{ExecutorConfig, RunOutcome, WorkflowExecutor};
pub use models::{Ast, AstNode, WorkflowDefinition};
pub use parser::{parse_workflow, parse_workflow_json};

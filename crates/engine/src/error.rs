//! Engine-level error types.
//!
//! Two independent taxonomies, per §7 of the spec:
//! - [`ParseError`] — parse-time, never partially applied; the caller gets
//!   back either a complete AST or an error, nothing in between.
//! - [`EngineFailure`] — run-aborting execution errors. A node *emitting*
//!   an `error` edge is **not** an `EngineFailure`; it is routed like any
//!   other edge and never reaches this type.

use serde_json::Value;
use thiserror::Error;

use nodes::StateMap;

/// Errors raised while lowering workflow JSON into an AST (§4.2).
///
/// Every variant carries `path`, a `/`-joined pointer built the same way
/// `instanceId`s are: ordinal indices and edge names along the source
/// JSON. A single `path` field per error keeps `cause`-style recursion out
/// of the type; callers report the whole workflow as either parsed or
/// rejected, never partially.
#[derive(Debug, Error)]
pub enum ParseError {
    #[error("malformed workflow JSON: {0}")]
    InvalidJson(String),

    #[error("workflow definition is missing the required `workflow` field")]
    MissingWorkflowField,

    #[error("`workflow` must contain at least one step")]
    EmptyWorkflow,

    #[error("at {path}: unknown node type '{node_type}'")]
    UnknownNodeType { path: String, node_type: String },

    #[error("at {path}: node type '{node_type}' does not declare an edge named '{edge}'")]
    UnknownEdge {
        path: String,
        node_type: String,
        edge: String,
    },

    #[error("at {path}: malformed step expression: {reason}")]
    InvalidStepShape { path: String, reason: String },

    #[error(
        "at {path}: edge-query key(s) found alongside non-edge-query keys in an implicit \
         sequence; `…?` keys are only meaningful directly inside a single node's config block"
    )]
    AmbiguousEdgeQuery { path: String },

    #[error(
        "at {path}: loop node '{node_type}' declares no branch-less (terminal) edge; the loop \
         could never exit"
    )]
    LoopMissingTerminalEdge { path: String, node_type: String },

    #[error(
        "at {path}: loop node '{node_type}' declares no branched (re-entrant) edge; it would \
         never loop"
    )]
    LoopMissingReentryEdge { path: String, node_type: String },
}

/// Why a run was aborted (§7 "Engine failures").
#[derive(Debug, Clone)]
pub enum FailureCause {
    /// A node's `execute` returned `NodeError::Fatal`, or `NodeError::Retryable`
    /// with retries exhausted.
    NodeError { message: String },
    /// A re-entrant node exceeded `ENGINE_LOOP_BOUND` re-entries without
    /// emitting a branch-less edge.
    LoopBoundExceeded { bound: u32 },
    /// The run exceeded its configured wall-clock timeout.
    Timeout,
    /// The run was cancelled externally.
    Cancelled,
}

impl std::fmt::Display for FailureCause {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NodeError { message } => write!(f, "node error: {message}"),
            Self::LoopBoundExceeded { bound } => {
                write!(f, "loop bound of {bound} re-entries exceeded")
            }
            Self::Timeout => write!(f, "run timed out"),
            Self::Cancelled => write!(f, "run was cancelled"),
        }
    }
}

/// A structured, run-aborting failure report (§7 "User-visible failure
/// behaviour"): the failing instance, the cause, and a snapshot of
/// whatever state existed at the moment of failure.
#[derive(Debug, Error)]
#[error("run aborted at node '{instance_id}': {cause}")]
pub struct EngineFailure {
    pub instance_id: String,
    pub cause: FailureCause,
    pub final_state: StateMap,
    pub node_payload: Option<Value>,
}

//! Node-level error type.

use thiserror::Error;

/// Errors returned by a node's `execute` method.
///
/// The engine uses the variant to decide retry behaviour:
/// - `Retryable` — the engine re-invokes the node with exponential back-off.
/// - `Fatal`     — the run is wrapped in an `EngineFailure` immediately.
///
/// Neither variant is the same thing as a node *emitting* an `error` edge
/// through its `EdgeMap` — that is a normal, recoverable outcome routed
/// like any other edge.
#[derive(Debug, Error, Clone)]
pub enum NodeError {
    /// Transient failure; the engine should re-try the job.
    #[error("retryable node error: {0}")]
    Retryable(String),

    /// Permanent failure; no retry should be attempted.
    #[error("fatal node error: {0}")]
    Fatal(String),
}

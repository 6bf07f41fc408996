//! The `ExecutableNode` trait and the `EdgeMap` it must return — the
//! contract every node body must fulfil (§4.6 of the node contract).
//!
//! Defined here (in the `nodes` crate) so both the `engine` crate and
//! individual node implementations can import them without a circular
//! dependency.

use std::future::Future;
use std::pin::Pin;

use async_trait::async_trait;
use indexmap::IndexMap;
use serde_json::Value;

use crate::NodeError;

/// The mutable key/value bag for one execution, free-form by design
/// (Non-goals, §1): nodes may read and write any key, but keys with a
/// leading underscore are reserved for engine bookkeeping (loop counters,
/// service injection) and are stripped before the final state is ever
/// handed back to a caller.
pub type StateMap = serde_json::Map<String, Value>;

/// Shared context passed to every node during execution.
pub struct ExecutionContext<'a> {
    /// ID of the parent workflow.
    pub workflow_id: uuid::Uuid,
    /// ID of the current execution run.
    pub execution_id: uuid::Uuid,
    /// Stable path-derived identifier of the node instance being invoked.
    pub node_id: String,
    /// The mutable state bag. Nodes read and write through this reference;
    /// mutations persist to every subsequent step.
    pub state: &'a mut StateMap,
    /// The payload produced by the previous step's emitted edge (or the
    /// caller-supplied overrides, at the first step).
    pub inputs: Value,
}

impl<'a> ExecutionContext<'a> {
    /// Look up a reserved (underscore-prefixed) bookkeeping key, e.g. a
    /// loop node's own per-instance counter at `_loop_<node_id>`.
    pub fn reserved_key(&self, suffix: &str) -> String {
        format!("_{suffix}_{}", self.node_id)
    }
}

/// A deferred computation producing the payload for one emitted edge.
///
/// Modelled as a boxed future rather than a plain value because the
/// contract allows the thunk to "perform suspending I/O" — a future
/// covers both the synchronous and the suspending case uniformly. The
/// engine calls (awaits) it exactly once.
pub type EdgePayload = Pin<Box<dyn Future<Output = Value> + Send>>;

/// The result of one node invocation: nominally a mapping with **exactly
/// one** entry — the edge name and its deferred payload.
///
/// The underlying map can technically hold more than one entry (a
/// misbehaving node can insert several), matching the distilled spec's
/// framing that "if a node returns multiple keys, engine behaviour is
/// unspecified". [`EdgeMap::into_single`] is where this implementation
/// chooses a concrete behaviour: take the first-inserted entry and warn.
pub struct EdgeMap {
    entries: IndexMap<String, EdgePayload>,
}

impl EdgeMap {
    /// Build an `EdgeMap` with a single edge carrying an already-computed
    /// value (the common case for nodes that do no I/O).
    pub fn single_value(edge: impl Into<String>, value: Value) -> Self {
        Self::single_future(edge, async move { value })
    }

    /// Build an `EdgeMap` with a single edge whose payload is computed by
    /// a future, e.g. one that performs network or disk I/O.
    pub fn single_future<F>(edge: impl Into<String>, payload: F) -> Self
    where
        F: Future<Output = Value> + Send + 'static,
    {
        let mut entries = IndexMap::with_capacity(1);
        entries.insert(edge.into(), Box::pin(payload) as EdgePayload);
        Self { entries }
    }

    /// Number of edges carried — should always be 1 for a conforming node.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Consume the map, returning the edge name and payload the engine
    /// should act on. Logs a warning and keeps the first-inserted entry
    /// if the node violated the single-edge invariant.
    pub fn into_single(mut self) -> Option<(String, EdgePayload)> {
        if self.entries.len() > 1 {
            tracing::warn!(
                edge_count = self.entries.len(),
                "node returned more than one edge; honouring the first and discarding the rest"
            );
        }
        self.entries.shift_remove_index(0)
    }
}

impl std::fmt::Debug for EdgeMap {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EdgeMap")
            .field("edges", &self.entries.keys().collect::<Vec<_>>())
            .finish()
    }
}

/// The core node trait. All built-in nodes and out-of-tree plugins must
/// implement this.
#[async_trait]
pub trait ExecutableNode: Send + Sync {
    /// Execute the node against the resolved config and the current
    /// execution context, returning the single edge it emits.
    async fn execute(
        &self,
        ctx: &mut ExecutionContext<'_>,
        config: Value,
    ) -> Result<EdgeMap, NodeError>;
}

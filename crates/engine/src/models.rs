//! Core domain models for the workflow engine — the source of truth for
//! what a workflow and its lowered AST look like in memory (§3).

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;

// ---------------------------------------------------------------------------
// WorkflowDefinition — the raw, still-sugared document
// ---------------------------------------------------------------------------

/// A workflow definition as received over the wire, before lowering.
///
/// `workflow` deliberately stays `Vec<Value>` rather than a typed enum:
/// each element is one of the step-expression shapes described in §3, and
/// [`crate::parser::parse_workflow`] is what lowers them.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkflowDefinition {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub version: Option<String>,
    #[serde(default, rename = "initialState")]
    pub initial_state: serde_json::Map<String, Value>,
    pub workflow: Vec<Value>,
}

// ---------------------------------------------------------------------------
// AstNode — the lowered, validated graph
// ---------------------------------------------------------------------------

/// One lowered step. `branches` maps an emitted edge name to the ordered
/// subgraph that runs when that edge fires; an edge with no entry is a
/// terminal outcome for this node (§4.4.2.g).
#[derive(Debug, Clone)]
pub struct AstNode {
    /// Stable, path-derived identifier (§3 "Instance identifier").
    pub instance_id: String,
    /// Node-type identifier, with any loop marker already stripped.
    pub node_type: String,
    /// Whether this node is re-entrant (trailing loop marker, §3).
    pub is_loop: bool,
    /// The node's own configuration — everything in the source mapping
    /// that was not an edge-query key. Always a JSON object.
    pub config: Value,
    /// Edge name → subgraph to run when that edge is emitted.
    pub branches: IndexMap<String, Vec<AstNode>>,
}

/// The fully lowered AST for one workflow: an ordered top-level sequence
/// plus whatever `initialState` the definition declared.
#[derive(Debug, Clone)]
pub struct Ast {
    pub steps: Vec<AstNode>,
    pub initial_state: serde_json::Map<String, Value>,
}

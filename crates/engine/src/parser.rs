//! The Workflow Parser (§4.2) — lowers sugared workflow JSON into an [`Ast`].
//!
//! A step expression is one of four shapes, and this module is organised
//! around exactly those four:
//!
//! - a bare string naming a node type with no config and no branches,
//! - a single-key object `{ "nodeType": { ... } }`, whose value mixes plain
//!   config keys with `"<edge>?"` branch keys,
//! - a multi-key object, sugar for an ordered sequence of single-key steps
//!   (key order — preserved by `serde_json`'s `preserve_order` feature — is
//!   execution order),
//! - an array, an explicit sequence, possibly nested.
//!
//! Lowering never partially succeeds: any rejection anywhere in the
//! document aborts the whole parse with a [`ParseError`] that names the
//! JSON path where it happened.

use indexmap::IndexMap;
use serde_json::Value;

use crate::error::ParseError;
use crate::models::{Ast, AstNode, WorkflowDefinition};
use nodes::{NodeDescriptor, NodeRegistry};

const LOOP_MARKER: &str = "...";
const EDGE_QUERY_SUFFIX: char = '?';

/// Parse a raw JSON document straight into a validated [`Ast`].
pub fn parse_workflow_json(raw: &str, registry: &NodeRegistry) -> Result<Ast, ParseError> {
    let value: Value = serde_json::from_str(raw).map_err(|e| ParseError::InvalidJson(e.to_string()))?;
    if value.get("workflow").is_none() {
        return Err(ParseError::MissingWorkflowField);
    }
    let definition: WorkflowDefinition =
        serde_json::from_value(value).map_err(|e| ParseError::InvalidJson(e.to_string()))?;
    parse_workflow(&definition, registry)
}

/// Lower an already-deserialized [`WorkflowDefinition`] into an [`Ast`],
/// validating every node type and edge name against `registry`.
pub fn parse_workflow(definition: &WorkflowDefinition, registry: &NodeRegistry) -> Result<Ast, ParseError> {
    if definition.workflow.is_empty() {
        return Err(ParseError::EmptyWorkflow);
    }
    let steps = lower_sequence(&definition.workflow, registry, "workflow")?;
    Ok(Ast {
        steps,
        initial_state: definition.initial_state.clone(),
    })
}

fn lower_sequence(items: &[Value], registry: &NodeRegistry, path: &str) -> Result<Vec<AstNode>, ParseError> {
    let mut nodes = Vec::with_capacity(items.len());
    for (i, item) in items.iter().enumerate() {
        let child_path = format!("{path}[{i}]");
        nodes.extend(lower_step_expr(item, registry, &child_path)?);
    }
    Ok(nodes)
}

/// Lower one step expression. Returns more than one [`AstNode`] exactly
/// when `value` is an array or a multi-key implicit sequence.
fn lower_step_expr(value: &Value, registry: &NodeRegistry, path: &str) -> Result<Vec<AstNode>, ParseError> {
    match value {
        Value::String(node_type) => Ok(vec![lower_bare_node(node_type, registry, path)?]),
        Value::Array(items) => lower_sequence(items, registry, path),
        Value::Object(map) => {
            if map.is_empty() {
                return Err(ParseError::InvalidStepShape {
                    path: path.to_string(),
                    reason: "an empty object is not a valid step expression".to_string(),
                });
            }

            if map.len() == 1 {
                let (node_type, spec) = map.iter().next().expect("len checked above");
                Ok(vec![lower_single_node(node_type, spec, registry, path)?])
            } else {
                if map.keys().any(|k| is_edge_query_key(k)) {
                    return Err(ParseError::AmbiguousEdgeQuery {
                        path: path.to_string(),
                    });
                }
                let mut nodes = Vec::with_capacity(map.len());
                for (i, (node_type, spec)) in map.iter().enumerate() {
                    let child_path = format!("{path}.{node_type}#{i}");
                    nodes.push(lower_single_node(node_type, spec, registry, &child_path)?);
                }
                Ok(nodes)
            }
        }
        other => Err(ParseError::InvalidStepShape {
            path: path.to_string(),
            reason: format!("expected a node type string, object, or array; found {other}"),
        }),
    }
}

/// A bare string step: a node type with empty config and no branches.
fn lower_bare_node(raw_type: &str, registry: &NodeRegistry, path: &str) -> Result<AstNode, ParseError> {
    let (node_type, is_loop) = strip_loop_marker(raw_type);
    let descriptor = lookup_descriptor(registry, &node_type, path)?;
    let branches = IndexMap::new();
    validate_loop_shape(&descriptor, &branches, is_loop, &node_type, path)?;
    Ok(AstNode {
        instance_id: path.to_string(),
        node_type,
        is_loop,
        config: Value::Object(serde_json::Map::new()),
        branches,
    })
}

/// A single-key step: `{ "nodeType": spec }`. `spec`'s keys split into
/// plain config fields and `"<edge>?"` branch keys.
fn lower_single_node(
    raw_type: &str,
    spec: &Value,
    registry: &NodeRegistry,
    path: &str,
) -> Result<AstNode, ParseError> {
    let (node_type, is_loop) = strip_loop_marker(raw_type);
    let descriptor = lookup_descriptor(registry, &node_type, path)?;

    let spec_map = match spec {
        Value::Object(map) => map.clone(),
        Value::Null => serde_json::Map::new(),
        // Shorthand config: `{ "print-message": "hello" }` is sugar for a
        // node whose whole config is that scalar/array value.
        other => {
            let mut config = serde_json::Map::new();
            config.insert("value".to_string(), other.clone());
            let branches = IndexMap::new();
            validate_loop_shape(&descriptor, &branches, is_loop, &node_type, path)?;
            return Ok(AstNode {
                instance_id: path.to_string(),
                node_type,
                is_loop,
                config: Value::Object(config),
                branches,
            });
        }
    };

    let mut config = serde_json::Map::new();
    let mut branches = IndexMap::new();

    for (key, val) in spec_map.iter() {
        if is_edge_query_key(key) {
            let edge = &key[..key.len() - 1];
            if edge.is_empty() {
                return Err(ParseError::InvalidStepShape {
                    path: path.to_string(),
                    reason: "an edge-query key must name an edge before '?'".to_string(),
                });
            }
            if !descriptor.edges.iter().any(|e| e == edge) {
                return Err(ParseError::UnknownEdge {
                    path: path.to_string(),
                    node_type: node_type.clone(),
                    edge: edge.to_string(),
                });
            }
            let branch_path = format!("{path}.{edge}?");
            let subgraph = lower_step_expr(val, registry, &branch_path)?;
            branches.insert(edge.to_string(), subgraph);
        } else {
            config.insert(key.clone(), val.clone());
        }
    }

    validate_loop_shape(&descriptor, &branches, is_loop, &node_type, path)?;

    Ok(AstNode {
        instance_id: path.to_string(),
        node_type,
        is_loop,
        config: Value::Object(config),
        branches,
    })
}

fn lookup_descriptor(registry: &NodeRegistry, node_type: &str, path: &str) -> Result<NodeDescriptor, ParseError> {
    registry.lookup(node_type).ok_or_else(|| ParseError::UnknownNodeType {
        path: path.to_string(),
        node_type: node_type.to_string(),
    })
}

/// A loop node must declare at least one edge left un-branched (the exit)
/// and at least one edge that is branched (the re-entry), or it could
/// never terminate, or never iterate at all (§4.4.2.g).
fn validate_loop_shape(
    descriptor: &NodeDescriptor,
    branches: &IndexMap<String, Vec<AstNode>>,
    is_loop: bool,
    node_type: &str,
    path: &str,
) -> Result<(), ParseError> {
    if !is_loop {
        return Ok(());
    }
    let has_terminal_edge = descriptor.edges.iter().any(|e| !branches.contains_key(e));
    if !has_terminal_edge {
        return Err(ParseError::LoopMissingTerminalEdge {
            path: path.to_string(),
            node_type: node_type.to_string(),
        });
    }
    if branches.is_empty() {
        return Err(ParseError::LoopMissingReentryEdge {
            path: path.to_string(),
            node_type: node_type.to_string(),
        });
    }
    Ok(())
}

fn is_edge_query_key(key: &str) -> bool {
    key.ends_with(EDGE_QUERY_SUFFIX)
}

fn strip_loop_marker(raw_type: &str) -> (String, bool) {
    match raw_type.strip_suffix(LOOP_MARKER) {
        Some(stripped) => (stripped.to_string(), true),
        None => (raw_type.to_string(), false),
    }
}

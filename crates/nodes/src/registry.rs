//! The Node Registry — maps a node-type identifier to a factory producing
//! fresh `ExecutableNode` instances, plus the metadata the parser validates
//! workflows against.
//!
//! Frozen after startup in the common case; `register` is still race-safe
//! (backed by `dashmap`) so a long-running process may register plugin
//! nodes discovered after boot without taking a global lock on every read.

use std::sync::Arc;

use dashmap::DashMap;
use thiserror::Error;

use crate::traits::ExecutableNode;

/// A node type's declared shape: what config keys it reads, what edges it
/// may emit, and discovery metadata. Immutable once registered.
#[derive(Debug, Clone)]
pub struct NodeDescriptor {
    /// Unique identifier, e.g. `"decision-node"`. Matched against the
    /// node-type key in workflow JSON.
    pub identifier: String,
    /// Human-readable name.
    pub name: String,
    /// Semver-ish version string.
    pub version: String,
    /// Declared input config keys (informational — not enforced by the
    /// registry itself; nodes validate their own config).
    pub input_keys: Vec<String>,
    /// Declared output payload keys (informational).
    pub output_keys: Vec<String>,
    /// Edge names this node type may emit. The parser rejects a branch
    /// keyed by any edge name not in this list.
    pub edges: Vec<String>,
    /// Opaque discovery hints (icon, category, docs URL, …).
    pub hints: Option<serde_json::Value>,
}

impl NodeDescriptor {
    pub fn new(
        identifier: impl Into<String>,
        name: impl Into<String>,
        version: impl Into<String>,
        edges: Vec<String>,
    ) -> Self {
        Self {
            identifier: identifier.into(),
            name: name.into(),
            version: version.into(),
            input_keys: Vec::new(),
            output_keys: Vec::new(),
            edges,
            hints: None,
        }
    }

    fn validate(&self) -> Result<(), RegistryError> {
        if self.edges.is_empty() {
            return Err(RegistryError::NoDeclaredEdges(self.identifier.clone()));
        }
        let shaped = self
            .identifier
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
            && !self.identifier.is_empty();
        if !shaped {
            return Err(RegistryError::MalformedIdentifier(self.identifier.clone()));
        }
        Ok(())
    }
}

/// Errors raised by registry operations.
#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("node type '{0}' is already registered at a different version")]
    DuplicateRegistration(String),

    #[error("node type '{0}' declares no edges; a node must emit at least one")]
    NoDeclaredEdges(String),

    #[error("node type identifier '{0}' is not identifier-shaped (expected snake/kebab-case)")]
    MalformedIdentifier(String),

    #[error("no node type registered for identifier '{0}'")]
    NotFound(String),
}

type Factory = Arc<dyn Fn() -> Arc<dyn ExecutableNode> + Send + Sync>;

struct Entry {
    descriptor: NodeDescriptor,
    factory: Factory,
}

/// Maps node-type identifiers to descriptors and instance factories.
///
/// An `Engine` owns exactly one `NodeRegistry` reference (§4.1); it is not
/// a process-wide singleton, though `Clone` is cheap (an `Arc` bump) so
/// multiple concurrent runs can share one registry.
#[derive(Clone, Default)]
pub struct NodeRegistry {
    entries: Arc<DashMap<String, Entry>>,
}

impl NodeRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a node type under its identifier.
    ///
    /// Re-registering the *same* identifier with a descriptor of the same
    /// version is idempotent (the new factory replaces the old one — handy
    /// when a plugin is hot-reloaded). Re-registering with a *different*
    /// version is rejected as `DuplicateRegistration`.
    pub fn register<F>(&self, descriptor: NodeDescriptor, factory: F) -> Result<(), RegistryError>
    where
        F: Fn() -> Arc<dyn ExecutableNode> + Send + Sync + 'static,
    {
        descriptor.validate()?;

        if let Some(existing) = self.entries.get(&descriptor.identifier) {
            if existing.descriptor.version != descriptor.version {
                return Err(RegistryError::DuplicateRegistration(descriptor.identifier));
            }
        }

        self.entries.insert(
            descriptor.identifier.clone(),
            Entry {
                descriptor,
                factory: Arc::new(factory),
            },
        );
        Ok(())
    }

    /// Look up a node type's descriptor.
    pub fn lookup(&self, identifier: &str) -> Option<NodeDescriptor> {
        self.entries.get(identifier).map(|e| e.descriptor.clone())
    }

    /// True if `identifier` is registered.
    pub fn contains(&self, identifier: &str) -> bool {
        self.entries.contains_key(identifier)
    }

    /// Create a fresh node instance for `identifier`.
    pub fn create(&self, identifier: &str) -> Result<Arc<dyn ExecutableNode>, RegistryError> {
        self.entries
            .get(identifier)
            .map(|e| (e.factory)())
            .ok_or_else(|| RegistryError::NotFound(identifier.to_owned()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::MockNode;
    use serde_json::json;

    fn descriptor(id: &str, edges: &[&str]) -> NodeDescriptor {
        NodeDescriptor::new(id, id, "1.0.0", edges.iter().map(|s| s.to_string()).collect())
    }

    #[test]
    fn register_then_lookup_and_create() {
        let registry = NodeRegistry::new();
        registry
            .register(descriptor("mock", &["success"]), || {
                Arc::new(MockNode::returning("mock", json!({})))
            })
            .unwrap();

        assert!(registry.contains("mock"));
        assert_eq!(registry.lookup("mock").unwrap().edges, vec!["success"]);
        assert!(registry.create("mock").is_ok());
        assert!(registry.create("missing").is_err());
    }

    #[test]
    fn rejects_descriptor_with_no_edges() {
        let registry = NodeRegistry::new();
        let err = registry
            .register(descriptor("broken", &[]), || {
                Arc::new(MockNode::returning("broken", json!({})))
            })
            .unwrap_err();
        assert!(matches!(err, RegistryError::NoDeclaredEdges(_)));
    }

    #[test]
    fn rejects_non_identifier_shaped_name() {
        let registry = NodeRegistry::new();
        let err = registry
            .register(descriptor("bad name!", &["success"]), || {
                Arc::new(MockNode::returning("bad", json!({})))
            })
            .unwrap_err();
        assert!(matches!(err, RegistryError::MalformedIdentifier(_)));
    }

    #[test]
    fn duplicate_registration_at_different_version_is_rejected() {
        let registry = NodeRegistry::new();
        registry
            .register(descriptor("mock", &["success"]), || {
                Arc::new(MockNode::returning("mock", json!({})))
            })
            .unwrap();

        let mut second = descriptor("mock", &["success"]);
        second.version = "2.0.0".into();
        let err = registry
            .register(second, || Arc::new(MockNode::returning("mock", json!({}))))
            .unwrap_err();
        assert!(matches!(err, RegistryError::DuplicateRegistration(_)));
    }

    #[test]
    fn same_version_reregistration_is_idempotent() {
        let registry = NodeRegistry::new();
        let d = descriptor("mock", &["success"]);
        registry
            .register(d.clone(), || Arc::new(MockNode::returning("mock", json!({}))))
            .unwrap();
        assert!(registry
            .register(d, || Arc::new(MockNode::returning("mock", json!({}))))
            .is_ok());
    }
}

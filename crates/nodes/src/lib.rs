//! `nodes` crate — the Node Contract (§4.6) and the Node Registry (§4.1).
//!
//! Every node — built-in and plugin alike — must implement
//! [`ExecutableNode`] and return an [`traits::EdgeMap`]. The `engine` crate
//! dispatches execution through this trait object and validates workflows
//! against a [`registry::NodeRegistry`].

pub mod builtin;
pub mod error;
pub mod mock;
pub mod registry;
pub mod traits;

pub use error::NodeError;
pub use registry::{NodeDescriptor, NodeRegistry, RegistryError};
pub use traits::{EdgeMap, ExecutableNode, ExecutionContext, StateMap};

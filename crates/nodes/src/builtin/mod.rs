//! Built-in node implementations used by the scenarios in the distilled
//! spec (S1–S5) and by the integration test suite. These are ordinary
//! `ExecutableNode` implementations — there is nothing privileged about
//! them; a workflow author could register an equivalent out-of-tree node
//! under a different identifier.

mod decision_node;
mod loop_node;
mod print_message;
mod print_random_number;
mod range_node;
mod request_node;

pub use decision_node::DecisionNode;
pub use loop_node::LoopNode;
pub use print_message::PrintMessage;
pub use print_random_number::PrintRandomNumber;
pub use range_node::RangeNode;
pub use request_node::RequestNode;

use std::sync::Arc;

use crate::registry::{NodeDescriptor, NodeRegistry, RegistryError};

/// Register every built-in node type into `registry`.
pub fn register_builtins(registry: &NodeRegistry) -> Result<(), RegistryError> {
    registry.register(
        NodeDescriptor::new(
            "print-random-number",
            "Print Random Number",
            "1.0.0",
            vec!["success".into()],
        ),
        || Arc::new(PrintRandomNumber),
    )?;

    registry.register(
        NodeDescriptor::new(
            "decision-node",
            "Decision",
            "1.0.0",
            vec!["big".into(), "small".into()],
        ),
        || Arc::new(DecisionNode),
    )?;

    registry.register(
        NodeDescriptor::new(
            "print-message",
            "Print Message",
            "1.0.0",
            vec!["success".into()],
        ),
        || Arc::new(PrintMessage),
    )?;

    registry.register(
        NodeDescriptor::new(
            "loop-node",
            "Bounded Counting Loop",
            "1.0.0",
            vec!["again".into(), "stop".into()],
        ),
        || Arc::new(LoopNode),
    )?;

    registry.register(
        NodeDescriptor::new(
            "range",
            "Range Iteration",
            "1.0.0",
            vec!["next".into(), "complete".into()],
        ),
        || Arc::new(RangeNode),
    )?;

    registry.register(
        NodeDescriptor::new(
            "fetch",
            "HTTP Fetch",
            "1.0.0",
            vec![
                "success".into(),
                "clientError".into(),
                "serverError".into(),
            ],
        ),
        || Arc::new(RequestNode),
    )?;

    Ok(())
}

//! Error types for the glass nodes

use liquid_gpu::BackendError;
use thiserror::Error;

use crate::node::NodeId;

/// Errors from driving glass nodes through a host
#[derive(Error, Debug)]
pub enum LiquidError {
    /// The node was removed or never existed
    #[error("Unknown node: {0:?}")]
    UnknownNode(NodeId),

    /// The node has fewer modifiers than requested
    #[error("Node {node:?} has no modifier at index {index}")]
    ModifierIndex { node: NodeId, index: usize },

    /// The modifier is not of the requested type
    #[error("Modifier {index} of node {node:?} is not a {expected}")]
    ModifierType {
        node: NodeId,
        index: usize,
        expected: &'static str,
    },

    /// Backend configuration failed
    #[error(transparent)]
    Backend(#[from] BackendError),
}

/// Result type for glass node operations
pub type Result<T> = std::result::Result<T, LiquidError>;

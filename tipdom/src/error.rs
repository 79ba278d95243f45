//! Errors for structural tree operations.

use thiserror::Error;

use crate::document::NodeId;

/// Structural mistakes rejected by [`Document`](crate::Document).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DomError {
    /// The node handle does not belong to this document.
    #[error("Unknown node {0}")]
    UnknownNode(NodeId),

    /// Only elements may contain children.
    #[error("Node {0} cannot contain children")]
    NotAContainer(NodeId),

    /// The insertion would make a node its own ancestor.
    #[error("Cannot insert {child} into its own subtree at {parent}")]
    HierarchyRequest { parent: NodeId, child: NodeId },

    /// The reference node is not a child of the given parent.
    #[error("Node {reference} is not a child of {parent}")]
    NotAChild { parent: NodeId, reference: NodeId },
}

//! Strand Page - Minimal element tree
//!
//! Just enough of a DOM for a playback layer: elements with attributes
//! and children, arena-allocated, with node replacement that keeps the
//! displaced node around for later restore. No layout, no styling.

mod node;
mod tree;

pub use node::{Attribute, ElementData, Node, NodeData};
pub use tree::Page;

/// Node identifier (index into arena)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId(pub(crate) u32);

impl NodeId {
    /// Sentinel for "no node"
    pub const NONE: NodeId = NodeId(u32::MAX);

    /// Root node ID
    pub const ROOT: NodeId = NodeId(0);

    #[inline]
    pub fn is_valid(self) -> bool {
        self != NodeId::NONE
    }
}

/// Page tree errors
#[derive(Debug, Clone, thiserror::Error)]
pub enum PageError {
    #[error("no such node: {0:?}")]
    NoSuchNode(NodeId),

    #[error("node is not an element: {0:?}")]
    NotAnElement(NodeId),

    #[error("node has no parent: {0:?}")]
    Detached(NodeId),
}

//! Node identifier type.

use std::fmt;

/// Identifies a node slot in the tree's node arena.
///
/// Using `usize` because:
/// 1. Nodes are stored in a `Vec` of slots
/// 2. Direct indexing without casting: `slots[node_id.0]`
///
/// A `NodeId` is a handle, not an owner. Parent back-references and leaf
/// chain links are stored as `NodeId`s, so they never keep a node alive.
/// Slots are recycled after a node is freed, so a stale handle may point at
/// an unrelated node; the tree rewrites every handle on re-parenting.
///
/// # Example
/// ```
/// use interchangedb_index::NodeId;
///
/// let node_id = NodeId::new(5);
/// assert_eq!(node_id.index(), 5);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub usize);

impl NodeId {
    /// Create a new NodeId.
    #[inline]
    pub fn new(id: usize) -> Self {
        NodeId(id)
    }

    /// Slot index in the arena.
    #[inline]
    pub fn index(self) -> usize {
        self.0
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Node({})", self.0)
    }
}

//! Leaf and internal node layouts.
//!
//! ```text
//!              InternalNode
//!   keys:      [   k0   |   k1   ]
//!   children:  [ c0 |  c1  |  c2 ]
//!
//!   entries under c0 <  k0 <= entries under c1 <  k1 <= entries under c2
//! ```
//!
//! `k[i]` is the smallest key stored under `c[i + 1]`. Leaves hold the
//! entries themselves; chain neighbours live in [`LeafChain`], not here.
//!
//! [`LeafChain`]: super::chain::LeafChain

use crate::common::NodeId;

/// A key/value pair stored in a leaf.
///
/// The key is fixed once the entry is in the tree; only the value can be
/// replaced, through `upsert` or `get_mut`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Entry<K, V> {
    pub(crate) key: K,
    pub(crate) value: V,
}

impl<K, V> Entry<K, V> {
    /// Create a new entry.
    #[inline]
    pub fn new(key: K, value: V) -> Self {
        Self { key, value }
    }

    /// The entry's key.
    #[inline]
    pub fn key(&self) -> &K {
        &self.key
    }

    /// The entry's value.
    #[inline]
    pub fn value(&self) -> &V {
        &self.value
    }

    /// Split the entry into its key and value.
    #[inline]
    pub fn into_parts(self) -> (K, V) {
        (self.key, self.value)
    }
}

pub(crate) struct LeafNode<K, V> {
    /// Sorted ascending by key, no duplicates.
    pub(crate) entries: Vec<Entry<K, V>>,
    /// None only for a root leaf.
    pub(crate) parent: Option<NodeId>,
}

impl<K: Ord, V> LeafNode<K, V> {
    pub(crate) fn new(entries: Vec<Entry<K, V>>, parent: Option<NodeId>) -> Self {
        Self { entries, parent }
    }

    /// Binary search for `key`: `Ok(pos)` on a hit, `Err(pos)` with the
    /// insertion point on a miss.
    #[inline]
    pub(crate) fn search(&self, key: &K) -> Result<usize, usize> {
        self.entries.binary_search_by(|entry| entry.key.cmp(key))
    }

    /// Position of the first entry with `entry.key >= key`.
    #[inline]
    pub(crate) fn lower_bound(&self, key: &K) -> usize {
        self.entries.partition_point(|entry| entry.key < *key)
    }

    /// Position just past the last entry with `entry.key <= key`.
    #[inline]
    pub(crate) fn upper_bound(&self, key: &K) -> usize {
        self.entries.partition_point(|entry| entry.key <= *key)
    }

    #[inline]
    pub(crate) fn len(&self) -> usize {
        self.entries.len()
    }

    /// Smallest key in the leaf.
    #[inline]
    pub(crate) fn first_key(&self) -> Option<&K> {
        self.entries.first().map(|entry| &entry.key)
    }
}

pub(crate) struct InternalNode<K> {
    /// Separator keys, sorted ascending.
    pub(crate) keys: Vec<K>,
    /// Always `keys.len() + 1` handles.
    pub(crate) children: Vec<NodeId>,
    /// None only for the root.
    pub(crate) parent: Option<NodeId>,
}

impl<K: Ord> InternalNode<K> {
    pub(crate) fn new(keys: Vec<K>, children: Vec<NodeId>, parent: Option<NodeId>) -> Self {
        debug_assert_eq!(children.len(), keys.len() + 1);
        Self {
            keys,
            children,
            parent,
        }
    }

    /// Index of the child whose subtree may contain `key`: the child left
    /// of the first separator strictly greater than `key`.
    #[inline]
    pub(crate) fn child_index(&self, key: &K) -> usize {
        self.keys.partition_point(|separator| separator <= key)
    }

    /// Slot of `child` in this node's child list.
    pub(crate) fn position_of(&self, child: NodeId) -> usize {
        match self.children.iter().position(|&id| id == child) {
            Some(index) => index,
            None => panic!("{} is not a child of this node", child),
        }
    }
}

pub(crate) enum Node<K, V> {
    Leaf(LeafNode<K, V>),
    Internal(InternalNode<K>),
}

impl<K, V> Node<K, V> {
    #[inline]
    pub(crate) fn parent(&self) -> Option<NodeId> {
        match self {
            Node::Leaf(leaf) => leaf.parent,
            Node::Internal(internal) => internal.parent,
        }
    }

    #[inline]
    pub(crate) fn set_parent(&mut self, parent: Option<NodeId>) {
        match self {
            Node::Leaf(leaf) => leaf.parent = parent,
            Node::Internal(internal) => internal.parent = parent,
        }
    }

    #[inline]
    pub(crate) fn is_leaf(&self) -> bool {
        matches!(self, Node::Leaf(_))
    }
}

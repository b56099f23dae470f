//! The tree itself: node store, root, leaf chain, and point lookups.

use std::fmt;

use tracing::trace;

use crate::common::{Error, NodeId, Result, TreeConfig};
use crate::index::btree::arena::NodeArena;
use crate::index::btree::chain::LeafChain;
use crate::index::btree::node::{Entry, InternalNode, LeafNode, Node};
use crate::index::btree::stats::{StatsSnapshot, TreeStats};

/// An ordered index over unique keys.
///
/// # Architecture
/// ```text
/// ┌───────────────────────────────────────────────────────────────┐
/// │                          BPlusTree                            │
/// │  ┌──────────────────────────┐   ┌──────────────────────────┐  │
/// │  │ nodes: NodeArena         │   │ chain: LeafChain         │  │
/// │  │ owns every node,         │   │ head ⇄ leaf ⇄ ... ⇄ tail │  │
/// │  │ children/parent by NodeId│   │ (sibling relation only)  │  │
/// │  └──────────────────────────┘   └──────────────────────────┘  │
/// │  root: NodeId   config: TreeConfig   len   height   stats     │
/// └───────────────────────────────────────────────────────────────┘
/// ```
///
/// All mutation goes through `&mut self` and runs to completion before
/// returning, so a half-finished split or merge is never observable. For
/// shared use across threads wrap the tree in
/// [`SharedBPlusTree`](super::SharedBPlusTree).
///
/// # Usage
/// ```
/// use interchangedb_index::{BPlusTree, Error};
///
/// let mut tree = BPlusTree::new(4).unwrap();
/// tree.insert(10, "ten").unwrap();
/// tree.insert(20, "twenty").unwrap();
///
/// assert_eq!(tree.get(&10), Some(&"ten"));
/// assert_eq!(tree.insert(10, "again"), Err(Error::DuplicateKey));
/// assert_eq!(tree.remove(&20), Ok("twenty"));
/// ```
pub struct BPlusTree<K, V> {
    /// Owns every node reachable from `root`.
    pub(crate) nodes: NodeArena<Node<K, V>>,

    /// Left-to-right order of the leaves.
    pub(crate) chain: LeafChain,

    pub(crate) root: NodeId,

    pub(crate) config: TreeConfig,

    /// Number of entries.
    pub(crate) len: usize,

    /// Levels from root to leaves; 1 when the root is a leaf.
    pub(crate) height: usize,

    pub(crate) stats: TreeStats,
}

impl<K: Ord, V> BPlusTree<K, V> {
    /// Create an empty tree of the given order.
    ///
    /// # Errors
    /// - `Error::InvalidConfiguration` if `order < 3`
    pub fn new(order: usize) -> Result<Self> {
        Ok(Self::with_config(TreeConfig::new(order)?))
    }

    /// Create an empty tree from a validated configuration.
    pub fn with_config(config: TreeConfig) -> Self {
        let mut nodes = NodeArena::new();
        let root = nodes.alloc(Node::Leaf(LeafNode::new(Vec::new(), None)));

        Self {
            nodes,
            chain: LeafChain::new(root),
            root,
            config,
            len: 0,
            height: 1,
            stats: TreeStats::new(),
        }
    }

    /// Create an empty tree whose nodes are sized to one page.
    pub fn for_page() -> Self {
        Self::with_config(TreeConfig::for_page::<K, V>())
    }

    // ========================================================================
    // Introspection
    // ========================================================================

    /// Number of entries.
    #[inline]
    pub fn len(&self) -> usize {
        self.len
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Number of levels; 1 while the root is a leaf.
    #[inline]
    pub fn height(&self) -> usize {
        self.height
    }

    #[inline]
    pub fn order(&self) -> usize {
        self.config.order()
    }

    #[inline]
    pub fn config(&self) -> TreeConfig {
        self.config
    }

    /// Number of live nodes, leaves and internal.
    #[inline]
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Number of leaves in the leaf chain.
    #[inline]
    pub fn leaf_count(&self) -> usize {
        self.chain.len()
    }

    /// Rebalancing counters.
    pub fn stats(&self) -> StatsSnapshot {
        self.stats.snapshot()
    }

    /// Zero the rebalancing counters. The tree itself is untouched.
    pub fn reset_stats(&self) {
        self.stats.reset();
    }

    // ========================================================================
    // Point lookups
    // ========================================================================

    /// Find the entry stored under `key`.
    ///
    /// # Errors
    /// - `Error::NotFound` if no entry has that key
    pub fn search(&self, key: &K) -> Result<&Entry<K, V>> {
        let leaf = self.leaf(self.find_leaf(key));
        match leaf.search(key) {
            Ok(pos) => Ok(&leaf.entries[pos]),
            Err(_) => Err(Error::NotFound),
        }
    }

    /// The value stored under `key`, if any.
    pub fn get(&self, key: &K) -> Option<&V> {
        self.search(key).ok().map(Entry::value)
    }

    /// Mutable access to the value stored under `key`.
    ///
    /// The key itself cannot change, so no rebalancing is needed.
    pub fn get_mut(&mut self, key: &K) -> Option<&mut V> {
        let leaf_id = self.find_leaf(key);
        let leaf = self.leaf_mut(leaf_id);
        match leaf.search(key) {
            Ok(pos) => Some(&mut leaf.entries[pos].value),
            Err(_) => None,
        }
    }

    pub fn contains_key(&self, key: &K) -> bool {
        self.search(key).is_ok()
    }

    /// Smallest entry, read from the head of the leaf chain.
    pub fn first(&self) -> Option<&Entry<K, V>> {
        self.chain
            .head()
            .and_then(|leaf| self.leaf(leaf).entries.first())
    }

    /// Largest entry, read from the tail of the leaf chain.
    pub fn last(&self) -> Option<&Entry<K, V>> {
        self.chain
            .tail()
            .and_then(|leaf| self.leaf(leaf).entries.last())
    }

    /// Remove every entry, leaving an empty root leaf.
    pub fn clear(&mut self) {
        self.nodes.clear();
        self.root = self
            .nodes
            .alloc(Node::Leaf(LeafNode::new(Vec::new(), None)));
        self.chain.reset(self.root);
        self.len = 0;
        self.height = 1;
    }

    // ========================================================================
    // Internal: navigation
    // ========================================================================

    /// Descend from the root to the leaf whose key range covers `key`.
    pub(crate) fn find_leaf(&self, key: &K) -> NodeId {
        let mut current = self.root;
        loop {
            match self.nodes.get(current) {
                Node::Leaf(_) => {
                    trace!(leaf = %current, "descended to leaf");
                    return current;
                }
                Node::Internal(internal) => {
                    current = internal.children[internal.child_index(key)];
                }
            }
        }
    }

    /// Leftmost leaf of the subtree rooted at `node`.
    pub(crate) fn leftmost_leaf(&self, mut node: NodeId) -> NodeId {
        while let Node::Internal(internal) = self.nodes.get(node) {
            node = internal.children[0];
        }
        node
    }

    pub(crate) fn leaf(&self, id: NodeId) -> &LeafNode<K, V> {
        match self.nodes.get(id) {
            Node::Leaf(leaf) => leaf,
            Node::Internal(_) => panic!("{} is an internal node, expected a leaf", id),
        }
    }

    pub(crate) fn leaf_mut(&mut self, id: NodeId) -> &mut LeafNode<K, V> {
        match self.nodes.get_mut(id) {
            Node::Leaf(leaf) => leaf,
            Node::Internal(_) => panic!("{} is an internal node, expected a leaf", id),
        }
    }

    pub(crate) fn internal(&self, id: NodeId) -> &InternalNode<K> {
        match self.nodes.get(id) {
            Node::Internal(internal) => internal,
            Node::Leaf(_) => panic!("{} is a leaf, expected an internal node", id),
        }
    }

    pub(crate) fn internal_mut(&mut self, id: NodeId) -> &mut InternalNode<K> {
        match self.nodes.get_mut(id) {
            Node::Internal(internal) => internal,
            Node::Leaf(_) => panic!("{} is a leaf, expected an internal node", id),
        }
    }

    #[inline]
    pub(crate) fn set_parent(&mut self, child: NodeId, parent: Option<NodeId>) {
        self.nodes.get_mut(child).set_parent(parent);
    }
}

impl<K: Ord, V> Default for BPlusTree<K, V> {
    fn default() -> Self {
        Self::with_config(TreeConfig::default())
    }
}

impl<K: Ord + Clone, V> Extend<(K, V)> for BPlusTree<K, V> {
    /// Upserts every pair; later pairs overwrite earlier ones.
    fn extend<I: IntoIterator<Item = (K, V)>>(&mut self, iter: I) {
        for (key, value) in iter {
            self.upsert(key, value);
        }
    }
}

impl<K: Ord + Clone, V> FromIterator<(K, V)> for BPlusTree<K, V> {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut tree = Self::default();
        tree.extend(iter);
        tree
    }
}

impl<K: Ord + fmt::Debug, V: fmt::Debug> fmt::Debug for BPlusTree<K, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map()
            .entries(self.iter().map(|entry| (entry.key(), entry.value())))
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_tree_is_empty_leaf_root() {
        let tree: BPlusTree<i32, i32> = BPlusTree::new(4).unwrap();
        assert!(tree.is_empty());
        assert_eq!(tree.height(), 1);
        assert_eq!(tree.node_count(), 1);
        assert_eq!(tree.leaf_count(), 1);
        assert!(tree.nodes.get(tree.root).is_leaf());
        assert_eq!(tree.first(), None);
        assert_eq!(tree.last(), None);
    }

    #[test]
    fn test_order_below_minimum_rejected() {
        let result: Result<BPlusTree<i32, i32>> = BPlusTree::new(2);
        assert_eq!(
            result.err(),
            Some(Error::InvalidConfiguration { order: 2, min: 3 })
        );
    }

    #[test]
    fn test_search_miss_on_empty_tree() {
        let tree: BPlusTree<i32, i32> = BPlusTree::new(3).unwrap();
        assert_eq!(tree.search(&1), Err(Error::NotFound));
        assert!(!tree.contains_key(&1));
    }

    #[test]
    fn test_get_mut_updates_value() {
        let mut tree = BPlusTree::new(4).unwrap();
        for k in 0..20 {
            tree.insert(k, k * 10).unwrap();
        }

        *tree.get_mut(&7).unwrap() += 1;
        assert_eq!(tree.get(&7), Some(&71));
        assert_eq!(tree.get_mut(&99), None);
    }

    #[test]
    fn test_find_leaf_descends_through_internal_nodes() {
        let mut tree = BPlusTree::new(3).unwrap();
        for k in 0..30 {
            tree.insert(k, ()).unwrap();
        }
        assert!(tree.height() > 2);

        for k in 0..30 {
            let leaf = tree.leaf(tree.find_leaf(&k));
            assert!(leaf.search(&k).is_ok());
        }
    }

    #[test]
    fn test_first_and_last() {
        let mut tree = BPlusTree::new(4).unwrap();
        for k in [50, 10, 40, 20, 30] {
            tree.insert(k, k).unwrap();
        }
        assert_eq!(tree.first().map(Entry::key), Some(&10));
        assert_eq!(tree.last().map(Entry::key), Some(&50));
    }

    #[test]
    fn test_clear() {
        let mut tree = BPlusTree::new(4).unwrap();
        for k in 0..100 {
            tree.insert(k, k).unwrap();
        }
        tree.clear();

        assert!(tree.is_empty());
        assert_eq!(tree.height(), 1);
        assert_eq!(tree.node_count(), 1);
        assert_eq!(tree.iter().count(), 0);

        tree.insert(1, 1).unwrap();
        assert_eq!(tree.get(&1), Some(&1));
        tree.check_invariants();
    }

    #[test]
    fn test_reset_stats_keeps_entries() {
        let mut tree = BPlusTree::new(3).unwrap();
        for k in 0..20 {
            tree.insert(k, k).unwrap();
        }
        assert!(tree.stats().leaf_splits > 0);

        tree.reset_stats();
        assert_eq!(tree.stats(), StatsSnapshot::default());
        assert_eq!(tree.len(), 20);

        tree.remove(&0).unwrap();
        tree.remove(&1).unwrap();
        assert!(tree.stats().borrows + tree.stats().merges > 0);
    }

    #[test]
    fn test_for_page_order() {
        let tree: BPlusTree<u64, u64> = BPlusTree::for_page();
        assert_eq!(tree.config(), TreeConfig::for_page::<u64, u64>());
    }

    #[test]
    fn test_from_iterator_keeps_last_value() {
        let tree: BPlusTree<i32, &str> = vec![(2, "b"), (1, "a"), (2, "c")].into_iter().collect();
        assert_eq!(tree.len(), 2);
        assert_eq!(tree.get(&2), Some(&"c"));
    }

    #[test]
    fn test_debug_renders_as_map() {
        let mut tree = BPlusTree::new(3).unwrap();
        tree.insert(2, "b").unwrap();
        tree.insert(1, "a").unwrap();
        assert_eq!(format!("{:?}", tree), r#"{1: "a", 2: "b"}"#);
    }
}

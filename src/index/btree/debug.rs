//! Diagnostics: structural validation and human-readable dumps.
//!
//! None of the output here is a stable format; it exists for tests and
//! debugging sessions.

use std::fmt::{Debug, Write};

use crate::common::NodeId;
use crate::index::btree::node::Node;
use crate::index::btree::tree::BPlusTree;

impl<K: Ord + Debug, V> BPlusTree<K, V> {
    /// Walk the whole tree and panic on the first broken invariant.
    ///
    /// Checked:
    /// - every leaf sits at depth `height`
    /// - node occupancy is within the bounds of the configured order
    /// - keys are strictly ascending within nodes and across the tree
    /// - each separator equals the smallest key of its right subtree
    /// - every child's parent handle names its actual parent
    /// - the leaf chain visits exactly the leaves of an in-order descent, in
    ///   the same order, and its back links mirror its forward links
    /// - `len()` and `node_count()` match what is reachable from the root
    ///
    /// Costs O(n); meant for tests.
    pub fn check_invariants(&self) {
        let mut walk = Walk {
            leaves: Vec::new(),
            entries: 0,
            nodes: 0,
        };
        self.check_node(self.root, None, 1, None, None, &mut walk);

        assert_eq!(walk.entries, self.len, "len() disagrees with stored entries");
        assert_eq!(walk.nodes, self.nodes.len(), "arena holds unreachable nodes");

        let chained: Vec<NodeId> = self.chain.iter().collect();
        assert_eq!(chained, walk.leaves, "leaf chain diverges from tree order");
        assert_eq!(self.chain.len(), walk.leaves.len());
        assert_eq!(self.chain.head(), walk.leaves.first().copied());
        assert_eq!(self.chain.tail(), walk.leaves.last().copied());
        for &leaf in &chained {
            assert!(self.nodes.contains(leaf), "chain links freed {}", leaf);
        }
        for pair in chained.windows(2) {
            assert_eq!(self.chain.prev(pair[1]), Some(pair[0]), "broken back link");
        }
        if let Some(&head) = chained.first() {
            assert_eq!(self.chain.prev(head), None);
        }

        let mut previous: Option<&K> = None;
        for entry in self.iter() {
            if let Some(prev) = previous {
                assert!(prev < &entry.key, "chain order {:?} !< {:?}", prev, entry.key);
            }
            previous = Some(&entry.key);
        }
    }

    /// Validate the subtree at `id` whose keys must lie in `[lower, upper)`.
    fn check_node<'a>(
        &'a self,
        id: NodeId,
        parent: Option<NodeId>,
        depth: usize,
        lower: Option<&'a K>,
        upper: Option<&'a K>,
        walk: &mut Walk,
    ) {
        let node = self.nodes.get(id);
        assert_eq!(node.parent(), parent, "{} has a stale parent handle", id);
        walk.nodes += 1;

        let in_bounds =
            |key: &K| lower.map_or(true, |l| l <= key) && upper.map_or(true, |u| key < u);
        let is_root = id == self.root;

        match node {
            Node::Leaf(leaf) => {
                assert_eq!(depth, self.height, "{} is at depth {} of {}", id, depth, self.height);
                assert!(leaf.len() <= self.config.max_leaf_entries(), "{} overflows", id);
                if !is_root {
                    assert!(leaf.len() >= self.config.min_leaf_entries(), "{} underflows", id);
                }
                for pair in leaf.entries.windows(2) {
                    assert!(pair[0].key < pair[1].key, "{} is not sorted", id);
                }
                for entry in &leaf.entries {
                    assert!(in_bounds(&entry.key), "{:?} out of range in {}", entry.key, id);
                }
                walk.entries += leaf.len();
                walk.leaves.push(id);
            }
            Node::Internal(internal) => {
                assert!(depth < self.height, "{} is internal at leaf depth", id);
                assert_eq!(internal.children.len(), internal.keys.len() + 1, "{} fanout", id);
                assert!(internal.children.len() <= self.config.max_children(), "{} overflows", id);
                let min_children = if is_root { 2 } else { self.config.min_children() };
                assert!(internal.children.len() >= min_children, "{} underflows", id);

                for pair in internal.keys.windows(2) {
                    assert!(pair[0] < pair[1], "{} separators not sorted", id);
                }
                for (i, separator) in internal.keys.iter().enumerate() {
                    assert!(in_bounds(separator), "separator {:?} out of range", separator);
                    let leaf = self.leftmost_leaf(internal.children[i + 1]);
                    assert_eq!(
                        self.leaf(leaf).first_key(),
                        Some(separator),
                        "separator {:?} in {} is not its subtree minimum",
                        separator,
                        id
                    );
                }

                for (i, &child) in internal.children.iter().enumerate() {
                    let child_lower = if i == 0 { lower } else { Some(&internal.keys[i - 1]) };
                    let child_upper = internal.keys.get(i).or(upper);
                    self.check_node(child, Some(id), depth + 1, child_lower, child_upper, walk);
                }
            }
        }
    }

    /// Indented rendering of the node hierarchy.
    ///
    /// ```text
    /// Node 4 (INTERNAL): 15
    ///   Node 0 (LEAF): 5 7 10 12
    ///   Node 1 (LEAF): 15 18 20
    /// ```
    pub fn dump_tree(&self) -> String {
        let mut out = String::new();
        self.dump_node(self.root, 0, &mut out);
        out
    }

    fn dump_node(&self, id: NodeId, depth: usize, out: &mut String) {
        let indent = "  ".repeat(depth);
        match self.nodes.get(id) {
            Node::Leaf(leaf) => {
                let _ = write!(out, "{}Node {} (LEAF):", indent, id.index());
                for entry in &leaf.entries {
                    let _ = write!(out, " {:?}", entry.key);
                }
                out.push('\n');
            }
            Node::Internal(internal) => {
                let _ = write!(out, "{}Node {} (INTERNAL):", indent, id.index());
                for key in &internal.keys {
                    let _ = write!(out, " {:?}", key);
                }
                out.push('\n');
                for &child in &internal.children {
                    self.dump_node(child, depth + 1, out);
                }
            }
        }
    }

    /// The leaves in chain order.
    ///
    /// ```text
    /// Leaf 0: 5 7 -> Leaf 2: 10 12 -> NULL
    /// ```
    pub fn dump_leaf_chain(&self) -> String {
        let mut out = String::new();
        for leaf_id in self.chain.iter() {
            let _ = write!(out, "Leaf {}:", leaf_id.index());
            for entry in &self.leaf(leaf_id).entries {
                let _ = write!(out, " {:?}", entry.key);
            }
            out.push_str(" -> ");
        }
        out.push_str("NULL");
        out
    }
}

struct Walk {
    /// Leaves in left-to-right descent order.
    leaves: Vec<NodeId>,
    entries: usize,
    nodes: usize,
}

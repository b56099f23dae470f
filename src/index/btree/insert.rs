//! Insertion: sorted placement, leaf split (copy-up), internal split
//! (move-up), and root growth.

use tracing::debug;

use crate::common::{Error, NodeId, Result};
use crate::index::btree::node::{Entry, InternalNode, LeafNode, Node};
use crate::index::btree::stats::TreeStats;
use crate::index::btree::tree::BPlusTree;

impl<K: Ord + Clone, V> BPlusTree<K, V> {
    /// Insert a new entry.
    ///
    /// # Errors
    /// - `Error::DuplicateKey` if `key` is already present; the tree is left
    ///   unchanged and the stored value is not touched
    pub fn insert(&mut self, key: K, value: V) -> Result<()> {
        let leaf_id = self.find_leaf(&key);
        match self.leaf(leaf_id).search(&key) {
            Ok(_) => Err(Error::DuplicateKey),
            Err(pos) => {
                self.insert_into_leaf(leaf_id, pos, Entry::new(key, value));
                Ok(())
            }
        }
    }

    /// Insert or overwrite.
    ///
    /// Returns the previous value when `key` was present. Overwriting never
    /// changes the shape of the tree.
    pub fn upsert(&mut self, key: K, value: V) -> Option<V> {
        let leaf_id = self.find_leaf(&key);
        match self.leaf(leaf_id).search(&key) {
            Ok(pos) => {
                let slot = &mut self.leaf_mut(leaf_id).entries[pos].value;
                Some(std::mem::replace(slot, value))
            }
            Err(pos) => {
                self.insert_into_leaf(leaf_id, pos, Entry::new(key, value));
                None
            }
        }
    }

    fn insert_into_leaf(&mut self, leaf_id: NodeId, pos: usize, entry: Entry<K, V>) {
        let leaf = self.leaf_mut(leaf_id);
        leaf.entries.insert(pos, entry);
        let count = leaf.len();
        self.len += 1;

        if count >= self.config.order() {
            self.split_leaf(leaf_id);
        }
    }

    /// Split a leaf holding `order` entries.
    ///
    /// The first `order / 2` entries stay, the rest move to a new right
    /// sibling. The right sibling's smallest key is copied into the parent;
    /// it stays in the leaf as data.
    fn split_leaf(&mut self, leaf_id: NodeId) {
        let mid = self.config.order() / 2;

        let leaf = self.leaf_mut(leaf_id);
        let right_entries = leaf.entries.split_off(mid);
        let parent = leaf.parent;
        let separator = right_entries[0].key.clone();

        let right_id = self
            .nodes
            .alloc(Node::Leaf(LeafNode::new(right_entries, parent)));
        self.chain.splice_after(leaf_id, right_id);

        TreeStats::bump(&self.stats.leaf_splits);
        debug!(left = %leaf_id, right = %right_id, "split leaf");

        self.promote(leaf_id, separator, right_id);
    }

    /// Hang `right` next to `left` under `left`'s parent with `separator`
    /// between them, splitting parents upward while they overflow.
    fn promote(&mut self, mut left: NodeId, mut separator: K, mut right: NodeId) {
        loop {
            let Some(parent_id) = self.nodes.get(left).parent() else {
                self.grow_root(left, separator, right);
                return;
            };

            let parent = self.internal_mut(parent_id);
            let slot = parent.position_of(left);
            parent.keys.insert(slot, separator);
            parent.children.insert(slot + 1, right);
            let key_count = parent.keys.len();
            self.set_parent(right, Some(parent_id));

            if key_count < self.config.order() {
                return;
            }

            let (promoted, new_right) = self.split_internal(parent_id);
            left = parent_id;
            separator = promoted;
            right = new_right;
        }
    }

    /// Split an internal node holding `order` keys.
    ///
    /// The middle key leaves both halves and is returned for the parent:
    /// separators carry no data, so nothing keeps a copy below.
    fn split_internal(&mut self, node_id: NodeId) -> (K, NodeId) {
        let mid = self.config.order() / 2;

        let node = self.internal_mut(node_id);
        let mut right_keys = node.keys.split_off(mid);
        let promoted = right_keys.remove(0);
        let right_children = node.children.split_off(mid + 1);
        let parent = node.parent;

        let moved = right_children.clone();
        let right_id = self.nodes.alloc(Node::Internal(InternalNode::new(
            right_keys,
            right_children,
            parent,
        )));
        for child in moved {
            self.set_parent(child, Some(right_id));
        }

        TreeStats::bump(&self.stats.internal_splits);
        debug!(left = %node_id, right = %right_id, "split internal node");

        (promoted, right_id)
    }

    /// The old root split into `left` and `right`: put a new root above.
    fn grow_root(&mut self, left: NodeId, separator: K, right: NodeId) {
        let root = self.nodes.alloc(Node::Internal(InternalNode::new(
            vec![separator],
            vec![left, right],
            None,
        )));
        self.set_parent(left, Some(root));
        self.set_parent(right, Some(root));
        self.root = root;
        self.height += 1;

        TreeStats::bump(&self.stats.root_grows);
        debug!(root = %root, height = self.height, "grew new root");
    }
}

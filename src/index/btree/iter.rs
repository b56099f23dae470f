//! Ordered scans over the leaf chain.

use std::iter::FusedIterator;

use crate::common::NodeId;
use crate::index::btree::node::Entry;
use crate::index::btree::tree::BPlusTree;

/// Position of one entry: leaf handle plus slot within the leaf.
type Cursor = (NodeId, usize);

/// A lazy, double-ended scan over a run of entries in key order.
///
/// Both ends are resolved up front with one root-to-leaf descent each;
/// the entries in between are produced by following the leaf chain, so no
/// further descents happen while iterating. The scan borrows the tree, so
/// the tree cannot change underneath it. Calling [`BPlusTree::range`]
/// again starts a fresh scan.
///
/// # Example
/// ```
/// use interchangedb_index::BPlusTree;
///
/// let mut tree = BPlusTree::new(4).unwrap();
/// for k in [10, 20, 5, 15, 25] {
///     tree.insert(k, k * 2).unwrap();
/// }
///
/// let keys: Vec<i32> = tree.range(&10, &20).map(|e| *e.key()).collect();
/// assert_eq!(keys, vec![10, 15, 20]);
///
/// let rev: Vec<i32> = tree.range(&10, &20).rev().map(|e| *e.key()).collect();
/// assert_eq!(rev, vec![20, 15, 10]);
/// ```
pub struct Range<'a, K, V> {
    tree: &'a BPlusTree<K, V>,
    /// Next entry to yield from the front, inclusive.
    front: Option<Cursor>,
    /// Next entry to yield from the back, inclusive.
    back: Option<Cursor>,
}

impl<'a, K: Ord, V> Range<'a, K, V> {
    fn new(tree: &'a BPlusTree<K, V>, front: Option<Cursor>, back: Option<Cursor>) -> Self {
        let (front, back) = match (front, back) {
            (Some(f), Some(b)) if tree.entry_at(f).key <= tree.entry_at(b).key => {
                (Some(f), Some(b))
            }
            _ => (None, None),
        };
        Self { tree, front, back }
    }

    fn finish(&mut self) {
        self.front = None;
        self.back = None;
    }
}

impl<'a, K: Ord, V> Iterator for Range<'a, K, V> {
    type Item = &'a Entry<K, V>;

    fn next(&mut self) -> Option<Self::Item> {
        let current = self.front?;
        let entry = self.tree.entry_at(current);
        if Some(current) == self.back {
            self.finish();
        } else {
            self.front = self.tree.step_forward(current);
        }
        Some(entry)
    }
}

impl<K: Ord, V> DoubleEndedIterator for Range<'_, K, V> {
    fn next_back(&mut self) -> Option<Self::Item> {
        let current = self.back?;
        let entry = self.tree.entry_at(current);
        if Some(current) == self.front {
            self.finish();
        } else {
            self.back = self.tree.step_backward(current);
        }
        Some(entry)
    }
}

impl<K: Ord, V> FusedIterator for Range<'_, K, V> {}

impl<K: Ord, V> BPlusTree<K, V> {
    /// Entries with `start <= key <= end`, ascending.
    ///
    /// Yields nothing when `start > end`.
    pub fn range(&self, start: &K, end: &K) -> Range<'_, K, V> {
        if start > end {
            return Range::new(self, None, None);
        }

        let first_leaf = self.find_leaf(start);
        let front = self.normalize_forward((first_leaf, self.leaf(first_leaf).lower_bound(start)));

        let last_leaf = self.find_leaf(end);
        let back = self.normalize_backward(last_leaf, self.leaf(last_leaf).upper_bound(end));

        Range::new(self, front, back)
    }

    /// Every entry, ascending, starting from the head of the leaf chain.
    pub fn iter(&self) -> Range<'_, K, V> {
        let front = self
            .chain
            .head()
            .and_then(|head| self.normalize_forward((head, 0)));
        let back = self
            .chain
            .tail()
            .and_then(|tail| self.normalize_backward(tail, self.leaf(tail).len()));
        Range::new(self, front, back)
    }

    /// Every entry, descending, starting from the tail of the leaf chain.
    pub fn iter_rev(&self) -> std::iter::Rev<Range<'_, K, V>> {
        self.iter().rev()
    }

    /// Every key, ascending.
    pub fn keys(&self) -> impl DoubleEndedIterator<Item = &K> + '_ {
        self.iter().map(Entry::key)
    }

    /// Every value, in key order.
    pub fn values(&self) -> impl DoubleEndedIterator<Item = &V> + '_ {
        self.iter().map(Entry::value)
    }

    #[inline]
    fn entry_at(&self, (leaf, pos): Cursor) -> &Entry<K, V> {
        &self.leaf(leaf).entries[pos]
    }

    /// Cursor one entry past `cursor`, following `next` links.
    fn step_forward(&self, (leaf, pos): Cursor) -> Option<Cursor> {
        self.normalize_forward((leaf, pos + 1))
    }

    /// Cursor one entry before `cursor`, following `prev` links.
    fn step_backward(&self, (leaf, pos): Cursor) -> Option<Cursor> {
        self.normalize_backward(leaf, pos)
    }

    /// Move a cursor that may sit past the end of its leaf onto the next
    /// real entry in the chain.
    fn normalize_forward(&self, (mut leaf, mut pos): Cursor) -> Option<Cursor> {
        while pos >= self.leaf(leaf).len() {
            leaf = self.chain.next(leaf)?;
            pos = 0;
        }
        Some((leaf, pos))
    }

    /// Cursor of the last real entry strictly before slot `end` of `leaf`.
    fn normalize_backward(&self, mut leaf: NodeId, mut end: usize) -> Option<Cursor> {
        while end == 0 {
            leaf = self.chain.prev(leaf)?;
            end = self.leaf(leaf).len();
        }
        Some((leaf, end - 1))
    }
}

impl<'a, K: Ord, V> IntoIterator for &'a BPlusTree<K, V> {
    type Item = &'a Entry<K, V>;
    type IntoIter = Range<'a, K, V>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

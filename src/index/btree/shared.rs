//! A thread-safe handle around one tree.
//!
//! The tree's rebalancing touches parents and siblings of the leaf being
//! modified, so the whole tree is treated as one shared resource: a single
//! `RwLock` guards it. Writers hold the write lock for a complete insert,
//! upsert or remove; lookups and scans share the read lock.

use std::sync::Arc;

use parking_lot::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use crate::common::{Result, TreeConfig};
use crate::index::btree::node::Entry;
use crate::index::btree::stats::StatsSnapshot;
use crate::index::btree::tree::BPlusTree;

/// Cloneable, `Send + Sync` handle to a [`BPlusTree`].
///
/// Results are returned by value because a reference into the tree cannot
/// outlive the lock guard. For multi-step reads without cloning, hold
/// [`read`](Self::read) directly.
///
/// # Thread Safety
/// - `tree`: `RwLock`, many readers or one writer
/// - no operation holds the lock across calls
///
/// # Example
/// ```
/// use interchangedb_index::SharedBPlusTree;
/// use std::thread;
///
/// let tree = SharedBPlusTree::new(8).unwrap();
/// let handles: Vec<_> = (0..4)
///     .map(|t| {
///         let tree = tree.clone();
///         thread::spawn(move || {
///             for i in 0..100 {
///                 tree.insert(t * 100 + i, i).unwrap();
///             }
///         })
///     })
///     .collect();
/// for h in handles {
///     h.join().unwrap();
/// }
/// assert_eq!(tree.len(), 400);
/// ```
pub struct SharedBPlusTree<K, V> {
    tree: Arc<RwLock<BPlusTree<K, V>>>,
}

impl<K, V> Clone for SharedBPlusTree<K, V> {
    fn clone(&self) -> Self {
        Self {
            tree: Arc::clone(&self.tree),
        }
    }
}

impl<K: Ord + Clone, V> SharedBPlusTree<K, V> {
    /// Create an empty shared tree of the given order.
    ///
    /// # Errors
    /// - `Error::InvalidConfiguration` if `order < 3`
    pub fn new(order: usize) -> Result<Self> {
        Ok(Self::from_tree(BPlusTree::new(order)?))
    }

    pub fn with_config(config: TreeConfig) -> Self {
        Self::from_tree(BPlusTree::with_config(config))
    }

    /// Take ownership of an existing tree.
    pub fn from_tree(tree: BPlusTree<K, V>) -> Self {
        Self {
            tree: Arc::new(RwLock::new(tree)),
        }
    }

    // ========================================================================
    // Writers (exclusive lock)
    // ========================================================================

    /// See [`BPlusTree::insert`].
    pub fn insert(&self, key: K, value: V) -> Result<()> {
        self.tree.write().insert(key, value)
    }

    /// See [`BPlusTree::upsert`].
    pub fn upsert(&self, key: K, value: V) -> Option<V> {
        self.tree.write().upsert(key, value)
    }

    /// See [`BPlusTree::remove`].
    pub fn remove(&self, key: &K) -> Result<V> {
        self.tree.write().remove(key)
    }

    // ========================================================================
    // Readers (shared lock)
    // ========================================================================

    /// See [`BPlusTree::search`].
    pub fn search(&self, key: &K) -> Result<Entry<K, V>>
    where
        V: Clone,
    {
        self.tree.read().search(key).cloned()
    }

    pub fn get(&self, key: &K) -> Option<V>
    where
        V: Clone,
    {
        self.tree.read().get(key).cloned()
    }

    pub fn contains_key(&self, key: &K) -> bool {
        self.tree.read().contains_key(key)
    }

    /// Collect the entries with `start <= key <= end` under one read lock.
    pub fn range(&self, start: &K, end: &K) -> Vec<Entry<K, V>>
    where
        V: Clone,
    {
        self.tree.read().range(start, end).cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.tree.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.tree.read().is_empty()
    }

    pub fn stats(&self) -> StatsSnapshot {
        self.tree.read().stats()
    }

    /// Counters are atomic, so the shared lock is enough.
    pub fn reset_stats(&self) {
        self.tree.read().reset_stats();
    }

    // ========================================================================
    // Guards
    // ========================================================================

    /// Hold the read lock for several reads against one consistent state.
    pub fn read(&self) -> RwLockReadGuard<'_, BPlusTree<K, V>> {
        self.tree.read()
    }

    /// Hold the write lock for several mutations applied atomically.
    pub fn write(&self) -> RwLockWriteGuard<'_, BPlusTree<K, V>> {
        self.tree.write()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Error;
    use std::thread;

    #[test]
    fn test_shared_basic_ops() {
        let tree = SharedBPlusTree::new(4).unwrap();
        tree.insert(1, "a").unwrap();
        tree.insert(2, "b").unwrap();

        assert_eq!(tree.get(&1), Some("a"));
        assert_eq!(tree.insert(1, "z"), Err(Error::DuplicateKey));
        assert_eq!(tree.upsert(1, "z"), Some("a"));
        assert_eq!(tree.remove(&2), Ok("b"));
        assert_eq!(tree.search(&2), Err(Error::NotFound));
        assert_eq!(tree.len(), 1);
    }

    #[test]
    fn test_shared_reset_stats() {
        let tree = SharedBPlusTree::new(3).unwrap();
        for k in 0..10 {
            tree.insert(k, k).unwrap();
        }
        assert!(tree.stats().splits() > 0);

        tree.reset_stats();
        assert_eq!(tree.stats(), StatsSnapshot::default());
        assert_eq!(tree.len(), 10);
    }

    #[test]
    fn test_shared_invalid_order() {
        assert!(SharedBPlusTree::<i32, i32>::new(1).is_err());
    }

    #[test]
    fn test_clones_share_one_tree() {
        let a = SharedBPlusTree::new(4).unwrap();
        let b = a.clone();
        a.insert(7, 70).unwrap();
        assert_eq!(b.get(&7), Some(70));
    }

    #[test]
    fn test_write_guard_batches_mutations() {
        let tree = SharedBPlusTree::new(4).unwrap();
        {
            let mut guard = tree.write();
            for k in 0..50 {
                guard.insert(k, k).unwrap();
            }
            guard.check_invariants();
        }
        assert_eq!(tree.range(&10, &12).len(), 3);
    }

    #[test]
    fn test_concurrent_readers_and_writer() {
        let tree = SharedBPlusTree::new(5).unwrap();
        for k in 0..100 {
            tree.insert(k, k).unwrap();
        }

        let writer = {
            let tree = tree.clone();
            thread::spawn(move || {
                for k in 100..300 {
                    tree.insert(k, k).unwrap();
                }
                for k in (0..100).step_by(2) {
                    tree.remove(&k).unwrap();
                }
            })
        };

        let readers: Vec<_> = (0..4)
            .map(|_| {
                let tree = tree.clone();
                thread::spawn(move || {
                    for _ in 0..50 {
                        let scan = tree.range(&0, &1000);
                        assert!(scan.windows(2).all(|w| w[0].key() < w[1].key()));
                    }
                })
            })
            .collect();

        writer.join().unwrap();
        for reader in readers {
            reader.join().unwrap();
        }

        assert_eq!(tree.len(), 250);
        tree.read().check_invariants();
    }
}

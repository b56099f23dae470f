//! Structural statistics for a tree.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

/// Counters for the rebalancing work a tree has done.
///
/// All fields are atomic so a snapshot can be taken through a shared
/// reference (for example under the read lock of
/// [`SharedBPlusTree`](super::SharedBPlusTree)) while the tree itself only
/// updates them from `&mut self` operations.
///
/// # Memory Ordering
/// `Ordering::Relaxed` everywhere: counters are independent and only need
/// atomicity, not ordering between each other.
///
/// # Example
/// ```
/// use interchangedb_index::TreeStats;
/// use std::sync::atomic::Ordering;
///
/// let stats = TreeStats::new();
/// stats.leaf_splits.fetch_add(1, Ordering::Relaxed);
/// assert_eq!(stats.snapshot().leaf_splits, 1);
/// ```
#[derive(Debug)]
pub struct TreeStats {
    /// Leaves split because they reached `order` entries.
    pub leaf_splits: AtomicU64,

    /// Internal nodes split because they reached `order` keys.
    pub internal_splits: AtomicU64,

    /// Times a new root was created above a split root.
    pub root_grows: AtomicU64,

    /// Entries or children moved from a sibling with surplus.
    pub borrows: AtomicU64,

    /// Sibling pairs combined into one node.
    pub merges: AtomicU64,

    /// Times an internal root with one child was replaced by that child.
    pub root_shrinks: AtomicU64,
}

impl TreeStats {
    /// Create a new stats tracker with all counters at zero.
    pub fn new() -> Self {
        Self {
            leaf_splits: AtomicU64::new(0),
            internal_splits: AtomicU64::new(0),
            root_grows: AtomicU64::new(0),
            borrows: AtomicU64::new(0),
            merges: AtomicU64::new(0),
            root_shrinks: AtomicU64::new(0),
        }
    }

    #[inline]
    pub(crate) fn bump(counter: &AtomicU64) {
        counter.fetch_add(1, Ordering::Relaxed);
    }

    /// Get a snapshot of current statistics.
    pub fn snapshot(&self) -> StatsSnapshot {
        StatsSnapshot {
            leaf_splits: self.leaf_splits.load(Ordering::Relaxed),
            internal_splits: self.internal_splits.load(Ordering::Relaxed),
            root_grows: self.root_grows.load(Ordering::Relaxed),
            borrows: self.borrows.load(Ordering::Relaxed),
            merges: self.merges.load(Ordering::Relaxed),
            root_shrinks: self.root_shrinks.load(Ordering::Relaxed),
        }
    }

    /// Reset all counters to zero.
    pub fn reset(&self) {
        self.leaf_splits.store(0, Ordering::Relaxed);
        self.internal_splits.store(0, Ordering::Relaxed);
        self.root_grows.store(0, Ordering::Relaxed);
        self.borrows.store(0, Ordering::Relaxed);
        self.merges.store(0, Ordering::Relaxed);
        self.root_shrinks.store(0, Ordering::Relaxed);
    }
}

impl Default for TreeStats {
    fn default() -> Self {
        Self::new()
    }
}

/// A point-in-time copy of [`TreeStats`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StatsSnapshot {
    pub leaf_splits: u64,
    pub internal_splits: u64,
    pub root_grows: u64,
    pub borrows: u64,
    pub merges: u64,
    pub root_shrinks: u64,
}

impl StatsSnapshot {
    /// Leaf and internal splits together.
    pub fn splits(&self) -> u64 {
        self.leaf_splits + self.internal_splits
    }
}

impl fmt::Display for StatsSnapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Stats {{ splits: {} (leaf {}, internal {}), borrows: {}, merges: {}, root: +{}/-{} }}",
            self.splits(),
            self.leaf_splits,
            self.internal_splits,
            self.borrows,
            self.merges,
            self.root_grows,
            self.root_shrinks
        )
    }
}

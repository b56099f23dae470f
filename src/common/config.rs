//! Configuration for the index engine.
//!
//! The tree is in-memory, but node capacity is sized like a disk block so
//! that the fanout behaves the way a page-oriented index would.

use std::mem::size_of;

use crate::common::{Error, NodeId, Result};

/// Size of a block in bytes (4KB).
///
/// Matches the OS page size on most systems and the page size used by
/// BusTub. Only used to derive a node order; nothing is written to disk.
pub const PAGE_SIZE: usize = 4096;

/// Smallest order that can keep minimum occupancy after a split.
pub const MIN_ORDER: usize = 3;

/// Order used by [`TreeConfig::default`].
pub const DEFAULT_ORDER: usize = 32;

/// Bytes per block reserved for node bookkeeping (parent handle, vector
/// headers, node tag) when deriving an order from a block size.
pub const NODE_HEADER_SIZE: usize = 64;

/// Construction-time configuration of a [`BPlusTree`](crate::BPlusTree).
///
/// `order` is the maximum number of children of an internal node. Leaves
/// hold at most `order - 1` entries.
///
/// # Occupancy bounds
/// | node     | min                     | max           |
/// |----------|-------------------------|---------------|
/// | leaf     | `floor((order - 1)/2)`  | `order - 1`   |
/// | internal | `ceil(order / 2)` kids  | `order` kids  |
///
/// The root is exempt from the minimums (an internal root still needs two
/// children).
///
/// # Example
/// ```
/// use interchangedb_index::TreeConfig;
///
/// let config = TreeConfig::new(4).unwrap();
/// assert_eq!(config.max_leaf_entries(), 3);
/// assert_eq!(config.min_children(), 2);
///
/// assert!(TreeConfig::new(2).is_err());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TreeConfig {
    order: usize,
}

impl TreeConfig {
    /// Create a configuration with the given order.
    ///
    /// # Errors
    /// - `Error::InvalidConfiguration` if `order < MIN_ORDER`
    pub fn new(order: usize) -> Result<Self> {
        if order < MIN_ORDER {
            return Err(Error::InvalidConfiguration {
                order,
                min: MIN_ORDER,
            });
        }
        Ok(Self { order })
    }

    /// Derive the largest order whose nodes fit in one [`PAGE_SIZE`] block.
    pub fn for_page<K, V>() -> Self {
        Self::for_block::<K, V>(PAGE_SIZE)
    }

    /// Derive the largest order whose nodes fit in a block of `block_size`
    /// bytes, never going below [`MIN_ORDER`].
    ///
    /// A leaf needs `order - 1` entries; an internal node needs `order - 1`
    /// keys plus `order` child handles. The smaller of the two wins.
    pub fn for_block<K, V>(block_size: usize) -> Self {
        let usable = block_size.saturating_sub(NODE_HEADER_SIZE);

        let entry_size = size_of::<(K, V)>().max(1);
        let leaf_order = usable / entry_size + 1;

        let key_size = size_of::<K>();
        let internal_order = (usable + key_size) / (key_size + size_of::<NodeId>());

        Self {
            order: leaf_order.min(internal_order).max(MIN_ORDER),
        }
    }

    /// Maximum children per internal node.
    #[inline]
    pub fn order(&self) -> usize {
        self.order
    }

    /// Maximum entries per leaf.
    #[inline]
    pub fn max_leaf_entries(&self) -> usize {
        self.order - 1
    }

    /// Entries below which a non-root leaf underflows.
    #[inline]
    pub fn min_leaf_entries(&self) -> usize {
        (self.order - 1) / 2
    }

    /// Maximum separator keys per internal node.
    #[inline]
    pub fn max_keys(&self) -> usize {
        self.order - 1
    }

    /// Maximum children per internal node (same as `order`).
    #[inline]
    pub fn max_children(&self) -> usize {
        self.order
    }

    /// Children below which a non-root internal node underflows.
    #[inline]
    pub fn min_children(&self) -> usize {
        self.order.div_ceil(2)
    }
}

impl Default for TreeConfig {
    fn default() -> Self {
        Self {
            order: DEFAULT_ORDER,
        }
    }
}

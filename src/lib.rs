//! InterchangeDB index - an ordered B+Tree index with block-sized nodes.
//!
//! # Architecture
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                      SharedBPlusTree (optional)                 │
//! │              Arc<RwLock<..>>: one lock for the whole tree       │
//! ├─────────────────────────────────────────────────────────────────┤
//! │                            BPlusTree                            │
//! │  ┌─────────────────────────────────────────────────────────┐   │
//! │  │   search / range        insert / upsert       remove     │   │
//! │  │   (descent + chain)     (split, promote)   (borrow/merge)│   │
//! │  └─────────────────────────────────────────────────────────┘   │
//! │                              ↓                                  │
//! │  ┌──────────────────────────┐   ┌──────────────────────────┐   │
//! │  │ Node Store (NodeArena)   │   │ Leaf Chain (LeafChain)   │   │
//! │  │ internal + leaf nodes,   │   │ head ⇄ leaf ⇄ ... ⇄ tail │   │
//! │  │ parent handles (NodeId)  │   │ kept beside the tree     │   │
//! │  └──────────────────────────┘   └──────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Nodes are sized by an order (maximum children per internal node;
//! leaves hold `order - 1` entries). [`TreeConfig::for_page`] derives the
//! order that fits one 4KB block, so fanout behaves like a disk index even
//! though everything lives in memory.
//!
//! # Modules
//! - [`common`] - Shared primitives (NodeId, Error, config)
//! - [`index`] - Index structures (B+Tree)
//!
//! # Quick Start
//! ```
//! use interchangedb_index::{BPlusTree, Error};
//!
//! let mut tree = BPlusTree::new(4).unwrap();
//! for k in [10, 20, 5, 15, 25, 30, 7, 12, 18] {
//!     tree.insert(k, k * 10).unwrap();
//! }
//!
//! assert_eq!(tree.search(&15).map(|e| *e.value()), Ok(150));
//!
//! let keys: Vec<i32> = tree.range(&10, &25).map(|e| *e.key()).collect();
//! assert_eq!(keys, vec![10, 12, 15, 18, 20, 25]);
//!
//! tree.remove(&15).unwrap();
//! assert_eq!(tree.search(&15), Err(Error::NotFound));
//! ```

pub mod common;
pub mod index;

// Re-export commonly used items at crate root for convenience
pub use common::config::{DEFAULT_ORDER, MIN_ORDER, PAGE_SIZE};
pub use common::{Error, NodeId, Result, TreeConfig};

pub use index::btree::{BPlusTree, Entry, Range, SharedBPlusTree, StatsSnapshot, TreeStats};

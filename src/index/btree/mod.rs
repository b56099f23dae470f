//! B+Tree index.
//!
//! # Components
//! - [`BPlusTree`] - The index: search, range scan, insert, upsert, remove
//! - [`Entry`] - A key/value pair stored in a leaf
//! - [`Range`] - Lazy ordered scan over the leaf chain
//! - [`SharedBPlusTree`] - `RwLock` handle for use across threads
//! - [`TreeStats`] - Split/borrow/merge counters
//!
//! Internally the nodes live in an arena (`arena`, `node`), the leaf order
//! is a separate relation (`chain`), and the rebalancing algorithms are
//! split by direction (`insert`, `delete`).

mod arena;
mod chain;
mod debug;
mod delete;
mod insert;
mod iter;
mod node;
mod shared;
mod stats;
mod tree;

pub use iter::Range;
pub use node::Entry;
pub use shared::SharedBPlusTree;
pub use stats::{StatsSnapshot, TreeStats};
pub use tree::BPlusTree;

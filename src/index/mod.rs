//! Index structures.
//!
//! - [`btree`] - Ordered B+Tree index with a doubly linked leaf chain

pub mod btree;

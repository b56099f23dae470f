//! Error types for the index engine.

use thiserror::Error;

/// Convenient Result type alias.
///
/// Instead of writing `Result<T, Error>` everywhere, we can write `Result<T>`.
/// This is a common Rust pattern (see `std::io::Result`).
pub type Result<T> = std::result::Result<T, Error>;

/// All possible errors reported by the index.
///
/// Every variant is a caller-facing outcome: none of them leave the tree
/// in a modified state, and repeating the failed call yields the same error.
/// Broken structural invariants are programming errors and panic instead.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Error {
    /// A point lookup found no entry for the key.
    #[error("No entry found for key")]
    NotFound,

    /// An insert collided with an existing key.
    ///
    /// Use `upsert` to overwrite instead.
    #[error("Duplicate key")]
    DuplicateKey,

    /// A delete targeted a key that is not in the tree.
    #[error("Cannot delete: key not found")]
    KeyNotFound,

    /// The tree configuration was rejected at construction time.
    #[error("Invalid configuration: order {order} is below the minimum of {min}")]
    InvalidConfiguration { order: usize, min: usize },
}

//! Error types for partitioning.

use thiserror::Error;

/// Result alias for taxon-cluster.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors returned by partitioning primitives.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// Input was empty.
    #[error("empty input provided")]
    EmptyInput,

    /// A row's dimension differs from the first row's.
    #[error("dimension mismatch: expected {expected}, found {found}")]
    DimensionMismatch { expected: usize, found: usize },

    /// Requested more clusters than there are rows.
    #[error("cannot create {requested} clusters from {n_items} items")]
    InvalidClusterCount { requested: usize, n_items: usize },
}

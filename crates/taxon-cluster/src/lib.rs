//! # taxon-cluster
//!
//! Vector partitioning for the taxon hierarchy engine: per-column
//! standardization plus seeded k-means with multiple restarts. The crate is
//! self-contained (no async, no I/O) so the partitioning step can run as a
//! synchronous barrier between levels.

pub mod error;
pub mod kmeans;
pub mod standardize;
pub mod traits;

pub use error::{Error, Result};
pub use kmeans::Kmeans;
pub use standardize::standardize;
pub use traits::Partitioner;

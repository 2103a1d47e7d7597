//! Partitioning trait.

use crate::error::Result;

/// A vector-partitioning algorithm.
pub trait Partitioner {
    /// Partition `data` and return one group index in `[0, k)` per row.
    fn fit_predict(&self, data: &[Vec<f32>]) -> Result<Vec<usize>>;

    /// Number of groups this partitioner produces.
    fn n_groups(&self) -> usize;
}

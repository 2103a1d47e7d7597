//! Seeded k-means partitioning.
//!
//! Lloyd's algorithm with k-means++ initialization. Runs `n_init` restarts
//! and keeps the assignment with the lowest inertia (within-cluster sum of
//! squared distances). With a fixed seed the result is fully deterministic:
//! restart `r` derives its generator from `seed + r`.

use ndarray::{Array2, ArrayView1};
use rand::prelude::*;

use crate::error::{Error, Result};
use crate::traits::Partitioner;

/// K-means partitioner.
#[derive(Debug, Clone)]
pub struct Kmeans {
    k: usize,
    max_iter: usize,
    tol: f32,
    n_init: usize,
    seed: Option<u64>,
}

impl Kmeans {
    /// Create a partitioner producing `k` groups.
    pub fn new(k: usize) -> Self {
        Self {
            k,
            max_iter: 100,
            tol: 1e-4,
            n_init: 1,
            seed: None,
        }
    }

    /// Set maximum Lloyd iterations per restart.
    pub fn with_max_iter(mut self, max_iter: usize) -> Self {
        self.max_iter = max_iter;
        self
    }

    /// Set the number of restarts; the lowest-inertia run wins.
    pub fn with_n_init(mut self, n_init: usize) -> Self {
        self.n_init = n_init.max(1);
        self
    }

    /// Set random seed for reproducibility.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    fn squared_distance(a: &ArrayView1<'_, f32>, b: &ArrayView1<'_, f32>) -> f32 {
        a.iter().zip(b.iter()).map(|(x, y)| (x - y).powi(2)).sum()
    }

    /// K-means++ seeding: first centroid uniform, the rest sampled
    /// proportional to squared distance from the nearest chosen centroid.
    fn init_centroids(&self, data: &Array2<f32>, rng: &mut StdRng) -> Array2<f32> {
        let n = data.nrows();
        let d = data.ncols();
        let mut centroids = Array2::zeros((self.k, d));

        let first = rng.gen_range(0..n);
        centroids.row_mut(0).assign(&data.row(first));

        for i in 1..self.k {
            let distances: Vec<f32> = (0..n)
                .map(|j| {
                    let point = data.row(j);
                    (0..i)
                        .map(|c| Self::squared_distance(&point, &centroids.row(c)))
                        .fold(f32::MAX, f32::min)
                })
                .collect();

            let total: f32 = distances.iter().sum();
            if total == 0.0 {
                let idx = rng.gen_range(0..n);
                centroids.row_mut(i).assign(&data.row(idx));
                continue;
            }

            let threshold = rng.gen::<f32>() * total;
            let mut cumsum = 0.0;
            let mut selected = n - 1;
            for (j, &dist) in distances.iter().enumerate() {
                cumsum += dist;
                if cumsum >= threshold {
                    selected = j;
                    break;
                }
            }
            centroids.row_mut(i).assign(&data.row(selected));
        }

        centroids
    }

    /// One full Lloyd run. Returns the assignment and its inertia.
    fn lloyd(&self, data: &Array2<f32>, rng: &mut StdRng) -> (Vec<usize>, f32) {
        let n = data.nrows();
        let d = data.ncols();

        let mut centroids = self.init_centroids(data, rng);
        let mut labels = vec![0usize; n];

        for _iter in 0..self.max_iter {
            // Assignment step
            for (i, label) in labels.iter_mut().enumerate() {
                let point = data.row(i);
                let mut best_group = 0;
                let mut best_dist = f32::MAX;
                for k in 0..self.k {
                    let dist = Self::squared_distance(&point, &centroids.row(k));
                    if dist < best_dist {
                        best_dist = dist;
                        best_group = k;
                    }
                }
                *label = best_group;
            }

            // Update step
            let mut new_centroids = Array2::zeros((self.k, d));
            let mut counts = vec![0usize; self.k];
            for i in 0..n {
                let k = labels[i];
                for j in 0..d {
                    new_centroids[[k, j]] += data[[i, j]];
                }
                counts[k] += 1;
            }
            for k in 0..self.k {
                if counts[k] > 0 {
                    for j in 0..d {
                        new_centroids[[k, j]] /= counts[k] as f32;
                    }
                } else {
                    // Empty group: reseed from a random point
                    let idx = rng.gen_range(0..n);
                    new_centroids.row_mut(k).assign(&data.row(idx));
                }
            }

            let shift: f32 = centroids
                .iter()
                .zip(new_centroids.iter())
                .map(|(a, b)| (a - b).powi(2))
                .sum();
            centroids = new_centroids;
            if shift < self.tol {
                break;
            }
        }

        let inertia = (0..n)
            .map(|i| Self::squared_distance(&data.row(i), &centroids.row(labels[i])))
            .sum();

        (labels, inertia)
    }
}

impl Partitioner for Kmeans {
    fn fit_predict(&self, data: &[Vec<f32>]) -> Result<Vec<usize>> {
        if data.is_empty() {
            return Err(Error::EmptyInput);
        }

        let n = data.len();
        let d = data[0].len();

        if self.k > n {
            return Err(Error::InvalidClusterCount {
                requested: self.k,
                n_items: n,
            });
        }

        let mut flat: Vec<f32> = Vec::with_capacity(n * d);
        for point in data {
            if point.len() != d {
                return Err(Error::DimensionMismatch {
                    expected: d,
                    found: point.len(),
                });
            }
            flat.extend(point);
        }
        let data_arr = Array2::from_shape_vec((n, d), flat)
            .expect("row-major buffer matches (n, d)");

        let base_seed = self.seed.unwrap_or_else(|| rand::thread_rng().gen());

        let mut best: Option<(Vec<usize>, f32)> = None;
        for restart in 0..self.n_init {
            let mut rng = StdRng::seed_from_u64(base_seed.wrapping_add(restart as u64));
            let (labels, inertia) = self.lloyd(&data_arr, &mut rng);
            if best.as_ref().map_or(true, |(_, b)| inertia < *b) {
                best = Some((labels, inertia));
            }
        }

        Ok(best.expect("n_init >= 1").0)
    }

    fn n_groups(&self) -> usize {
        self.k
    }
}

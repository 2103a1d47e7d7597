//! Batched embedding with bounded concurrency.
//!
//! Splits an input list into fixed-size contiguous batches, dispatches them
//! all at once under a semaphore, and reassembles the vectors in input
//! order. Any batch that exhausts its retries fails the whole call: the
//! downstream partitioner needs a complete, aligned vector set, so partial
//! results are worthless.

use std::sync::Arc;

use tokio::sync::Semaphore;
use tracing::debug;

use taxon_core::{retry_with_backoff, BackoffConfig, EmbeddingBackend, Error, Result, Vector};

/// Order-preserving batch embedding client.
pub struct BatchEmbedder {
    backend: Arc<dyn EmbeddingBackend>,
    batch_size: usize,
    concurrency: usize,
    backoff: BackoffConfig,
}

impl BatchEmbedder {
    /// Create a client over `backend`, sending `batch_size` texts per call
    /// with at most `concurrency` calls in flight.
    pub fn new(
        backend: Arc<dyn EmbeddingBackend>,
        batch_size: usize,
        concurrency: usize,
        backoff: BackoffConfig,
    ) -> Self {
        Self {
            backend,
            batch_size: batch_size.max(1),
            concurrency: concurrency.max(1),
            backoff,
        }
    }

    /// Embed every text, returning one vector per input in input order.
    pub async fn embed_all(&self, texts: &[String]) -> Result<Vec<Vector>> {
        if texts.is_empty() {
            return Ok(vec![]);
        }

        let semaphore = Arc::new(Semaphore::new(self.concurrency));
        let n_batches = texts.len().div_ceil(self.batch_size);
        debug!(
            input_count = texts.len(),
            batch_count = n_batches,
            concurrency = self.concurrency,
            "Dispatching embedding batches"
        );

        let futures = texts
            .chunks(self.batch_size)
            .enumerate()
            .map(|(batch_idx, chunk)| {
                let semaphore = Arc::clone(&semaphore);
                let backend = Arc::clone(&self.backend);
                let backoff = self.backoff.clone();
                let chunk: Vec<String> = chunk.to_vec();
                async move {
                    let _permit = semaphore
                        .acquire()
                        .await
                        .map_err(|_| Error::Internal("embedding semaphore closed".into()))?;

                    let backend = backend.as_ref();
                    let chunk_ref = chunk.as_slice();
                    let vectors =
                        retry_with_backoff(&backoff, "embed_batch", move || async move {
                            backend.embed_texts(chunk_ref).await
                        })
                        .await?;

                    if vectors.len() != chunk.len() {
                        return Err(Error::Embedding(format!(
                            "Batch {} returned {} vectors for {} inputs",
                            batch_idx,
                            vectors.len(),
                            chunk.len()
                        )));
                    }
                    debug!(batch_index = batch_idx, "Embedding batch complete");
                    Ok(vectors)
                }
            });

        // try_join_all yields results in future order, not completion order,
        // so concatenation reassembles the original input positions.
        let batches = futures::future::try_join_all(futures).await?;
        Ok(batches.into_iter().flatten().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::MockEmbeddingBackend;
    use taxon_core::retry::classify;
    use taxon_core::FailureClass;

    fn texts(n: usize) -> Vec<String> {
        (0..n).map(|i| format!("t{}", i)).collect()
    }

    fn small_backoff() -> BackoffConfig {
        BackoffConfig {
            max_retries: 2,
            base_delay: std::time::Duration::from_millis(10),
            max_delay: std::time::Duration::from_millis(50),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_output_preserves_input_order() {
        // Later batches complete first; assembly must still match input order.
        let backend = Arc::new(MockEmbeddingBackend::new(1).with_reverse_latency());
        let embedder = BatchEmbedder::new(backend, 2, 4, small_backoff());

        let result = embedder.embed_all(&texts(7)).await.unwrap();

        assert_eq!(result.len(), 7);
        for (i, vector) in result.iter().enumerate() {
            assert_eq!(vector[0], i as f32, "result[{}] out of position", i);
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_single_batch_when_input_fits() {
        let backend = Arc::new(MockEmbeddingBackend::new(1));
        let embedder = BatchEmbedder::new(backend.clone(), 16, 4, small_backoff());

        let result = embedder.embed_all(&texts(5)).await.unwrap();
        assert_eq!(result.len(), 5);
        assert_eq!(backend.call_count(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_empty_input_no_calls() {
        let backend = Arc::new(MockEmbeddingBackend::new(1));
        let embedder = BatchEmbedder::new(backend.clone(), 16, 4, small_backoff());

        let result = embedder.embed_all(&[]).await.unwrap();
        assert!(result.is_empty());
        assert_eq!(backend.call_count(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_transient_failures_retried_then_succeed() {
        let backend = Arc::new(MockEmbeddingBackend::new(1).with_fail_times(2));
        let embedder = BatchEmbedder::new(backend.clone(), 16, 4, small_backoff());

        let result = embedder.embed_all(&texts(3)).await.unwrap();
        assert_eq!(result.len(), 3);
        assert_eq!(backend.call_count(), 3, "two failures then one success");
    }

    #[tokio::test(start_paused = true)]
    async fn test_exhausted_retries_fail_whole_call() {
        let backend = Arc::new(MockEmbeddingBackend::new(1).with_fail_times(u32::MAX));
        let embedder = BatchEmbedder::new(backend, 2, 4, small_backoff());

        let err = embedder.embed_all(&texts(6)).await.unwrap_err();
        assert_eq!(classify(&err), FailureClass::Transient, "original error surfaced");
    }

    #[tokio::test(start_paused = true)]
    async fn test_fatal_error_not_retried() {
        let backend = Arc::new(MockEmbeddingBackend::new(1).with_fatal());
        let embedder = BatchEmbedder::new(backend.clone(), 16, 4, small_backoff());

        let err = embedder.embed_all(&texts(3)).await.unwrap_err();
        assert_eq!(classify(&err), FailureClass::Fatal);
        assert_eq!(backend.call_count(), 1);
    }
}

//! Mock embedding backend for deterministic in-crate tests.
//!
//! Inputs of the form `t<N>` embed to `[N, N, ...]`, letting tests verify
//! that assembled output positions match input positions. Failure injection
//! covers transient (retryable) and fatal behavior.

use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use taxon_core::{EmbeddingBackend, Error, Result, Vector};

/// Configurable mock embedding backend.
pub struct MockEmbeddingBackend {
    dimension: usize,
    fail_times: u32,
    fatal: bool,
    reverse_latency: bool,
    calls: Arc<AtomicU32>,
    failures_injected: Arc<AtomicU32>,
}

impl MockEmbeddingBackend {
    pub fn new(dimension: usize) -> Self {
        Self {
            dimension,
            fail_times: 0,
            fatal: false,
            reverse_latency: false,
            calls: Arc::new(AtomicU32::new(0)),
            failures_injected: Arc::new(AtomicU32::new(0)),
        }
    }

    /// Fail the first `n` calls with a transient error.
    pub fn with_fail_times(mut self, n: u32) -> Self {
        self.fail_times = n;
        self
    }

    /// Fail every call with a fatal (non-retryable) error.
    pub fn with_fatal(mut self) -> Self {
        self.fatal = true;
        self
    }

    /// Delay each call so batches with higher starting indices finish first.
    pub fn with_reverse_latency(mut self) -> Self {
        self.reverse_latency = true;
        self
    }

    /// Total calls observed, including failed ones.
    pub fn call_count(&self) -> u32 {
        self.calls.load(Ordering::SeqCst)
    }

    fn text_index(text: &str) -> f32 {
        text.trim_start_matches('t').parse().unwrap_or(0.0)
    }
}

#[async_trait]
impl EmbeddingBackend for MockEmbeddingBackend {
    async fn embed_texts(&self, texts: &[String]) -> Result<Vec<Vector>> {
        self.calls.fetch_add(1, Ordering::SeqCst);

        if self.fatal {
            return Err(Error::Http {
                status: 401,
                message: "mock auth failure".into(),
            });
        }

        if self.failures_injected.fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| {
            (n < self.fail_times).then_some(n + 1)
        })
        .is_ok()
        {
            return Err(Error::RateLimited("mock rate limit".into()));
        }

        if self.reverse_latency {
            let first = texts.first().map(|t| Self::text_index(t)).unwrap_or(0.0);
            let delay = 1_000u64.saturating_sub((first as u64) * 10);
            tokio::time::sleep(Duration::from_millis(delay)).await;
        }

        Ok(texts
            .iter()
            .map(|t| vec![Self::text_index(t); self.dimension])
            .collect())
    }

    fn dimension(&self) -> usize {
        self.dimension
    }

    fn model_name(&self) -> &str {
        "mock-embed"
    }
}

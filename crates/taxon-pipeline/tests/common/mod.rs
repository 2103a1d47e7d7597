//! Shared mock backends for pipeline scenario tests.

use std::sync::atomic::{AtomicU32, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use taxon_core::{BackoffConfig, EmbeddingBackend, Error, GenerationBackend, Result, Vector};
use taxon_pipeline::RunConfig;

/// Generation backend that labels each cluster distinctly.
pub struct GoodGen {
    calls: AtomicU32,
}

impl GoodGen {
    pub fn new() -> Self {
        Self {
            calls: AtomicU32::new(0),
        }
    }
}

#[async_trait]
impl GenerationBackend for GoodGen {
    async fn generate(&self, prompt: &str) -> Result<String> {
        self.generate_json(prompt).await
    }

    async fn generate_json(&self, _prompt: &str) -> Result<String> {
        let n = self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(format!(
            r#"{{"label": "Theme {}", "description": "Cluster of related topics number {}."}}"#,
            n, n
        ))
    }

    fn model_name(&self) -> &str {
        "good-gen"
    }
}

/// Generation backend that fails every call with a transient error.
pub struct FailGen;

#[async_trait]
impl GenerationBackend for FailGen {
    async fn generate(&self, prompt: &str) -> Result<String> {
        self.generate_json(prompt).await
    }

    async fn generate_json(&self, _prompt: &str) -> Result<String> {
        Err(Error::ServiceUnavailable("generation service down".into()))
    }

    fn model_name(&self) -> &str {
        "fail-gen"
    }
}

/// Embedding backend hashing text bytes into deterministic vectors.
pub struct GridEmbed {
    dimension: usize,
}

impl GridEmbed {
    pub fn new(dimension: usize) -> Self {
        Self { dimension }
    }
}

#[async_trait]
impl EmbeddingBackend for GridEmbed {
    async fn embed_texts(&self, texts: &[String]) -> Result<Vec<Vector>> {
        Ok(texts
            .iter()
            .map(|t| {
                let sum: u32 = t.bytes().map(u32::from).sum();
                (0..self.dimension)
                    .map(|j| ((sum + j as u32) % 89) as f32)
                    .collect()
            })
            .collect())
    }

    fn dimension(&self) -> usize {
        self.dimension
    }

    fn model_name(&self) -> &str {
        "grid-embed"
    }
}

/// Embedding backend that fails every call with a transient error.
pub struct FailEmbed;

#[async_trait]
impl EmbeddingBackend for FailEmbed {
    async fn embed_texts(&self, _texts: &[String]) -> Result<Vec<Vector>> {
        Err(Error::RateLimited("embedding service throttled".into()))
    }

    fn dimension(&self) -> usize {
        2
    }

    fn model_name(&self) -> &str {
        "fail-embed"
    }
}

/// A config with a tight retry budget so failure scenarios finish quickly.
pub fn fast_config(ks: Vec<usize>) -> RunConfig {
    RunConfig::default()
        .with_level_ks(ks)
        .with_backoff(BackoffConfig {
            max_retries: 2,
            base_delay: Duration::from_millis(10),
            max_delay: Duration::from_millis(50),
        })
}

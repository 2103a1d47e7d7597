//! Deterministic mock backends shared by in-crate unit tests.

use std::sync::atomic::{AtomicU32, Ordering};

use async_trait::async_trait;
use taxon_core::{EmbeddingBackend, GenerationBackend, Result, Vector};

/// Generation backend returning a distinct well-formed label per call.
pub struct CountingGen {
    calls: AtomicU32,
}

impl CountingGen {
    pub fn new() -> Self {
        Self {
            calls: AtomicU32::new(0),
        }
    }
}

#[async_trait]
impl GenerationBackend for CountingGen {
    async fn generate(&self, prompt: &str) -> Result<String> {
        self.generate_json(prompt).await
    }

    async fn generate_json(&self, _prompt: &str) -> Result<String> {
        let n = self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(format!(
            r#"{{"label": "Group {}", "description": "Description of group {}."}}"#,
            n, n
        ))
    }

    fn model_name(&self) -> &str {
        "counting-gen"
    }
}

/// Embedding backend hashing text bytes into a fixed-dimension vector.
pub struct HashEmbed {
    dimension: usize,
}

impl HashEmbed {
    pub fn new(dimension: usize) -> Self {
        Self { dimension }
    }
}

#[async_trait]
impl EmbeddingBackend for HashEmbed {
    async fn embed_texts(&self, texts: &[String]) -> Result<Vec<Vector>> {
        Ok(texts
            .iter()
            .map(|t| {
                let sum: u32 = t.bytes().map(u32::from).sum();
                (0..self.dimension)
                    .map(|j| ((sum + j as u32) % 97) as f32)
                    .collect()
            })
            .collect())
    }

    fn dimension(&self) -> usize {
        self.dimension
    }

    fn model_name(&self) -> &str {
        "hash-embed"
    }
}

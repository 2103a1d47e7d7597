//! Inference backend traits.
//!
//! These traits define the interfaces that concrete service clients must
//! satisfy, enabling pluggable backends and testability. Implementations
//! perform a single network call per method; retry policy is applied by the
//! callers via [`crate::retry`].

use async_trait::async_trait;

use crate::error::Result;
use crate::models::Vector;

/// Backend for generating text embeddings.
#[async_trait]
pub trait EmbeddingBackend: Send + Sync {
    /// Generate embeddings for the given texts.
    ///
    /// Returns one vector per input text, in input order.
    async fn embed_texts(&self, texts: &[String]) -> Result<Vec<Vector>>;

    /// Expected dimension of embedding vectors.
    fn dimension(&self) -> usize;

    /// Model name being used.
    fn model_name(&self) -> &str;
}

/// Backend for text generation (LLM).
#[async_trait]
pub trait GenerationBackend: Send + Sync {
    /// Generate free-form text for a prompt.
    async fn generate(&self, prompt: &str) -> Result<String>;

    /// Generate text with the service's strict-JSON output mode enabled.
    ///
    /// The returned string is the raw response body content; callers parse
    /// and validate the expected keys.
    async fn generate_json(&self, prompt: &str) -> Result<String>;

    /// Model name being used.
    fn model_name(&self) -> &str;
}

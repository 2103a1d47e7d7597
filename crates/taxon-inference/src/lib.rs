//! # taxon-inference
//!
//! Service clients for the taxon hierarchy engine.
//!
//! This crate provides:
//! - An OpenAI-compatible backend implementing the generation and embedding
//!   traits from `taxon-core` (chat completions with strict-JSON output mode,
//!   embeddings endpoint)
//! - A batched embedding client with bounded concurrency and order-preserving
//!   assembly
//!
//! Generation and embedding are independent services: construct one backend
//! per role, each with its own base URL, key, and model.
//!
//! # Example
//!
//! ```rust,no_run
//! use taxon_inference::openai::OpenAIBackend;
//! use taxon_core::EmbeddingBackend;
//!
//! #[tokio::main]
//! async fn main() {
//!     let backend = OpenAIBackend::embedding_from_env().unwrap();
//!     let texts = vec!["Hello".to_string()];
//!     let embeddings = backend.embed_texts(&texts).await.unwrap();
//!     assert_eq!(embeddings.len(), 1);
//! }
//! ```

pub mod batch;
pub mod openai;

// Mock backends for in-crate tests
#[cfg(test)]
pub mod mock;

pub use batch::BatchEmbedder;
pub use openai::{OpenAIBackend, OpenAIConfig};

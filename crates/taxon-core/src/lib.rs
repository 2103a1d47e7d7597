//! # taxon-core
//!
//! Core types, traits, and abstractions for the taxon hierarchy engine.
//!
//! This crate provides the foundational data structures (items, cluster
//! nodes, assignments), the shared error type, the retry/backoff policy
//! used by every external-service call, and the inference backend traits
//! that other taxon crates depend on.

pub mod defaults;
pub mod error;
pub mod models;
pub mod retry;
pub mod traits;

// Re-export commonly used types at crate root
pub use error::{Error, Result};
pub use models::{Assignment, ClusterNode, Item, LevelRef, Vector};
pub use retry::{retry_with_backoff, BackoffConfig, FailureClass};
pub use traits::{EmbeddingBackend, GenerationBackend};

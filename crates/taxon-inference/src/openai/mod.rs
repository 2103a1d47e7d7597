//! OpenAI-compatible service client.
//!
//! Works against any endpoint speaking the OpenAI wire protocol (OpenAI,
//! DeepSeek, Ollama in compatibility mode, vLLM, ...).

mod backend;
mod error;
mod types;

pub use backend::{OpenAIBackend, OpenAIConfig};
pub use error::error_from_status;

//! OpenAI-compatible backend implementation.

use async_trait::async_trait;
use reqwest::Client;
use std::time::Duration;
use tracing::{debug, info};

use taxon_core::{EmbeddingBackend, Error, GenerationBackend, Result, Vector};

use super::error::error_from_status;
use super::types::*;

/// Default generation endpoint (DeepSeek, OpenAI wire protocol).
pub const DEFAULT_GEN_URL: &str = "https://api.deepseek.com";

/// Default generation model.
pub const DEFAULT_GEN_MODEL: &str = "deepseek-chat";

/// Default embedding endpoint.
pub const DEFAULT_EMBED_URL: &str = "https://api.openai.com/v1";

/// Default embedding model.
pub const DEFAULT_EMBED_MODEL: &str = "text-embedding-3-large";

/// Default embedding dimension for text-embedding-3-large.
pub const DEFAULT_DIMENSION: usize = 3072;

/// Default timeout in seconds.
pub const DEFAULT_TIMEOUT_SECS: u64 = 120;

/// Sampling temperature for labeling calls; low for stable JSON output.
const GEN_TEMPERATURE: f32 = 0.2;

/// Configuration for an OpenAI-compatible backend.
///
/// One backend instance is bound to one service and one model; the engine
/// constructs separate instances for generation and embedding since those
/// are independent services.
#[derive(Debug, Clone)]
pub struct OpenAIConfig {
    /// Base URL for the API endpoint.
    pub base_url: String,
    /// API key for authentication (optional for local endpoints).
    pub api_key: Option<String>,
    /// Model slug sent with every request.
    pub model: String,
    /// Expected embedding dimension (embedding role only).
    pub embed_dimension: usize,
    /// Request timeout in seconds.
    pub timeout_seconds: u64,
}

impl OpenAIConfig {
    /// Defaults for the generation role.
    pub fn generation_defaults() -> Self {
        Self {
            base_url: DEFAULT_GEN_URL.to_string(),
            api_key: None,
            model: DEFAULT_GEN_MODEL.to_string(),
            embed_dimension: 0,
            timeout_seconds: DEFAULT_TIMEOUT_SECS,
        }
    }

    /// Defaults for the embedding role.
    pub fn embedding_defaults() -> Self {
        Self {
            base_url: DEFAULT_EMBED_URL.to_string(),
            api_key: None,
            model: DEFAULT_EMBED_MODEL.to_string(),
            embed_dimension: DEFAULT_DIMENSION,
            timeout_seconds: DEFAULT_TIMEOUT_SECS,
        }
    }
}

/// OpenAI-compatible inference backend.
pub struct OpenAIBackend {
    client: Client,
    config: OpenAIConfig,
}

impl OpenAIBackend {
    /// Create a new backend with the given configuration.
    pub fn new(config: OpenAIConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .build()
            .map_err(|e| Error::Config(format!("Failed to create HTTP client: {}", e)))?;

        info!(
            base_url = %config.base_url,
            model = %config.model,
            "Initializing OpenAI-compatible backend"
        );

        Ok(Self { client, config })
    }

    /// Generation backend from environment variables.
    ///
    /// | Variable | Default | Description |
    /// |----------|---------|-------------|
    /// | `TAXON_GEN_BASE_URL` | DeepSeek endpoint | API base URL |
    /// | `TAXON_GEN_API_KEY` | (none) | Bearer token |
    /// | `TAXON_GEN_MODEL` | `deepseek-chat` | Model slug |
    /// | `TAXON_GEN_TIMEOUT` | `120` | Request timeout (seconds) |
    pub fn generation_from_env() -> Result<Self> {
        let defaults = OpenAIConfig::generation_defaults();
        Self::new(OpenAIConfig {
            base_url: std::env::var("TAXON_GEN_BASE_URL").unwrap_or(defaults.base_url),
            api_key: std::env::var("TAXON_GEN_API_KEY").ok(),
            model: std::env::var("TAXON_GEN_MODEL").unwrap_or(defaults.model),
            embed_dimension: 0,
            timeout_seconds: std::env::var("TAXON_GEN_TIMEOUT")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(defaults.timeout_seconds),
        })
    }

    /// Embedding backend from environment variables.
    ///
    /// | Variable | Default | Description |
    /// |----------|---------|-------------|
    /// | `TAXON_EMBED_BASE_URL` | OpenAI endpoint | API base URL |
    /// | `TAXON_EMBED_API_KEY` | (none) | Bearer token |
    /// | `TAXON_EMBED_MODEL` | `text-embedding-3-large` | Model slug |
    /// | `TAXON_EMBED_DIM` | `3072` | Embedding dimension |
    /// | `TAXON_EMBED_TIMEOUT` | `120` | Request timeout (seconds) |
    pub fn embedding_from_env() -> Result<Self> {
        let defaults = OpenAIConfig::embedding_defaults();
        Self::new(OpenAIConfig {
            base_url: std::env::var("TAXON_EMBED_BASE_URL").unwrap_or(defaults.base_url),
            api_key: std::env::var("TAXON_EMBED_API_KEY").ok(),
            model: std::env::var("TAXON_EMBED_MODEL").unwrap_or(defaults.model),
            embed_dimension: std::env::var("TAXON_EMBED_DIM")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(defaults.embed_dimension),
            timeout_seconds: std::env::var("TAXON_EMBED_TIMEOUT")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(defaults.timeout_seconds),
        })
    }

    /// Get the current configuration.
    pub fn config(&self) -> &OpenAIConfig {
        &self.config
    }

    /// Build a POST request with authentication if configured.
    fn build_request(&self, endpoint: &str) -> reqwest::RequestBuilder {
        let url = format!("{}{}", self.config.base_url.trim_end_matches('/'), endpoint);
        let mut req = self.client.post(&url);

        if let Some(ref api_key) = self.config.api_key {
            req = req.header("Authorization", format!("Bearer {}", api_key));
        }

        req.header("Content-Type", "application/json")
    }

    /// Read an error response body and map the status to an error category.
    async fn error_from_response(response: reqwest::Response, context: &str) -> Error {
        let status = response.status().as_u16();
        let message = match response.json::<ApiErrorResponse>().await {
            Ok(body) => body.error.message,
            Err(_) => "Unknown error".to_string(),
        };
        error_from_status(status, format!("{}: {}", context, message))
    }

    async fn chat_completion(&self, prompt: &str, strict_json: bool) -> Result<String> {
        debug!(
            model = %self.config.model,
            prompt_len = prompt.len(),
            strict_json,
            "Requesting chat completion"
        );

        let request = ChatCompletionRequest {
            model: self.config.model.clone(),
            messages: vec![ChatMessage {
                role: "user".to_string(),
                content: prompt.to_string(),
            }],
            temperature: Some(GEN_TEMPERATURE),
            response_format: strict_json.then(ResponseFormat::json_object),
        };

        let response = self
            .build_request("/chat/completions")
            .json(&request)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(Self::error_from_response(response, "chat completion").await);
        }

        let result: ChatCompletionResponse = response
            .json()
            .await
            .map_err(|e| Error::Generation(format!("Failed to parse response: {}", e)))?;

        let content = result
            .choices
            .into_iter()
            .next()
            .map(|c| c.message.content)
            .ok_or_else(|| Error::Generation("Response contained no choices".to_string()))?;

        debug!(response_len = content.len(), "Chat completion received");
        Ok(content)
    }
}

#[async_trait]
impl EmbeddingBackend for OpenAIBackend {
    async fn embed_texts(&self, texts: &[String]) -> Result<Vec<Vector>> {
        if texts.is_empty() {
            return Ok(vec![]);
        }

        debug!(
            input_count = texts.len(),
            model = %self.config.model,
            "Embedding texts"
        );

        let request = EmbeddingRequest {
            model: self.config.model.clone(),
            input: texts.to_vec(),
            encoding_format: Some("float".to_string()),
        };

        let response = self
            .build_request("/embeddings")
            .json(&request)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(Self::error_from_response(response, "embeddings").await);
        }

        let result: EmbeddingResponse = response
            .json()
            .await
            .map_err(|e| Error::Embedding(format!("Failed to parse response: {}", e)))?;

        if result.data.len() != texts.len() {
            return Err(Error::Embedding(format!(
                "Expected {} embeddings, got {}",
                texts.len(),
                result.data.len()
            )));
        }

        // Sort by index so the result aligns with the input order
        let mut data = result.data;
        data.sort_by_key(|d| d.index);

        Ok(data.into_iter().map(|d| d.embedding).collect())
    }

    fn dimension(&self) -> usize {
        self.config.embed_dimension
    }

    fn model_name(&self) -> &str {
        &self.config.model
    }
}

#[async_trait]
impl GenerationBackend for OpenAIBackend {
    async fn generate(&self, prompt: &str) -> Result<String> {
        self.chat_completion(prompt, false).await
    }

    async fn generate_json(&self, prompt: &str) -> Result<String> {
        self.chat_completion(prompt, true).await
    }

    fn model_name(&self) -> &str {
        &self.config.model
    }
}

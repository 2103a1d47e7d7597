//! Run configuration.
//!
//! Every optional knob resolves to a concrete default at construction time,
//! so the rest of the engine never handles unset fields.

use std::time::Duration;

use taxon_core::{defaults, BackoffConfig, Error, Result};

/// Configuration for one clustering run.
#[derive(Debug, Clone)]
pub struct RunConfig {
    /// Cluster counts per level, finest first. The last entry is the top of
    /// the hierarchy.
    pub level_ks: Vec<usize>,
    /// Seed for the partitioner.
    pub random_seed: u64,
    /// K-means restarts per level.
    pub kmeans_restarts: usize,
    /// Maximum concurrent label-generation calls.
    pub label_concurrency: usize,
    /// Maximum concurrent embedding batches.
    pub embed_concurrency: usize,
    /// Texts per embedding batch.
    pub embed_batch_size: usize,
    /// Maximum member texts per labeling prompt.
    pub max_items_per_prompt: usize,
    /// Maximum characters of member text per labeling prompt.
    pub max_chars_per_prompt: usize,
    /// Retry policy for every service call.
    pub backoff: BackoffConfig,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            level_ks: defaults::LEVEL_KS.to_vec(),
            random_seed: defaults::RANDOM_SEED,
            kmeans_restarts: defaults::KMEANS_RESTARTS,
            label_concurrency: defaults::LABEL_CONCURRENCY,
            embed_concurrency: defaults::EMBED_CONCURRENCY,
            embed_batch_size: defaults::EMBED_BATCH_SIZE,
            max_items_per_prompt: defaults::MAX_ITEMS_PER_PROMPT,
            max_chars_per_prompt: defaults::MAX_CHARS_PER_PROMPT,
            backoff: BackoffConfig::default(),
        }
    }
}

impl RunConfig {
    /// Create config from environment variables (with defaults).
    ///
    /// | Variable | Default | Description |
    /// |----------|---------|-------------|
    /// | `TAXON_LEVEL_KS` | `50,25,5` | Cluster counts, finest first |
    /// | `TAXON_RANDOM_SEED` | `42` | Partitioner seed |
    /// | `TAXON_KMEANS_RESTARTS` | `10` | Restarts per level |
    /// | `TAXON_LABEL_CONCURRENCY` | `5` | Concurrent label calls |
    /// | `TAXON_EMBED_CONCURRENCY` | `8` | Concurrent embedding batches |
    /// | `TAXON_EMBED_BATCH_SIZE` | `128` | Texts per embedding batch |
    /// | `TAXON_MAX_ITEMS_PER_PROMPT` | `60` | Member texts per prompt |
    /// | `TAXON_MAX_CHARS_PER_PROMPT` | `8000` | Prompt text budget |
    /// | `TAXON_MAX_RETRIES` | `6` | Retries per service call |
    /// | `TAXON_BASE_DELAY_MS` | `1000` | Backoff base delay |
    /// | `TAXON_MAX_DELAY_MS` | `30000` | Backoff delay cap |
    pub fn from_env() -> Result<Self> {
        let mut config = Self::default();

        if let Ok(raw) = std::env::var("TAXON_LEVEL_KS") {
            config.level_ks = parse_level_ks(&raw)?;
        }
        if let Some(seed) = env_parse("TAXON_RANDOM_SEED") {
            config.random_seed = seed;
        }
        if let Some(n) = env_parse("TAXON_KMEANS_RESTARTS") {
            config.kmeans_restarts = n;
        }
        if let Some(n) = env_parse("TAXON_LABEL_CONCURRENCY") {
            config.label_concurrency = n;
        }
        if let Some(n) = env_parse("TAXON_EMBED_CONCURRENCY") {
            config.embed_concurrency = n;
        }
        if let Some(n) = env_parse("TAXON_EMBED_BATCH_SIZE") {
            config.embed_batch_size = n;
        }
        if let Some(n) = env_parse("TAXON_MAX_ITEMS_PER_PROMPT") {
            config.max_items_per_prompt = n;
        }
        if let Some(n) = env_parse("TAXON_MAX_CHARS_PER_PROMPT") {
            config.max_chars_per_prompt = n;
        }
        if let Some(n) = env_parse::<u32>("TAXON_MAX_RETRIES") {
            config.backoff.max_retries = n;
        }
        if let Some(ms) = env_parse::<u64>("TAXON_BASE_DELAY_MS") {
            config.backoff.base_delay = Duration::from_millis(ms);
        }
        if let Some(ms) = env_parse::<u64>("TAXON_MAX_DELAY_MS") {
            config.backoff.max_delay = Duration::from_millis(ms);
        }

        config.validate()?;
        Ok(config)
    }

    /// Set cluster counts per level, finest first.
    pub fn with_level_ks(mut self, ks: Vec<usize>) -> Self {
        self.level_ks = ks;
        self
    }

    /// Set the partitioner seed.
    pub fn with_random_seed(mut self, seed: u64) -> Self {
        self.random_seed = seed;
        self
    }

    /// Set the label-call admission limit.
    pub fn with_label_concurrency(mut self, n: usize) -> Self {
        self.label_concurrency = n;
        self
    }

    /// Set the embedding-batch admission limit.
    pub fn with_embed_concurrency(mut self, n: usize) -> Self {
        self.embed_concurrency = n;
        self
    }

    /// Set the embedding batch size.
    pub fn with_embed_batch_size(mut self, n: usize) -> Self {
        self.embed_batch_size = n;
        self
    }

    /// Set the retry policy.
    pub fn with_backoff(mut self, backoff: BackoffConfig) -> Self {
        self.backoff = backoff;
        self
    }

    /// Check structural constraints.
    pub fn validate(&self) -> Result<()> {
        if self.level_ks.is_empty() {
            return Err(Error::Config("level_ks must not be empty".into()));
        }
        if self.level_ks.iter().any(|&k| k == 0) {
            return Err(Error::Config("every level k must be at least 1".into()));
        }
        if self.label_concurrency == 0 || self.embed_concurrency == 0 {
            return Err(Error::Config("concurrency limits must be at least 1".into()));
        }
        if self.embed_batch_size == 0 {
            return Err(Error::Config("embed_batch_size must be at least 1".into()));
        }
        Ok(())
    }

    /// Index of the topmost configured level.
    pub fn top_level(&self) -> usize {
        self.level_ks.len() - 1
    }
}

fn env_parse<T: std::str::FromStr>(name: &str) -> Option<T> {
    std::env::var(name).ok().and_then(|v| v.parse().ok())
}

/// Parse a comma-separated level list such as `"50,25,5"`.
pub fn parse_level_ks(raw: &str) -> Result<Vec<usize>> {
    raw.split(',')
        .map(|part| {
            part.trim()
                .parse::<usize>()
                .map_err(|_| Error::Config(format!("invalid level k '{}'", part.trim())))
        })
        .collect()
}

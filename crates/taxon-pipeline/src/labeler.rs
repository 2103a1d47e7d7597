//! Cluster labeling via the text-generation service.
//!
//! One call per cluster, requesting strict two-key JSON. Labeling is
//! fail-soft: after the retry budget is spent (or on a fatal error such as a
//! malformed response), the labeler returns a synthetic fallback instead of
//! propagating, so one misbehaving cluster never aborts the hierarchy build.
//! Embeddings are the opposite (fail-fast): they are structurally required
//! downstream, labels are cosmetic.

use std::sync::Arc;

use serde::Deserialize;
use tracing::error;

use taxon_core::{retry_with_backoff, BackoffConfig, Error, GenerationBackend, Result};

use crate::config::RunConfig;

/// Generated label/description pair for one cluster.
#[derive(Debug, Clone, PartialEq)]
pub struct ClusterLabel {
    pub label: String,
    pub description: String,
}

/// Expected shape of the generation response.
#[derive(Debug, Deserialize)]
struct LabelResponse {
    label: String,
    description: String,
}

/// Labels clusters from their members' texts.
pub struct ClusterLabeler {
    backend: Arc<dyn GenerationBackend>,
    max_items: usize,
    max_chars: usize,
    backoff: BackoffConfig,
}

impl ClusterLabeler {
    pub fn new(backend: Arc<dyn GenerationBackend>, config: &RunConfig) -> Self {
        Self {
            backend,
            max_items: config.max_items_per_prompt,
            max_chars: config.max_chars_per_prompt,
            backoff: config.backoff.clone(),
        }
    }

    /// Generate a label/description for one cluster.
    ///
    /// `texts` are raw item texts at level 0 and child-cluster descriptions
    /// above. Never fails: exhausted retries and fatal errors degrade to
    /// [`fallback_label`].
    pub async fn label_cluster(&self, texts: &[String], level: usize, node_id: usize) -> ClusterLabel {
        let prompt = build_prompt(texts, level, self.max_items, self.max_chars);

        let prompt_ref = prompt.as_str();
        let backend = self.backend.as_ref();
        let result = retry_with_backoff(&self.backoff, "label_cluster", move || async move {
            let raw = backend.generate_json(prompt_ref).await?;
            parse_label_response(&raw)
        })
        .await;

        match result {
            Ok(label) => label,
            Err(err) => {
                error!(
                    level,
                    node_id,
                    error = %err,
                    "Labeling failed after retries, using fallback label"
                );
                fallback_label(level, node_id)
            }
        }
    }
}

/// Synthetic label used when generation fails.
pub fn fallback_label(level: usize, node_id: usize) -> ClusterLabel {
    ClusterLabel {
        label: format!("Cluster {}", node_id),
        description: format!("Cluster {} at level {}", node_id, level),
    }
}

/// Parse and validate the strict two-key JSON response.
fn parse_label_response(raw: &str) -> Result<ClusterLabel> {
    let parsed: LabelResponse = serde_json::from_str(raw)
        .map_err(|e| Error::Generation(format!("invalid label response: {}", e)))?;
    Ok(ClusterLabel {
        label: parsed.label,
        description: parsed.description,
    })
}

/// Assemble the labeling prompt, truncating the member list and the total
/// text budget.
fn build_prompt(texts: &[String], level: usize, max_items: usize, max_chars: usize) -> String {
    let mut lines: Vec<String> = texts
        .iter()
        .take(max_items)
        .map(|t| format!("- {}", t))
        .collect();
    if texts.len() > max_items {
        lines.push(format!("... and {} more items", texts.len() - max_items));
    }

    let mut items_text: String = lines.join("\n");
    if items_text.chars().count() > max_chars {
        items_text = items_text.chars().take(max_chars).collect();
    }

    if level == 0 {
        format!(
            "You are analyzing a cluster of related conversation topics. \
Below are all the topics in this cluster:\n\n{}\n\n\
Please analyze these topics and provide:\n\
1. A short, concise label (2-5 words) that captures the main theme\n\
2. A detailed description (2-3 sentences) explaining what this cluster represents\n\n\
Format your response as JSON with exactly these keys:\n\
- \"label\": the short label\n\
- \"description\": the detailed description\n\n\
Only return the JSON, no other text.",
            items_text
        )
    } else {
        format!(
            "You are analyzing a cluster of related sub-clusters. \
Below are the descriptions of the sub-clusters in this cluster:\n\n{}\n\n\
Please analyze these sub-cluster descriptions and provide:\n\
1. A short, concise label (2-5 words) that captures the main theme of this parent cluster\n\
2. A detailed description (2-3 sentences) explaining what this higher-level cluster represents\n\n\
Format your response as JSON with exactly these keys:\n\
- \"label\": the short label\n\
- \"description\": the detailed description\n\n\
Only return the JSON, no other text.",
            items_text
        )
    }
}

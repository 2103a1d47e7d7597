//! End-to-end run orchestration.
//!
//! Load → build hierarchy → project assignments → write artifacts. Any
//! fatal error propagates before the first artifact is written, so a failed
//! run leaves no partial output files.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;

use tracing::info;

use taxon_core::{EmbeddingBackend, GenerationBackend, Result};

use crate::assign::build_assignments;
use crate::config::RunConfig;
use crate::hierarchy::HierarchyBuilder;
use crate::io;

/// Destination paths for the run's artifacts.
#[derive(Debug, Clone)]
pub struct OutputPaths {
    pub nodes: PathBuf,
    pub assignments: PathBuf,
    pub augmented: Option<PathBuf>,
}

/// Counts reported after a successful run.
#[derive(Debug, Clone)]
pub struct RunSummary {
    pub total_rows: usize,
    pub valid_rows: usize,
    pub nodes_per_level: Vec<usize>,
}

/// Run the full clustering pipeline over one input table.
pub async fn run_clustering(
    input: &Path,
    text_col: &str,
    embed_col: &str,
    outputs: &OutputPaths,
    config: RunConfig,
    gen_backend: Arc<dyn GenerationBackend>,
    embed_backend: Arc<dyn EmbeddingBackend>,
) -> Result<RunSummary> {
    let started = Instant::now();
    let n_levels = config.level_ks.len();

    let loaded = io::load_input(input, text_col, embed_col)?;

    let texts: Vec<String> = loaded
        .valid_indices
        .iter()
        .map(|&i| loaded.items[i].text.clone())
        .collect();
    let vectors = loaded
        .valid_indices
        .iter()
        .filter_map(|&i| loaded.items[i].embedding.clone())
        .collect();

    let builder = HierarchyBuilder::new(gen_backend, embed_backend, config)?;
    let nodes = builder.build(texts, vectors).await?;

    let assignments = build_assignments(
        &nodes,
        loaded.items.len(),
        &loaded.valid_indices,
        n_levels,
    );

    io::write_nodes(&outputs.nodes, &nodes)?;
    io::write_assignments(&outputs.assignments, &assignments, n_levels)?;
    if let Some(augmented) = &outputs.augmented {
        io::write_augmented(augmented, &loaded.table, &nodes, &assignments, n_levels)?;
    }

    let nodes_per_level = (0..n_levels)
        .map(|level| nodes.iter().filter(|n| n.level == level).count())
        .collect();
    let summary = RunSummary {
        total_rows: loaded.items.len(),
        valid_rows: loaded.valid_indices.len(),
        nodes_per_level,
    };
    info!(
        duration_ms = started.elapsed().as_millis() as u64,
        total_rows = summary.total_rows,
        valid_rows = summary.valid_rows,
        nodes_per_level = ?summary.nodes_per_level,
        "Run complete"
    );
    Ok(summary)
}

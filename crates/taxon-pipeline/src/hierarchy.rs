//! Bottom-up hierarchy assembly.
//!
//! Drives the level processor across every configured level, threading each
//! level's descriptions and embeddings into the next, and back-fills
//! `parent_id` on level L once level L+1 exists. Nodes are owned by their
//! level list throughout; linking happens in an explicit second phase via a
//! child-id to parent-id map, never through shared pointers.

use std::collections::HashMap;
use std::sync::Arc;

use tracing::info;

use taxon_core::{
    ClusterNode, EmbeddingBackend, Error, GenerationBackend, Result, Vector,
};
use taxon_inference::BatchEmbedder;

use crate::config::RunConfig;
use crate::labeler::ClusterLabeler;
use crate::level::{LevelInput, LevelProcessor};

/// Builds the full node tree from base-level texts and vectors.
pub struct HierarchyBuilder {
    processor: LevelProcessor,
    config: RunConfig,
}

impl HierarchyBuilder {
    /// Create a builder over the two service backends.
    pub fn new(
        gen_backend: Arc<dyn GenerationBackend>,
        embed_backend: Arc<dyn EmbeddingBackend>,
        config: RunConfig,
    ) -> Result<Self> {
        config.validate()?;
        let labeler = Arc::new(ClusterLabeler::new(gen_backend, &config));
        let embedder = BatchEmbedder::new(
            embed_backend,
            config.embed_batch_size,
            config.embed_concurrency,
            config.backoff.clone(),
        );
        let processor = LevelProcessor::new(labeler, embedder, &config);
        Ok(Self { processor, config })
    }

    /// Build every configured level and return all nodes, finest level
    /// first. `texts` and `vectors` are the valid base items, aligned.
    pub async fn build(&self, texts: Vec<String>, vectors: Vec<Vector>) -> Result<Vec<ClusterNode>> {
        let n_levels = self.config.level_ks.len();
        let mut levels: Vec<Vec<ClusterNode>> = Vec::with_capacity(n_levels);
        let mut pending = Some(LevelInput {
            texts,
            vectors,
            child_ids: None,
        });

        for (level, &k) in self.config.level_ks.iter().enumerate() {
            let is_top = level == self.config.top_level();
            let input = pending
                .take()
                .ok_or_else(|| Error::Internal("missing level input".into()))?;

            let nodes = self.processor.process_level(level, k, input, is_top).await?;

            if let Some(prev) = levels.last_mut() {
                Self::link_parents(prev, &nodes)?;
            }
            if !is_top {
                pending = Some(Self::next_input(&nodes)?);
            }
            levels.push(nodes);
        }

        let total: usize = levels.iter().map(|l| l.len()).sum();
        info!(levels = n_levels, node_count = total, "Hierarchy complete");
        Ok(levels.into_iter().flatten().collect())
    }

    /// Set `parent_id` on every child from the parents' membership lists.
    fn link_parents(children: &mut [ClusterNode], parents: &[ClusterNode]) -> Result<()> {
        let mut parent_of: HashMap<usize, usize> = HashMap::new();
        for parent in parents {
            for &child_id in &parent.children_refs {
                parent_of.insert(child_id, parent.node_id);
            }
        }

        for child in children {
            let parent_id = parent_of.get(&child.node_id).ok_or_else(|| {
                Error::Internal(format!(
                    "no level-{} node covers node {}",
                    child.level + 1,
                    child.node_id
                ))
            })?;
            child.set_parent(*parent_id)?;
        }
        Ok(())
    }

    /// Turn a completed level into the next level's input set.
    fn next_input(nodes: &[ClusterNode]) -> Result<LevelInput> {
        let texts = nodes.iter().map(|n| n.description.clone()).collect();
        let vectors = nodes
            .iter()
            .map(|n| {
                n.description_embedding.clone().ok_or_else(|| {
                    Error::Internal(format!(
                        "node {}/{} missing description embedding",
                        n.level, n.node_id
                    ))
                })
            })
            .collect::<Result<Vec<Vector>>>()?;
        let child_ids = nodes.iter().map(|n| n.node_id).collect();
        Ok(LevelInput {
            texts,
            vectors,
            child_ids: Some(child_ids),
        })
    }
}

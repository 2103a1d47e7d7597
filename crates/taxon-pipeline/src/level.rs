//! Single-level processing: partition, label, embed.
//!
//! Partitioning is a synchronous barrier; labeling fans out under its own
//! admission semaphore; description embedding runs only when the level is
//! not the topmost (the root level is never re-embedded since no further
//! clustering follows).

use std::sync::Arc;

use tokio::sync::Semaphore;
use tracing::{info, warn};

use taxon_cluster::{standardize, Kmeans, Partitioner};
use taxon_core::{ClusterNode, Error, Result, Vector};
use taxon_inference::BatchEmbedder;

use crate::config::RunConfig;
use crate::labeler::ClusterLabeler;
use crate::progress::Progress;

/// Input set for one level: aligned texts and vectors, plus the node ids the
/// rows correspond to (absent at level 0, where rows are item indices).
pub struct LevelInput {
    pub texts: Vec<String>,
    pub vectors: Vec<Vector>,
    pub child_ids: Option<Vec<usize>>,
}

/// Runs partition → shell → label → embed for one level.
pub struct LevelProcessor {
    labeler: Arc<ClusterLabeler>,
    embedder: BatchEmbedder,
    label_concurrency: usize,
    random_seed: u64,
    kmeans_restarts: usize,
}

impl LevelProcessor {
    pub fn new(labeler: Arc<ClusterLabeler>, embedder: BatchEmbedder, config: &RunConfig) -> Self {
        Self {
            labeler,
            embedder,
            label_concurrency: config.label_concurrency,
            random_seed: config.random_seed,
            kmeans_restarts: config.kmeans_restarts,
        }
    }

    /// Process one level and return its completed nodes.
    ///
    /// `is_top` suppresses description embedding for the topmost level.
    pub async fn process_level(
        &self,
        level: usize,
        k: usize,
        input: LevelInput,
        is_top: bool,
    ) -> Result<Vec<ClusterNode>> {
        let n = input.vectors.len();
        if n == 0 {
            return Err(Error::Partition(format!("level {} has no input vectors", level)));
        }
        if input.texts.len() != n {
            return Err(Error::Internal(format!(
                "level {} input misaligned: {} texts for {} vectors",
                level,
                input.texts.len(),
                n
            )));
        }

        // Degenerate partition: fewer members than requested groups reduces
        // k instead of collapsing everything into one group.
        let k_eff = k.min(n);
        if k_eff < k {
            warn!(
                level,
                requested = k,
                available = n,
                "Reducing cluster count to available members"
            );
        }

        info!(level, k = k_eff, input_count = n, "Partitioning level");
        let scaled = standardize(&input.vectors).map_err(|e| Error::Partition(e.to_string()))?;
        let groups = Kmeans::new(k_eff)
            .with_seed(self.random_seed)
            .with_n_init(self.kmeans_restarts)
            .fit_predict(&scaled)
            .map_err(|e| Error::Partition(e.to_string()))?;

        let mut members: Vec<Vec<usize>> = vec![Vec::new(); k_eff];
        for (position, &group) in groups.iter().enumerate() {
            members[group].push(position);
        }
        if let Some(empty) = members.iter().position(|m| m.is_empty()) {
            return Err(Error::Partition(format!(
                "level {} group {} received no members",
                level, empty
            )));
        }

        let member_texts: Vec<Vec<String>> = members
            .iter()
            .map(|positions| positions.iter().map(|&p| input.texts[p].clone()).collect())
            .collect();

        let mut nodes: Vec<ClusterNode> = members
            .into_iter()
            .enumerate()
            .map(|(node_id, positions)| {
                let children_refs = match &input.child_ids {
                    Some(ids) => positions.iter().map(|&p| ids[p]).collect(),
                    None => positions,
                };
                ClusterNode::shell(level, node_id, k_eff, children_refs)
            })
            .collect();

        info!(level, node_count = nodes.len(), "Labeling clusters");
        let semaphore = Arc::new(Semaphore::new(self.label_concurrency));
        let progress = Progress::new("labeling", level, nodes.len());
        let progress_ref = &progress;
        let label_futures = member_texts.into_iter().enumerate().map(|(node_id, texts)| {
            let semaphore = Arc::clone(&semaphore);
            let labeler = Arc::clone(&self.labeler);
            async move {
                let _permit = semaphore
                    .acquire()
                    .await
                    .map_err(|_| Error::Internal("labeling semaphore closed".into()))?;
                let label = labeler.label_cluster(&texts, level, node_id).await;
                progress_ref.tick();
                Ok::<_, Error>(label)
            }
        });
        let labels = futures::future::try_join_all(label_futures).await?;
        for (node, label) in nodes.iter_mut().zip(labels) {
            node.label = label.label;
            node.description = label.description;
        }

        if !is_top {
            info!(level, node_count = nodes.len(), "Embedding cluster descriptions");
            let descriptions: Vec<String> = nodes.iter().map(|n| n.description.clone()).collect();
            let vectors = self.embedder.embed_all(&descriptions).await?;
            for (node, vector) in nodes.iter_mut().zip(vectors) {
                node.description_embedding = Some(vector);
            }
        }

        info!(level, node_count = nodes.len(), "Level complete");
        Ok(nodes)
    }
}

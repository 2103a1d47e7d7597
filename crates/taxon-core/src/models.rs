//! Data model for the taxon hierarchy engine.

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Embedding vector.
pub type Vector = Vec<f32>;

/// A base-level input unit: one row of the source table.
///
/// `index` is the row's position in the original input order. Items whose
/// embedding cell failed to parse carry `embedding: None`; they are excluded
/// from clustering but still appear, blank, in the final per-row output.
#[derive(Debug, Clone)]
pub struct Item {
    pub index: usize,
    pub text: String,
    pub embedding: Option<Vector>,
}

/// A labeled group at one level of the hierarchy.
///
/// Identity for cross-level reference is the pair `(level, node_id)`;
/// `node_id` is unique only within its level. `children_refs` holds item
/// indices at level 0 and child node ids at levels above.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClusterNode {
    /// Hierarchy tier, 0 = finest grain.
    pub level: usize,
    /// Identifier within `level`.
    pub node_id: usize,
    /// `node_id` of the enclosing node at `level + 1`; `None` until the
    /// parent level is processed, and permanently `None` at the top level.
    pub parent_id: Option<usize>,
    /// Partition count used to produce this node's level.
    pub k_at_level: usize,
    /// Short human-readable theme, filled by the labeler.
    pub label: String,
    /// 1-3 sentence summary, filled by the labeler.
    pub description: String,
    /// Embedding of `description`; set for every level below the topmost.
    pub description_embedding: Option<Vector>,
    /// Always equals `children_refs.len()`.
    pub num_children: usize,
    /// Level-below members: item indices at level 0, node ids above.
    pub children_refs: Vec<usize>,
}

impl ClusterNode {
    /// Create an unlabeled node shell from partition membership.
    pub fn shell(level: usize, node_id: usize, k_at_level: usize, children_refs: Vec<usize>) -> Self {
        Self {
            level,
            node_id,
            parent_id: None,
            k_at_level,
            label: String::new(),
            description: String::new(),
            description_embedding: None,
            num_children: children_refs.len(),
            children_refs,
        }
    }

    /// Record the enclosing node once the parent level exists.
    ///
    /// A node's parent is set at most once; a second call is an internal
    /// invariant violation.
    pub fn set_parent(&mut self, parent_id: usize) -> Result<()> {
        if let Some(existing) = self.parent_id {
            return Err(Error::Internal(format!(
                "parent of node {}/{} already set to {}",
                self.level, self.node_id, existing
            )));
        }
        self.parent_id = Some(parent_id);
        Ok(())
    }
}

/// Resolved hierarchy slot for one level of one row.
#[derive(Debug, Clone, PartialEq)]
pub struct LevelRef {
    pub node_id: usize,
    pub label: String,
}

/// Per-original-row projection of the finished hierarchy.
///
/// `levels[l]` is `None` when the row could not be resolved at level `l`
/// (no valid vector, or a missing hop further down).
#[derive(Debug, Clone)]
pub struct Assignment {
    pub topic_index: usize,
    pub levels: Vec<Option<LevelRef>>,
}

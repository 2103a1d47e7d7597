//! Per-row assignment projection.
//!
//! Inverts each level's membership lists into child-to-parent maps, then
//! resolves every original input row hop by hop (item → L0 → L1 → ...).
//! Resolution stops at the first missing hop, leaving the remaining levels
//! empty; rows excluded for an invalid vector resolve nowhere.

use std::collections::HashMap;

use taxon_core::{Assignment, ClusterNode, LevelRef};

/// Project the finished node set onto the original rows.
///
/// `n_rows` is the original row count; `valid_indices[f]` is the original
/// row index of filtered item `f` (level-0 `children_refs` hold filtered
/// indices). `n_levels` fixes the length of every assignment's level list.
pub fn build_assignments(
    nodes: &[ClusterNode],
    n_rows: usize,
    valid_indices: &[usize],
    n_levels: usize,
) -> Vec<Assignment> {
    let labels: HashMap<(usize, usize), &str> = nodes
        .iter()
        .map(|n| ((n.level, n.node_id), n.label.as_str()))
        .collect();

    // Original row -> level-0 node, via the filtered-index indirection.
    let mut row_to_l0: HashMap<usize, usize> = HashMap::new();
    for node in nodes.iter().filter(|n| n.level == 0) {
        for &filtered_idx in &node.children_refs {
            if let Some(&original_idx) = valid_indices.get(filtered_idx) {
                row_to_l0.insert(original_idx, node.node_id);
            }
        }
    }

    // Child node -> parent node, per level, from the back-linked parent ids.
    let mut parent_maps: Vec<HashMap<usize, usize>> = vec![HashMap::new(); n_levels];
    for node in nodes {
        if let Some(parent_id) = node.parent_id {
            parent_maps[node.level].insert(node.node_id, parent_id);
        }
    }

    (0..n_rows)
        .map(|row| {
            let mut levels: Vec<Option<LevelRef>> = Vec::with_capacity(n_levels);
            let mut current = row_to_l0.get(&row).copied();
            for level in 0..n_levels {
                match current {
                    Some(node_id) => {
                        let label = labels
                            .get(&(level, node_id))
                            .map(|l| l.to_string())
                            .unwrap_or_default();
                        levels.push(Some(LevelRef { node_id, label }));
                        current = parent_maps[level].get(&node_id).copied();
                    }
                    None => levels.push(None),
                }
            }
            Assignment {
                topic_index: row,
                levels,
            }
        })
        .collect()
}

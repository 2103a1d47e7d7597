//! Tabular input and output artifacts.
//!
//! Input is a CSV with a text column and an embedding column whose cells are
//! empty, `null`, or a JSON array of floats. Rows with unparseable cells are
//! excluded from clustering but preserved in the augmented output. All
//! artifacts are written once, at the very end of a successful run.

use std::collections::HashMap;
use std::path::Path;

use tracing::{info, warn};

use taxon_core::{Assignment, ClusterNode, Error, Item, Result, Vector};

/// Original table contents, kept for the augmented output.
#[derive(Debug)]
pub struct InputTable {
    pub headers: csv::StringRecord,
    pub rows: Vec<csv::StringRecord>,
}

/// Result of loading the input CSV.
#[derive(Debug)]
pub struct LoadedInput {
    pub table: InputTable,
    /// One item per row, in row order; `embedding` is `None` for rows whose
    /// cell failed to parse.
    pub items: Vec<Item>,
    /// Original row index of each valid item, in filtered order.
    pub valid_indices: Vec<usize>,
}

/// Load the input table, parsing the embedding column.
pub fn load_input(path: &Path, text_col: &str, embed_col: &str) -> Result<LoadedInput> {
    let mut reader = csv::Reader::from_path(path)?;
    let headers = reader.headers()?.clone();

    let text_idx = column_index(&headers, text_col)?;
    let embed_idx = column_index(&headers, embed_col)?;

    let mut rows = Vec::new();
    let mut items = Vec::new();
    let mut valid_indices = Vec::new();

    for (index, record) in reader.records().enumerate() {
        let record = record?;
        let text = record.get(text_idx).unwrap_or("").to_string();
        let embedding = parse_embedding_cell(record.get(embed_idx).unwrap_or(""));
        if embedding.is_some() {
            valid_indices.push(index);
        }
        items.push(Item {
            index,
            text,
            embedding,
        });
        rows.push(record);
    }

    if valid_indices.is_empty() {
        return Err(Error::InvalidInput(format!(
            "no parseable embedding vectors in column '{}'",
            embed_col
        )));
    }
    if valid_indices.len() < items.len() {
        warn!(
            total = items.len(),
            valid = valid_indices.len(),
            "Some rows lack a parseable embedding and will not be clustered"
        );
    }
    info!(
        total = items.len(),
        valid = valid_indices.len(),
        "Loaded input table"
    );

    Ok(LoadedInput {
        table: InputTable { headers, rows },
        items,
        valid_indices,
    })
}

fn column_index(headers: &csv::StringRecord, name: &str) -> Result<usize> {
    headers
        .iter()
        .position(|h| h == name)
        .ok_or_else(|| Error::InvalidInput(format!("Column '{}' not found in input", name)))
}

/// Parse one embedding cell: empty and `null` markers yield `None`, as does
/// anything that is not a non-empty JSON array of floats.
fn parse_embedding_cell(cell: &str) -> Option<Vector> {
    let cell = cell.trim();
    if cell.is_empty() || cell == "null" {
        return None;
    }
    serde_json::from_str::<Vector>(cell)
        .ok()
        .filter(|v| !v.is_empty())
}

/// Write the nodes table, sorted by (level, node_id).
pub fn write_nodes(path: &Path, nodes: &[ClusterNode]) -> Result<()> {
    let mut writer = csv::Writer::from_path(path)?;
    writer.write_record([
        "level",
        "node_id",
        "parent_id",
        "k_at_level",
        "label",
        "description",
        "description_embedding_json",
        "num_children",
        "children_ref_json",
    ])?;

    let mut sorted: Vec<&ClusterNode> = nodes.iter().collect();
    sorted.sort_by_key(|n| (n.level, n.node_id));

    for node in sorted {
        let embedding_json = match &node.description_embedding {
            Some(v) => serde_json::to_string(v)?,
            None => "null".to_string(),
        };
        writer.write_record([
            node.level.to_string(),
            node.node_id.to_string(),
            node.parent_id.map(|p| p.to_string()).unwrap_or_default(),
            node.k_at_level.to_string(),
            node.label.clone(),
            node.description.clone(),
            embedding_json,
            node.num_children.to_string(),
            serde_json::to_string(&node.children_refs)?,
        ])?;
    }
    writer.flush()?;
    info!(path = %path.display(), node_count = nodes.len(), "Wrote nodes table");
    Ok(())
}

/// Write the per-row assignments table.
pub fn write_assignments(path: &Path, assignments: &[Assignment], n_levels: usize) -> Result<()> {
    let mut writer = csv::Writer::from_path(path)?;

    let mut headers = vec!["topic_index".to_string()];
    for level in 0..n_levels {
        headers.push(format!("cluster_L{}_id", level));
        headers.push(format!("cluster_L{}_label", level));
    }
    writer.write_record(&headers)?;

    for assignment in assignments {
        let mut record = vec![assignment.topic_index.to_string()];
        for level in 0..n_levels {
            match assignment.levels.get(level).and_then(|l| l.as_ref()) {
                Some(level_ref) => {
                    record.push(level_ref.node_id.to_string());
                    record.push(level_ref.label.clone());
                }
                None => {
                    record.push(String::new());
                    record.push(String::new());
                }
            }
        }
        writer.write_record(&record)?;
    }
    writer.flush()?;
    info!(path = %path.display(), row_count = assignments.len(), "Wrote assignments table");
    Ok(())
}

/// Write the original rows with hierarchy columns appended.
pub fn write_augmented(
    path: &Path,
    table: &InputTable,
    nodes: &[ClusterNode],
    assignments: &[Assignment],
    n_levels: usize,
) -> Result<()> {
    let lookup: HashMap<(usize, usize), &ClusterNode> = nodes
        .iter()
        .map(|n| ((n.level, n.node_id), n))
        .collect();

    let mut writer = csv::Writer::from_path(path)?;

    let mut headers: Vec<String> = table.headers.iter().map(|h| h.to_string()).collect();
    for level in 0..n_levels {
        headers.push(format!("L{}_cluster_id", level));
        headers.push(format!("L{}_cluster_label", level));
        headers.push(format!("L{}_cluster_description", level));
        headers.push(format!("L{}_cluster_description_embedding", level));
    }
    writer.write_record(&headers)?;

    for (row, assignment) in table.rows.iter().zip(assignments) {
        let mut record: Vec<String> = row.iter().map(|f| f.to_string()).collect();
        for level in 0..n_levels {
            let node = assignment
                .levels
                .get(level)
                .and_then(|l| l.as_ref())
                .and_then(|l| lookup.get(&(level, l.node_id)));
            match node {
                Some(node) => {
                    record.push(node.node_id.to_string());
                    record.push(node.label.clone());
                    record.push(node.description.clone());
                    record.push(match &node.description_embedding {
                        Some(v) => serde_json::to_string(v)?,
                        None => String::new(),
                    });
                }
                None => record.extend([String::new(), String::new(), String::new(), String::new()]),
            }
        }
        writer.write_record(&record)?;
    }
    writer.flush()?;
    info!(path = %path.display(), row_count = table.rows.len(), "Wrote augmented table");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write as _;

    fn write_temp_csv(content: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file
    }

    #[test]
    fn test_parse_embedding_cell_variants() {
        assert_eq!(parse_embedding_cell(""), None);
        assert_eq!(parse_embedding_cell("null"), None);
        assert_eq!(parse_embedding_cell("  "), None);
        assert_eq!(parse_embedding_cell("not json"), None);
        assert_eq!(parse_embedding_cell("[]"), None);
        assert_eq!(parse_embedding_cell("[0.5, 1.5]"), Some(vec![0.5, 1.5]));
    }

    #[test]
    fn test_load_input_filters_invalid_rows() {
        let file = write_temp_csv(
            "Topic,Topic_Embedding\n\
             refunds,\"[0.1, 0.2]\"\n\
             broken,null\n\
             logins,\"[0.3, 0.4]\"\n",
        );
        let loaded = load_input(file.path(), "Topic", "Topic_Embedding").unwrap();

        assert_eq!(loaded.items.len(), 3);
        assert_eq!(loaded.valid_indices, vec![0, 2]);
        assert!(loaded.items[1].embedding.is_none());
        assert_eq!(loaded.items[2].text, "logins");
    }

    #[test]
    fn test_load_input_missing_column_is_error() {
        let file = write_temp_csv("Topic,Other\nx,y\n");
        let err = load_input(file.path(), "Topic", "Topic_Embedding").unwrap_err();
        assert!(matches!(err, Error::InvalidInput(_)));
    }

    #[test]
    fn test_load_input_no_valid_vectors_is_error() {
        let file = write_temp_csv("Topic,Topic_Embedding\na,null\nb,\n");
        let err = load_input(file.path(), "Topic", "Topic_Embedding").unwrap_err();
        assert!(matches!(err, Error::InvalidInput(_)));
    }

    #[test]
    fn test_write_nodes_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nodes.csv");

        let mut node = ClusterNode::shell(0, 1, 2, vec![3, 4]);
        node.label = "Payments".into();
        node.description = "Payment problems.".into();
        node.description_embedding = Some(vec![0.5]);
        node.parent_id = Some(0);
        let root = ClusterNode::shell(1, 0, 1, vec![1]);

        write_nodes(&path, &[root, node]).unwrap();

        let mut reader = csv::Reader::from_path(&path).unwrap();
        let rows: Vec<csv::StringRecord> = reader.records().map(|r| r.unwrap()).collect();
        assert_eq!(rows.len(), 2);
        // Sorted by (level, node_id): the level-0 node comes first.
        assert_eq!(&rows[0][0], "0");
        assert_eq!(&rows[0][2], "0", "parent_id");
        assert_eq!(&rows[0][4], "Payments");
        assert_eq!(&rows[0][6], "[0.5]");
        assert_eq!(&rows[0][8], "[3,4]");
        assert_eq!(&rows[1][2], "", "root has blank parent");
        assert_eq!(&rows[1][6], "null", "root has no embedding");
    }
}

//! End-to-end pipeline scenarios over CSV fixtures and mock services.

mod common;

use std::path::PathBuf;
use std::sync::Arc;

use common::{fast_config, FailEmbed, FailGen, GoodGen, GridEmbed};
use taxon_pipeline::{run_clustering, OutputPaths};

/// Six topics forming two well-separated 2-D groups.
const TWO_GROUP_CSV: &str = "\
Topic,Topic_Embedding
refund request,\"[0.0, 0.1]\"
billing dispute,\"[0.1, 0.0]\"
invoice question,\"[0.05, 0.05]\"
password reset,\"[9.0, 9.1]\"
login failure,\"[9.1, 9.0]\"
account locked,\"[9.05, 9.05]\"
";

/// Eight topics forming four well-separated 2-D groups.
const FOUR_GROUP_CSV: &str = "\
Topic,Topic_Embedding
refund request,\"[0.0, 0.1]\"
billing dispute,\"[0.1, 0.0]\"
password reset,\"[9.0, 0.1]\"
login failure,\"[9.1, 0.0]\"
shipping delay,\"[0.0, 9.1]\"
lost package,\"[0.1, 9.0]\"
feature request,\"[9.0, 9.1]\"
integration help,\"[9.1, 9.0]\"
";

struct Fixture {
    _dir: tempfile::TempDir,
    input: PathBuf,
    outputs: OutputPaths,
}

fn fixture(csv: &str, augmented: bool) -> Fixture {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("input.csv");
    std::fs::write(&input, csv).unwrap();
    let outputs = OutputPaths {
        nodes: dir.path().join("nodes.csv"),
        assignments: dir.path().join("assignments.csv"),
        augmented: augmented.then(|| dir.path().join("augmented.csv")),
    };
    Fixture {
        _dir: dir,
        input,
        outputs,
    }
}

fn read_rows(path: &std::path::Path) -> (csv::StringRecord, Vec<csv::StringRecord>) {
    let mut reader = csv::Reader::from_path(path).unwrap();
    let headers = reader.headers().unwrap().clone();
    let rows = reader.records().map(|r| r.unwrap()).collect();
    (headers, rows)
}

#[tokio::test(start_paused = true)]
async fn test_single_level_two_groups() {
    let fx = fixture(TWO_GROUP_CSV, false);

    let summary = run_clustering(
        &fx.input,
        "Topic",
        "Topic_Embedding",
        &fx.outputs,
        fast_config(vec![2]),
        Arc::new(GoodGen::new()),
        Arc::new(GridEmbed::new(2)),
    )
    .await
    .unwrap();

    assert_eq!(summary.total_rows, 6);
    assert_eq!(summary.valid_rows, 6);
    assert_eq!(summary.nodes_per_level, vec![2]);

    let (_, rows) = read_rows(&fx.outputs.nodes);
    assert_eq!(rows.len(), 2);

    // Combined children cover item indices 0-5 exactly once.
    let mut covered: Vec<usize> = rows
        .iter()
        .flat_map(|r| serde_json::from_str::<Vec<usize>>(&r[8]).unwrap())
        .collect();
    covered.sort_unstable();
    assert_eq!(covered, vec![0, 1, 2, 3, 4, 5]);

    for row in &rows {
        assert!(!row[4].is_empty(), "label must be non-empty");
        assert_eq!(&row[2], "", "single level: every node is a root");
        assert_eq!(&row[6], "null", "top level is never re-embedded");
        assert_eq!(
            row[7].parse::<usize>().unwrap(),
            serde_json::from_str::<Vec<usize>>(&row[8]).unwrap().len(),
            "num_children matches children_refs"
        );
    }
}

#[tokio::test(start_paused = true)]
async fn test_three_level_hierarchy_links_and_artifacts() {
    let fx = fixture(FOUR_GROUP_CSV, true);

    let summary = run_clustering(
        &fx.input,
        "Topic",
        "Topic_Embedding",
        &fx.outputs,
        fast_config(vec![4, 2, 1]),
        Arc::new(GoodGen::new()),
        Arc::new(GridEmbed::new(2)),
    )
    .await
    .unwrap();

    assert_eq!(summary.nodes_per_level, vec![4, 2, 1]);

    let (_, rows) = read_rows(&fx.outputs.nodes);
    assert_eq!(rows.len(), 7);

    for row in &rows {
        let level: usize = row[0].parse().unwrap();
        if level < 2 {
            assert!(!row[2].is_empty(), "level {} node has a parent", level);
            assert_ne!(&row[6], "null", "level {} node is embedded", level);
        } else {
            assert!(row[2].is_empty(), "top-level node has no parent");
            assert_eq!(&row[6], "null");
        }
    }

    // Augmented output: every original row gains resolved hierarchy columns.
    let (headers, augmented) = read_rows(fx.outputs.augmented.as_ref().unwrap());
    assert_eq!(augmented.len(), 8);
    let l2_label_idx = headers.iter().position(|h| h == "L2_cluster_label").unwrap();
    for row in &augmented {
        assert!(!row[l2_label_idx].is_empty(), "all rows resolve to the single root");
    }
}

#[tokio::test(start_paused = true)]
async fn test_labeling_failure_degrades_to_fallback() {
    let fx = fixture(TWO_GROUP_CSV, false);

    let summary = run_clustering(
        &fx.input,
        "Topic",
        "Topic_Embedding",
        &fx.outputs,
        fast_config(vec![2]),
        Arc::new(FailGen),
        Arc::new(GridEmbed::new(2)),
    )
    .await
    .expect("labeling failures must not abort the run");

    assert_eq!(summary.nodes_per_level, vec![2]);

    let (_, rows) = read_rows(&fx.outputs.nodes);
    for row in &rows {
        let node_id = &row[1];
        assert_eq!(&row[4], &format!("Cluster {}", node_id), "synthetic fallback label");
    }
}

#[tokio::test(start_paused = true)]
async fn test_embedding_failure_aborts_without_artifacts() {
    let fx = fixture(TWO_GROUP_CSV, true);

    // Two levels: level 0 requires description embeddings, which always fail.
    let result = run_clustering(
        &fx.input,
        "Topic",
        "Topic_Embedding",
        &fx.outputs,
        fast_config(vec![2, 1]),
        Arc::new(GoodGen::new()),
        Arc::new(FailEmbed),
    )
    .await;

    assert!(result.is_err(), "embedding failure is fatal to the run");
    assert!(!fx.outputs.nodes.exists(), "no nodes artifact on failure");
    assert!(!fx.outputs.assignments.exists());
    assert!(!fx.outputs.augmented.as_ref().unwrap().exists());
}

#[tokio::test(start_paused = true)]
async fn test_invalid_row_preserved_with_blank_assignment() {
    let csv = "\
Topic,Topic_Embedding
refund request,\"[0.0, 0.1]\"
garbled row,null
login failure,\"[9.0, 9.1]\"
";
    let fx = fixture(csv, false);

    let summary = run_clustering(
        &fx.input,
        "Topic",
        "Topic_Embedding",
        &fx.outputs,
        fast_config(vec![2]),
        Arc::new(GoodGen::new()),
        Arc::new(GridEmbed::new(2)),
    )
    .await
    .unwrap();

    assert_eq!(summary.total_rows, 3);
    assert_eq!(summary.valid_rows, 2);

    let (_, rows) = read_rows(&fx.outputs.assignments);
    assert_eq!(rows.len(), 3, "one assignment row per original row");

    // Row 1 had no parseable vector: blank at every level.
    assert_eq!(&rows[1][1], "");
    assert_eq!(&rows[1][2], "");

    // The valid rows resolve to level-0 nodes with labels.
    for idx in [0, 2] {
        assert!(!rows[idx][1].is_empty(), "row {} has an L0 id", idx);
        assert!(!rows[idx][2].is_empty(), "row {} has an L0 label", idx);
    }

    // The two valid rows land in the two separated clusters.
    assert_ne!(rows[0][1], rows[2][1]);
}

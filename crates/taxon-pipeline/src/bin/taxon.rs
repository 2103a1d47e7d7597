//! Taxon pipeline runner.
//!
//! Builds a multi-level topic taxonomy from a CSV of texts and embeddings.
//!
//! Usage:
//!   cargo run --bin taxon -- --input topics.csv
//!   cargo run --bin taxon -- --input topics.csv --ks 50,25,5 --augmented-out out.csv
//!
//! Service configuration comes from the environment (see `--help`); a .env
//! file in the working directory is loaded automatically.

use std::env;
use std::path::PathBuf;
use std::sync::Arc;

use taxon_inference::openai::OpenAIBackend;
use taxon_pipeline::config::parse_level_ks;
use taxon_pipeline::{run_clustering, OutputPaths, RunConfig};

#[derive(Debug)]
struct Args {
    input: Option<PathBuf>,
    nodes_out: PathBuf,
    assignments_out: PathBuf,
    augmented_out: Option<PathBuf>,
    text_col: String,
    embed_col: String,
    ks: Option<String>,
}

impl Default for Args {
    fn default() -> Self {
        Self {
            input: None,
            nodes_out: PathBuf::from("cluster_hierarchy_nodes.csv"),
            assignments_out: PathBuf::from("cluster_assignments_levels.csv"),
            augmented_out: None,
            text_col: "Topic".to_string(),
            embed_col: "Topic_Embedding".to_string(),
            ks: None,
        }
    }
}

fn parse_args() -> Args {
    let args: Vec<String> = env::args().collect();
    let mut result = Args::default();

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--input" | "-i" => {
                i += 1;
                if i < args.len() {
                    result.input = Some(PathBuf::from(&args[i]));
                }
            }
            "--nodes-out" => {
                i += 1;
                if i < args.len() {
                    result.nodes_out = PathBuf::from(&args[i]);
                }
            }
            "--assignments-out" => {
                i += 1;
                if i < args.len() {
                    result.assignments_out = PathBuf::from(&args[i]);
                }
            }
            "--augmented-out" => {
                i += 1;
                if i < args.len() {
                    result.augmented_out = Some(PathBuf::from(&args[i]));
                }
            }
            "--text-col" => {
                i += 1;
                if i < args.len() {
                    result.text_col = args[i].clone();
                }
            }
            "--embed-col" => {
                i += 1;
                if i < args.len() {
                    result.embed_col = args[i].clone();
                }
            }
            "--ks" | "-k" => {
                i += 1;
                if i < args.len() {
                    result.ks = Some(args[i].clone());
                }
            }
            "--help" | "-h" => {
                print_help();
                std::process::exit(0);
            }
            other => {
                eprintln!("Unknown argument: {}", other);
                print_help();
                std::process::exit(2);
            }
        }
        i += 1;
    }

    result
}

fn print_help() {
    println!(
        "taxon - hierarchical topic taxonomy builder

USAGE:
    taxon --input <CSV> [OPTIONS]

OPTIONS:
    -i, --input <PATH>          Input CSV with text and embedding columns (required)
        --nodes-out <PATH>      Nodes table output [default: cluster_hierarchy_nodes.csv]
        --assignments-out <PATH> Assignments table output [default: cluster_assignments_levels.csv]
        --augmented-out <PATH>  Optional augmented copy of the input with hierarchy columns
        --text-col <NAME>       Text column name [default: Topic]
        --embed-col <NAME>      Embedding column name [default: Topic_Embedding]
    -k, --ks <LIST>             Cluster counts per level, finest first (e.g. 50,25,5)
    -h, --help                  Show this help

ENVIRONMENT:
    TAXON_GEN_BASE_URL / TAXON_GEN_API_KEY / TAXON_GEN_MODEL        generation service
    TAXON_EMBED_BASE_URL / TAXON_EMBED_API_KEY / TAXON_EMBED_MODEL  embedding service
    TAXON_LEVEL_KS, TAXON_RANDOM_SEED, TAXON_LABEL_CONCURRENCY,
    TAXON_EMBED_CONCURRENCY, TAXON_EMBED_BATCH_SIZE,
    TAXON_MAX_RETRIES, TAXON_BASE_DELAY_MS, TAXON_MAX_DELAY_MS      run configuration
    RUST_LOG                                                        log filter [default: taxon=info]"
    );
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "taxon=info".into());
    tracing_subscriber::fmt().with_env_filter(env_filter).init();

    let args = parse_args();
    let input = args.input.unwrap_or_else(|| {
        eprintln!("Missing required --input argument");
        print_help();
        std::process::exit(2);
    });

    let mut config = RunConfig::from_env()?;
    if let Some(ks) = &args.ks {
        config.level_ks = parse_level_ks(ks)?;
        config.validate()?;
    }

    let gen_backend = Arc::new(OpenAIBackend::generation_from_env()?);
    let embed_backend = Arc::new(OpenAIBackend::embedding_from_env()?);

    let outputs = OutputPaths {
        nodes: args.nodes_out,
        assignments: args.assignments_out,
        augmented: args.augmented_out,
    };

    let summary = run_clustering(
        &input,
        &args.text_col,
        &args.embed_col,
        &outputs,
        config,
        gen_backend,
        embed_backend,
    )
    .await?;

    println!("Clustering complete:");
    println!("  rows: {} total, {} clustered", summary.total_rows, summary.valid_rows);
    for (level, count) in summary.nodes_per_level.iter().enumerate() {
        println!("  level {}: {} nodes", level, count);
    }
    Ok(())
}

//! synprov CLI
//!
//! - `export`: walk projects in the data repository and write their
//!   provenance graph as `{"vertices": [...], "edges": [...]}`
//! - `stage`: turn an exported graph into `vertices.csv` / `edges.csv`
//! - `load`: bulk-load an exported graph into Neo4j

use anyhow::{anyhow, Context, Result};
use clap::{Args, Parser, Subcommand};
use colored::Colorize;
use std::path::PathBuf;
use tracing::Level;

mod export;
mod load;

#[derive(Parser)]
#[command(name = "synprov")]
#[command(author, version, about = "Export data-repository provenance as a property graph")]
struct Cli {
    /// Verbose (debug-level) logging
    #[arg(long, global = true)]
    debug: bool,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Fetch entities and provenance and write the graph document.
    Export(ExportArgs),

    /// Write CSV staging tables for an exported graph.
    Stage {
        /// Exported graph JSON
        graph: PathBuf,
        /// Vertex table
        #[arg(long, default_value = "vertices.csv")]
        node_csv: PathBuf,
        /// Edge table
        #[arg(long, default_value = "edges.csv")]
        edge_csv: PathBuf,
    },

    /// Load an exported graph into Neo4j.
    Load {
        /// Exported graph JSON
        graph: PathBuf,
        #[command(flatten)]
        neo4j: Neo4jArgs,
    },
}

#[derive(Args)]
pub struct ExportArgs {
    /// Project ids to export; none (or `all`) exports every visible project
    projects: Vec<String>,
    /// Output file (stdout when omitted)
    #[arg(short, long)]
    out: Option<PathBuf>,
    /// Concurrent repository requests
    #[arg(short, long, default_value_t = synprov_ingest::DEFAULT_WORKERS)]
    workers: usize,
    /// Additional project ids to skip when exporting all projects
    /// (ids named explicitly are always exported)
    #[arg(long = "skip")]
    skip: Vec<String>,
    /// Personal access token (defaults to SYNAPSE_AUTH_TOKEN)
    #[arg(long)]
    auth_token: Option<String>,
    /// Repository REST endpoint (defaults to SYNAPSE_BASE_URL or production)
    #[arg(long)]
    base_url: Option<String>,
    /// Load the result into Neo4j after writing it
    #[arg(long)]
    load: bool,
    #[command(flatten)]
    neo4j: Neo4jArgs,
}

#[derive(Args)]
pub struct Neo4jArgs {
    /// Neo4j credentials JSON (defaults to ~/credentials.json)
    #[arg(long)]
    credentials: Option<PathBuf>,
    /// Rows per load statement
    #[arg(long)]
    batch_size: Option<usize>,
    /// Drop `_id` constraints and properties after loading
    #[arg(long)]
    strip_ids: bool,
}

fn init_logging(debug: bool) {
    let level = if debug { Level::DEBUG } else { Level::INFO };
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .init();
}

fn runtime() -> Result<tokio::runtime::Runtime> {
    tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .map_err(|e| anyhow!("failed to initialize tokio runtime: {e}"))
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.debug);

    match cli.command {
        Commands::Export(args) => {
            let rt = runtime()?;
            rt.block_on(export::run(args))?;
        }
        Commands::Stage {
            graph,
            node_csv,
            edge_csv,
        } => {
            let doc = load::read_graph(&graph)?;
            let (vertices, edges) = synprov_neo4j::write_staging(&doc, &node_csv, &edge_csv)
                .context("failed to write staging tables")?;
            let tables = synprov_neo4j::read_staging(&node_csv, &edge_csv)
                .context("failed to read back staging tables")?;
            let dangling = tables.dangling_endpoints();
            if let Some((row, endpoint)) = dangling.first() {
                return Err(anyhow!(
                    "{} edge endpoint(s) have no vertex (first: row {row}, `{endpoint}`)",
                    dangling.len()
                ));
            }
            eprintln!(
                "{} {} ({vertices} vertices), {} ({edges} edges)",
                "wrote".green().bold(),
                node_csv.display().to_string().bold(),
                edge_csv.display().to_string().bold(),
            );
        }
        Commands::Load { graph, neo4j } => {
            let doc = load::read_graph(&graph)?;
            let rt = runtime()?;
            rt.block_on(load::run(&doc, &neo4j))?;
        }
    }
    Ok(())
}

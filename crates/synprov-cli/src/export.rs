//! `synprov export`

use crate::{load, ExportArgs};
use anyhow::{Context, Result};
use colored::Colorize;
use std::fs::File;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use synprov_ingest::{ExportOptions, ExportPipeline, ExportStats, ProjectSelection};
use synprov_model::GraphDocument;
use synprov_repo::{SynapseClient, SynapseConfig};

/// Where the graph document goes. Files are created before any fetching.
enum Output {
    File(PathBuf, File),
    Stdout,
}

impl Output {
    fn open(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => {
                let file = File::create(path)
                    .with_context(|| format!("cannot write output {}", path.display()))?;
                Ok(Output::File(path.to_path_buf(), file))
            }
            None => Ok(Output::Stdout),
        }
    }

    fn write(self, doc: &GraphDocument) -> Result<()> {
        match self {
            Output::File(path, file) => {
                doc.write_to(file)
                    .with_context(|| format!("failed to write {}", path.display()))?;
                eprintln!("{} {}", "wrote".green().bold(), path.display().to_string().bold());
            }
            Output::Stdout => doc
                .write_to(std::io::stdout().lock())
                .context("failed to write graph to stdout")?,
        }
        Ok(())
    }
}

pub async fn run(args: ExportArgs) -> Result<()> {
    let output = Output::open(args.out.as_deref())?;

    let mut config = SynapseConfig::from_env().with_auth_token(args.auth_token);
    if let Some(base_url) = args.base_url {
        config.base_url = base_url;
    }
    let client = SynapseClient::new(config).context("invalid repository configuration")?;
    client
        .verify()
        .await
        .context("the repository rejected the auth token")?;

    let options = ExportOptions::default()
        .with_workers(args.workers)
        .skipping(args.skip);
    let pipeline = ExportPipeline::new(Arc::new(client), options);
    let report = pipeline
        .run(ProjectSelection::from_args(args.projects))
        .await
        .context("export failed")?;

    let doc = report.graph.to_document();
    output.write(&doc)?;
    print_summary(&report.stats, doc.vertices.len(), doc.edges.len());

    if args.load {
        load::run(&doc, &args.neo4j).await?;
    }
    Ok(())
}

fn print_summary(stats: &ExportStats, vertices: usize, edges: usize) {
    eprintln!(
        "{} {} project(s), {} entities, {:.2}% with provenance",
        "ok".green().bold(),
        stats.projects,
        stats.entities,
        stats.provenance_percentage()
    );
    eprintln!("   {vertices} vertices, {edges} edges");
    if stats.failed_projects > 0 {
        eprintln!(
            "{} {} project(s) could not be listed",
            "warn:".yellow().bold(),
            stats.failed_projects
        );
    }
    let skipped = stats.build.skipped_references + stats.build.unresolved_inputs;
    if skipped > 0 {
        eprintln!(
            "{} {skipped} input reference(s) skipped (malformed or unresolvable)",
            "info:".yellow().bold()
        );
    }
}

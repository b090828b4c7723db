//! `synprov load` and the Neo4j half of `export --load`.

use crate::Neo4jArgs;
use anyhow::{Context, Result};
use colored::Colorize;
use std::path::Path;
use synprov_model::GraphDocument;
use synprov_neo4j::{Loader, Neo4jConfig, Neo4jSink};

pub fn read_graph(path: &Path) -> Result<GraphDocument> {
    GraphDocument::read_from(path).with_context(|| format!("failed to read graph {}", path.display()))
}

pub async fn run(doc: &GraphDocument, args: &Neo4jArgs) -> Result<()> {
    let mut config =
        Neo4jConfig::load(args.credentials.as_deref()).context("failed to load Neo4j credentials")?;
    if let Some(batch_size) = args.batch_size {
        config = config.with_batch_size(batch_size);
    }

    let sink = Neo4jSink::connect(&config)
        .await
        .with_context(|| format!("failed to connect to {}", config.uri))?;
    let loader = Loader::new(sink).with_batch_size(config.batch_size);
    let report = loader.load(doc).await.context("Neo4j load failed")?;
    eprintln!(
        "{} loaded {} entities, {} activities, {} relationships into {}",
        "ok".green().bold(),
        report.entities,
        report.activities,
        report.relationships,
        config.uri.bold()
    );

    if args.strip_ids {
        loader.strip_ids().await.context("failed to strip _id properties")?;
        eprintln!("{} removed _id constraints and properties", "ok".green().bold());
    }
    Ok(())
}

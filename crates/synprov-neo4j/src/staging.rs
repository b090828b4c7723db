//! CSV staging tables.
//!
//! `vertices.csv` carries the union of every vertex's columns (sorted, `_id`
//! first); `edges.csv` carries one fixed set of edge columns. Missing values
//! are empty cells.

use crate::error::LoadError;
use crate::loader::EXCLUDED_NODE_COLUMNS;
use std::collections::{BTreeMap, BTreeSet, HashSet};
use std::path::Path;
use synprov_model::GraphDocument;
use tracing::info;

pub const EDGE_COLUMNS: [&str; 8] = [
    "_inV",
    "_outV",
    "_label",
    "createdBy",
    "createdOn",
    "modifiedBy",
    "modifiedOn",
    "wasExecuted",
];

pub type StagedRow = BTreeMap<String, String>;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StagedTables {
    pub vertices: Vec<StagedRow>,
    pub edges: Vec<StagedRow>,
}

impl StagedTables {
    /// `(row, endpoint)` for every edge endpoint with no matching vertex.
    pub fn dangling_endpoints(&self) -> Vec<(usize, String)> {
        let ids: HashSet<&str> = self
            .vertices
            .iter()
            .filter_map(|v| v.get("_id").map(String::as_str))
            .collect();
        let mut dangling = Vec::new();
        for (i, edge) in self.edges.iter().enumerate() {
            for column in ["_inV", "_outV"] {
                let endpoint = edge.get(column).map(String::as_str).unwrap_or_default();
                if !ids.contains(endpoint) {
                    dangling.push((i, endpoint.to_string()));
                }
            }
        }
        dangling
    }
}

/// Vertex header: `_id` then every other column, sorted.
pub fn vertex_columns(doc: &GraphDocument) -> Vec<String> {
    let mut names: BTreeSet<&str> = BTreeSet::new();
    for record in &doc.vertices {
        names.extend(record.keys().map(String::as_str));
    }
    names.remove("_id");
    for excluded in EXCLUDED_NODE_COLUMNS {
        names.remove(excluded);
    }
    std::iter::once("_id")
        .chain(names)
        .map(str::to_string)
        .collect()
}

/// Write both tables. Returns `(vertex rows, edge rows)`.
pub fn write_staging(
    doc: &GraphDocument,
    vertex_path: &Path,
    edge_path: &Path,
) -> Result<(usize, usize), LoadError> {
    let columns = vertex_columns(doc);
    let mut writer = csv::Writer::from_path(vertex_path)?;
    writer.write_record(&columns)?;
    for record in &doc.vertices {
        writer.write_record(columns.iter().map(|c| {
            record.get(c).map(|v| v.to_text()).unwrap_or_default()
        }))?;
    }
    writer.flush()?;

    let mut writer = csv::Writer::from_path(edge_path)?;
    writer.write_record(EDGE_COLUMNS)?;
    for edge in &doc.edges {
        let record = edge.to_record();
        writer.write_record(EDGE_COLUMNS.iter().map(|c| {
            record.get(*c).map(|v| v.to_text()).unwrap_or_default()
        }))?;
    }
    writer.flush()?;

    info!(
        vertices = doc.vertices.len(),
        edges = doc.edges.len(),
        nodes = %vertex_path.display(),
        relationships = %edge_path.display(),
        "staged graph"
    );
    Ok((doc.vertices.len(), doc.edges.len()))
}

pub fn read_staging(vertex_path: &Path, edge_path: &Path) -> Result<StagedTables, LoadError> {
    Ok(StagedTables {
        vertices: read_table(vertex_path)?,
        edges: read_table(edge_path)?,
    })
}

fn read_table(path: &Path) -> Result<Vec<StagedRow>, LoadError> {
    let mut reader = csv::Reader::from_path(path)?;
    let headers = reader.headers()?.clone();
    let mut rows = Vec::new();
    for record in reader.records() {
        let record = record?;
        rows.push(
            headers
                .iter()
                .zip(record.iter())
                .map(|(h, v)| (h.to_string(), v.to_string()))
                .collect(),
        );
    }
    Ok(rows)
}

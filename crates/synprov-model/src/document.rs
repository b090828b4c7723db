//! The in-memory graph and its flat export document.

use crate::edge::Edge;
use crate::error::ModelError;
use crate::scalar::{FlatRecord, Scalar};
use crate::vertex::Vertex;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fs;
use std::io::{BufReader, BufWriter, Read, Write};
use std::path::Path;

/// Output of one graph-construction run.
#[derive(Debug, Clone, Default)]
pub struct PropertyGraph {
    pub vertices: Vec<Vertex>,
    pub edges: Vec<Edge>,
}

impl PropertyGraph {
    pub fn vertex_keys(&self) -> HashSet<&str> {
        self.vertices.iter().map(Vertex::key).collect()
    }

    /// Edges naming a vertex that is not in the graph.
    pub fn dangling_edges(&self) -> Vec<&Edge> {
        let keys = self.vertex_keys();
        self.edges
            .iter()
            .filter(|e| !keys.contains(e.in_v.as_str()) || !keys.contains(e.out_v.as_str()))
            .collect()
    }

    pub fn activity_count(&self) -> usize {
        self.vertices.iter().filter(|v| v.is_activity()).count()
    }

    pub fn to_document(&self) -> GraphDocument {
        GraphDocument {
            vertices: self.vertices.iter().map(Vertex::to_record).collect(),
            edges: self.edges.clone(),
        }
    }
}

/// `{"vertices": [...], "edges": [...]}` with flat vertex and edge maps.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GraphDocument {
    pub vertices: Vec<FlatRecord>,
    pub edges: Vec<Edge>,
}

impl GraphDocument {
    pub fn from_reader<R: Read>(reader: R) -> Result<Self, ModelError> {
        Ok(serde_json::from_reader(reader)?)
    }

    pub fn read_from(path: &Path) -> Result<Self, ModelError> {
        let file = fs::File::open(path)?;
        Self::from_reader(BufReader::new(file))
    }

    /// Pretty-printed JSON, the format the loader and downstream tooling read.
    pub fn write_to<W: Write>(&self, writer: W) -> Result<(), ModelError> {
        let mut writer = BufWriter::new(writer);
        serde_json::to_writer_pretty(&mut writer, self)?;
        writer.write_all(b"\n")?;
        writer.flush()?;
        Ok(())
    }

    pub fn write_file(&self, path: &Path) -> Result<(), ModelError> {
        self.write_to(fs::File::create(path)?)
    }

    /// `_id` of a vertex record, rendered as text.
    pub fn vertex_id(record: &FlatRecord) -> Option<String> {
        record
            .get("_id")
            .filter(|v| !matches!(v, Scalar::Null))
            .map(Scalar::to_text)
    }

    pub fn dangling_edges(&self) -> Vec<&Edge> {
        let ids: HashSet<String> = self.vertices.iter().filter_map(Self::vertex_id).collect();
        self.edges
            .iter()
            .filter(|e| !ids.contains(&e.in_v) || !ids.contains(&e.out_v))
            .collect()
    }
}

//! Statement execution.

use crate::config::Neo4jConfig;
use crate::error::LoadError;
use async_trait::async_trait;
use neo4rs::{query, BoltList, BoltMap, BoltString, BoltType, ConfigBuilder, Graph};
use synprov_model::{FlatRecord, Scalar};
use tracing::debug;

/// One Cypher statement and the rows bound to `$rows` (none for schema
/// statements).
#[derive(Debug, Clone, PartialEq)]
pub struct Statement {
    pub cypher: String,
    pub rows: Vec<FlatRecord>,
}

impl Statement {
    pub fn bare(cypher: impl Into<String>) -> Self {
        Self {
            cypher: cypher.into(),
            rows: Vec::new(),
        }
    }

    pub fn with_rows(cypher: impl Into<String>, rows: Vec<FlatRecord>) -> Self {
        Self {
            cypher: cypher.into(),
            rows,
        }
    }
}

#[async_trait]
pub trait GraphSink: Send + Sync {
    async fn run(&self, statement: Statement) -> Result<(), LoadError>;
}

/// Executes statements against a live Neo4j instance.
pub struct Neo4jSink {
    graph: Graph,
}

impl Neo4jSink {
    pub async fn connect(config: &Neo4jConfig) -> Result<Self, LoadError> {
        let driver_config = ConfigBuilder::default()
            .uri(config.uri.as_str())
            .user(config.username.as_str())
            .password(config.password.as_str())
            .build()?;
        let graph = Graph::connect(driver_config).await?;
        Ok(Self { graph })
    }
}

#[async_trait]
impl GraphSink for Neo4jSink {
    async fn run(&self, statement: Statement) -> Result<(), LoadError> {
        debug!(cypher = %statement.cypher, rows = statement.rows.len(), "running statement");
        let mut q = query(&statement.cypher);
        if !statement.rows.is_empty() {
            q = q.param("rows", rows_param(&statement.rows));
        }
        self.graph.run(q).await?;
        Ok(())
    }
}

fn rows_param(rows: &[FlatRecord]) -> BoltType {
    let mut list = BoltList::new();
    for row in rows {
        let mut map = BoltMap::new();
        for (key, value) in row {
            // Neo4j does not store nulls.
            if let Some(value) = scalar_to_bolt(value) {
                map.put(BoltString::from(key.as_str()), value);
            }
        }
        list.push(BoltType::Map(map));
    }
    BoltType::List(list)
}

fn scalar_to_bolt(value: &Scalar) -> Option<BoltType> {
    match value {
        Scalar::Null => None,
        Scalar::Bool(b) => Some(BoltType::from(*b)),
        Scalar::Int(i) => Some(BoltType::from(*i)),
        Scalar::Float(f) => Some(BoltType::from(*f)),
        Scalar::Str(s) => Some(BoltType::from(s.as_str())),
    }
}

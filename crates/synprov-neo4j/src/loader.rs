//! Bulk load plan: schema, nodes per label, relationships per edge label.

use crate::config::DEFAULT_BATCH_SIZE;
use crate::cypher::{self, ACTIVITY_LABEL, ENTITY_LABEL};
use crate::error::LoadError;
use crate::sink::{GraphSink, Statement};
use synprov_model::keys::ACTIVITY_TYPE;
use synprov_model::{EdgeLabel, FlatRecord, GraphDocument, Scalar};
use tracing::info;

/// Vertex columns never sent to the database.
pub const EXCLUDED_NODE_COLUMNS: [&str; 2] = ["used", "description"];

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LoadReport {
    pub entities: usize,
    pub activities: usize,
    pub relationships: usize,
    pub statements: usize,
}

pub struct Loader<S: GraphSink> {
    sink: S,
    batch_size: usize,
}

impl<S: GraphSink> Loader<S> {
    pub fn new(sink: S) -> Self {
        Self {
            sink,
            batch_size: DEFAULT_BATCH_SIZE,
        }
    }

    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size.max(1);
        self
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }

    /// Load every vertex and edge of `doc`. Merges are keyed by `_id`, so
    /// loading the same document twice changes nothing.
    pub async fn load(&self, doc: &GraphDocument) -> Result<LoadReport, LoadError> {
        let mut report = LoadReport::default();

        info!("creating constraints");
        for cypher in cypher::schema_statements() {
            self.run(Statement::bare(cypher), &mut report).await?;
        }

        let (activities, entities) = partition_nodes(doc)?;
        report.entities = entities.len();
        report.activities = activities.len();
        info!(entities = entities.len(), activities = activities.len(), "loading nodes");
        self.run_batched(&cypher::merge_nodes(ENTITY_LABEL), entities, &mut report)
            .await?;
        self.run_batched(&cypher::merge_nodes(ACTIVITY_LABEL), activities, &mut report)
            .await?;

        for label in EdgeLabel::ALL {
            let rows: Vec<FlatRecord> = doc
                .edges
                .iter()
                .filter(|e| e.label == label)
                .map(|e| {
                    let mut row = e.to_record();
                    row.insert("action".into(), Scalar::from(label.as_str()));
                    row
                })
                .collect();
            if rows.is_empty() {
                continue;
            }
            info!(label = %label, edges = rows.len(), "loading relationships");
            report.relationships += rows.len();
            self.run_batched(&cypher::merge_edges(label), rows, &mut report)
                .await?;
        }

        info!(
            entities = report.entities,
            activities = report.activities,
            relationships = report.relationships,
            "load complete"
        );
        Ok(report)
    }

    /// Drop the `_id` constraints and properties once loading is finished.
    pub async fn strip_ids(&self) -> Result<usize, LoadError> {
        info!("removing _id properties");
        let mut report = LoadReport::default();
        for cypher in cypher::strip_id_statements() {
            self.run(Statement::bare(cypher), &mut report).await?;
        }
        Ok(report.statements)
    }

    async fn run_batched(
        &self,
        cypher: &str,
        rows: Vec<FlatRecord>,
        report: &mut LoadReport,
    ) -> Result<(), LoadError> {
        for chunk in rows.chunks(self.batch_size) {
            self.run(Statement::with_rows(cypher, chunk.to_vec()), report)
                .await?;
        }
        Ok(())
    }

    async fn run(&self, statement: Statement, report: &mut LoadReport) -> Result<(), LoadError> {
        self.sink.run(statement).await?;
        report.statements += 1;
        Ok(())
    }
}

/// Split vertex records into (activities, entities), dropping excluded
/// columns and nulls. Everything that is not an Activity loads as an Entity.
fn partition_nodes(doc: &GraphDocument) -> Result<(Vec<FlatRecord>, Vec<FlatRecord>), LoadError> {
    let mut activities = Vec::new();
    let mut entities = Vec::new();
    for (i, record) in doc.vertices.iter().enumerate() {
        if GraphDocument::vertex_id(record).is_none() {
            return Err(LoadError::MissingId(i));
        }
        let row: FlatRecord = record
            .iter()
            .filter(|(k, v)| !EXCLUDED_NODE_COLUMNS.contains(&k.as_str()) && !matches!(v, Scalar::Null))
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect();
        let is_activity = record.get("concreteType").and_then(Scalar::as_str) == Some(ACTIVITY_TYPE);
        if is_activity {
            activities.push(row);
        } else {
            entities.push(row);
        }
    }
    Ok((activities, entities))
}

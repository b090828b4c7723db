//! Getting an exported graph into Neo4j.
//!
//! ```text
//!  GraphDocument ──► staging (vertices.csv / edges.csv)
//!        │
//!        └─────────► Loader ──► Cypher statements ──► GraphSink (neo4rs)
//! ```
//!
//! The loader never talks to the driver directly: every statement goes
//! through a [`GraphSink`], so the whole load plan can be recorded and
//! inspected without a database.

pub mod config;
pub mod cypher;
pub mod error;
pub mod loader;
pub mod sink;
pub mod staging;

pub use config::{Neo4jConfig, DEFAULT_BATCH_SIZE};
pub use error::LoadError;
pub use loader::{LoadReport, Loader};
pub use sink::{GraphSink, Neo4jSink, Statement};
pub use staging::{read_staging, write_staging, StagedTables};

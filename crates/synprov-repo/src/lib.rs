//! Remote data-repository boundary.
//!
//! The pipeline only ever talks to a [`RepositoryClient`]. Two
//! implementations ship here:
//! - [`SynapseClient`]: the Synapse REST API over `reqwest`,
//! - [`InMemoryRepository`]: a fixture holding raw records in memory, used by
//!   tests and offline runs.
//!
//! Retry and backoff are deliberately absent: a failed call surfaces as a
//! [`RepoError`] and the caller decides whether the item is dropped.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;

pub mod memory;
pub mod synapse;

pub use memory::InMemoryRepository;
pub use synapse::{SynapseClient, SynapseConfig};

/// One entity listed under a project.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EntitySummary {
    pub id: String,
    pub benefactor_id: Option<String>,
}

/// One version of an entity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VersionInfo {
    pub id: String,
    pub version_number: i64,
}

#[derive(Debug, thiserror::Error)]
pub enum RepoError {
    #[error("not found: {0}")]
    NotFound(String),
    #[error("access denied: {0}")]
    Forbidden(String),
    #[error("HTTP {status}: {message}")]
    Http { status: u16, message: String },
    #[error("network error: {0}")]
    Network(String),
    #[error("invalid response: {0}")]
    InvalidResponse(String),
    #[error("invalid configuration: {0}")]
    Config(String),
}

impl RepoError {
    /// Not-found and access-denied are the expected "nothing here" answers.
    pub fn is_absent(&self) -> bool {
        matches!(self, RepoError::NotFound(_) | RepoError::Forbidden(_))
    }
}

/// Operations the export pipeline consumes.
#[async_trait]
pub trait RepositoryClient: Send + Sync {
    /// Every project visible to the caller.
    async fn list_projects(&self) -> Result<Vec<String>, RepoError>;

    /// File entities anywhere under `project_id`.
    async fn list_entities(&self, project_id: &str) -> Result<Vec<EntitySummary>, RepoError>;

    async fn list_versions(&self, entity_id: &str) -> Result<Vec<VersionInfo>, RepoError>;

    /// Raw entity record with annotation values merged into the top level.
    /// `None` asks for the current version.
    async fn get_entity(&self, id: &str, version: Option<i64>) -> Result<Value, RepoError>;

    /// Activity that generated `id` at `version`.
    async fn get_provenance(&self, id: &str, version: i64) -> Result<Value, RepoError>;

    async fn get_project_id(&self, id: &str) -> Result<String, RepoError>;

    async fn get_benefactor_id(&self, id: &str) -> Result<String, RepoError>;
}

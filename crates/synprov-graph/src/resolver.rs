use async_trait::async_trait;
use synprov_model::EntityVertex;

#[derive(Debug, thiserror::Error)]
pub enum ResolveError {
    #[error("{0}")]
    Unavailable(String),
    #[error("{id} is a container ({concrete_type}) and cannot be an input vertex")]
    Ignored { id: String, concrete_type: String },
}

/// Fetches and normalizes an entity referenced as an input but not part of
/// the fetched set. `version = None` means the current version.
#[async_trait]
pub trait EntityResolver: Send + Sync {
    async fn resolve(&self, target_id: &str, version: Option<i64>)
        -> Result<EntityVertex, ResolveError>;
}

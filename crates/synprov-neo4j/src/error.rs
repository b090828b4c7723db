use synprov_model::ModelError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum LoadError {
    #[error("credentials error: {0}")]
    Credentials(String),

    #[error("vertex record {0} has no _id")]
    MissingId(usize),

    #[error("neo4j error: {0}")]
    Neo4j(#[from] neo4rs::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error(transparent)]
    Model(#[from] ModelError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

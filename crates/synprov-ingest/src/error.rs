use synprov_model::ModelError;
use synprov_repo::RepoError;

#[derive(Debug, thiserror::Error)]
pub enum IngestError {
    #[error("repository error: {0}")]
    Repo(#[from] RepoError),

    #[error("malformed entity record: {0}")]
    Model(#[from] ModelError),

    #[error("lookup of {what} for {id} failed: {source}")]
    Lookup {
        what: &'static str,
        id: String,
        #[source]
        source: RepoError,
    },
}

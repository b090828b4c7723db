use thiserror::Error;

#[derive(Debug, Error)]
pub enum ModelError {
    #[error("record is not a JSON object")]
    NotAnObject,

    #[error("missing required field `{0}`")]
    MissingField(&'static str),

    #[error("field `{field}` has an unexpected value: {value}")]
    InvalidField { field: &'static str, value: String },

    #[error("unsupported used-reference type `{0}`")]
    UnsupportedReference(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

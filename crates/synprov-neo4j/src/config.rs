//! Neo4j connection settings.
//!
//! Read from a JSON credentials file shaped like
//!
//! ```json
//! { "machine": "graph.example.org", "username": "neo4j", "password": "..." }
//! ```
//!
//! (`uri` is accepted in place of `machine`), then overridden by
//! `NEO4J_URI`, `NEO4J_USER` and `NEO4J_PASSWORD` when those are set.

use crate::error::LoadError;
use serde::Deserialize;
use std::path::{Path, PathBuf};

pub const DEFAULT_BATCH_SIZE: usize = 1000;
const DEFAULT_PORT: u16 = 7687;

#[derive(Clone, PartialEq, Eq)]
pub struct Neo4jConfig {
    pub uri: String,
    pub username: String,
    pub password: String,
    /// Rows per `UNWIND` statement.
    pub batch_size: usize,
}

impl std::fmt::Debug for Neo4jConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Neo4jConfig")
            .field("uri", &self.uri)
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .field("batch_size", &self.batch_size)
            .finish()
    }
}

#[derive(Debug, Deserialize)]
struct CredentialsFile {
    #[serde(alias = "machine")]
    uri: String,
    username: String,
    password: String,
    #[serde(default)]
    batch_size: Option<usize>,
}

impl Neo4jConfig {
    /// `~/credentials.json`.
    pub fn default_credentials_path() -> Option<PathBuf> {
        dirs::home_dir().map(|home| home.join("credentials.json"))
    }

    /// Load `path` (or the default credentials file) and apply environment
    /// overrides. A missing file is fine when the environment supplies
    /// everything.
    pub fn load(path: Option<&Path>) -> Result<Self, LoadError> {
        let path = match path {
            Some(p) => Some(p.to_path_buf()),
            None => Self::default_credentials_path(),
        };
        let from_file = match path {
            Some(p) if p.exists() => Some(Self::from_file(&p)?),
            Some(p) if !env_complete() => {
                return Err(LoadError::Credentials(format!(
                    "{} not found and NEO4J_URI/NEO4J_USER/NEO4J_PASSWORD not set",
                    p.display()
                )))
            }
            _ => None,
        };
        from_file
            .unwrap_or_else(Self::empty)
            .with_overrides(|key| std::env::var(key).ok())
            .validated()
    }

    pub fn from_file(path: &Path) -> Result<Self, LoadError> {
        let text = std::fs::read_to_string(path).map_err(|e| {
            LoadError::Credentials(format!("cannot read {}: {e}", path.display()))
        })?;
        Self::from_json(&text)
    }

    pub fn from_json(text: &str) -> Result<Self, LoadError> {
        let file: CredentialsFile = serde_json::from_str(text)?;
        Ok(Self {
            uri: normalize_uri(&file.uri),
            username: file.username,
            password: file.password,
            batch_size: file.batch_size.unwrap_or(DEFAULT_BATCH_SIZE).max(1),
        })
    }

    /// Replace fields with whatever `lookup` returns for the `NEO4J_*` keys.
    pub fn with_overrides(mut self, lookup: impl Fn(&str) -> Option<String>) -> Self {
        if let Some(uri) = lookup("NEO4J_URI") {
            self.uri = normalize_uri(&uri);
        }
        if let Some(user) = lookup("NEO4J_USER") {
            self.username = user;
        }
        if let Some(password) = lookup("NEO4J_PASSWORD") {
            self.password = password;
        }
        self
    }

    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size.max(1);
        self
    }

    fn empty() -> Self {
        Self {
            uri: String::new(),
            username: String::new(),
            password: String::new(),
            batch_size: DEFAULT_BATCH_SIZE,
        }
    }

    fn validated(self) -> Result<Self, LoadError> {
        if self.uri.is_empty() {
            return Err(LoadError::Credentials("no Neo4j uri configured".into()));
        }
        if self.username.is_empty() {
            return Err(LoadError::Credentials("no Neo4j username configured".into()));
        }
        Ok(self)
    }
}

fn env_complete() -> bool {
    ["NEO4J_URI", "NEO4J_USER", "NEO4J_PASSWORD"]
        .iter()
        .all(|k| std::env::var(k).is_ok())
}

/// A bare host becomes `bolt://host:7687`; anything with a scheme is kept.
fn normalize_uri(raw: &str) -> String {
    let raw = raw.trim();
    if raw.is_empty() || raw.contains("://") {
        return raw.to_string();
    }
    if raw.contains(':') {
        format!("bolt://{raw}")
    } else {
        format!("bolt://{raw}:{DEFAULT_PORT}")
    }
}

//! In-memory repository fixture.
//!
//! Holds raw entity/activity records exactly as the REST API would return
//! them, plus knobs for injecting per-item failures. Lookups are counted so
//! callers can assert on caching behaviour.

use super::*;
use parking_lot::Mutex;
use std::collections::{BTreeMap, HashMap, HashSet};

#[derive(Debug, Clone)]
struct StoredEntity {
    project_id: String,
    benefactor_id: String,
    /// version → raw record
    versions: BTreeMap<i64, Value>,
}

#[derive(Debug, Default)]
pub struct InMemoryRepository {
    projects: Vec<String>,
    listed: HashMap<String, Vec<String>>,
    entities: HashMap<String, StoredEntity>,
    activities: HashMap<(String, i64), Value>,
    forbidden_provenance: HashSet<(String, i64)>,
    broken_provenance: HashSet<(String, i64)>,
    broken_entities: HashSet<String>,
    calls: Mutex<HashMap<&'static str, usize>>,
}

impl InMemoryRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_project(mut self, project_id: &str) -> Self {
        if !self.projects.iter().any(|p| p == project_id) {
            self.projects.push(project_id.to_string());
        }
        self.listed.entry(project_id.to_string()).or_default();
        self
    }

    /// Add one version of an entity and list it under `project_id`.
    pub fn with_entity(self, project_id: &str, benefactor_id: &str, record: Value) -> Self {
        let id = record_id(&record);
        let mut repo = self.with_unlisted_entity(project_id, benefactor_id, record).with_project(project_id);
        let listed = repo.listed.entry(project_id.to_string()).or_default();
        if !listed.contains(&id) {
            listed.push(id);
        }
        repo
    }

    /// Add one version of an entity reachable only by direct lookup, as an
    /// input living in some other project would be.
    pub fn with_unlisted_entity(mut self, project_id: &str, benefactor_id: &str, record: Value) -> Self {
        let id = record_id(&record);
        let version = record.get("versionNumber").and_then(Value::as_i64).unwrap_or(1);
        self.entities
            .entry(id)
            .or_insert_with(|| StoredEntity {
                project_id: project_id.to_string(),
                benefactor_id: benefactor_id.to_string(),
                versions: BTreeMap::new(),
            })
            .versions
            .insert(version, record);
        self
    }

    pub fn with_activity(mut self, entity_id: &str, version: i64, activity: Value) -> Self {
        self.activities.insert((entity_id.to_string(), version), activity);
        self
    }

    /// Provenance lookups for this version answer "access denied".
    pub fn with_forbidden_provenance(mut self, entity_id: &str, version: i64) -> Self {
        self.forbidden_provenance.insert((entity_id.to_string(), version));
        self
    }

    /// Provenance lookups for this version fail with a server error.
    pub fn with_broken_provenance(mut self, entity_id: &str, version: i64) -> Self {
        self.broken_provenance.insert((entity_id.to_string(), version));
        self
    }

    /// Version listing and entity fetches for this entity fail.
    pub fn with_broken_entity(mut self, entity_id: &str) -> Self {
        self.broken_entities.insert(entity_id.to_string());
        self
    }

    /// Number of calls made to one trait operation so far.
    pub fn calls(&self, operation: &str) -> usize {
        self.calls.lock().get(operation).copied().unwrap_or(0)
    }

    fn record_call(&self, operation: &'static str) {
        *self.calls.lock().entry(operation).or_insert(0) += 1;
    }

    fn stored(&self, id: &str) -> Result<&StoredEntity, RepoError> {
        if self.broken_entities.contains(id) {
            return Err(RepoError::Http {
                status: 500,
                message: format!("{id} is unavailable"),
            });
        }
        self.entities
            .get(id)
            .ok_or_else(|| RepoError::NotFound(format!("/entity/{id}")))
    }
}

fn record_id(record: &Value) -> String {
    record
        .get("id")
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string()
}

#[async_trait]
impl RepositoryClient for InMemoryRepository {
    async fn list_projects(&self) -> Result<Vec<String>, RepoError> {
        self.record_call("list_projects");
        Ok(self.projects.clone())
    }

    async fn list_entities(&self, project_id: &str) -> Result<Vec<EntitySummary>, RepoError> {
        self.record_call("list_entities");
        let listed = self
            .listed
            .get(project_id)
            .ok_or_else(|| RepoError::NotFound(format!("/entity/{project_id}")))?;
        Ok(listed
            .iter()
            .map(|id| EntitySummary {
                id: id.clone(),
                benefactor_id: self.entities.get(id).map(|e| e.benefactor_id.clone()),
            })
            .collect())
    }

    async fn list_versions(&self, entity_id: &str) -> Result<Vec<VersionInfo>, RepoError> {
        self.record_call("list_versions");
        let stored = self.stored(entity_id)?;
        Ok(stored
            .versions
            .keys()
            .map(|v| VersionInfo {
                id: entity_id.to_string(),
                version_number: *v,
            })
            .collect())
    }

    async fn get_entity(&self, id: &str, version: Option<i64>) -> Result<Value, RepoError> {
        self.record_call("get_entity");
        let stored = self.stored(id)?;
        let record = match version {
            Some(v) => stored.versions.get(&v),
            None => stored.versions.values().next_back(),
        };
        record
            .cloned()
            .ok_or_else(|| RepoError::NotFound(format!("/entity/{id}/version/{version:?}")))
    }

    async fn get_provenance(&self, id: &str, version: i64) -> Result<Value, RepoError> {
        self.record_call("get_provenance");
        let key = (id.to_string(), version);
        if self.forbidden_provenance.contains(&key) {
            return Err(RepoError::Forbidden(format!("/entity/{id}/version/{version}/generatedBy")));
        }
        if self.broken_provenance.contains(&key) {
            return Err(RepoError::Http {
                status: 503,
                message: "provenance service unavailable".into(),
            });
        }
        self.activities
            .get(&key)
            .cloned()
            .ok_or_else(|| RepoError::NotFound(format!("/entity/{id}/version/{version}/generatedBy")))
    }

    async fn get_project_id(&self, id: &str) -> Result<String, RepoError> {
        self.record_call("get_project_id");
        Ok(self.stored(id)?.project_id.clone())
    }

    async fn get_benefactor_id(&self, id: &str) -> Result<String, RepoError> {
        self.record_call("get_benefactor_id");
        Ok(self.stored(id)?.benefactor_id.clone())
    }
}

//! Entity normalization.

use crate::error::IngestError;
use async_trait::async_trait;
use parking_lot::RwLock;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;
use synprov_graph::{EntityResolver, ResolveError};
use synprov_model::keys::IGNORED_ENTITY_TYPES;
use synprov_model::{flatten_record, EntityVertex, ModelError};
use synprov_repo::RepositoryClient;
use tracing::{debug, info};

/// Project and benefactor ids per `synId`, shared by every worker.
///
/// All versions of an entity live in the same project under the same
/// benefactor, so one lookup serves every version.
#[derive(Debug, Default)]
pub struct ContainerCache {
    projects: RwLock<HashMap<String, String>>,
    benefactors: RwLock<HashMap<String, String>>,
}

impl ContainerCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.projects.read().len().max(self.benefactors.read().len())
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    async fn project_of(
        &self,
        repo: &dyn RepositoryClient,
        syn_id: &str,
    ) -> Result<String, IngestError> {
        let cached = self.projects.read().get(syn_id).cloned();
        if let Some(hit) = cached {
            return Ok(hit);
        }
        let project = repo
            .get_project_id(syn_id)
            .await
            .map_err(|source| IngestError::Lookup {
                what: "project",
                id: syn_id.to_string(),
                source,
            })?;
        self.projects.write().insert(syn_id.to_string(), project.clone());
        Ok(project)
    }

    async fn benefactor_of(
        &self,
        repo: &dyn RepositoryClient,
        syn_id: &str,
    ) -> Result<String, IngestError> {
        let cached = self.benefactors.read().get(syn_id).cloned();
        if let Some(hit) = cached {
            return Ok(hit);
        }
        let benefactor = repo
            .get_benefactor_id(syn_id)
            .await
            .map_err(|source| IngestError::Lookup {
                what: "benefactor",
                id: syn_id.to_string(),
                source,
            })?;
        self.benefactors
            .write()
            .insert(syn_id.to_string(), benefactor.clone());
        Ok(benefactor)
    }
}

pub struct Normalizer {
    repo: Arc<dyn RepositoryClient>,
    ignored_types: Vec<String>,
    cache: ContainerCache,
}

impl Normalizer {
    pub fn new(repo: Arc<dyn RepositoryClient>) -> Self {
        Self {
            repo,
            ignored_types: IGNORED_ENTITY_TYPES.iter().map(|t| t.to_string()).collect(),
            cache: ContainerCache::new(),
        }
    }

    pub fn with_ignored_types(mut self, ignored_types: Vec<String>) -> Self {
        self.ignored_types = ignored_types;
        self
    }

    pub fn cache(&self) -> &ContainerCache {
        &self.cache
    }

    /// The record's type discriminator when it is in the ignored set.
    pub fn ignored_type<'a>(&self, raw: &'a Value) -> Option<&'a str> {
        let kind = raw
            .get("concreteType")
            .or_else(|| raw.get("entityType"))
            .and_then(Value::as_str)?;
        self.ignored_types.iter().any(|t| t == kind).then_some(kind)
    }

    /// Normalize one raw entity record. Containers yield `Ok(None)`.
    ///
    /// `project_id` / `benefactor_id` are looked up (through the cache) only
    /// when the caller does not already know them.
    pub async fn normalize(
        &self,
        raw: &Value,
        project_id: Option<&str>,
        benefactor_id: Option<&str>,
    ) -> Result<Option<EntityVertex>, IngestError> {
        if let Some(kind) = self.ignored_type(raw) {
            info!(entity_type = kind, "bad entity type; skipped");
            return Ok(None);
        }

        let record = raw.as_object().ok_or(ModelError::NotAnObject)?;
        let flat = flatten_record(record);
        let syn_id = flat
            .get("id")
            .and_then(|v| v.as_str())
            .ok_or(ModelError::MissingField("id"))?
            .to_string();

        let project_id = match project_id {
            Some(p) => p.to_string(),
            None => self.cache.project_of(self.repo.as_ref(), &syn_id).await?,
        };
        let benefactor_id = match benefactor_id {
            Some(b) => b.to_string(),
            None => self.cache.benefactor_of(self.repo.as_ref(), &syn_id).await?,
        };

        let entity = EntityVertex::from_flat(flat, project_id, benefactor_id)?;
        debug!(entity = %entity.key, "normalized");
        Ok(Some(entity))
    }
}

/// Resolves inputs missing from the fetched set by fetching and normalizing
/// them on demand.
pub struct RepositoryResolver {
    repo: Arc<dyn RepositoryClient>,
    normalizer: Arc<Normalizer>,
}

impl RepositoryResolver {
    pub fn new(repo: Arc<dyn RepositoryClient>, normalizer: Arc<Normalizer>) -> Self {
        Self { repo, normalizer }
    }
}

#[async_trait]
impl EntityResolver for RepositoryResolver {
    async fn resolve(
        &self,
        target_id: &str,
        version: Option<i64>,
    ) -> Result<EntityVertex, ResolveError> {
        let raw = self
            .repo
            .get_entity(target_id, version)
            .await
            .map_err(|e| ResolveError::Unavailable(e.to_string()))?;
        match self.normalizer.normalize(&raw, None, None).await {
            Ok(Some(entity)) => Ok(entity),
            Ok(None) => Err(ResolveError::Ignored {
                id: target_id.to_string(),
                concrete_type: self
                    .normalizer
                    .ignored_type(&raw)
                    .unwrap_or_default()
                    .to_string(),
            }),
            Err(e) => Err(ResolveError::Unavailable(e.to_string())),
        }
    }
}

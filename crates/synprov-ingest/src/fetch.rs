//! Entity fetching: project → file entities → every version.

use crate::error::IngestError;
use crate::normalize::Normalizer;
use crate::pool::FetchPool;
use std::sync::Arc;
use synprov_model::EntityVertex;
use synprov_repo::{EntitySummary, RepositoryClient};
use tracing::{info, warn};

pub struct EntityFetcher {
    repo: Arc<dyn RepositoryClient>,
    normalizer: Arc<Normalizer>,
    pool: FetchPool,
}

impl EntityFetcher {
    pub fn new(repo: Arc<dyn RepositoryClient>, normalizer: Arc<Normalizer>, pool: FetchPool) -> Self {
        Self {
            repo,
            normalizer,
            pool,
        }
    }

    /// Every version of every file entity under `project_id`, in listing
    /// order. Failing entities are logged and left out.
    pub async fn fetch_project(&self, project_id: &str) -> Result<Vec<EntityVertex>, IngestError> {
        info!(project = project_id, "getting and formatting all entities");
        let listed = self.repo.list_entities(project_id).await?;

        let repo = Arc::clone(&self.repo);
        let normalizer = Arc::clone(&self.normalizer);
        let project = project_id.to_string();

        let per_entity = self
            .pool
            .map(listed, move |summary| {
                let repo = Arc::clone(&repo);
                let normalizer = Arc::clone(&normalizer);
                let project = project.clone();
                async move { fetch_versions(repo.as_ref(), &normalizer, &project, summary).await }
            })
            .await;

        Ok(per_entity.into_iter().flatten().collect())
    }
}

async fn fetch_versions(
    repo: &dyn RepositoryClient,
    normalizer: &Normalizer,
    project_id: &str,
    summary: EntitySummary,
) -> Vec<EntityVertex> {
    let versions = match repo.list_versions(&summary.id).await {
        Ok(versions) => versions,
        Err(e) => {
            warn!(entity = %summary.id, error = %e, "skipping entity: versions unavailable");
            return Vec::new();
        }
    };

    let mut entities = Vec::with_capacity(versions.len());
    for version in versions {
        info!(entity = %version.id, version = version.version_number, "getting entity");
        let raw = match repo.get_entity(&version.id, Some(version.version_number)).await {
            Ok(raw) => raw,
            Err(e) => {
                warn!(
                    entity = %version.id,
                    version = version.version_number,
                    error = %e,
                    "skipping entity version"
                );
                continue;
            }
        };
        match normalizer
            .normalize(&raw, Some(project_id), summary.benefactor_id.as_deref())
            .await
        {
            Ok(Some(entity)) => entities.push(entity),
            Ok(None) => {}
            Err(e) => warn!(
                entity = %version.id,
                version = version.version_number,
                error = %e,
                "skipping entity version"
            ),
        }
    }
    entities
}

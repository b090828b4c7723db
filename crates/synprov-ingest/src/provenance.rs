//! Provenance fetching.

use crate::pool::FetchPool;
use std::sync::Arc;
use synprov_graph::ProvenanceOutcome;
use synprov_model::EntityVertex;
use synprov_repo::RepositoryClient;
use tracing::{debug, warn};

#[derive(Clone)]
pub struct ProvenanceFetcher {
    repo: Arc<dyn RepositoryClient>,
}

impl ProvenanceFetcher {
    pub fn new(repo: Arc<dyn RepositoryClient>) -> Self {
        Self { repo }
    }

    /// Activity behind one entity version. Absence is the common case (most
    /// entities carry no provenance) and is never an error.
    pub async fn fetch(&self, entity: &EntityVertex) -> ProvenanceOutcome {
        fetch_one(
            self.repo.as_ref(),
            entity.key.clone(),
            &entity.syn_id,
            entity.version_number,
        )
        .await
    }

    /// One outcome per entity, in entity order.
    pub async fn fetch_all(&self, pool: &FetchPool, entities: &[EntityVertex]) -> Vec<ProvenanceOutcome> {
        let targets: Vec<(String, String, i64)> = entities
            .iter()
            .map(|e| (e.key.clone(), e.syn_id.clone(), e.version_number))
            .collect();
        let repo = Arc::clone(&self.repo);

        pool.map(targets, move |(key, syn_id, version)| {
            let repo = Arc::clone(&repo);
            async move { fetch_one(repo.as_ref(), key, &syn_id, version).await }
        })
        .await
    }
}

async fn fetch_one(
    repo: &dyn RepositoryClient,
    entity_key: String,
    syn_id: &str,
    version: i64,
) -> ProvenanceOutcome {
    debug!(entity = %entity_key, "getting provenance");
    let activity = match repo.get_provenance(syn_id, version).await {
        Ok(record) => Some(record),
        Err(e) if e.is_absent() => {
            debug!(entity = %entity_key, "no provenance");
            None
        }
        Err(e) => {
            warn!(entity = %entity_key, error = %e, "provenance unavailable; treated as absent");
            None
        }
    };
    ProvenanceOutcome {
        entity_key,
        activity,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use synprov_model::{flatten_record, EntityVertex};
    use synprov_repo::InMemoryRepository;

    fn entity(id: &str) -> EntityVertex {
        let raw = json!({"id": id, "versionNumber": 1});
        EntityVertex::from_flat(flatten_record(raw.as_object().unwrap()), "p".into(), "p".into())
            .unwrap()
    }

    #[tokio::test]
    async fn one_failing_provenance_leaves_the_rest_intact() {
        let activity = json!({"id": "A1", "createdBy": "1", "createdOn": "t",
                              "modifiedBy": "1", "modifiedOn": "t", "used": []});
        let repo = Arc::new(
            InMemoryRepository::new()
                .with_activity("syn1", 1, activity.clone())
                .with_broken_provenance("syn2", 1)
                .with_activity("syn3", 1, activity),
        );
        let fetcher = ProvenanceFetcher::new(repo);
        let entities = vec![entity("syn1"), entity("syn2"), entity("syn3"), entity("syn4")];

        let outcomes = fetcher.fetch_all(&FetchPool::new(3), &entities).await;

        let keys: Vec<&str> = outcomes.iter().map(|o| o.entity_key.as_str()).collect();
        assert_eq!(keys, vec!["syn1.1", "syn2.1", "syn3.1", "syn4.1"]);
        let present: Vec<bool> = outcomes.iter().map(|o| o.activity.is_some()).collect();
        assert_eq!(present, vec![true, false, true, false]);
    }

    #[tokio::test]
    async fn forbidden_is_absent() {
        let repo = Arc::new(InMemoryRepository::new().with_forbidden_provenance("syn1", 1));
        let outcome = ProvenanceFetcher::new(repo).fetch(&entity("syn1")).await;
        assert!(outcome.activity.is_none());
    }
}

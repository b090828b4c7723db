//! Export pipeline over the in-memory repository.

use serde_json::{json, Value};
use std::collections::BTreeSet;
use std::sync::Arc;
use synprov_ingest::{ExportOptions, ExportPipeline, ProjectSelection};
use synprov_model::keys::{FOLDER_TYPE, USED_ENTITY_TYPE};
use synprov_model::{EdgeLabel, PropertyGraph, Vertex};
use synprov_repo::{InMemoryRepository, RepositoryClient};

const FILE_TYPE: &str = "org.sagebionetworks.repo.model.FileEntity";

fn file(id: &str, version: i64) -> Value {
    json!({"id": id, "versionNumber": version, "concreteType": FILE_TYPE, "name": format!("{id}.csv")})
}

fn activity(id: &str, used: Value) -> Value {
    json!({
        "id": id,
        "name": "normalization",
        "createdBy": "3321",
        "createdOn": "2018-01-01T00:00:00.000Z",
        "modifiedBy": "3321",
        "modifiedOn": "2018-01-02T00:00:00.000Z",
        "used": used,
    })
}

fn used(target: &str, version: Option<i64>) -> Value {
    let mut reference = json!({"targetId": target});
    if let Some(v) = version {
        reference["targetVersionNumber"] = json!(v);
    }
    json!({"concreteType": USED_ENTITY_TYPE, "reference": reference, "wasExecuted": false})
}

/// A.1 and C.1 are generated by P1, which used B.1 from another project.
/// D.1 has provenance the service fails to return.
fn scenario() -> InMemoryRepository {
    let p1 = activity("P1", json!([used("synB", Some(1))]));
    InMemoryRepository::new()
        .with_entity("syn1", "syn1", file("synA", 1))
        .with_entity("syn1", "syn1", file("synC", 1))
        .with_entity("syn1", "syn1", file("synD", 1))
        .with_unlisted_entity("syn2", "syn2", file("synB", 1))
        .with_activity("synA", 1, p1.clone())
        .with_activity("synC", 1, p1)
        .with_broken_provenance("synD", 1)
}

fn edge_set(graph: &PropertyGraph) -> BTreeSet<(String, String, EdgeLabel)> {
    graph
        .edges
        .iter()
        .map(|e| (e.in_v.clone(), e.out_v.clone(), e.label))
        .collect()
}

fn vertex_keys(graph: &PropertyGraph) -> BTreeSet<String> {
    graph.vertices.iter().map(|v| v.key().to_string()).collect()
}

#[tokio::test]
async fn shared_activity_scenario() {
    let repo = Arc::new(scenario());
    let pipeline = ExportPipeline::new(repo.clone(), ExportOptions::default().with_workers(3));

    let report = pipeline
        .run(ProjectSelection::Ids(vec!["syn1".into()]))
        .await
        .unwrap();
    let graph = &report.graph;

    let expected: BTreeSet<String> = ["synA.1", "synC.1", "synD.1", "synB.1", "P1"]
        .iter()
        .map(|s| s.to_string())
        .collect();
    assert_eq!(vertex_keys(graph), expected);
    assert_eq!(graph.vertices.len(), 5);

    let edges = edge_set(graph);
    assert_eq!(graph.edges.len(), 3);
    assert!(edges.contains(&("synA.1".into(), "P1".into(), EdgeLabel::GeneratedBy)));
    assert!(edges.contains(&("synC.1".into(), "P1".into(), EdgeLabel::GeneratedBy)));
    assert!(edges.contains(&("P1".into(), "synB.1".into(), EdgeLabel::Used)));
    assert!(graph.dangling_edges().is_empty());

    // The synthesized input keeps its own project.
    let b = graph
        .vertices
        .iter()
        .find_map(|v| match v {
            Vertex::Entity(e) if e.key == "synB.1" => Some(e),
            _ => None,
        })
        .unwrap();
    assert_eq!(b.project_id, "syn2");

    assert_eq!(report.stats.projects, 1);
    assert_eq!(report.stats.entities, 3);
    assert_eq!(report.stats.activities, 2);
    assert_eq!(report.stats.build.activities, 1);
    assert_eq!(report.stats.build.synthesized_entities, 1);
}

#[tokio::test]
async fn reruns_are_identical() {
    let repo = Arc::new(scenario());
    let pipeline = ExportPipeline::new(repo, ExportOptions::default().with_workers(8));

    let first = pipeline
        .run(ProjectSelection::Ids(vec!["syn1".into()]))
        .await
        .unwrap();
    let second = pipeline
        .run(ProjectSelection::Ids(vec!["syn1".into()]))
        .await
        .unwrap();

    assert_eq!(first.graph.to_document(), second.graph.to_document());
}

#[tokio::test]
async fn all_projects_honours_the_skip_list() {
    let repo = Arc::new(
        scenario()
            .with_entity("syn582072", "syn582072", file("synBig", 1))
            .with_project("syn3"),
    );
    let pipeline = ExportPipeline::new(repo, ExportOptions::default());

    let report = pipeline.run(ProjectSelection::All).await.unwrap();

    assert!(!vertex_keys(&report.graph).contains("synBig.1"));
    assert_eq!(report.stats.skipped_projects, 1);
    assert_eq!(report.stats.projects, 2);
}

#[tokio::test]
async fn failing_project_does_not_abort_the_run() {
    let repo = Arc::new(scenario());
    let pipeline = ExportPipeline::new(repo, ExportOptions::default());

    let report = pipeline
        .run(ProjectSelection::Ids(vec!["syn404".into(), "syn1".into()]))
        .await
        .unwrap();

    assert_eq!(report.stats.failed_projects, 1);
    assert_eq!(report.stats.projects, 1);
    assert_eq!(report.graph.vertices.len(), 5);
}

#[tokio::test]
async fn containers_and_unversioned_inputs() {
    let p2 = activity("P2", json!([used("synE", None)]));
    let repo = Arc::new(
        InMemoryRepository::new()
            .with_entity("syn1", "syn1", file("synA", 1))
            .with_entity(
                "syn1",
                "syn1",
                json!({"id": "synF", "versionNumber": 1, "concreteType": FOLDER_TYPE}),
            )
            .with_unlisted_entity("syn2", "syn2", file("synE", 1))
            .with_unlisted_entity("syn2", "syn2", file("synE", 3))
            .with_activity("synA", 1, p2),
    );
    let pipeline = ExportPipeline::new(repo.clone(), ExportOptions::default());

    let report = pipeline
        .run(ProjectSelection::Ids(vec!["syn1".into()]))
        .await
        .unwrap();

    let keys = vertex_keys(&report.graph);
    assert!(!keys.iter().any(|k| k.starts_with("synF")));
    assert!(keys.contains("synE.3"));
    assert!(edge_set(&report.graph).contains(&("P2".into(), "synE.3".into(), EdgeLabel::Used)));
    assert!(repo.calls("get_provenance") >= 1);
}

#[tokio::test]
async fn listing_failure_is_fatal_only_for_all() {
    struct NoProjects;

    #[async_trait::async_trait]
    impl RepositoryClient for NoProjects {
        async fn list_projects(&self) -> Result<Vec<String>, synprov_repo::RepoError> {
            Err(synprov_repo::RepoError::Forbidden("/projects".into()))
        }
        async fn list_entities(
            &self,
            id: &str,
        ) -> Result<Vec<synprov_repo::EntitySummary>, synprov_repo::RepoError> {
            Err(synprov_repo::RepoError::NotFound(id.into()))
        }
        async fn list_versions(
            &self,
            id: &str,
        ) -> Result<Vec<synprov_repo::VersionInfo>, synprov_repo::RepoError> {
            Err(synprov_repo::RepoError::NotFound(id.into()))
        }
        async fn get_entity(&self, id: &str, _: Option<i64>) -> Result<Value, synprov_repo::RepoError> {
            Err(synprov_repo::RepoError::NotFound(id.into()))
        }
        async fn get_provenance(&self, id: &str, _: i64) -> Result<Value, synprov_repo::RepoError> {
            Err(synprov_repo::RepoError::NotFound(id.into()))
        }
        async fn get_project_id(&self, id: &str) -> Result<String, synprov_repo::RepoError> {
            Err(synprov_repo::RepoError::NotFound(id.into()))
        }
        async fn get_benefactor_id(&self, id: &str) -> Result<String, synprov_repo::RepoError> {
            Err(synprov_repo::RepoError::NotFound(id.into()))
        }
    }

    let pipeline = ExportPipeline::new(Arc::new(NoProjects), ExportOptions::default());
    assert!(pipeline.run(ProjectSelection::All).await.is_err());

    let report = pipeline
        .run(ProjectSelection::Ids(vec!["syn1".into()]))
        .await
        .unwrap();
    assert!(report.graph.vertices.is_empty());
    assert_eq!(report.stats.failed_projects, 1);
}

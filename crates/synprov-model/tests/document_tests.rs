//! Export document: JSON shape and file round trip.

use synprov_model::{
    ActivityVertex, Edge, EntityVertex, ExternalResource, FlatRecord, GraphDocument,
    PropertyGraph, ProvenanceStamp, Scalar, Vertex,
};
use tempfile::tempdir;

fn stamp() -> ProvenanceStamp {
    ProvenanceStamp {
        created_by: "3324230".into(),
        created_on: "2016-05-01T10:00:00.000Z".into(),
        modified_by: "3324230".into(),
        modified_on: "2016-05-01T10:00:00.000Z".into(),
    }
}

fn small_graph() -> PropertyGraph {
    let mut attributes = FlatRecord::new();
    attributes.insert("name".into(), Scalar::from("reads.bam"));
    let entity = EntityVertex {
        key: "syn10.1".into(),
        syn_id: "syn10".into(),
        version_number: 1,
        concrete_type: "org.sagebionetworks.repo.model.FileEntity".into(),
        project_id: "syn1".into(),
        benefactor_id: "syn1".into(),
        attributes,
    };
    let activity = ActivityVertex {
        key: "7001".into(),
        name: Some("align".into()),
        description: None,
        etag: None,
        stamp: stamp(),
        used: Vec::new(),
    };
    let url = ExternalResource::for_url("https://github.com/alexdobin/STAR", Some("STAR".into()));

    PropertyGraph {
        edges: vec![
            Edge::generated_by(&entity.key, &activity.key, &stamp()),
            Edge::input(&activity.key, &url.key, true, &stamp()),
        ],
        vertices: vec![Vertex::from(entity), Vertex::from(activity), Vertex::from(url)],
    }
}

#[test]
fn document_json_has_flat_vertices_and_edges() {
    let doc = small_graph().to_document();
    let json = serde_json::to_value(&doc).unwrap();

    let vertices = json["vertices"].as_array().unwrap();
    let edges = json["edges"].as_array().unwrap();
    assert_eq!(vertices.len(), 3);
    assert_eq!(edges.len(), 2);

    for record in vertices.iter().chain(edges.iter()) {
        let obj = record.as_object().unwrap();
        assert!(obj.values().all(|v| !v.is_object() && !v.is_array()));
    }
    assert_eq!(vertices[0]["_id"], "syn10.1");
    assert_eq!(edges[1]["_label"], "executed");
}

#[test]
fn document_file_round_trip() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("graph.json");

    let doc = small_graph().to_document();
    doc.write_file(&path).unwrap();
    let back = GraphDocument::read_from(&path).unwrap();

    assert_eq!(back, doc);
    assert!(back.dangling_edges().is_empty());
}

#[test]
fn dangling_edges_are_reported() {
    let mut graph = small_graph();
    graph.edges.push(Edge::input("7001", "syn404.1", false, &stamp()));

    assert_eq!(graph.dangling_edges().len(), 1);
    assert_eq!(graph.to_document().dangling_edges().len(), 1);
}

use async_trait::async_trait;
use proptest::prelude::*;
use serde_json::{json, Value};
use std::collections::{BTreeSet, HashSet};
use synprov_graph::{clean_activities, EntityResolver, GraphBuilder, ProvenanceOutcome, ResolveError};
use synprov_model::keys::{USED_ENTITY_TYPE, USED_URL_TYPE};
use synprov_model::{flatten_record, EdgeLabel, EntityVertex, PropertyGraph, Vertex};

const MAX_ENTITIES: usize = 6;
const MAX_ACTIVITIES: usize = 4;
const URLS: [&str; 3] = ["http://a.example", "http://b.example", "ftp://c.example/data"];

#[derive(Debug, Clone)]
enum RefShape {
    Fetched(usize),
    /// Outside the fetched set; resolvable when the index is even.
    External(usize),
    Url(usize),
    Malformed,
}

#[derive(Debug, Clone)]
struct Scenario {
    entities: usize,
    activities: Vec<Vec<(RefShape, bool)>>,
    assignment: Vec<Option<usize>>,
}

fn ref_strategy() -> impl Strategy<Value = (RefShape, bool)> {
    (
        prop_oneof![
            (0..MAX_ENTITIES).prop_map(RefShape::Fetched),
            (0usize..4).prop_map(RefShape::External),
            (0..URLS.len()).prop_map(RefShape::Url),
            Just(RefShape::Malformed),
        ],
        any::<bool>(),
    )
}

fn scenario_strategy() -> impl Strategy<Value = Scenario> {
    (1..=MAX_ENTITIES, 1..=MAX_ACTIVITIES).prop_flat_map(|(entities, activities)| {
        (
            prop::collection::vec(prop::collection::vec(ref_strategy(), 0..5), activities),
            prop::collection::vec(prop::option::of(0..activities), entities),
        )
            .prop_map(move |(activities, assignment)| Scenario {
                entities,
                activities,
                assignment,
            })
    })
}

fn entity(syn_id: &str, version: i64) -> EntityVertex {
    let raw = json!({"id": syn_id, "versionNumber": version, "concreteType": "FileEntity"});
    EntityVertex::from_flat(flatten_record(raw.as_object().unwrap()), "syn1".into(), "syn1".into())
        .unwrap()
}

fn reference(shape: &RefShape, entities: usize, executed: bool) -> Value {
    match shape {
        RefShape::Fetched(i) => json!({
            "concreteType": USED_ENTITY_TYPE,
            "reference": {"targetId": format!("synE{}", i % entities), "targetVersionNumber": 1},
            "wasExecuted": executed,
        }),
        RefShape::External(j) => json!({
            "concreteType": USED_ENTITY_TYPE,
            "reference": {"targetId": format!("synX{j}"), "targetVersionNumber": 1},
            "wasExecuted": executed,
        }),
        RefShape::Url(k) => json!({"concreteType": USED_URL_TYPE, "url": URLS[*k], "wasExecuted": executed}),
        RefShape::Malformed => json!({"concreteType": USED_URL_TYPE}),
    }
}

struct EvenResolver;

#[async_trait]
impl EntityResolver for EvenResolver {
    async fn resolve(&self, target_id: &str, version: Option<i64>) -> Result<EntityVertex, ResolveError> {
        let index: usize = target_id.trim_start_matches("synX").parse().unwrap_or(1);
        if index % 2 == 0 {
            Ok(entity(target_id, version.unwrap_or(1)))
        } else {
            Err(ResolveError::Unavailable(target_id.to_string()))
        }
    }
}

fn run(scenario: &Scenario) -> PropertyGraph {
    let entities: Vec<EntityVertex> = (0..scenario.entities)
        .map(|i| entity(&format!("synE{i}"), 1))
        .collect();
    let outcomes: Vec<ProvenanceOutcome> = scenario
        .assignment
        .iter()
        .enumerate()
        .map(|(i, assigned)| ProvenanceOutcome {
            entity_key: format!("synE{i}.1"),
            activity: assigned.map(|a| {
                let used: Vec<Value> = scenario.activities[a]
                    .iter()
                    .map(|(shape, executed)| reference(shape, scenario.entities, *executed))
                    .collect();
                json!({
                    "id": format!("act{a}"),
                    "createdBy": "1", "createdOn": "t0",
                    "modifiedBy": "1", "modifiedOn": "t1",
                    "used": used,
                })
            }),
        })
        .collect();

    let runtime = tokio::runtime::Builder::new_current_thread()
        .build()
        .unwrap();
    runtime.block_on(
        GraphBuilder::with_entities(entities).build(clean_activities(outcomes), &EvenResolver),
    )
}

fn expected_input_edges(scenario: &Scenario) -> usize {
    let used_activities: BTreeSet<usize> = scenario.assignment.iter().flatten().copied().collect();
    used_activities
        .iter()
        .map(|&a| {
            scenario.activities[a]
                .iter()
                .filter(|(shape, _)| match shape {
                    RefShape::Fetched(_) | RefShape::Url(_) => true,
                    RefShape::External(j) => j % 2 == 0,
                    RefShape::Malformed => false,
                })
                .count()
        })
        .sum()
}

proptest! {
    #![proptest_config(ProptestConfig {
        cases: 128,
        failure_persistence: None,
        ..ProptestConfig::default()
    })]

    #[test]
    fn build_is_deterministic(scenario in scenario_strategy()) {
        let first = run(&scenario);
        let second = run(&scenario);
        let keys = |g: &PropertyGraph| g.vertices.iter().map(|v| v.key().to_string()).collect::<Vec<_>>();
        prop_assert_eq!(keys(&first), keys(&second));
        prop_assert_eq!(first.edges, second.edges);
    }

    #[test]
    fn no_dangling_edges_and_unique_keys(scenario in scenario_strategy()) {
        let graph = run(&scenario);
        prop_assert!(graph.dangling_edges().is_empty());
        let unique: HashSet<&str> = graph.vertices.iter().map(Vertex::key).collect();
        prop_assert_eq!(unique.len(), graph.vertices.len());
    }

    #[test]
    fn edge_counts_follow_dedup_rules(scenario in scenario_strategy()) {
        let graph = run(&scenario);
        let generated = graph.edges.iter().filter(|e| e.label == EdgeLabel::GeneratedBy).count();
        let inputs = graph.edges.len() - generated;
        let distinct: BTreeSet<usize> = scenario.assignment.iter().flatten().copied().collect();

        prop_assert_eq!(generated, scenario.assignment.iter().filter(|a| a.is_some()).count());
        prop_assert_eq!(graph.activity_count(), distinct.len());
        prop_assert_eq!(inputs, expected_input_edges(&scenario));
    }
}

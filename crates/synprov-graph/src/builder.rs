//! Arena graph builder.

use crate::resolver::EntityResolver;
use serde_json::Value;
use std::collections::{HashMap, HashSet};
use synprov_model::keys::entity_key;
use synprov_model::{
    ActivityVertex, Edge, EntityVertex, ExternalResource, PropertyGraph, ProvenanceStamp,
    UsedReference, Vertex,
};
use tracing::{debug, info, warn};

/// Result of one provenance fetch, tagged with the entity it belongs to.
#[derive(Debug, Clone, PartialEq)]
pub struct ProvenanceOutcome {
    pub entity_key: String,
    /// Raw activity record; `None` when the entity has no (visible) provenance.
    pub activity: Option<Value>,
}

/// Drop absent results, parse the rest into Activity vertices and index them
/// by the key of the entity they generated.
pub fn clean_activities(
    outcomes: impl IntoIterator<Item = ProvenanceOutcome>,
) -> HashMap<String, ActivityVertex> {
    let mut cleaned = HashMap::new();
    for outcome in outcomes {
        let Some(record) = outcome.activity else {
            continue;
        };
        debug!(entity = %outcome.entity_key, "cleaning activity");
        match ActivityVertex::from_record(&record) {
            Ok(activity) => {
                cleaned.insert(outcome.entity_key, activity);
            }
            Err(e) => warn!(
                entity = %outcome.entity_key,
                error = %e,
                "malformed activity record dropped"
            ),
        }
    }
    cleaned
}

/// Counters reported at the end of a build.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BuildStats {
    pub activities: usize,
    pub synthesized_entities: usize,
    pub synthesized_urls: usize,
    pub skipped_references: usize,
    pub unresolved_inputs: usize,
}

#[derive(Debug, Default)]
pub struct GraphBuilder {
    vertices: Vec<Vertex>,
    index: HashMap<String, usize>,
    edges: Vec<Edge>,
    /// targetId → key of its current version; `None` once resolution failed.
    current_versions: HashMap<String, Option<String>>,
    /// Versioned input keys whose resolution already failed.
    unresolvable: HashSet<String>,
    stats: BuildStats,
}

impl GraphBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed the arena with fetched entities, in order. Later duplicates of a
    /// key are ignored.
    pub fn with_entities(entities: impl IntoIterator<Item = EntityVertex>) -> Self {
        let mut builder = Self::new();
        for entity in entities {
            builder.insert_vertex(Vertex::Entity(entity));
        }
        builder
    }

    /// Append a vertex unless its key is taken. Returns whether it was added.
    pub fn insert_vertex(&mut self, vertex: Vertex) -> bool {
        if self.index.contains_key(vertex.key()) {
            return false;
        }
        self.index.insert(vertex.key().to_string(), self.vertices.len());
        self.vertices.push(vertex);
        true
    }

    pub fn contains(&self, key: &str) -> bool {
        self.index.contains_key(key)
    }

    pub fn stats(&self) -> BuildStats {
        self.stats
    }

    /// Link every seeded entity to the activity that generated it and expand
    /// each distinct activity's inputs exactly once.
    pub async fn build<R>(
        self,
        activities: HashMap<String, ActivityVertex>,
        resolver: &R,
    ) -> PropertyGraph
    where
        R: EntityResolver + ?Sized,
    {
        self.build_with_stats(activities, resolver).await.0
    }

    pub async fn build_with_stats<R>(
        mut self,
        mut activities: HashMap<String, ActivityVertex>,
        resolver: &R,
    ) -> (PropertyGraph, BuildStats)
    where
        R: EntityResolver + ?Sized,
    {
        info!("constructing directed edges based on provenance");

        let generated: Vec<String> = self
            .vertices
            .iter()
            .filter_map(|v| match v {
                Vertex::Entity(e) => Some(e.key.clone()),
                _ => None,
            })
            .collect();

        for entity in generated {
            let Some(activity) = activities.remove(&entity) else {
                continue;
            };
            debug!(%entity, activity = %activity.key, "processing entity");

            let activity_key = activity.key.clone();
            let seen = match self.index.get(&activity_key).map(|&slot| &self.vertices[slot]) {
                Some(Vertex::Activity(seen)) => Some(seen.stamp.clone()),
                Some(_) => {
                    warn!(
                        %entity,
                        activity = %activity_key,
                        "activity id collides with a non-activity vertex; skipped"
                    );
                    continue;
                }
                None => None,
            };
            let stamp = match seen {
                Some(stamp) => stamp,
                None => self.register_activity(activity, resolver).await,
            };

            self.edges
                .push(Edge::generated_by(&entity, &activity_key, &stamp));
        }

        info!(
            activities = self.stats.activities,
            synthesized_entities = self.stats.synthesized_entities,
            synthesized_urls = self.stats.synthesized_urls,
            skipped_references = self.stats.skipped_references,
            unresolved_inputs = self.stats.unresolved_inputs,
            "graph built"
        );

        let graph = PropertyGraph {
            vertices: self.vertices,
            edges: self.edges,
        };
        (graph, self.stats)
    }

    /// First sighting of an activity: add its vertex, then its input edges.
    /// Returns the stamp every edge of this activity carries.
    async fn register_activity<R>(
        &mut self,
        mut activity: ActivityVertex,
        resolver: &R,
    ) -> ProvenanceStamp
    where
        R: EntityResolver + ?Sized,
    {
        let used = std::mem::take(&mut activity.used);
        let key = activity.key.clone();
        let stamp = activity.stamp.clone();
        self.insert_vertex(Vertex::Activity(activity));
        self.stats.activities += 1;

        for raw in &used {
            self.link_input(&key, &stamp, raw, resolver).await;
        }
        stamp
    }

    async fn link_input<R>(
        &mut self,
        activity_key: &str,
        stamp: &ProvenanceStamp,
        raw: &Value,
        resolver: &R,
    ) where
        R: EntityResolver + ?Sized,
    {
        let reference = match UsedReference::parse(raw) {
            Ok(reference) => reference,
            Err(e) => {
                warn!(activity = %activity_key, error = %e, "skipping malformed used reference");
                self.stats.skipped_references += 1;
                return;
            }
        };

        let target = match &reference {
            UsedReference::Entity {
                target_id,
                target_version,
                ..
            } => self.entity_input(target_id, *target_version, resolver).await,
            UsedReference::Url { url, name, .. } => Some(self.url_input(url, name.clone())),
        };

        if let Some(target) = target {
            self.edges.push(Edge::input(
                activity_key,
                &target,
                reference.was_executed(),
                stamp,
            ));
        }
    }

    fn url_input(&mut self, url: &str, name: Option<String>) -> String {
        let resource = ExternalResource::for_url(url, name);
        let key = resource.key.clone();
        if self.insert_vertex(Vertex::External(resource)) {
            self.stats.synthesized_urls += 1;
        }
        key
    }

    async fn entity_input<R>(
        &mut self,
        target_id: &str,
        version: Option<i64>,
        resolver: &R,
    ) -> Option<String>
    where
        R: EntityResolver + ?Sized,
    {
        match version {
            Some(v) => {
                let key = entity_key(target_id, v);
                if self.contains(&key) {
                    return Some(key);
                }
                if self.unresolvable.contains(&key) {
                    return None;
                }
                let resolved = self.resolve_into_arena(target_id, version, resolver).await;
                if resolved.is_none() {
                    self.unresolvable.insert(key);
                }
                resolved
            }
            None => {
                if let Some(known) = self.current_versions.get(target_id) {
                    return known.clone();
                }
                let key = self.resolve_into_arena(target_id, None, resolver).await;
                self.current_versions.insert(target_id.to_string(), key.clone());
                key
            }
        }
    }

    async fn resolve_into_arena<R>(
        &mut self,
        target_id: &str,
        version: Option<i64>,
        resolver: &R,
    ) -> Option<String>
    where
        R: EntityResolver + ?Sized,
    {
        match resolver.resolve(target_id, version).await {
            Ok(entity) => {
                let key = entity.key.clone();
                if self.insert_vertex(Vertex::Entity(entity)) {
                    self.stats.synthesized_entities += 1;
                }
                Some(key)
            }
            Err(e) => {
                warn!(target = %target_id, ?version, error = %e, "could not resolve used entity");
                self.stats.unresolved_inputs += 1;
                None
            }
        }
    }
}

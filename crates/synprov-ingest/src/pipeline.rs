//! End-to-end export: projects → entities → provenance → graph.

use crate::error::IngestError;
use crate::fetch::EntityFetcher;
use crate::normalize::{Normalizer, RepositoryResolver};
use crate::pool::{FetchPool, DEFAULT_WORKERS};
use crate::provenance::ProvenanceFetcher;
use std::sync::Arc;
use synprov_graph::{clean_activities, BuildStats, GraphBuilder};
use synprov_model::keys::IGNORED_ENTITY_TYPES;
use synprov_model::{EntityVertex, PropertyGraph};
use synprov_repo::RepositoryClient;
use tracing::{info, warn};

/// Projects too large to export in one pass; skipped when exporting `all`.
pub const DEFAULT_SKIP_LIST: [&str; 5] = [
    "syn582072",
    "syn3218329",
    "syn2044761",
    "syn2351328",
    "syn1450028",
];

// ============================================================================
// Options
// ============================================================================

#[derive(Debug, Clone)]
pub struct ExportOptions {
    /// Concurrent fetches.
    pub workers: usize,
    /// Projects left out of an `all` export.
    pub skip_list: Vec<String>,
    /// Entity type discriminators never turned into vertices.
    pub ignored_types: Vec<String>,
}

impl Default for ExportOptions {
    fn default() -> Self {
        Self {
            workers: DEFAULT_WORKERS,
            skip_list: DEFAULT_SKIP_LIST.iter().map(|s| s.to_string()).collect(),
            ignored_types: IGNORED_ENTITY_TYPES.iter().map(|s| s.to_string()).collect(),
        }
    }
}

impl ExportOptions {
    pub fn with_workers(mut self, workers: usize) -> Self {
        self.workers = workers;
        self
    }

    pub fn skipping(mut self, ids: impl IntoIterator<Item = String>) -> Self {
        for id in ids {
            if !self.skip_list.contains(&id) {
                self.skip_list.push(id);
            }
        }
        self
    }
}

/// Which projects to export.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProjectSelection {
    /// Every project visible to the caller, minus the skip list.
    All,
    /// Exactly these projects, in this order.
    Ids(Vec<String>),
}

impl ProjectSelection {
    /// `[]` and `["all"]` both mean every project.
    pub fn from_args(args: Vec<String>) -> Self {
        if args.is_empty() || args.iter().any(|a| a.eq_ignore_ascii_case("all")) {
            Self::All
        } else {
            Self::Ids(args)
        }
    }
}

// ============================================================================
// Report
// ============================================================================

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExportStats {
    pub projects: usize,
    pub failed_projects: usize,
    pub skipped_projects: usize,
    pub entities: usize,
    /// Entities with a visible activity.
    pub activities: usize,
    pub build: BuildStats,
}

impl ExportStats {
    /// Share of fetched entities that carry provenance, in percent.
    pub fn provenance_percentage(&self) -> f64 {
        if self.entities == 0 {
            return 0.0;
        }
        self.activities as f64 / self.entities as f64 * 100.0
    }
}

#[derive(Debug)]
pub struct ExportReport {
    pub graph: PropertyGraph,
    pub stats: ExportStats,
}

// ============================================================================
// Pipeline
// ============================================================================

pub struct ExportPipeline {
    repo: Arc<dyn RepositoryClient>,
    options: ExportOptions,
    normalizer: Arc<Normalizer>,
    pool: FetchPool,
}

impl ExportPipeline {
    pub fn new(repo: Arc<dyn RepositoryClient>, options: ExportOptions) -> Self {
        let normalizer = Arc::new(
            Normalizer::new(Arc::clone(&repo)).with_ignored_types(options.ignored_types.clone()),
        );
        let pool = FetchPool::new(options.workers);
        Self {
            repo,
            options,
            normalizer,
            pool,
        }
    }

    /// Run one export. Only a failure to list projects is fatal; everything
    /// else is logged and the offending item left out.
    pub async fn run(&self, selection: ProjectSelection) -> Result<ExportReport, IngestError> {
        info!(workers = self.pool.size(), "starting export");
        let mut stats = ExportStats::default();
        let projects = self.select_projects(selection, &mut stats).await?;

        let entities = self.fetch_entities(&projects, &mut stats).await;
        stats.entities = entities.len();
        info!(entities = entities.len(), "fetched entities");

        // Barrier: every provenance fetch resolves before the build starts.
        let outcomes = ProvenanceFetcher::new(Arc::clone(&self.repo))
            .fetch_all(&self.pool, &entities)
            .await;
        let activities = clean_activities(outcomes);
        stats.activities = activities.len();
        info!(
            activities = stats.activities,
            "percentage of entities with provenance: {:.2}%",
            stats.provenance_percentage()
        );

        let resolver = RepositoryResolver::new(Arc::clone(&self.repo), Arc::clone(&self.normalizer));
        let (graph, build) = GraphBuilder::with_entities(entities)
            .build_with_stats(activities, &resolver)
            .await;
        stats.build = build;
        info!(
            vertices = graph.vertices.len(),
            edges = graph.edges.len(),
            "export complete"
        );

        Ok(ExportReport { graph, stats })
    }

    async fn select_projects(
        &self,
        selection: ProjectSelection,
        stats: &mut ExportStats,
    ) -> Result<Vec<String>, IngestError> {
        match selection {
            ProjectSelection::Ids(ids) => Ok(ids),
            ProjectSelection::All => {
                info!("listing all projects");
                let listed = self.repo.list_projects().await?;
                let before = listed.len();
                let kept: Vec<String> = listed
                    .into_iter()
                    .filter(|p| !self.options.skip_list.contains(p))
                    .collect();
                stats.skipped_projects = before - kept.len();
                Ok(kept)
            }
        }
    }

    async fn fetch_entities(&self, projects: &[String], stats: &mut ExportStats) -> Vec<EntityVertex> {
        let fetcher = EntityFetcher::new(
            Arc::clone(&self.repo),
            Arc::clone(&self.normalizer),
            self.pool.clone(),
        );
        let mut entities = Vec::new();
        for project in projects {
            info!(project = %project, "processing project");
            match fetcher.fetch_project(project).await {
                Ok(fetched) => {
                    stats.projects += 1;
                    entities.extend(fetched);
                }
                Err(e) => {
                    stats.failed_projects += 1;
                    warn!(project = %project, error = %e, "project skipped");
                }
            }
        }
        entities
    }
}

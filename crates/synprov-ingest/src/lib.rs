//! Fetch phase of the export pipeline.
//!
//! - [`Normalizer`]: raw entity record → [`EntityVertex`](synprov_model::EntityVertex)
//! - [`EntityFetcher`]: every version of every file entity under a project
//! - [`ProvenanceFetcher`]: the activity behind each entity version
//! - [`FetchPool`]: bounded worker pool the fetchers share
//! - [`ExportPipeline`]: fetch → barrier → single-threaded graph build
//!
//! Per-item failures are logged and the item dropped; only failures that
//! make the whole run meaningless (cannot list projects) are returned.

pub mod error;
pub mod fetch;
pub mod normalize;
pub mod pipeline;
pub mod pool;
pub mod provenance;

pub use error::IngestError;
pub use fetch::EntityFetcher;
pub use normalize::{ContainerCache, Normalizer, RepositoryResolver};
pub use pipeline::{
    ExportOptions, ExportPipeline, ExportReport, ExportStats, ProjectSelection, DEFAULT_SKIP_LIST,
};
pub use pool::{FetchPool, DEFAULT_WORKERS};
pub use provenance::ProvenanceFetcher;

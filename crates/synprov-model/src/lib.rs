//! Provenance property-graph model.
//!
//! Everything the pipeline moves around after it leaves the repository
//! client lives here:
//! - [`Vertex`]: a tagged variant over Entity / Activity / external resource,
//! - [`Edge`]: `generatedBy` / `used` / `executed` relations stamped with the
//!   authorship of the activity that produced them,
//! - [`keys`]: content-derived identifiers (`synId.version`, URL UUIDv3),
//! - [`GraphDocument`]: the flat `{"vertices": [...], "edges": [...]}` export.
//!
//! Records are flat by construction: every attribute value is a [`Scalar`],
//! so the document can be staged to CSV without loss of structure.

pub mod document;
pub mod edge;
pub mod error;
pub mod keys;
pub mod reference;
pub mod scalar;
pub mod vertex;

pub use document::{GraphDocument, PropertyGraph};
pub use edge::{Edge, EdgeLabel, ProvenanceStamp};
pub use error::ModelError;
pub use reference::UsedReference;
pub use scalar::{flatten_record, FlatRecord, Scalar};
pub use vertex::{ActivityVertex, EntityVertex, ExternalResource, Vertex};

//! Provenance graph construction.
//!
//! Runs after every fetch has resolved. The builder owns its arena
//! exclusively: one append-only vertex table with a key → slot index, and
//! one append-only edge table. Nothing else may touch it while it runs.
//!
//! ```text
//!  entities ──┐
//!             ├─► clean_activities ─► GraphBuilder::build ─► PropertyGraph
//!  outcomes ──┘                              │
//!                                            └─► EntityResolver (missing inputs)
//! ```

pub mod builder;
pub mod resolver;

pub use builder::{clean_activities, BuildStats, GraphBuilder, ProvenanceOutcome};
pub use resolver::{EntityResolver, ResolveError};

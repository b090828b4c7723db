//! Content-derived identifiers and repository type discriminators.
//!
//! Keys are pure functions of record content. Two runs over the same input
//! therefore agree on every `_id`, which is what makes a rerun after a
//! partial failure converge on the same graph.

use uuid::Uuid;

pub const PROJECT_TYPE: &str = "org.sagebionetworks.repo.model.Project";
pub const PREVIEW_TYPE: &str = "org.sagebionetworks.repo.model.Preview";
pub const FOLDER_TYPE: &str = "org.sagebionetworks.repo.model.Folder";

pub const ACTIVITY_TYPE: &str = "org.sagebionetworks.repo.model.provenance.Activity";
pub const USED_ENTITY_TYPE: &str = "org.sagebionetworks.repo.model.provenance.UsedEntity";
pub const USED_URL_TYPE: &str = "org.sagebionetworks.repo.model.provenance.UsedURL";

/// Container types that never become vertices.
pub const IGNORED_ENTITY_TYPES: [&str; 3] = [PROJECT_TYPE, PREVIEW_TYPE, FOLDER_TYPE];

/// `"{synId}.{versionNumber}"`, the key of one entity version.
pub fn entity_key(syn_id: &str, version_number: i64) -> String {
    format!("{syn_id}.{version_number}")
}

/// UUIDv3 of `url` in the RFC 4122 URL namespace.
pub fn url_key(url: &str) -> String {
    Uuid::new_v3(&Uuid::NAMESPACE_URL, url.as_bytes()).to_string()
}

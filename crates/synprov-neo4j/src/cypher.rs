//! Cypher text for the bulk load.
//!
//! Every row-carrying statement reads its rows from a single `$rows`
//! parameter.

use synprov_model::EdgeLabel;

pub const ENTITY_LABEL: &str = "Entity";
pub const ACTIVITY_LABEL: &str = "Activity";

const CONSTRAINTS: [(&str, &str); 2] = [
    ("entity_id_unique", ENTITY_LABEL),
    ("activity_id_unique", ACTIVITY_LABEL),
];

/// Uniqueness on `_id` per label plus a lookup index on `Entity.projectId`.
pub fn schema_statements() -> Vec<String> {
    let mut statements: Vec<String> = CONSTRAINTS
        .iter()
        .map(|(name, label)| {
            format!("CREATE CONSTRAINT {name} IF NOT EXISTS FOR (n:{label}) REQUIRE n._id IS UNIQUE")
        })
        .collect();
    statements.push(format!(
        "CREATE INDEX entity_project IF NOT EXISTS FOR (n:{ENTITY_LABEL}) ON (n.projectId)"
    ));
    statements
}

/// Merge node rows under `label`. Existing nodes are left untouched.
pub fn merge_nodes(label: &str) -> String {
    format!("UNWIND $rows AS row MERGE (n:{label} {{_id: row._id}}) ON CREATE SET n = row")
}

/// Merge relationship rows for one edge label.
///
/// `generatedBy` runs activity → entity; `used` / `executed` run
/// input → activity.
pub fn merge_edges(label: EdgeLabel) -> String {
    let (in_label, out_label) = match label {
        EdgeLabel::GeneratedBy => (ENTITY_LABEL, ACTIVITY_LABEL),
        EdgeLabel::Used | EdgeLabel::Executed => (ACTIVITY_LABEL, ENTITY_LABEL),
    };
    let relationship = label.relationship_type();
    format!(
        "UNWIND $rows AS row \
         MATCH (i:{in_label} {{_id: row._inV}}) \
         MATCH (o:{out_label} {{_id: row._outV}}) \
         MERGE (o)-[r:{relationship}]->(i) \
         SET r.action = row.action, r.wasExecuted = row.wasExecuted, \
         r.createdBy = row.createdBy, r.createdOn = row.createdOn, \
         r.modifiedBy = row.modifiedBy, r.modifiedOn = row.modifiedOn"
    )
}

/// Drop the `_id` constraints, then the `_id` properties themselves.
pub fn strip_id_statements() -> Vec<String> {
    let mut statements: Vec<String> = CONSTRAINTS
        .iter()
        .map(|(name, _)| format!("DROP CONSTRAINT {name} IF EXISTS"))
        .collect();
    for label in [ENTITY_LABEL, ACTIVITY_LABEL] {
        statements.push(format!("MATCH (n:{label}) WHERE n._id IS NOT NULL REMOVE n._id"));
    }
    statements
}

//! Edges and their labels.

use crate::scalar::{FlatRecord, Scalar};
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum EdgeLabel {
    /// Entity version → the activity that generated it.
    GeneratedBy,
    /// Activity → an input it read.
    Used,
    /// Activity → an input it ran as a process step.
    Executed,
}

impl EdgeLabel {
    pub const ALL: [EdgeLabel; 3] = [EdgeLabel::GeneratedBy, EdgeLabel::Used, EdgeLabel::Executed];

    /// The `_label` value written to the export document.
    pub fn as_str(&self) -> &'static str {
        match self {
            EdgeLabel::GeneratedBy => "generatedBy",
            EdgeLabel::Used => "used",
            EdgeLabel::Executed => "executed",
        }
    }

    /// Relationship type in the graph database.
    pub fn relationship_type(&self) -> &'static str {
        match self {
            EdgeLabel::GeneratedBy => "GENERATED_BY",
            EdgeLabel::Used => "USED",
            EdgeLabel::Executed => "EXECUTED",
        }
    }

    pub fn for_input(was_executed: bool) -> Self {
        if was_executed {
            EdgeLabel::Executed
        } else {
            EdgeLabel::Used
        }
    }
}

impl fmt::Display for EdgeLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Authorship and timestamps of an activity, copied onto every edge the
/// activity is responsible for.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProvenanceStamp {
    #[serde(default)]
    pub created_by: String,
    #[serde(default)]
    pub created_on: String,
    #[serde(default)]
    pub modified_by: String,
    #[serde(default)]
    pub modified_on: String,
}

impl ProvenanceStamp {
    pub fn write_into(&self, record: &mut FlatRecord) {
        record.insert("createdBy".into(), Scalar::from(self.created_by.as_str()));
        record.insert("createdOn".into(), Scalar::from(self.created_on.as_str()));
        record.insert("modifiedBy".into(), Scalar::from(self.modified_by.as_str()));
        record.insert("modifiedOn".into(), Scalar::from(self.modified_on.as_str()));
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Edge {
    #[serde(rename = "_inV")]
    pub in_v: String,
    #[serde(rename = "_outV")]
    pub out_v: String,
    #[serde(rename = "_label")]
    pub label: EdgeLabel,
    #[serde(flatten)]
    pub stamp: ProvenanceStamp,
    /// Present on input edges only.
    #[serde(rename = "wasExecuted", default, skip_serializing_if = "Option::is_none")]
    pub was_executed: Option<bool>,
}

impl Edge {
    pub fn generated_by(entity_key: &str, activity_key: &str, stamp: &ProvenanceStamp) -> Self {
        Self {
            in_v: entity_key.to_string(),
            out_v: activity_key.to_string(),
            label: EdgeLabel::GeneratedBy,
            stamp: stamp.clone(),
            was_executed: None,
        }
    }

    pub fn input(
        activity_key: &str,
        target_key: &str,
        was_executed: bool,
        stamp: &ProvenanceStamp,
    ) -> Self {
        Self {
            in_v: activity_key.to_string(),
            out_v: target_key.to_string(),
            label: EdgeLabel::for_input(was_executed),
            stamp: stamp.clone(),
            was_executed: Some(was_executed),
        }
    }

    pub fn to_record(&self) -> FlatRecord {
        let mut record = FlatRecord::new();
        record.insert("_inV".into(), Scalar::from(self.in_v.as_str()));
        record.insert("_outV".into(), Scalar::from(self.out_v.as_str()));
        record.insert("_label".into(), Scalar::from(self.label.as_str()));
        self.stamp.write_into(&mut record);
        if let Some(executed) = self.was_executed {
            record.insert("wasExecuted".into(), Scalar::Bool(executed));
        }
        record
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stamp() -> ProvenanceStamp {
        ProvenanceStamp {
            created_by: "273950".into(),
            created_on: "2014-01-01T00:00:00.000Z".into(),
            modified_by: "273950".into(),
            modified_on: "2014-01-02T00:00:00.000Z".into(),
        }
    }

    #[test]
    fn edge_serializes_flat() {
        let edge = Edge::input("P1", "syn2.1", true, &stamp());
        let json = serde_json::to_value(&edge).unwrap();
        assert_eq!(json["_inV"], "P1");
        assert_eq!(json["_outV"], "syn2.1");
        assert_eq!(json["_label"], "executed");
        assert_eq!(json["createdBy"], "273950");
        assert_eq!(json["wasExecuted"], true);
        assert!(json.as_object().unwrap().values().all(|v| !v.is_object()));
    }

    #[test]
    fn generated_by_edge_has_no_execution_flag() {
        let edge = Edge::generated_by("syn1.1", "P1", &stamp());
        let json = serde_json::to_value(&edge).unwrap();
        assert_eq!(json["_label"], "generatedBy");
        assert!(json.get("wasExecuted").is_none());
    }

    #[test]
    fn edge_without_stamp_still_parses() {
        let edge: Edge =
            serde_json::from_str(r#"{"_inV":"a","_outV":"b","_label":"generatedBy"}"#).unwrap();
        assert_eq!(edge.label, EdgeLabel::GeneratedBy);
        assert_eq!(edge.stamp, ProvenanceStamp::default());
    }
}

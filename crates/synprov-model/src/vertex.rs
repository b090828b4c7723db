//! Vertex variants.

use crate::edge::ProvenanceStamp;
use crate::error::ModelError;
use crate::keys::{self, ACTIVITY_TYPE, USED_URL_TYPE};
use crate::scalar::{FlatRecord, Scalar};
use serde_json::Value;

// ============================================================================
// Entity
// ============================================================================

/// One version of a repository entity.
#[derive(Debug, Clone, PartialEq)]
pub struct EntityVertex {
    /// `{synId}.{versionNumber}`
    pub key: String,
    pub syn_id: String,
    pub version_number: i64,
    pub concrete_type: String,
    pub project_id: String,
    pub benefactor_id: String,
    /// Every other flattened attribute (name, etag, annotations, ...).
    pub attributes: FlatRecord,
}

/// Attributes owned by the typed fields; stripped from `attributes`.
const ENTITY_RESERVED: [&str; 7] = [
    "_id",
    "id",
    "synId",
    "versionNumber",
    "concreteType",
    "projectId",
    "benefactorId",
];

impl EntityVertex {
    /// Build from an already flattened record. `id` and `versionNumber` are
    /// required; a record without a `concreteType` keeps its `entityType`.
    pub fn from_flat(
        mut flat: FlatRecord,
        project_id: String,
        benefactor_id: String,
    ) -> Result<Self, ModelError> {
        let syn_id = flat
            .get("id")
            .or_else(|| flat.get("synId"))
            .and_then(Scalar::as_str)
            .map(str::to_string)
            .ok_or(ModelError::MissingField("id"))?;
        let version_number = match flat.get("versionNumber") {
            Some(v) => v.as_i64().ok_or_else(|| ModelError::InvalidField {
                field: "versionNumber",
                value: v.to_text(),
            })?,
            None => return Err(ModelError::MissingField("versionNumber")),
        };
        let concrete_type = flat
            .get("concreteType")
            .or_else(|| flat.get("entityType"))
            .map(Scalar::to_text)
            .unwrap_or_default();

        for reserved in ENTITY_RESERVED {
            flat.remove(reserved);
        }

        Ok(Self {
            key: keys::entity_key(&syn_id, version_number),
            syn_id,
            version_number,
            concrete_type,
            project_id,
            benefactor_id,
            attributes: flat,
        })
    }

    pub fn to_record(&self) -> FlatRecord {
        let mut record = self.attributes.clone();
        record.insert("_id".into(), Scalar::from(self.key.as_str()));
        record.insert("synId".into(), Scalar::from(self.syn_id.as_str()));
        record.insert("versionNumber".into(), Scalar::Int(self.version_number));
        record.insert("concreteType".into(), Scalar::from(self.concrete_type.as_str()));
        record.insert("projectId".into(), Scalar::from(self.project_id.as_str()));
        record.insert("benefactorId".into(), Scalar::from(self.benefactor_id.as_str()));
        record
    }
}

// ============================================================================
// Activity
// ============================================================================

/// A provenance activity, deduplicated by its native id.
#[derive(Debug, Clone, PartialEq)]
pub struct ActivityVertex {
    pub key: String,
    pub name: Option<String>,
    pub description: Option<String>,
    pub etag: Option<String>,
    pub stamp: ProvenanceStamp,
    /// Raw input-reference descriptors; consumed by the graph builder and
    /// never written to the export.
    pub used: Vec<Value>,
}

impl ActivityVertex {
    /// Parse a raw activity record. The native `id` becomes the vertex key.
    pub fn from_record(record: &Value) -> Result<Self, ModelError> {
        let obj = record.as_object().ok_or(ModelError::NotAnObject)?;

        let key = match obj.get("id") {
            Some(Value::String(s)) if !s.is_empty() => s.clone(),
            Some(Value::Number(n)) => n.to_string(),
            Some(other) => {
                return Err(ModelError::InvalidField {
                    field: "id",
                    value: other.to_string(),
                })
            }
            None => return Err(ModelError::MissingField("id")),
        };

        let required = |field: &'static str| -> Result<String, ModelError> {
            match obj.get(field) {
                Some(Value::String(s)) => Ok(s.clone()),
                Some(Value::Number(n)) => Ok(n.to_string()),
                _ => Err(ModelError::MissingField(field)),
            }
        };
        let optional = |field: &str| obj.get(field).and_then(Value::as_str).map(str::to_string);

        let stamp = ProvenanceStamp {
            created_by: required("createdBy")?,
            created_on: required("createdOn")?,
            modified_by: required("modifiedBy")?,
            modified_on: required("modifiedOn")?,
        };

        let used = match obj.get("used") {
            Some(Value::Array(items)) => items.clone(),
            Some(Value::Null) | None => Vec::new(),
            Some(other) => {
                return Err(ModelError::InvalidField {
                    field: "used",
                    value: other.to_string(),
                })
            }
        };

        Ok(Self {
            key,
            name: optional("name"),
            description: optional("description"),
            etag: optional("etag"),
            stamp,
            used,
        })
    }

    pub fn to_record(&self) -> FlatRecord {
        let mut record = FlatRecord::new();
        record.insert("_id".into(), Scalar::from(self.key.as_str()));
        record.insert("concreteType".into(), Scalar::from(ACTIVITY_TYPE));
        if let Some(name) = &self.name {
            record.insert("name".into(), Scalar::from(name.as_str()));
        }
        if let Some(description) = &self.description {
            record.insert("description".into(), Scalar::from(description.as_str()));
        }
        if let Some(etag) = &self.etag {
            record.insert("etag".into(), Scalar::from(etag.as_str()));
        }
        self.stamp.write_into(&mut record);
        record
    }
}

// ============================================================================
// External resource
// ============================================================================

/// A URL referenced as an activity input.
#[derive(Debug, Clone, PartialEq)]
pub struct ExternalResource {
    pub key: String,
    pub url: String,
    pub name: Option<String>,
}

impl ExternalResource {
    pub fn for_url(url: &str, name: Option<String>) -> Self {
        Self {
            key: keys::url_key(url),
            url: url.to_string(),
            name,
        }
    }

    pub fn to_record(&self) -> FlatRecord {
        let mut record = FlatRecord::new();
        record.insert("_id".into(), Scalar::from(self.key.as_str()));
        record.insert("concreteType".into(), Scalar::from(USED_URL_TYPE));
        record.insert("url".into(), Scalar::from(self.url.as_str()));
        record.insert(
            "name".into(),
            self.name.as_deref().map(Scalar::from).unwrap_or(Scalar::Null),
        );
        record
    }
}

// ============================================================================
// Vertex
// ============================================================================

#[derive(Debug, Clone, PartialEq)]
pub enum Vertex {
    Entity(EntityVertex),
    Activity(ActivityVertex),
    External(ExternalResource),
}

impl Vertex {
    pub fn key(&self) -> &str {
        match self {
            Vertex::Entity(v) => &v.key,
            Vertex::Activity(v) => &v.key,
            Vertex::External(v) => &v.key,
        }
    }

    pub fn concrete_type(&self) -> &str {
        match self {
            Vertex::Entity(v) => &v.concrete_type,
            Vertex::Activity(_) => ACTIVITY_TYPE,
            Vertex::External(_) => USED_URL_TYPE,
        }
    }

    pub fn is_activity(&self) -> bool {
        matches!(self, Vertex::Activity(_))
    }

    pub fn to_record(&self) -> FlatRecord {
        match self {
            Vertex::Entity(v) => v.to_record(),
            Vertex::Activity(v) => v.to_record(),
            Vertex::External(v) => v.to_record(),
        }
    }
}

impl From<EntityVertex> for Vertex {
    fn from(value: EntityVertex) -> Self {
        Vertex::Entity(value)
    }
}

impl From<ActivityVertex> for Vertex {
    fn from(value: ActivityVertex) -> Self {
        Vertex::Activity(value)
    }
}

impl From<ExternalResource> for Vertex {
    fn from(value: ExternalResource) -> Self {
        Vertex::External(value)
    }
}

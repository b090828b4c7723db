//! Activity input references (`used` entries).

use crate::error::ModelError;
use crate::keys::{USED_ENTITY_TYPE, USED_URL_TYPE};
use serde_json::Value;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UsedReference {
    Entity {
        target_id: String,
        /// Absent when the reference points at "the current version".
        target_version: Option<i64>,
        was_executed: bool,
    },
    Url {
        url: String,
        name: Option<String>,
        was_executed: bool,
    },
}

impl UsedReference {
    pub fn parse(raw: &Value) -> Result<Self, ModelError> {
        let obj = raw.as_object().ok_or(ModelError::NotAnObject)?;
        let was_executed = obj
            .get("wasExecuted")
            .and_then(Value::as_bool)
            .unwrap_or(false);
        let concrete_type = obj
            .get("concreteType")
            .and_then(Value::as_str)
            .ok_or(ModelError::MissingField("concreteType"))?;

        match concrete_type {
            USED_ENTITY_TYPE => {
                let reference = obj
                    .get("reference")
                    .and_then(Value::as_object)
                    .ok_or(ModelError::MissingField("reference"))?;
                let target_id = reference
                    .get("targetId")
                    .and_then(Value::as_str)
                    .filter(|s| !s.is_empty())
                    .ok_or(ModelError::MissingField("reference.targetId"))?
                    .to_string();
                let target_version = match reference.get("targetVersionNumber") {
                    None | Some(Value::Null) => None,
                    Some(Value::Number(n)) => Some(n.as_i64().ok_or_else(|| {
                        ModelError::InvalidField {
                            field: "reference.targetVersionNumber",
                            value: n.to_string(),
                        }
                    })?),
                    Some(Value::String(s)) => {
                        Some(s.trim().parse().map_err(|_| ModelError::InvalidField {
                            field: "reference.targetVersionNumber",
                            value: s.clone(),
                        })?)
                    }
                    Some(other) => {
                        return Err(ModelError::InvalidField {
                            field: "reference.targetVersionNumber",
                            value: other.to_string(),
                        })
                    }
                };
                Ok(UsedReference::Entity {
                    target_id,
                    target_version,
                    was_executed,
                })
            }
            USED_URL_TYPE => {
                let url = obj
                    .get("url")
                    .and_then(Value::as_str)
                    .filter(|s| !s.is_empty())
                    .ok_or(ModelError::MissingField("url"))?
                    .to_string();
                let name = obj.get("name").and_then(Value::as_str).map(str::to_string);
                Ok(UsedReference::Url {
                    url,
                    name,
                    was_executed,
                })
            }
            other => Err(ModelError::UnsupportedReference(other.to_string())),
        }
    }

    pub fn was_executed(&self) -> bool {
        match self {
            UsedReference::Entity { was_executed, .. } | UsedReference::Url { was_executed, .. } => {
                *was_executed
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn parses_used_entity() {
        let raw = json!({
            "concreteType": USED_ENTITY_TYPE,
            "reference": {"targetId": "syn9", "targetVersionNumber": 3},
            "wasExecuted": true
        });
        assert_eq!(
            UsedReference::parse(&raw).unwrap(),
            UsedReference::Entity {
                target_id: "syn9".into(),
                target_version: Some(3),
                was_executed: true
            }
        );
    }

    #[test]
    fn unversioned_entity_reference_is_allowed() {
        let raw = json!({"concreteType": USED_ENTITY_TYPE, "reference": {"targetId": "syn9"}});
        let parsed = UsedReference::parse(&raw).unwrap();
        assert!(matches!(parsed, UsedReference::Entity { target_version: None, .. }));
        assert!(!parsed.was_executed());
    }

    #[test]
    fn parses_used_url() {
        let raw = json!({"concreteType": USED_URL_TYPE, "url": "https://x.org/a", "name": "a"});
        let parsed = UsedReference::parse(&raw).unwrap();
        assert_eq!(
            parsed,
            UsedReference::Url {
                url: "https://x.org/a".into(),
                name: Some("a".into()),
                was_executed: false
            }
        );
    }

    #[test]
    fn malformed_references_are_errors() {
        let missing_target = json!({"concreteType": USED_ENTITY_TYPE, "reference": {}});
        assert!(matches!(
            UsedReference::parse(&missing_target),
            Err(ModelError::MissingField("reference.targetId"))
        ));

        let missing_url = json!({"concreteType": USED_URL_TYPE});
        assert!(matches!(
            UsedReference::parse(&missing_url),
            Err(ModelError::MissingField("url"))
        ));

        let unknown = json!({"concreteType": "org.example.Mystery"});
        assert!(matches!(
            UsedReference::parse(&unknown),
            Err(ModelError::UnsupportedReference(_))
        ));
    }
}

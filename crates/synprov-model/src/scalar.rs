//! Flat attribute values.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::fmt;

/// A flat record: attribute name → scalar. Sorted keys keep the JSON and
/// CSV output byte-stable across runs.
pub type FlatRecord = BTreeMap<String, Scalar>;

/// A single attribute value that survives staging to a CSV cell.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Scalar {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
}

impl Scalar {
    /// Convert a JSON value, rendering nested arrays/objects as compact JSON
    /// text so the result stays flat.
    pub fn from_json(value: &Value) -> Self {
        match value {
            Value::Null => Scalar::Null,
            Value::Bool(b) => Scalar::Bool(*b),
            Value::Number(n) => match n.as_i64() {
                Some(i) => Scalar::Int(i),
                None => n.as_f64().map(Scalar::Float).unwrap_or(Scalar::Null),
            },
            Value::String(s) => Scalar::Str(s.clone()),
            Value::Array(_) | Value::Object(_) => Scalar::Str(value.to_string()),
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Scalar::Str(s) => Some(s),
            _ => None,
        }
    }

    /// Integer view, accepting digit strings (repositories are not always
    /// consistent about numeric ids).
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Scalar::Int(i) => Some(*i),
            Scalar::Str(s) => s.trim().parse().ok(),
            _ => None,
        }
    }

    /// Text rendering used for identifiers and CSV cells; `Null` is empty.
    pub fn to_text(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for Scalar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Scalar::Null => Ok(()),
            Scalar::Bool(b) => write!(f, "{b}"),
            Scalar::Int(i) => write!(f, "{i}"),
            Scalar::Float(x) => write!(f, "{x}"),
            Scalar::Str(s) => f.write_str(s),
        }
    }
}

impl From<&str> for Scalar {
    fn from(value: &str) -> Self {
        Scalar::Str(value.to_string())
    }
}

impl From<String> for Scalar {
    fn from(value: String) -> Self {
        Scalar::Str(value)
    }
}

impl From<i64> for Scalar {
    fn from(value: i64) -> Self {
        Scalar::Int(value)
    }
}

impl From<bool> for Scalar {
    fn from(value: bool) -> Self {
        Scalar::Bool(value)
    }
}

/// Flatten one raw repository record.
///
/// - a non-empty array is replaced by its first element (single-valued
///   annotation semantics),
/// - an empty array is dropped,
/// - the nested `annotations` object is discarded; the repository client has
///   already merged its values into the top-level namespace.
pub fn flatten_record(raw: &Map<String, Value>) -> FlatRecord {
    let mut out = FlatRecord::new();
    for (key, value) in raw {
        if key == "annotations" {
            continue;
        }
        let value = match value {
            Value::Array(items) => match items.first() {
                Some(first) => first,
                None => continue,
            },
            other => other,
        };
        out.insert(key.clone(), Scalar::from_json(value));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn flatten_takes_first_element_and_drops_annotations() {
        let raw = json!({
            "id": "syn1",
            "tissue": ["brain", "liver"],
            "empty": [],
            "annotations": {"tissue": ["brain"]},
            "nested": {"a": 1},
            "versionNumber": 3
        });
        let flat = flatten_record(raw.as_object().unwrap());

        assert_eq!(flat.get("tissue"), Some(&Scalar::from("brain")));
        assert!(!flat.contains_key("empty"));
        assert!(!flat.contains_key("annotations"));
        assert_eq!(flat.get("nested"), Some(&Scalar::from(r#"{"a":1}"#)));
        assert_eq!(flat.get("versionNumber"), Some(&Scalar::Int(3)));
    }

    #[test]
    fn scalar_text_rendering() {
        assert_eq!(Scalar::Null.to_text(), "");
        assert_eq!(Scalar::Bool(true).to_text(), "true");
        assert_eq!(Scalar::Int(-2).to_text(), "-2");
        assert_eq!(Scalar::from("x").to_text(), "x");
        assert_eq!(Scalar::from("17").as_i64(), Some(17));
    }

    #[test]
    fn scalar_json_shape_is_untagged() {
        let record: FlatRecord = serde_json::from_str(r#"{"a":null,"b":true,"c":3,"d":1.5,"e":"s"}"#)
            .unwrap();
        assert_eq!(record["a"], Scalar::Null);
        assert_eq!(record["b"], Scalar::Bool(true));
        assert_eq!(record["c"], Scalar::Int(3));
        assert_eq!(record["d"], Scalar::Float(1.5));
        assert_eq!(record["e"], Scalar::from("s"));
    }
}

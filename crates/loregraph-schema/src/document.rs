//! Schema document types, as read from JSON files.
//!
//! ```json
//! {
//!   "name": "add_npc",
//!   "description": "A non-player character",
//!   "properties": {
//!     "name": { "type": "string", "description": "Unique name", "required": true },
//!     "role": { "type": "string", "description": "Occupation", "required": true },
//!     "currentLocation": {
//!       "type": "string",
//!       "description": "Where the NPC is",
//!       "relationship": { "edgeType": "located_in", "description": "NPC location" }
//!     }
//!   },
//!   "additionalProperties": false
//! }
//! ```

use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

/// A declarative description of one node type.
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SchemaDocument {
    /// Tool name, e.g. `add_npc`. The node type is this name without `add_`.
    pub name: String,
    #[serde(default)]
    pub description: String,
    /// Properties in declared order.
    #[serde(default, deserialize_with = "ordered_properties")]
    pub properties: Vec<(String, PropertySchema)>,
    #[serde(default = "default_true")]
    pub additional_properties: bool,
}

/// One declared field.
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct PropertySchema {
    #[serde(rename = "type")]
    pub value_type: ValueType,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub required: bool,
    #[serde(default, rename = "enum")]
    pub allowed: Option<Vec<Value>>,
    #[serde(default)]
    pub items: Option<ItemSchema>,
    #[serde(default)]
    pub relationship: Option<Relationship>,
}

/// Element schema for `array` properties.
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct ItemSchema {
    #[serde(rename = "type")]
    pub value_type: ValueType,
    #[serde(default, rename = "enum")]
    pub allowed: Option<Vec<Value>>,
}

/// Marks a property whose values become outgoing edges instead of metadata.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Relationship {
    pub edge_type: String,
    #[serde(default)]
    pub description: String,
}

/// JSON value types a property may declare.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum ValueType {
    String,
    Number,
    Integer,
    Boolean,
    Array,
    Object,
}

impl ValueType {
    /// Whether `value` has this JSON type.
    pub fn accepts(&self, value: &Value) -> bool {
        match self {
            Self::String => value.is_string(),
            Self::Number => value.is_number(),
            Self::Integer => value.is_i64() || value.is_u64(),
            Self::Boolean => value.is_boolean(),
            Self::Array => value.is_array(),
            Self::Object => value.is_object(),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::String => "string",
            Self::Number => "number",
            Self::Integer => "integer",
            Self::Boolean => "boolean",
            Self::Array => "array",
            Self::Object => "object",
        }
    }
}

fn default_true() -> bool {
    true
}

/// Deserialize `properties` keeping the order fields appear in the file.
///
/// Relies on serde_json's `preserve_order` feature for the intermediate map.
fn ordered_properties<'de, D>(deserializer: D) -> Result<Vec<(String, PropertySchema)>, D::Error>
where
    D: Deserializer<'de>,
{
    let map = serde_json::Map::<String, Value>::deserialize(deserializer)?;
    let mut properties = Vec::with_capacity(map.len());
    for (field, raw) in map {
        let property = serde_json::from_value::<PropertySchema>(raw)
            .map_err(|e| D::Error::custom(format!("property '{field}': {e}")))?;
        properties.push((field, property));
    }
    Ok(properties)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_properties_keep_declared_order() {
        let doc: SchemaDocument = serde_json::from_str(
            r#"{
                "name": "add_quest",
                "properties": {
                    "name": {"type": "string", "required": true},
                    "status": {"type": "string", "enum": ["Active", "Done"]},
                    "description": {"type": "string"},
                    "objectives": {"type": "array", "items": {"type": "string"}}
                }
            }"#,
        )
        .unwrap();

        let fields: Vec<&str> = doc.properties.iter().map(|(f, _)| f.as_str()).collect();
        assert_eq!(fields, vec!["name", "status", "description", "objectives"]);
        assert!(doc.additional_properties);
    }

    #[test]
    fn test_unknown_type_names_the_property() {
        let err = serde_json::from_str::<SchemaDocument>(
            r#"{"name": "add_x", "properties": {"size": {"type": "huge"}}}"#,
        )
        .unwrap_err();
        assert!(err.to_string().contains("property 'size'"));
    }

    #[test]
    fn test_integer_rejects_fractions() {
        assert!(ValueType::Integer.accepts(&serde_json::json!(3)));
        assert!(!ValueType::Integer.accepts(&serde_json::json!(3.5)));
        assert!(ValueType::Number.accepts(&serde_json::json!(3.5)));
    }
}

//! Turns schema documents into compiled field specs and tools.
//!
//! Compilation is a pure function of the document: the same document always
//! yields the same required-field set, metadata order and edge types.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

use serde_json::{json, Map, Value};

use crate::document::{ItemSchema, SchemaDocument, ValueType};
use crate::error::{Result, SchemaError};
use crate::tool::{CompiledTool, ToolKind};

/// The property that holds the node's unique name.
pub const NAME_FIELD: &str = "name";

/// What a field turns into when a node is built.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldRole {
    /// The node name.
    Key,
    /// A rendered `"Label: value"` metadata line.
    Metadata,
    /// Outgoing edges of this type, one per value.
    Relationship { edge_type: String },
}

/// A compiled property.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldSpec {
    pub name: String,
    /// Metadata label: the field name with its first letter capitalized.
    pub label: String,
    pub value_type: ValueType,
    pub allowed: Option<Vec<Value>>,
    pub items: Option<ItemSchema>,
    pub required: bool,
    pub description: String,
    pub role: FieldRole,
}

/// A compiled schema: everything the add/update/delete tools need.
#[derive(Debug, Clone, PartialEq)]
pub struct CompiledSchema {
    pub node_type: String,
    pub description: String,
    /// Fields in declared order.
    pub fields: Vec<FieldSpec>,
    pub additional_properties: bool,
}

impl CompiledSchema {
    pub fn field(&self, name: &str) -> Option<&FieldSpec> {
        self.fields.iter().find(|f| f.name == name)
    }

    pub fn required_fields(&self) -> BTreeSet<&str> {
        self.fields
            .iter()
            .filter(|f| f.required)
            .map(|f| f.name.as_str())
            .collect()
    }

    pub fn metadata_fields(&self) -> impl Iterator<Item = &FieldSpec> {
        self.fields.iter().filter(|f| f.role == FieldRole::Metadata)
    }

    pub fn relationship_fields(&self) -> impl Iterator<Item = (&FieldSpec, &str)> {
        self.fields.iter().filter_map(|f| match &f.role {
            FieldRole::Relationship { edge_type } => Some((f, edge_type.as_str())),
            _ => None,
        })
    }

    pub fn relationship_edge_types(&self) -> BTreeSet<&str> {
        self.relationship_fields().map(|(_, t)| t).collect()
    }

    /// JSON schema of the tool input. Update inputs only require `name`.
    pub(crate) fn input_schema(&self, kind: ToolKind) -> Value {
        let fields: Vec<&FieldSpec> = match kind {
            ToolKind::Delete => self.fields.iter().filter(|f| f.role == FieldRole::Key).collect(),
            ToolKind::Add | ToolKind::Update => self.fields.iter().collect(),
        };

        let mut properties = Map::new();
        for field in &fields {
            properties.insert(field.name.clone(), property_schema(field));
        }

        let required: Vec<&str> = match kind {
            ToolKind::Add => fields
                .iter()
                .filter(|f| f.required)
                .map(|f| f.name.as_str())
                .collect(),
            ToolKind::Update | ToolKind::Delete => vec![NAME_FIELD],
        };

        json!({
            "type": "object",
            "properties": properties,
            "required": required,
            "additionalProperties": self.additional_properties,
        })
    }
}

fn property_schema(field: &FieldSpec) -> Value {
    let mut schema = Map::new();
    schema.insert("type".into(), json!(field.value_type.as_str()));
    let description = match &field.role {
        FieldRole::Relationship { edge_type } if field.description.is_empty() => {
            format!("Creates '{edge_type}' edges")
        }
        _ => field.description.clone(),
    };
    if !description.is_empty() {
        schema.insert("description".into(), json!(description));
    }
    if let Some(allowed) = &field.allowed {
        schema.insert("enum".into(), json!(allowed));
    }
    if let Some(items) = &field.items {
        let mut item = Map::new();
        item.insert("type".into(), json!(items.value_type.as_str()));
        if let Some(allowed) = &items.allowed {
            item.insert("enum".into(), json!(allowed));
        }
        schema.insert("items".into(), Value::Object(item));
    }
    Value::Object(schema)
}

/// Capitalize the first character: `currentLocation` → `CurrentLocation`.
pub fn capitalize(field: &str) -> String {
    let mut chars = field.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// Derive the node type from a schema name: `add_npc` → `npc`.
fn node_type_of(document: &SchemaDocument) -> Result<String> {
    let raw = document.name.trim();
    let node_type = raw.strip_prefix("add_").unwrap_or(raw);
    let valid = !node_type.is_empty()
        && node_type
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_');
    if !valid {
        return Err(invalid(
            &document.name,
            "name must be a tool name like 'add_npc' or a type like 'npc'",
        ));
    }
    Ok(node_type.to_string())
}

fn invalid(schema: &str, reason: impl Into<String>) -> SchemaError {
    SchemaError::Invalid {
        schema: schema.to_string(),
        reason: reason.into(),
    }
}

/// Compile one schema document.
pub fn compile(document: &SchemaDocument) -> Result<CompiledSchema> {
    let node_type = node_type_of(document)?;
    let mut fields = Vec::with_capacity(document.properties.len() + 1);

    for (name, property) in &document.properties {
        if name.is_empty() {
            return Err(invalid(&document.name, "property names must not be empty"));
        }
        if matches!(&property.allowed, Some(values) if values.is_empty()) {
            return Err(invalid(&document.name, format!("'{name}' has an empty enum")));
        }

        let role = if name == NAME_FIELD {
            if property.value_type != ValueType::String || property.relationship.is_some() {
                return Err(invalid(
                    &document.name,
                    "'name' must be a plain string property",
                ));
            }
            FieldRole::Key
        } else if let Some(relationship) = &property.relationship {
            if relationship.edge_type.trim().is_empty() {
                return Err(invalid(
                    &document.name,
                    format!("'{name}' has a relationship without an edgeType"),
                ));
            }
            let string_valued = match property.value_type {
                ValueType::String => true,
                ValueType::Array => property
                    .items
                    .as_ref()
                    .map_or(true, |items| items.value_type == ValueType::String),
                _ => false,
            };
            if !string_valued {
                return Err(invalid(
                    &document.name,
                    format!("relationship '{name}' must be a string or an array of strings"),
                ));
            }
            FieldRole::Relationship {
                edge_type: relationship.edge_type.clone(),
            }
        } else {
            FieldRole::Metadata
        };

        let description = match (&role, &property.relationship) {
            (FieldRole::Relationship { .. }, Some(rel)) if property.description.is_empty() => {
                rel.description.clone()
            }
            _ => property.description.clone(),
        };

        fields.push(FieldSpec {
            name: name.clone(),
            label: capitalize(name),
            value_type: property.value_type,
            allowed: property.allowed.clone(),
            items: property.items.clone(),
            required: property.required || role == FieldRole::Key,
            description,
            role,
        });
    }

    if !fields.iter().any(|f| f.role == FieldRole::Key) {
        fields.insert(
            0,
            FieldSpec {
                name: NAME_FIELD.to_string(),
                label: capitalize(NAME_FIELD),
                value_type: ValueType::String,
                allowed: None,
                items: None,
                required: true,
                description: format!("Unique name of the {node_type}"),
                role: FieldRole::Key,
            },
        );
    }

    let compiled = CompiledSchema {
        description: document.description.clone(),
        node_type,
        fields,
        additional_properties: document.additional_properties,
    };

    tracing::debug!(
        node_type = %compiled.node_type,
        fields = compiled.fields.len(),
        edge_types = ?compiled.relationship_edge_types(),
        "Schema compiled"
    );
    Ok(compiled)
}

/// Compile all documents into a tool-name → tool table.
///
/// Each schema yields `add_<type>`, `update_<type>` and `delete_<type>`.
/// Two schemas for the same node type are rejected.
pub fn compile_all(documents: &[SchemaDocument]) -> Result<BTreeMap<String, CompiledTool>> {
    let mut tools = BTreeMap::new();

    for document in documents {
        let schema = Arc::new(compile(document)?);
        for kind in [ToolKind::Add, ToolKind::Update, ToolKind::Delete] {
            let tool = CompiledTool::new(kind, Arc::clone(&schema));
            let name = tool.name().to_string();
            if tools.insert(name.clone(), tool).is_some() {
                return Err(SchemaError::DuplicateTool { tool: name });
            }
        }
    }

    Ok(tools)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn npc_document() -> SchemaDocument {
        serde_json::from_value(json!({
            "name": "add_npc",
            "description": "A non-player character",
            "properties": {
                "name": {"type": "string", "description": "NPC name", "required": true},
                "role": {"type": "string", "required": true},
                "status": {"type": "string", "enum": ["Alive", "Dead"], "required": true},
                "currentLocation": {
                    "type": "string",
                    "relationship": {"edgeType": "located_in", "description": "Where they are"}
                },
                "allies": {
                    "type": "array",
                    "items": {"type": "string"},
                    "relationship": {"edgeType": "allied_with", "description": "Friends"}
                },
                "description": {"type": "string"}
            },
            "additionalProperties": false
        }))
        .unwrap()
    }

    #[test]
    fn test_derives_fields_in_declared_order() {
        let schema = compile(&npc_document()).unwrap();
        assert_eq!(schema.node_type, "npc");

        let metadata: Vec<&str> = schema.metadata_fields().map(|f| f.label.as_str()).collect();
        assert_eq!(metadata, vec!["Role", "Status", "Description"]);

        assert_eq!(
            schema.required_fields(),
            BTreeSet::from(["name", "role", "status"])
        );
        assert_eq!(
            schema.relationship_edge_types(),
            BTreeSet::from(["allied_with", "located_in"])
        );
    }

    #[test]
    fn test_compilation_is_deterministic() {
        let first = compile(&npc_document()).unwrap();
        let second = compile(&npc_document()).unwrap();
        assert_eq!(first.required_fields(), second.required_fields());
        assert_eq!(
            first.relationship_edge_types(),
            second.relationship_edge_types()
        );
        assert_eq!(first, second);
    }

    #[test]
    fn test_name_field_is_synthesized_when_missing() {
        let doc: SchemaDocument = serde_json::from_value(json!({
            "name": "location",
            "properties": {"description": {"type": "string"}}
        }))
        .unwrap();

        let schema = compile(&doc).unwrap();
        assert_eq!(schema.node_type, "location");
        assert_eq!(schema.fields[0].role, FieldRole::Key);
        assert!(schema.required_fields().contains("name"));
    }

    #[test]
    fn test_relationship_must_be_string_valued() {
        let doc: SchemaDocument = serde_json::from_value(json!({
            "name": "add_item",
            "properties": {
                "weight": {"type": "number", "relationship": {"edgeType": "weighs"}}
            }
        }))
        .unwrap();

        let err = compile(&doc).unwrap_err();
        assert!(matches!(err, SchemaError::Invalid { .. }));
    }

    #[test]
    fn test_rejects_bad_tool_names() {
        let doc: SchemaDocument =
            serde_json::from_value(json!({"name": "add_", "properties": {}})).unwrap();
        assert!(compile(&doc).is_err());

        let doc: SchemaDocument =
            serde_json::from_value(json!({"name": "add npc", "properties": {}})).unwrap();
        assert!(compile(&doc).is_err());
    }

    #[test]
    fn test_accepts_mixed_case_type_names() {
        let doc: SchemaDocument =
            serde_json::from_value(json!({"name": "add_Guild_2", "properties": {}})).unwrap();
        assert_eq!(compile(&doc).unwrap().node_type, "Guild_2");
    }

    #[test]
    fn test_compile_all_yields_three_tools_per_schema() {
        let tools = compile_all(&[npc_document()]).unwrap();
        let names: Vec<&str> = tools.keys().map(String::as_str).collect();
        assert_eq!(names, vec!["add_npc", "delete_npc", "update_npc"]);
    }

    #[test]
    fn test_compile_all_rejects_duplicate_types() {
        let mut other = npc_document();
        other.name = "npc".to_string();
        let err = compile_all(&[npc_document(), other]).unwrap_err();
        assert!(matches!(err, SchemaError::DuplicateTool { .. }));
    }

    #[test]
    fn test_add_input_schema_lists_required_fields() {
        let schema = compile(&npc_document()).unwrap();
        let input = schema.input_schema(ToolKind::Add);
        assert_eq!(input["required"], json!(["name", "role", "status"]));
        assert_eq!(input["properties"]["status"]["enum"], json!(["Alive", "Dead"]));
        assert_eq!(input["additionalProperties"], json!(false));

        let update = schema.input_schema(ToolKind::Update);
        assert_eq!(update["required"], json!(["name"]));
    }

    #[test]
    fn test_capitalize_first_letter_only() {
        assert_eq!(capitalize("currentLocation"), "CurrentLocation");
        assert_eq!(capitalize("status"), "Status");
        assert_eq!(capitalize(""), "");
    }
}

//! Compiled `add_<type>`, `update_<type>` and `delete_<type>` tools.
//!
//! A compiled tool only validates: it turns raw JSON arguments into an
//! [`EntityOperation`] that the graph store applies as one unit.

use std::sync::Arc;

use serde_json::{Map, Value};

use loregraph_core::{
    Edge, EntityUpdate, LoreError, MetadataChange, Node, RelationshipChange, Result,
};

use crate::compiler::{CompiledSchema, FieldRole, FieldSpec, NAME_FIELD};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ToolKind {
    Add,
    Update,
    Delete,
}

impl ToolKind {
    pub fn prefix(&self) -> &'static str {
        match self {
            Self::Add => "add",
            Self::Update => "update",
            Self::Delete => "delete",
        }
    }
}

/// A validated, ready-to-apply entity mutation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EntityOperation {
    Create { node: Node, edges: Vec<Edge> },
    Update(EntityUpdate),
    Delete { name: String, node_type: String },
}

/// One generated tool bound to its compiled schema.
#[derive(Debug, Clone)]
pub struct CompiledTool {
    name: String,
    kind: ToolKind,
    schema: Arc<CompiledSchema>,
}

impl CompiledTool {
    pub fn new(kind: ToolKind, schema: Arc<CompiledSchema>) -> Self {
        Self {
            name: format!("{}_{}", kind.prefix(), schema.node_type),
            kind,
            schema,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn kind(&self) -> ToolKind {
        self.kind
    }

    pub fn schema(&self) -> &CompiledSchema {
        &self.schema
    }

    pub fn description(&self) -> String {
        let node_type = &self.schema.node_type;
        let summary = match self.kind {
            ToolKind::Add => format!("Create a new {node_type} node"),
            ToolKind::Update => format!("Update fields of an existing {node_type} node"),
            ToolKind::Delete => format!("Delete a {node_type} node and its edges"),
        };
        if self.schema.description.is_empty() {
            summary
        } else {
            format!("{summary}. {}", self.schema.description)
        }
    }

    pub fn input_schema(&self) -> Value {
        self.schema.input_schema(self.kind)
    }

    /// Validate raw arguments and build the entity operation.
    ///
    /// Any violation rejects the whole call; nothing is partially built.
    pub fn validate(&self, args: &Value) -> Result<EntityOperation> {
        let args = args
            .as_object()
            .ok_or_else(|| LoreError::validation("arguments", "must be a JSON object"))?;
        self.check_unknown_fields(args)?;
        let name = self.node_name(args)?;

        match self.kind {
            ToolKind::Add => self.build_create(name, args),
            ToolKind::Update => self.build_update(name, args),
            ToolKind::Delete => Ok(EntityOperation::Delete {
                name,
                node_type: self.schema.node_type.clone(),
            }),
        }
    }

    fn check_unknown_fields(&self, args: &Map<String, Value>) -> Result<()> {
        if self.schema.additional_properties {
            return Ok(());
        }
        let allowed = |key: &str| match self.kind {
            ToolKind::Delete => key == NAME_FIELD,
            ToolKind::Add | ToolKind::Update => self.schema.field(key).is_some(),
        };
        match args.keys().find(|key| !allowed(key.as_str())) {
            Some(key) => Err(LoreError::validation(
                key.as_str(),
                format!("is not a field of {}", self.name),
            )),
            None => Ok(()),
        }
    }

    fn node_name(&self, args: &Map<String, Value>) -> Result<String> {
        match present(args, NAME_FIELD) {
            Some(Value::String(name)) if !name.trim().is_empty() => Ok(name.clone()),
            Some(Value::String(_)) => Err(LoreError::validation(NAME_FIELD, "must not be empty")),
            Some(_) => Err(LoreError::validation(NAME_FIELD, "must be a string")),
            None => Err(LoreError::validation(NAME_FIELD, "is required")),
        }
    }

    fn build_create(&self, name: String, args: &Map<String, Value>) -> Result<EntityOperation> {
        let mut node = Node::new(name, &self.schema.node_type);
        let mut edges = Vec::new();

        for field in &self.schema.fields {
            let value = match present(args, &field.name) {
                Some(value) => value,
                None if field.required => {
                    return Err(LoreError::validation(field.name.as_str(), "is required"))
                }
                None => continue,
            };
            check_value(field, value)?;

            match &field.role {
                FieldRole::Key => {}
                FieldRole::Metadata => {
                    if let Some(rendered) = render_value(value) {
                        node.set_metadata_field(&field.label, Some(rendered.as_str()));
                    }
                }
                FieldRole::Relationship { edge_type } => {
                    for target in relationship_targets(field, value)? {
                        edges.push(Edge::new(&node.name, target, edge_type));
                    }
                }
            }
        }

        Ok(EntityOperation::Create { node, edges })
    }

    fn build_update(&self, name: String, args: &Map<String, Value>) -> Result<EntityOperation> {
        let mut update = EntityUpdate {
            name,
            node_type: self.schema.node_type.clone(),
            metadata: Vec::new(),
            relationships: Vec::new(),
        };

        for field in &self.schema.fields {
            let value = match args.get(&field.name) {
                Some(value) => value,
                None => continue,
            };
            if !value.is_null() {
                check_value(field, value)?;
            }

            match &field.role {
                FieldRole::Key => {}
                FieldRole::Metadata => update.metadata.push(MetadataChange {
                    label: field.label.clone(),
                    value: render_value(value),
                }),
                FieldRole::Relationship { edge_type } => {
                    let targets = if value.is_null() {
                        Vec::new()
                    } else {
                        relationship_targets(field, value)?
                    };
                    update.relationships.push(RelationshipChange {
                        edge_type: edge_type.clone(),
                        targets,
                    });
                }
            }
        }

        Ok(EntityOperation::Update(update))
    }
}

/// A field value, treating explicit `null` as absent.
fn present<'a>(args: &'a Map<String, Value>, field: &str) -> Option<&'a Value> {
    args.get(field).filter(|v| !v.is_null())
}

fn check_value(field: &FieldSpec, value: &Value) -> Result<()> {
    if !field.value_type.accepts(value) {
        return Err(LoreError::validation(
            field.name.as_str(),
            format!("must be of type {}", field.value_type.as_str()),
        ));
    }
    check_enum(&field.name, field.allowed.as_deref(), value)?;

    if let (Value::Array(elements), Some(items)) = (value, &field.items) {
        for element in elements {
            if !items.value_type.accepts(element) {
                return Err(LoreError::validation(
                    field.name.as_str(),
                    format!("elements must be of type {}", items.value_type.as_str()),
                ));
            }
            check_enum(&field.name, items.allowed.as_deref(), element)?;
        }
    }
    Ok(())
}

fn check_enum(field: &str, allowed: Option<&[Value]>, value: &Value) -> Result<()> {
    match allowed {
        Some(allowed) if !allowed.contains(value) => {
            let options: Vec<String> = allowed.iter().map(display_scalar).collect();
            Err(LoreError::validation(
                field,
                format!("must be one of: {}", options.join(", ")),
            ))
        }
        _ => Ok(()),
    }
}

/// Render a field value for a metadata line. `None` means "no line":
/// `null` and empty arrays.
fn render_value(value: &Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::Array(elements) if elements.is_empty() => None,
        Value::Array(elements) => Some(
            elements
                .iter()
                .map(display_scalar)
                .collect::<Vec<_>>()
                .join(", "),
        ),
        other => Some(display_scalar(other)),
    }
}

fn display_scalar(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Edge targets for a relationship value, de-duplicated in order.
fn relationship_targets(field: &FieldSpec, value: &Value) -> Result<Vec<String>> {
    let raw: Vec<&Value> = match value {
        Value::Array(elements) => elements.iter().collect(),
        scalar => vec![scalar],
    };

    let mut targets: Vec<String> = Vec::with_capacity(raw.len());
    for element in raw {
        let target = match element {
            Value::String(s) if !s.trim().is_empty() => s.clone(),
            _ => {
                return Err(LoreError::validation(
                    field.name.as_str(),
                    "relationship targets must be non-empty node names",
                ))
            }
        };
        if !targets.contains(&target) {
            targets.push(target);
        }
    }
    Ok(targets)
}

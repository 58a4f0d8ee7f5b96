//! Tool registry and dispatcher.
//!
//! The registry is built once from the schema directory. Every call is
//! resolved through an explicit name → handler table; a name that is not in
//! the table is an unknown tool, whatever its prefix looks like.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use serde::Serialize;
use serde_json::{json, Value};
use tokio::sync::OnceCell;

use loregraph_core::{LoreError, Result};
use loregraph_schema::{compile_all, load_schema_dir, CompiledTool, EntityOperation};
use loregraph_store::GraphStore;

use crate::builtin::{self, BuiltinCall, BuiltinTool};
use crate::envelope::{ErrorEnvelope, ToolResponse, ToolResult};

/// Name, description and input schema of one registered tool.
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ToolDescriptor {
    pub name: String,
    pub description: String,
    pub input_schema: Value,
}

/// What a registered name resolves to.
#[derive(Debug, Clone)]
pub enum ToolHandler {
    Builtin(BuiltinTool),
    Compiled(CompiledTool),
}

/// A validated call, ready to run against the store.
#[derive(Debug, Clone, PartialEq)]
pub enum Operation {
    Builtin(BuiltinCall),
    Entity(EntityOperation),
}

impl ToolHandler {
    pub fn validate(&self, args: &Value) -> Result<Operation> {
        match self {
            Self::Builtin(tool) => tool.validate(args).map(Operation::Builtin),
            Self::Compiled(tool) => tool.validate(args).map(Operation::Entity),
        }
    }

    fn descriptor(&self) -> ToolDescriptor {
        match self {
            Self::Builtin(tool) => ToolDescriptor {
                name: tool.name().to_string(),
                description: tool.description().to_string(),
                input_schema: tool.input_schema(),
            },
            Self::Compiled(tool) => ToolDescriptor {
                name: tool.name().to_string(),
                description: tool.description(),
                input_schema: tool.input_schema(),
            },
        }
    }
}

/// The resolved tool table.
#[derive(Debug)]
struct ToolTable {
    handlers: HashMap<String, ToolHandler>,
    /// Built-ins first, then compiled tools by name.
    listing: Vec<ToolDescriptor>,
}

impl ToolTable {
    fn build(schema_dir: &Path) -> Result<Self> {
        let documents =
            load_schema_dir(schema_dir).map_err(|e| LoreError::Initialization(e.to_string()))?;
        let compiled =
            compile_all(&documents).map_err(|e| LoreError::Initialization(e.to_string()))?;

        let mut handlers = HashMap::with_capacity(BuiltinTool::ALL.len() + compiled.len());
        let mut listing = Vec::with_capacity(handlers.capacity());

        for tool in BuiltinTool::ALL {
            let handler = ToolHandler::Builtin(tool);
            listing.push(handler.descriptor());
            handlers.insert(tool.name().to_string(), handler);
        }
        for (name, tool) in compiled {
            if handlers.contains_key(&name) {
                return Err(LoreError::Initialization(format!(
                    "Schema tool {name} collides with a built-in tool"
                )));
            }
            let handler = ToolHandler::Compiled(tool);
            listing.push(handler.descriptor());
            handlers.insert(name, handler);
        }

        Ok(Self { handlers, listing })
    }
}

/// Registry of built-in and schema-compiled tools.
///
/// Shared by reference across concurrent callers; initialization runs at
/// most once even when raced.
#[derive(Debug)]
pub struct ToolRegistry {
    schema_dir: PathBuf,
    table: OnceCell<ToolTable>,
}

impl ToolRegistry {
    pub fn new(schema_dir: impl Into<PathBuf>) -> Self {
        Self {
            schema_dir: schema_dir.into(),
            table: OnceCell::new(),
        }
    }

    pub fn schema_dir(&self) -> &Path {
        &self.schema_dir
    }

    pub fn is_initialized(&self) -> bool {
        self.table.initialized()
    }

    /// Load and compile the schema directory. Later calls are no-ops; a
    /// failed attempt leaves the registry uninitialized so it can be retried.
    pub async fn initialize(&self) -> Result<()> {
        let table = self
            .table
            .get_or_try_init(|| async {
                let table = ToolTable::build(&self.schema_dir)?;
                tracing::info!(
                    schema_dir = %self.schema_dir.display(),
                    tools = table.handlers.len(),
                    "Tool registry initialized"
                );
                Ok::<_, LoreError>(table)
            })
            .await;

        if let Err(e) = &table {
            tracing::error!(schema_dir = %self.schema_dir.display(), error = %e, "Tool registry initialization failed");
        }
        table.map(|_| ())
    }

    fn table(&self) -> Result<&ToolTable> {
        self.table.get().ok_or_else(|| {
            LoreError::Initialization(format!(
                "call initialize() before using tools (schema dir: {})",
                self.schema_dir.display()
            ))
        })
    }

    /// Every registered tool with its input schema.
    pub fn list_tools(&self) -> Result<Vec<ToolDescriptor>> {
        Ok(self.table()?.listing.clone())
    }

    /// Whether `name` is a schema-compiled tool.
    pub fn is_dynamic_tool(&self, name: &str) -> Result<bool> {
        Ok(matches!(
            self.table()?.handlers.get(name),
            Some(ToolHandler::Compiled(_))
        ))
    }

    /// Resolve, validate and run a tool call. Failures come back as an
    /// error envelope, never as a panic or an escaped error.
    pub async fn dispatch(&self, name: &str, args: &Value, store: &GraphStore) -> ToolResult {
        match self.call(name, args, store).await {
            Ok(response) => {
                tracing::debug!(tool = name, action = %response.action_taken, "Tool call succeeded");
                ToolResult::Success(response)
            }
            Err(e) => {
                tracing::warn!(tool = name, kind = e.kind(), error = %e, "Tool call failed");
                ToolResult::Error(ErrorEnvelope::from_error(name, &e))
            }
        }
    }

    /// Like [`dispatch`](Self::dispatch) but returns the typed error.
    pub async fn call(&self, name: &str, args: &Value, store: &GraphStore) -> Result<ToolResponse> {
        let handler = self
            .table()?
            .handlers
            .get(name)
            .ok_or_else(|| LoreError::UnknownTool(name.to_string()))?;

        match handler.validate(args)? {
            Operation::Builtin(call) => builtin::apply(call, store).await,
            Operation::Entity(op) => apply_entity(op, store).await,
        }
    }
}

async fn apply_entity(op: EntityOperation, store: &GraphStore) -> Result<ToolResponse> {
    match op {
        EntityOperation::Create { node, edges } => {
            let created = store.create_entity(node, edges).await?;
            let node = &created.node;
            let message = format!("Created {} '{}'", node.node_type, node.name);
            let action = format!(
                "Created {} node with {} relationship edge(s)",
                node.node_type,
                created.edges.len()
            );
            Ok(ToolResponse::new(message, action).with_data(serde_json::to_value(&created)?))
        }
        EntityOperation::Update(update) => {
            let changed_fields = update.metadata.len() + update.relationships.len();
            let updated = store.update_entity(update).await?;
            let message = format!("Updated {} '{}'", updated.node_type, updated.name);
            let action = format!("Updated {changed_fields} field(s) of {} node", updated.node_type);
            Ok(ToolResponse::new(message, action).with_data(json!({"node": updated})))
        }
        EntityOperation::Delete { name, node_type } => {
            let removal = store.delete_entity(&name, &node_type).await?;
            let message = format!("Deleted {node_type} '{name}'");
            let action = format!(
                "Deleted {node_type} node and {} edge(s)",
                removal.removed_edges
            );
            Ok(ToolResponse::new(message, action).with_data(serde_json::to_value(removal)?))
        }
    }
}

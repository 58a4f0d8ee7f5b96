//! The fixed set of graph tools that exist regardless of loaded schemas.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use loregraph_core::{
    Edge, EdgeUpdate, LoreError, MetadataAddition, MetadataDeletion, Node, NodeUpdate, Result,
};
use loregraph_store::{BatchOutcome, GraphStore};

use crate::envelope::ToolResponse;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BuiltinTool {
    AddNodes,
    UpdateNodes,
    AddEdges,
    UpdateEdges,
    AddMetadata,
    DeleteNodes,
    DeleteMetadata,
    DeleteEdges,
    ReadGraph,
    SearchNodes,
    OpenNodes,
}

/// Validated arguments for a built-in tool.
#[derive(Debug, Clone, PartialEq)]
pub enum BuiltinCall {
    AddNodes(Vec<Node>),
    UpdateNodes(Vec<NodeUpdate>),
    AddEdges(Vec<Edge>),
    UpdateEdges(Vec<EdgeUpdate>),
    AddMetadata(Vec<MetadataAddition>),
    DeleteNodes(Vec<String>),
    DeleteMetadata(Vec<MetadataDeletion>),
    DeleteEdges(Vec<Edge>),
    ReadGraph,
    SearchNodes(String),
    OpenNodes(Vec<String>),
}

// ── Argument shapes ───────────────────────────────────────────────

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct NodesArgs<T> {
    nodes: Vec<T>,
}

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct EdgesArgs<T> {
    edges: Vec<T>,
}

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct AddMetadataArgs {
    metadata: Vec<MetadataAddition>,
}

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct DeleteMetadataArgs {
    deletions: Vec<MetadataDeletion>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
struct DeleteNodesArgs {
    node_names: Vec<String>,
}

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct ReadGraphArgs {}

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct SearchArgs {
    query: String,
}

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct OpenArgs {
    names: Vec<String>,
}

impl BuiltinTool {
    /// Every built-in, in listing order.
    pub const ALL: [BuiltinTool; 11] = [
        Self::AddNodes,
        Self::UpdateNodes,
        Self::AddEdges,
        Self::UpdateEdges,
        Self::AddMetadata,
        Self::DeleteNodes,
        Self::DeleteMetadata,
        Self::DeleteEdges,
        Self::ReadGraph,
        Self::SearchNodes,
        Self::OpenNodes,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Self::AddNodes => "add_nodes",
            Self::UpdateNodes => "update_nodes",
            Self::AddEdges => "add_edges",
            Self::UpdateEdges => "update_edges",
            Self::AddMetadata => "add_metadata",
            Self::DeleteNodes => "delete_nodes",
            Self::DeleteMetadata => "delete_metadata",
            Self::DeleteEdges => "delete_edges",
            Self::ReadGraph => "read_graph",
            Self::SearchNodes => "search_nodes",
            Self::OpenNodes => "open_nodes",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|tool| tool.name() == name)
    }

    pub fn description(&self) -> &'static str {
        match self {
            Self::AddNodes => "Create new nodes. Each name must be unique in the graph.",
            Self::UpdateNodes => {
                "Update existing nodes. Supplied metadata lines replace lines with the same label."
            }
            Self::AddEdges => "Create directed, typed edges between existing nodes.",
            Self::UpdateEdges => {
                "Rewrite edges matching {from, to, edgeType} with new endpoints or type."
            }
            Self::AddMetadata => "Append metadata lines to existing nodes.",
            Self::DeleteNodes => "Delete nodes and every edge that touches them.",
            Self::DeleteMetadata => "Remove specific metadata lines from nodes.",
            Self::DeleteEdges => "Delete edges matching {from, to, edgeType}.",
            Self::ReadGraph => "Return the entire graph.",
            Self::SearchNodes => {
                "Search nodes by name or metadata text. Use 'type:<nodeType>' or 'tag:<name>' to filter."
            }
            Self::OpenNodes => "Return the named nodes and the edges among them.",
        }
    }

    /// JSON Schema describing the arguments object.
    pub fn input_schema(&self) -> Value {
        let (property, items) = match self {
            Self::AddNodes => ("nodes", node_schema()),
            Self::UpdateNodes => ("nodes", node_update_schema()),
            Self::AddEdges | Self::DeleteEdges => ("edges", edge_schema()),
            Self::UpdateEdges => ("edges", edge_update_schema()),
            Self::AddMetadata => ("metadata", metadata_schema("contents")),
            Self::DeleteMetadata => ("deletions", metadata_schema("metadata")),
            Self::DeleteNodes => ("nodeNames", json!({"type": "string"})),
            Self::OpenNodes => ("names", json!({"type": "string"})),
            Self::ReadGraph => {
                return json!({
                    "type": "object",
                    "properties": {},
                    "additionalProperties": false
                })
            }
            Self::SearchNodes => {
                return json!({
                    "type": "object",
                    "properties": {"query": {"type": "string"}},
                    "required": ["query"],
                    "additionalProperties": false
                })
            }
        };
        json!({
            "type": "object",
            "properties": {property: {"type": "array", "items": items}},
            "required": [property],
            "additionalProperties": false
        })
    }

    /// Parse raw arguments into a typed call.
    pub fn validate(&self, args: &Value) -> Result<BuiltinCall> {
        let call = match self {
            Self::AddNodes => {
                let args: NodesArgs<Node> = parse(args)?;
                BuiltinCall::AddNodes(non_empty("nodes", args.nodes)?)
            }
            Self::UpdateNodes => {
                let args: NodesArgs<NodeUpdate> = parse(args)?;
                BuiltinCall::UpdateNodes(non_empty("nodes", args.nodes)?)
            }
            Self::AddEdges => {
                let args: EdgesArgs<Edge> = parse(args)?;
                BuiltinCall::AddEdges(non_empty("edges", args.edges)?)
            }
            Self::UpdateEdges => {
                let args: EdgesArgs<EdgeUpdate> = parse(args)?;
                BuiltinCall::UpdateEdges(non_empty("edges", args.edges)?)
            }
            Self::DeleteEdges => {
                let args: EdgesArgs<Edge> = parse(args)?;
                BuiltinCall::DeleteEdges(non_empty("edges", args.edges)?)
            }
            Self::AddMetadata => {
                let args: AddMetadataArgs = parse(args)?;
                BuiltinCall::AddMetadata(non_empty("metadata", args.metadata)?)
            }
            Self::DeleteMetadata => {
                let args: DeleteMetadataArgs = parse(args)?;
                BuiltinCall::DeleteMetadata(non_empty("deletions", args.deletions)?)
            }
            Self::DeleteNodes => {
                let args: DeleteNodesArgs = parse(args)?;
                BuiltinCall::DeleteNodes(non_empty("nodeNames", args.node_names)?)
            }
            Self::ReadGraph => {
                let _: ReadGraphArgs = parse(args)?;
                BuiltinCall::ReadGraph
            }
            Self::SearchNodes => {
                let args: SearchArgs = parse(args)?;
                BuiltinCall::SearchNodes(args.query)
            }
            Self::OpenNodes => {
                let args: OpenArgs = parse(args)?;
                BuiltinCall::OpenNodes(non_empty("names", args.names)?)
            }
        };
        Ok(call)
    }
}

/// Run a validated built-in call against the store.
pub async fn apply(call: BuiltinCall, store: &GraphStore) -> Result<ToolResponse> {
    match call {
        BuiltinCall::AddNodes(nodes) => {
            batch_response("Added", "nodes", store.add_nodes(nodes).await?)
        }
        BuiltinCall::UpdateNodes(updates) => {
            batch_response("Updated", "nodes", store.update_nodes(updates).await?)
        }
        BuiltinCall::DeleteNodes(names) => {
            batch_response("Deleted", "nodes", store.delete_nodes(names).await?)
        }
        BuiltinCall::AddEdges(edges) => {
            batch_response("Added", "edges", store.add_edges(edges).await?)
        }
        BuiltinCall::UpdateEdges(updates) => {
            batch_response("Updated", "edges", store.update_edges(updates).await?)
        }
        BuiltinCall::DeleteEdges(edges) => {
            batch_response("Deleted", "edges", store.delete_edges(edges).await?)
        }
        BuiltinCall::AddMetadata(additions) => {
            batch_response("Added metadata to", "nodes", store.add_metadata(additions).await?)
        }
        BuiltinCall::DeleteMetadata(deletions) => batch_response(
            "Removed metadata from",
            "nodes",
            store.delete_metadata(deletions).await?,
        ),
        BuiltinCall::ReadGraph => {
            let graph = store.read_graph().await;
            let message = format!(
                "Graph has {} nodes and {} edges",
                graph.nodes.len(),
                graph.edges.len()
            );
            Ok(ToolResponse::new(message, "Read graph").with_data(serde_json::to_value(graph)?))
        }
        BuiltinCall::SearchNodes(query) => {
            let found = store.search_nodes(&query).await?;
            let message = format!("Found {} nodes matching '{query}'", found.nodes.len());
            Ok(ToolResponse::new(message, "Searched nodes").with_data(serde_json::to_value(found)?))
        }
        BuiltinCall::OpenNodes(names) => {
            let opened = store.open_nodes(&names).await;
            let mut message = format!("Opened {} of {} nodes", opened.nodes.len(), names.len());
            if !opened.missing.is_empty() {
                message.push_str(&format!("; not found: {}", opened.missing.join(", ")));
            }
            Ok(ToolResponse::new(message, "Opened nodes").with_data(serde_json::to_value(opened)?))
        }
    }
}

fn batch_response<T: Serialize>(
    verb: &str,
    noun: &str,
    outcome: BatchOutcome<T>,
) -> Result<ToolResponse> {
    let done = outcome.succeeded.len();
    let mut message = format!("{verb} {done} of {} {noun}", outcome.total());
    if !outcome.is_complete() {
        message.push_str(&format!(" ({} failed)", outcome.failed.len()));
    }
    let action = format!("{verb} {noun}");
    Ok(ToolResponse::new(message, action).with_data(serde_json::to_value(outcome)?))
}

fn parse<T: DeserializeOwned>(args: &Value) -> Result<T> {
    let args = match args {
        Value::Null => Value::Object(Default::default()),
        other => other.clone(),
    };
    if !args.is_object() {
        return Err(LoreError::validation("arguments", "must be a JSON object"));
    }
    serde_json::from_value(args).map_err(|e| LoreError::validation("arguments", e.to_string()))
}

fn non_empty<T>(field: &str, items: Vec<T>) -> Result<Vec<T>> {
    if items.is_empty() {
        return Err(LoreError::validation(field, "must contain at least one item"));
    }
    Ok(items)
}

// ── Input schemas ─────────────────────────────────────────────────

fn string_array() -> Value {
    json!({"type": "array", "items": {"type": "string"}})
}

fn node_schema() -> Value {
    json!({
        "type": "object",
        "properties": {
            "name": {"type": "string"},
            "nodeType": {"type": "string"},
            "metadata": string_array()
        },
        "required": ["name", "nodeType"]
    })
}

fn node_update_schema() -> Value {
    json!({
        "type": "object",
        "properties": {
            "name": {"type": "string"},
            "nodeType": {"type": "string"},
            "metadata": string_array()
        },
        "required": ["name"]
    })
}

fn edge_schema() -> Value {
    json!({
        "type": "object",
        "properties": {
            "from": {"type": "string"},
            "to": {"type": "string"},
            "edgeType": {"type": "string"}
        },
        "required": ["from", "to", "edgeType"]
    })
}

fn edge_update_schema() -> Value {
    json!({
        "type": "object",
        "properties": {
            "from": {"type": "string"},
            "to": {"type": "string"},
            "edgeType": {"type": "string"},
            "newFrom": {"type": "string"},
            "newTo": {"type": "string"},
            "newEdgeType": {"type": "string"}
        },
        "required": ["from", "to", "edgeType"]
    })
}

fn metadata_schema(lines: &str) -> Value {
    json!({
        "type": "object",
        "properties": {
            "nodeName": {"type": "string"},
            lines: string_array()
        },
        "required": ["nodeName", lines]
    })
}

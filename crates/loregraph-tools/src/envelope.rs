//! Request and response shapes for tool invocation.

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use loregraph_core::LoreError;

/// An incoming `{name, arguments}` tool call.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
pub struct ToolRequest {
    pub name: String,
    #[serde(default)]
    pub arguments: Value,
}

/// Successful tool result.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ToolResponse {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
    pub message: String,
    pub action_taken: String,
}

impl ToolResponse {
    pub fn new(message: impl Into<String>, action_taken: impl Into<String>) -> Self {
        Self {
            data: None,
            message: message.into(),
            action_taken: action_taken.into(),
        }
    }

    pub fn with_data(mut self, data: Value) -> Self {
        self.data = Some(data);
        self
    }
}

/// Structured failure returned instead of an error escaping the dispatcher.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ErrorEnvelope {
    pub is_error: bool,
    pub operation: String,
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub context: Option<Value>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub suggestions: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub recovery_steps: Vec<String>,
}

impl ErrorEnvelope {
    /// Build the envelope for a failed call to `operation`.
    pub fn from_error(operation: &str, err: &LoreError) -> Self {
        let (suggestions, recovery_steps) = guidance(err);
        Self {
            is_error: true,
            operation: operation.to_string(),
            error: format!("{}: {err}", err.kind()),
            context: context(operation, err),
            suggestions: suggestions.iter().map(|s| s.to_string()).collect(),
            recovery_steps: recovery_steps.iter().map(|s| s.to_string()).collect(),
        }
    }

    /// The error kind prefix of `error`, e.g. `ValidationError`.
    pub fn kind(&self) -> &str {
        self.error.split(':').next().unwrap_or_default()
    }
}

/// Either outcome of a dispatched call, serialized without a wrapper.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(untagged)]
pub enum ToolResult {
    Error(ErrorEnvelope),
    Success(ToolResponse),
}

impl ToolResult {
    pub fn is_error(&self) -> bool {
        matches!(self, Self::Error(_))
    }

    pub fn success(&self) -> Option<&ToolResponse> {
        match self {
            Self::Success(response) => Some(response),
            Self::Error(_) => None,
        }
    }

    pub fn error(&self) -> Option<&ErrorEnvelope> {
        match self {
            Self::Error(envelope) => Some(envelope),
            Self::Success(_) => None,
        }
    }
}

fn context(operation: &str, err: &LoreError) -> Option<Value> {
    let context = match err {
        LoreError::Validation { field, .. } => json!({"tool": operation, "field": field}),
        LoreError::NotFound { what, name } => json!({"tool": operation, "missing": what, "name": name}),
        LoreError::Conflict(name) => json!({"tool": operation, "name": name}),
        LoreError::Persistence { path, .. } => json!({"tool": operation, "path": path}),
        LoreError::CorruptStore { line, .. } => json!({"tool": operation, "line": line}),
        _ => json!({"tool": operation}),
    };
    Some(context)
}

fn guidance(err: &LoreError) -> (&'static [&'static str], &'static [&'static str]) {
    match err {
        LoreError::Validation { .. } => (
            &["Check the tool's input schema with list_tools"],
            &["Fix the argument named in the error and retry the call"],
        ),
        LoreError::NotFound { .. } => (
            &["Use search_nodes or open_nodes to find existing names"],
            &["Create the missing node first, then retry the call"],
        ),
        LoreError::Conflict(_) => (
            &[
                "Choose a different name",
                "Use an update tool to change the existing node",
            ],
            &["Retry with a unique name"],
        ),
        LoreError::Initialization(_) => (
            &["Check that the schema directory exists and its documents are valid"],
            &["Initialize the tool registry before dispatching calls"],
        ),
        LoreError::UnknownTool(_) => (
            &["Run list_tools to see the available tool names"],
            &["Retry with one of the listed tool names"],
        ),
        LoreError::Persistence { .. } => (
            &["Check free space and permissions for the memory file"],
            &["Retry the call; the graph was left unchanged"],
        ),
        LoreError::CorruptStore { .. } => (
            &["Inspect the memory file for the malformed line"],
            &["Repair or remove the line and restart"],
        ),
        LoreError::Serialization(_) => (&[], &[]),
    }
}

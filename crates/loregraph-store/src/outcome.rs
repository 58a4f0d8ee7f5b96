//! Per-item results of batch operations.

use serde::Serialize;

use loregraph_core::{Edge, LoreError};

/// Result of a batch call: every item either succeeded or failed on its own.
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct BatchOutcome<T> {
    pub succeeded: Vec<T>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub failed: Vec<ItemFailure>,
}

/// A single rejected batch item.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ItemFailure {
    /// Position of the item in the request.
    pub index: usize,
    /// Short label for the item (node name or edge triple).
    pub item: String,
    /// Error taxonomy name, e.g. `ConflictError`.
    pub kind: String,
    pub error: String,
}

impl<T> Default for BatchOutcome<T> {
    fn default() -> Self {
        Self {
            succeeded: Vec::new(),
            failed: Vec::new(),
        }
    }
}

impl<T> BatchOutcome<T> {
    pub(crate) fn record(&mut self, index: usize, item: impl Into<String>, result: Result<T, LoreError>) {
        match result {
            Ok(value) => self.succeeded.push(value),
            Err(err) => self.failed.push(ItemFailure {
                index,
                item: item.into(),
                kind: err.kind().to_string(),
                error: err.to_string(),
            }),
        }
    }

    pub fn is_complete(&self) -> bool {
        self.failed.is_empty()
    }

    pub fn total(&self) -> usize {
        self.succeeded.len() + self.failed.len()
    }
}

/// A deleted node and the number of incident edges removed with it.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct NodeRemoval {
    pub name: String,
    pub removed_edges: usize,
}

/// A requested edge deletion and how many stored edges matched it.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct EdgeRemoval {
    #[serde(flatten)]
    pub edge: Edge,
    pub removed: usize,
}

/// A rewritten edge match: the new triple and how many stored edges changed.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct EdgeRewrite {
    #[serde(flatten)]
    pub edge: Edge,
    pub updated: usize,
}

/// A created entity and the outgoing edges actually stored with it.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct EntityCreation {
    pub node: loregraph_core::Node,
    pub edges: Vec<Edge>,
}

/// Result of `open_nodes`: found nodes, the edges among them, and misses.
#[derive(Debug, Clone, Default, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct OpenNodes {
    pub nodes: Vec<loregraph_core::Node>,
    pub edges: Vec<Edge>,
    pub missing: Vec<String>,
}

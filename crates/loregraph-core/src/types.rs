//! Core domain types for the loregraph knowledge graph.
//!
//! Nodes are keyed by a unique name and carry an ordered list of rendered
//! `"Label: value"` metadata lines. Edges are directed and typed, and refer to
//! nodes by name. The same types are the on-disk record shape, so importers
//! that emit [`GraphRecord`]s stay byte-compatible with the store.

use serde::{Deserialize, Serialize};

/// Edge type used by `tag:` searches to find tagged nodes.
pub const TAGGED_WITH: &str = "tagged_with";

/// Node type of the targets a `tag:` search follows.
pub const TAG_NODE_TYPE: &str = "tag";

// ── Nodes ─────────────────────────────────────────────────────────

/// A uniquely named entity in the graph.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct Node {
    pub name: String,
    pub node_type: String,
    #[serde(default)]
    pub metadata: Vec<String>,
}

impl Node {
    pub fn new(name: impl Into<String>, node_type: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            node_type: node_type.into(),
            metadata: Vec::new(),
        }
    }

    /// Builder-style helper for attaching metadata lines.
    pub fn with_metadata<I, S>(mut self, lines: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.metadata.extend(lines.into_iter().map(Into::into));
        self
    }

    /// Set, replace, or remove the metadata line carrying `label`.
    ///
    /// An existing `"Label: "` line is replaced in place so the declared field
    /// order survives updates; a new label is appended. `None` removes it.
    pub fn set_metadata_field(&mut self, label: &str, value: Option<&str>) {
        let position = self
            .metadata
            .iter()
            .position(|line| metadata_label(line) == Some(label));

        match (position, value) {
            (Some(i), Some(v)) => self.metadata[i] = render_metadata(label, v),
            (None, Some(v)) => self.metadata.push(render_metadata(label, v)),
            (Some(i), None) => {
                self.metadata.remove(i);
            }
            (None, None) => {}
        }
    }

    /// Merge raw metadata lines: labelled lines replace their label, other
    /// lines are appended unless already present.
    pub fn merge_metadata(&mut self, lines: &[String]) {
        for line in lines {
            match split_metadata(line) {
                Some((label, value)) => self.set_metadata_field(label, Some(value)),
                None => {
                    if !self.metadata.contains(line) {
                        self.metadata.push(line.clone());
                    }
                }
            }
        }
    }
}

/// Render a metadata line as `"Label: value"`.
pub fn render_metadata(label: &str, value: &str) -> String {
    format!("{label}: {value}")
}

/// Split a `"Label: value"` line into its label and value.
pub fn split_metadata(line: &str) -> Option<(&str, &str)> {
    let (label, value) = line.split_once(": ")?;
    if label.is_empty() || label.contains(char::is_whitespace) {
        return None;
    }
    Some((label, value))
}

/// The label of a metadata line, if it has one.
pub fn metadata_label(line: &str) -> Option<&str> {
    split_metadata(line).map(|(label, _)| label)
}

// ── Edges ─────────────────────────────────────────────────────────

/// A directed, typed relationship between two node names.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct Edge {
    pub from: String,
    pub to: String,
    pub edge_type: String,
}

impl Edge {
    pub fn new(
        from: impl Into<String>,
        to: impl Into<String>,
        edge_type: impl Into<String>,
    ) -> Self {
        Self {
            from: from.into(),
            to: to.into(),
            edge_type: edge_type.into(),
        }
    }

    /// Whether this edge touches `name` at either end.
    pub fn touches(&self, name: &str) -> bool {
        self.from == name || self.to == name
    }
}

impl std::fmt::Display for Edge {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} -[{}]-> {}", self.from, self.edge_type, self.to)
    }
}

// ── Graph ─────────────────────────────────────────────────────────

/// A full or partial view of the graph.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct KnowledgeGraph {
    pub nodes: Vec<Node>,
    pub edges: Vec<Edge>,
}

impl KnowledgeGraph {
    pub fn node(&self, name: &str) -> Option<&Node> {
        self.nodes.iter().find(|n| n.name == name)
    }

    pub fn node_mut(&mut self, name: &str) -> Option<&mut Node> {
        self.nodes.iter_mut().find(|n| n.name == name)
    }

    pub fn contains_node(&self, name: &str) -> bool {
        self.node(name).is_some()
    }

    /// Edges whose endpoints are both in `names`.
    pub fn edges_among(&self, names: &[&str]) -> Vec<Edge> {
        self.edges
            .iter()
            .filter(|e| names.contains(&e.from.as_str()) && names.contains(&e.to.as_str()))
            .cloned()
            .collect()
    }
}

/// One line of the persisted graph file.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum GraphRecord {
    Node(Node),
    Edge(Edge),
}

// ── Batch Inputs ──────────────────────────────────────────────────

/// Partial update for an existing node.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct NodeUpdate {
    pub name: String,
    #[serde(default)]
    pub node_type: Option<String>,
    #[serde(default)]
    pub metadata: Option<Vec<String>>,
}

/// Rewrite of every edge matching `{from, to, edgeType}`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct EdgeUpdate {
    pub from: String,
    pub to: String,
    pub edge_type: String,
    #[serde(default)]
    pub new_from: Option<String>,
    #[serde(default)]
    pub new_to: Option<String>,
    #[serde(default)]
    pub new_edge_type: Option<String>,
}

impl EdgeUpdate {
    pub fn matches(&self, edge: &Edge) -> bool {
        edge.from == self.from && edge.to == self.to && edge.edge_type == self.edge_type
    }
}

/// Metadata lines to append to a node.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct MetadataAddition {
    pub node_name: String,
    pub contents: Vec<String>,
}

/// Metadata lines to remove from a node.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct MetadataDeletion {
    pub node_name: String,
    pub metadata: Vec<String>,
}

// ── Entity Operations ─────────────────────────────────────────────

/// One metadata field change: `Some` sets or replaces the line, `None` removes it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MetadataChange {
    pub label: String,
    pub value: Option<String>,
}

/// Full replacement of a node's outgoing edges of one type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RelationshipChange {
    pub edge_type: String,
    pub targets: Vec<String>,
}

/// A partial update of a typed entity, applied as one unit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntityUpdate {
    pub name: String,
    pub node_type: String,
    pub metadata: Vec<MetadataChange>,
    pub relationships: Vec<RelationshipChange>,
}

//! Write operations for the graph store.
//!
//! Batch operations validate each item on its own and report per-item
//! results. Entity operations (used by schema-compiled tools) are a single
//! unit: they either apply completely or leave the graph untouched.

use std::collections::HashSet;

use loregraph_core::{
    Edge, EdgeUpdate, EntityUpdate, KnowledgeGraph, LoreError, MetadataAddition,
    MetadataDeletion, Node, NodeUpdate, Result,
};

use crate::outcome::{BatchOutcome, EdgeRemoval, EdgeRewrite, EntityCreation, NodeRemoval};
use crate::store::GraphStore;

impl GraphStore {
    // ── Nodes ────────────────────────────────────────────────────

    /// Add new nodes. A name that already exists fails that item only.
    pub async fn add_nodes(&self, nodes: Vec<Node>) -> Result<BatchOutcome<Node>> {
        self.mutate("add_nodes", |graph| {
            let mut outcome = BatchOutcome::default();
            for (i, node) in nodes.into_iter().enumerate() {
                let label = node.name.clone();
                outcome.record(i, label, insert_node(graph, node));
            }
            Ok(outcome)
        })
        .await
    }

    /// Merge supplied fields into existing nodes.
    pub async fn update_nodes(&self, updates: Vec<NodeUpdate>) -> Result<BatchOutcome<Node>> {
        self.mutate("update_nodes", |graph| {
            let mut outcome = BatchOutcome::default();
            for (i, update) in updates.into_iter().enumerate() {
                let label = update.name.clone();
                outcome.record(i, label, apply_node_update(graph, update));
            }
            Ok(outcome)
        })
        .await
    }

    /// Delete nodes and every edge that starts or ends at them.
    pub async fn delete_nodes(&self, names: Vec<String>) -> Result<BatchOutcome<NodeRemoval>> {
        self.mutate("delete_nodes", |graph| {
            let mut outcome = BatchOutcome::default();
            for (i, name) in names.into_iter().enumerate() {
                let result = remove_node(graph, &name);
                outcome.record(i, name, result);
            }
            Ok(outcome)
        })
        .await
    }

    // ── Edges ────────────────────────────────────────────────────

    /// Add edges between existing nodes.
    pub async fn add_edges(&self, edges: Vec<Edge>) -> Result<BatchOutcome<Edge>> {
        self.mutate("add_edges", |graph| {
            let mut outcome = BatchOutcome::default();
            for (i, edge) in edges.into_iter().enumerate() {
                let label = edge.to_string();
                let result = check_edge(graph, &edge).map(|()| {
                    graph.edges.push(edge.clone());
                    edge
                });
                outcome.record(i, label, result);
            }
            Ok(outcome)
        })
        .await
    }

    /// Rewrite every edge exactly matching each `{from, to, edgeType}`.
    pub async fn update_edges(&self, updates: Vec<EdgeUpdate>) -> Result<BatchOutcome<EdgeRewrite>> {
        self.mutate("update_edges", |graph| {
            let mut outcome = BatchOutcome::default();
            for (i, update) in updates.into_iter().enumerate() {
                let label = format!("{} -[{}]-> {}", update.from, update.edge_type, update.to);
                outcome.record(i, label, rewrite_edges(graph, &update));
            }
            Ok(outcome)
        })
        .await
    }

    /// Remove every edge exactly matching each triple. Absent edges are a no-op.
    pub async fn delete_edges(&self, edges: Vec<Edge>) -> Result<BatchOutcome<EdgeRemoval>> {
        self.mutate("delete_edges", |graph| {
            let mut outcome = BatchOutcome::default();
            for (i, edge) in edges.into_iter().enumerate() {
                let before = graph.edges.len();
                graph.edges.retain(|e| e != &edge);
                let removed = before - graph.edges.len();
                let label = edge.to_string();
                outcome.record(i, label, Ok(EdgeRemoval { edge, removed }));
            }
            Ok(outcome)
        })
        .await
    }

    // ── Metadata ─────────────────────────────────────────────────

    /// Append metadata lines, skipping lines the node already has.
    ///
    /// Each succeeded item lists only the lines that were actually added.
    pub async fn add_metadata(
        &self,
        additions: Vec<MetadataAddition>,
    ) -> Result<BatchOutcome<MetadataAddition>> {
        self.mutate("add_metadata", |graph| {
            let mut outcome = BatchOutcome::default();
            for (i, addition) in additions.into_iter().enumerate() {
                let label = addition.node_name.clone();
                let result = match graph.node_mut(&addition.node_name) {
                    Some(node) => {
                        let mut added = Vec::new();
                        for line in addition.contents {
                            if !node.metadata.contains(&line) {
                                node.metadata.push(line.clone());
                                added.push(line);
                            }
                        }
                        Ok(MetadataAddition {
                            node_name: addition.node_name,
                            contents: added,
                        })
                    }
                    None => Err(LoreError::node_not_found(addition.node_name)),
                };
                outcome.record(i, label, result);
            }
            Ok(outcome)
        })
        .await
    }

    /// Remove metadata lines. Lines the node does not have are ignored.
    ///
    /// Each succeeded item lists only the lines that were actually removed.
    pub async fn delete_metadata(
        &self,
        deletions: Vec<MetadataDeletion>,
    ) -> Result<BatchOutcome<MetadataDeletion>> {
        self.mutate("delete_metadata", |graph| {
            let mut outcome = BatchOutcome::default();
            for (i, deletion) in deletions.into_iter().enumerate() {
                let label = deletion.node_name.clone();
                let result = match graph.node_mut(&deletion.node_name) {
                    Some(node) => {
                        let removed: Vec<String> = deletion
                            .metadata
                            .into_iter()
                            .filter(|line| node.metadata.contains(line))
                            .collect();
                        node.metadata.retain(|line| !removed.contains(line));
                        Ok(MetadataDeletion {
                            node_name: deletion.node_name,
                            metadata: removed,
                        })
                    }
                    None => Err(LoreError::node_not_found(deletion.node_name)),
                };
                outcome.record(i, label, result);
            }
            Ok(outcome)
        })
        .await
    }

    // ── Entities ─────────────────────────────────────────────────

    /// Create a node together with its outgoing edges, all or nothing.
    ///
    /// Every edge must start at the new node. Targets must already exist,
    /// except for self-references.
    pub async fn create_entity(&self, node: Node, edges: Vec<Edge>) -> Result<EntityCreation> {
        let created = self
            .mutate("create_entity", |graph| {
                let node = insert_node(graph, node)?;
                let mut stored: Vec<Edge> = Vec::with_capacity(edges.len());
                for edge in edges {
                    if edge.from != node.name {
                        return Err(LoreError::validation(
                            "from",
                            format!("edge {edge} does not start at '{}'", node.name),
                        ));
                    }
                    check_edge(graph, &edge)?;
                    if !stored.contains(&edge) {
                        stored.push(edge);
                    }
                }
                graph.edges.extend(stored.iter().cloned());
                Ok(EntityCreation {
                    node,
                    edges: stored,
                })
            })
            .await?;

        tracing::info!(
            name = %created.node.name,
            node_type = %created.node.node_type,
            edges = created.edges.len(),
            "Entity created"
        );
        Ok(created)
    }

    /// Apply a typed partial update, all or nothing.
    ///
    /// Metadata changes replace or remove labelled lines in place. Each
    /// relationship change replaces the node's full set of outgoing edges of
    /// that type.
    pub async fn update_entity(&self, update: EntityUpdate) -> Result<Node> {
        self.mutate("update_entity", |graph| {
            check_entity_type(graph, &update.name, &update.node_type)?;

            for change in &update.relationships {
                for target in &change.targets {
                    if target != &update.name && !graph.contains_node(target) {
                        return Err(LoreError::node_not_found(target.clone()));
                    }
                }
            }

            for change in &update.relationships {
                graph
                    .edges
                    .retain(|e| !(e.from == update.name && e.edge_type == change.edge_type));
                let mut seen = HashSet::new();
                for target in &change.targets {
                    if seen.insert(target.as_str()) {
                        graph
                            .edges
                            .push(Edge::new(&update.name, target, &change.edge_type));
                    }
                }
            }

            let node = graph
                .node_mut(&update.name)
                .ok_or_else(|| LoreError::node_not_found(update.name.clone()))?;
            for change in &update.metadata {
                node.set_metadata_field(&change.label, change.value.as_deref());
            }
            Ok(node.clone())
        })
        .await
    }

    /// Delete a node of a specific type, cascading to its edges.
    pub async fn delete_entity(&self, name: &str, node_type: &str) -> Result<NodeRemoval> {
        self.mutate("delete_entity", |graph| {
            check_entity_type(graph, name, node_type)?;
            remove_node(graph, name)
        })
        .await
    }
}

fn insert_node(graph: &mut KnowledgeGraph, node: Node) -> Result<Node> {
    if node.name.trim().is_empty() {
        return Err(LoreError::validation("name", "must not be empty"));
    }
    if node.node_type.trim().is_empty() {
        return Err(LoreError::validation("nodeType", "must not be empty"));
    }
    if graph.contains_node(&node.name) {
        return Err(LoreError::Conflict(node.name));
    }
    graph.nodes.push(node.clone());
    Ok(node)
}

fn apply_node_update(graph: &mut KnowledgeGraph, update: NodeUpdate) -> Result<Node> {
    let node = graph
        .node_mut(&update.name)
        .ok_or_else(|| LoreError::node_not_found(update.name.clone()))?;

    if let Some(node_type) = update.node_type {
        if node_type.trim().is_empty() {
            return Err(LoreError::validation("nodeType", "must not be empty"));
        }
        node.node_type = node_type;
    }
    if let Some(lines) = update.metadata {
        node.merge_metadata(&lines);
    }
    Ok(node.clone())
}

fn remove_node(graph: &mut KnowledgeGraph, name: &str) -> Result<NodeRemoval> {
    let position = graph
        .nodes
        .iter()
        .position(|n| n.name == name)
        .ok_or_else(|| LoreError::node_not_found(name))?;
    graph.nodes.remove(position);

    let before = graph.edges.len();
    graph.edges.retain(|e| !e.touches(name));

    Ok(NodeRemoval {
        name: name.to_string(),
        removed_edges: before - graph.edges.len(),
    })
}

fn check_edge(graph: &KnowledgeGraph, edge: &Edge) -> Result<()> {
    if edge.edge_type.trim().is_empty() {
        return Err(LoreError::validation("edgeType", "must not be empty"));
    }
    for endpoint in [&edge.from, &edge.to] {
        if !graph.contains_node(endpoint) {
            return Err(LoreError::node_not_found(endpoint.clone()));
        }
    }
    Ok(())
}

fn check_entity_type(graph: &KnowledgeGraph, name: &str, node_type: &str) -> Result<()> {
    let node = graph
        .node(name)
        .ok_or_else(|| LoreError::node_not_found(name))?;
    if node.node_type != node_type {
        return Err(LoreError::validation(
            "name",
            format!(
                "'{name}' is a {} node, not a {node_type} node",
                node.node_type
            ),
        ));
    }
    Ok(())
}

fn rewrite_edges(graph: &mut KnowledgeGraph, update: &EdgeUpdate) -> Result<EdgeRewrite> {
    let rewritten = Edge::new(
        update.new_from.as_deref().unwrap_or(&update.from),
        update.new_to.as_deref().unwrap_or(&update.to),
        update.new_edge_type.as_deref().unwrap_or(&update.edge_type),
    );

    if !graph.edges.iter().any(|e| update.matches(e)) {
        return Err(LoreError::edge_not_found(format!(
            "{} -[{}]-> {}",
            update.from, update.edge_type, update.to
        )));
    }
    check_edge(graph, &rewritten)?;

    let mut updated = 0;
    for edge in graph.edges.iter_mut().filter(|e| update.matches(e)) {
        *edge = rewritten.clone();
        updated += 1;
    }

    Ok(EdgeRewrite {
        edge: rewritten,
        updated,
    })
}

//! Read operations for the graph store.
//!
//! Every query runs under the read guard, so it sees the graph either before
//! or after any concurrent mutation, never in between.

use loregraph_core::types::{TAGGED_WITH, TAG_NODE_TYPE};
use loregraph_core::{KnowledgeGraph, LoreError, Node, Result};

use crate::outcome::OpenNodes;
use crate::store::GraphStore;

/// A parsed `search_nodes` query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SearchQuery {
    /// Case-insensitive substring over node names and metadata.
    Text(String),
    /// Exact `nodeType` match (`type:<nodeType>`).
    NodeType(String),
    /// Nodes with a `tagged_with` edge to the named `tag` node (`tag:<tagName>`),
    /// compared case-insensitively.
    Tag(String),
}

impl SearchQuery {
    pub fn parse(raw: &str) -> Result<Self> {
        let raw = raw.trim();
        if raw.is_empty() {
            return Err(LoreError::validation("query", "must not be empty"));
        }

        if let Some(rest) = raw.strip_prefix("type:") {
            return Ok(Self::NodeType(prefixed_value(raw, rest)?));
        }
        if let Some(rest) = raw.strip_prefix("tag:") {
            return Ok(Self::Tag(prefixed_value(raw, rest)?.to_lowercase()));
        }
        Ok(Self::Text(raw.to_lowercase()))
    }

    fn matches(&self, node: &Node, graph: &KnowledgeGraph) -> bool {
        match self {
            Self::Text(needle) => {
                node.name.to_lowercase().contains(needle)
                    || node
                        .metadata
                        .iter()
                        .any(|line| line.to_lowercase().contains(needle))
            }
            Self::NodeType(node_type) => &node.node_type == node_type,
            Self::Tag(tag) => graph
                .edges
                .iter()
                .filter(|e| e.edge_type == TAGGED_WITH && e.from == node.name)
                .filter_map(|e| graph.node(&e.to))
                .any(|target| {
                    target.node_type == TAG_NODE_TYPE && target.name.to_lowercase() == *tag
                }),
        }
    }
}

fn prefixed_value(raw: &str, rest: &str) -> Result<String> {
    let value = rest.trim();
    if value.is_empty() {
        return Err(LoreError::validation(
            "query",
            format!("'{raw}' needs a value after the prefix"),
        ));
    }
    Ok(value.to_string())
}

impl GraphStore {
    /// Snapshot of every node and edge.
    pub async fn read_graph(&self) -> KnowledgeGraph {
        self.read(|graph| graph.clone()).await
    }

    /// Find nodes matching `query`, plus the edges among them.
    ///
    /// Results keep store order, so repeated searches with no intervening
    /// mutation return identical results.
    pub async fn search_nodes(&self, query: &str) -> Result<KnowledgeGraph> {
        let query = SearchQuery::parse(query)?;
        let result = self
            .read(|graph| {
                let nodes: Vec<Node> = graph
                    .nodes
                    .iter()
                    .filter(|n| query.matches(n, graph))
                    .cloned()
                    .collect();
                let names: Vec<&str> = nodes.iter().map(|n| n.name.as_str()).collect();
                let edges = graph.edges_among(&names);
                KnowledgeGraph { nodes, edges }
            })
            .await;

        tracing::debug!(?query, matches = result.nodes.len(), "Search completed");
        Ok(result)
    }

    /// Look up nodes by exact name, reporting names that were not found.
    pub async fn open_nodes(&self, names: &[String]) -> OpenNodes {
        self.read(|graph| {
            let mut opened = OpenNodes::default();
            for name in names {
                match graph.node(name) {
                    Some(node) if !opened.nodes.contains(node) => opened.nodes.push(node.clone()),
                    Some(_) => {}
                    None => opened.missing.push(name.clone()),
                }
            }
            let found: Vec<&str> = opened.nodes.iter().map(|n| n.name.as_str()).collect();
            opened.edges = graph.edges_among(&found);
            opened
        })
        .await
    }
}

#[cfg(test)]
mod tests {
    use loregraph_core::Edge;

    use super::*;

    async fn seeded_store(dir: &tempfile::TempDir) -> GraphStore {
        let store = GraphStore::open(dir.path().join("memory.jsonl")).unwrap();
        store
            .add_nodes(vec![
                Node::new("Garrick", "npc").with_metadata(["Role: Blacksmith"]),
                Node::new("Mira", "npc").with_metadata(["Role: Bard"]),
                Node::new("Tavern", "location").with_metadata(["Description: smoky hall"]),
                Node::new("merchant", "tag"),
            ])
            .await
            .unwrap();
        store
            .add_edges(vec![
                Edge::new("Garrick", "Tavern", "located_in"),
                Edge::new("Mira", "Tavern", "located_in"),
                Edge::new("Garrick", "merchant", TAGGED_WITH),
            ])
            .await
            .unwrap();
        store
    }

    #[test]
    fn test_parse_query_forms() {
        assert_eq!(
            SearchQuery::parse("type:npc").unwrap(),
            SearchQuery::NodeType("npc".into())
        );
        assert_eq!(
            SearchQuery::parse(" tag: merchant ").unwrap(),
            SearchQuery::Tag("merchant".into())
        );
        assert_eq!(
            SearchQuery::parse("Smoky").unwrap(),
            SearchQuery::Text("smoky".into())
        );
        assert!(SearchQuery::parse("   ").is_err());
        assert!(SearchQuery::parse("type:").is_err());
    }

    #[tokio::test]
    async fn test_text_search_covers_names_and_metadata() {
        let dir = tempfile::tempdir().unwrap();
        let store = seeded_store(&dir).await;

        let by_name = store.search_nodes("garr").await.unwrap();
        assert_eq!(by_name.nodes.len(), 1);
        assert_eq!(by_name.nodes[0].name, "Garrick");

        let by_metadata = store.search_nodes("SMOKY").await.unwrap();
        assert_eq!(by_metadata.nodes[0].name, "Tavern");
    }

    #[tokio::test]
    async fn test_type_search_returns_edges_among_matches() {
        let dir = tempfile::tempdir().unwrap();
        let store = seeded_store(&dir).await;

        let npcs = store.search_nodes("type:npc").await.unwrap();
        let names: Vec<&str> = npcs.nodes.iter().map(|n| n.name.as_str()).collect();
        assert_eq!(names, vec!["Garrick", "Mira"]);
        assert!(npcs.edges.is_empty());

        let blacksmith = store.search_nodes("blacksmith").await.unwrap();
        assert!(blacksmith.edges.is_empty());
    }

    #[tokio::test]
    async fn test_tag_search_follows_tagged_with_edges() {
        let dir = tempfile::tempdir().unwrap();
        let store = seeded_store(&dir).await;

        let tagged = store.search_nodes("tag:Merchant").await.unwrap();
        assert_eq!(tagged.nodes.len(), 1);
        assert_eq!(tagged.nodes[0].name, "Garrick");
    }

    #[tokio::test]
    async fn test_tag_search_folds_non_ascii_and_requires_tag_nodes() {
        let dir = tempfile::tempdir().unwrap();
        let store = seeded_store(&dir).await;
        store
            .add_nodes(vec![Node::new("Ölhändler", "tag"), Node::new("Schmiede", "location")])
            .await
            .unwrap();
        store
            .add_edges(vec![
                Edge::new("Mira", "Ölhändler", TAGGED_WITH),
                Edge::new("Garrick", "Schmiede", TAGGED_WITH),
            ])
            .await
            .unwrap();

        let tagged = store.search_nodes("tag:ÖLHÄNDLER").await.unwrap();
        let names: Vec<&str> = tagged.nodes.iter().map(|n| n.name.as_str()).collect();
        assert_eq!(names, vec!["Mira"]);

        let not_a_tag = store.search_nodes("tag:Schmiede").await.unwrap();
        assert!(not_a_tag.nodes.is_empty());
    }

    #[tokio::test]
    async fn test_open_nodes_reports_missing_names() {
        let dir = tempfile::tempdir().unwrap();
        let store = seeded_store(&dir).await;

        let opened = store
            .open_nodes(&["Garrick".into(), "Castle".into(), "Tavern".into()])
            .await;

        assert_eq!(opened.nodes.len(), 2);
        assert_eq!(opened.missing, vec!["Castle"]);
        assert_eq!(opened.edges, vec![Edge::new("Garrick", "Tavern", "located_in")]);
    }
}

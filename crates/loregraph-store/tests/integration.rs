//! Integration tests for loregraph-store against a real backing file.
//!
//! Each test gets its own temporary directory.

use std::collections::HashSet;

use loregraph_core::{Edge, GraphRecord, Node};
use loregraph_store::GraphStore;

fn open(dir: &tempfile::TempDir) -> GraphStore {
    GraphStore::open(dir.path().join("memory.jsonl")).unwrap()
}

async fn build_village(store: &GraphStore) {
    store
        .add_nodes(vec![
            Node::new("Garrick", "npc").with_metadata(["Role: Blacksmith", "Status: Alive"]),
            Node::new("Mira", "npc").with_metadata(["Role: Bard"]),
            Node::new("Tavern", "location"),
            Node::new("Forge", "location"),
            Node::new("FindTheAmulet", "quest").with_metadata(["Status: Active"]),
        ])
        .await
        .unwrap();
    store
        .add_edges(vec![
            Edge::new("Garrick", "Forge", "located_in"),
            Edge::new("Mira", "Tavern", "located_in"),
            Edge::new("Mira", "FindTheAmulet", "gives_quest"),
            Edge::new("Tavern", "Forge", "next_to"),
            Edge::new("Mira", "Tavern", "located_in"),
        ])
        .await
        .unwrap();
}

#[tokio::test]
async fn test_round_trip_is_set_equal() {
    let dir = tempfile::tempdir().unwrap();
    let store = open(&dir);
    build_village(&store).await;
    let before = store.read_graph().await;

    let reopened = open(&dir);
    let after = reopened.read_graph().await;

    let nodes_before: HashSet<Node> = before.nodes.into_iter().collect();
    let nodes_after: HashSet<Node> = after.nodes.into_iter().collect();
    assert_eq!(nodes_before, nodes_after);

    let mut edges_before = before.edges;
    let mut edges_after = after.edges;
    edges_before.sort();
    edges_after.sort();
    assert_eq!(edges_before, edges_after);
}

#[tokio::test]
async fn test_reload_ignores_line_order() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("memory.jsonl");
    let records = [
        GraphRecord::Edge(Edge::new("Mira", "Tavern", "located_in")),
        GraphRecord::Node(Node::new("Tavern", "location")),
        GraphRecord::Node(Node::new("Mira", "npc")),
    ];
    let text: String = records
        .iter()
        .map(|r| serde_json::to_string(r).unwrap() + "\n")
        .collect();
    std::fs::write(&path, text).unwrap();

    let store = GraphStore::open(&path).unwrap();
    let graph = store.read_graph().await;
    assert_eq!(graph.nodes.len(), 2);
    assert_eq!(graph.edges, vec![Edge::new("Mira", "Tavern", "located_in")]);
}

#[tokio::test]
async fn test_corrupt_file_refuses_to_open() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("memory.jsonl");
    std::fs::write(&path, "{\"type\":\"node\",\"name\":\"A\",\"nodeType\":\"npc\"}\nnot json\n")
        .unwrap();

    let err = GraphStore::open(&path).err().unwrap();
    assert_eq!(err.kind(), "CorruptStoreError");
}

#[tokio::test]
async fn test_uniqueness_across_add_sequences() {
    let dir = tempfile::tempdir().unwrap();
    let store = open(&dir);

    for round in 0..5 {
        let batch = (0..4)
            .map(|i| Node::new(format!("node-{}", (round + i) % 6), "npc"))
            .collect();
        store.add_nodes(batch).await.unwrap();
    }

    let graph = store.read_graph().await;
    let names: HashSet<&str> = graph.nodes.iter().map(|n| n.name.as_str()).collect();
    assert_eq!(names.len(), graph.nodes.len());
    assert_eq!(graph.nodes.len(), 6);
}

#[tokio::test]
async fn test_duplicate_add_does_not_touch_file() {
    let dir = tempfile::tempdir().unwrap();
    let store = open(&dir);
    build_village(&store).await;
    let before = std::fs::read_to_string(store.path()).unwrap();

    let outcome = store
        .add_nodes(vec![Node::new("Garrick", "quest")])
        .await
        .unwrap();
    assert_eq!(outcome.failed[0].kind, "ConflictError");

    let after = std::fs::read_to_string(store.path()).unwrap();
    assert_eq!(before, after);
    assert_eq!(store.read_graph().await.node("Garrick").unwrap().node_type, "npc");
}

#[tokio::test]
async fn test_cascade_leaves_no_dangling_edges() {
    let dir = tempfile::tempdir().unwrap();
    let store = open(&dir);
    build_village(&store).await;

    for name in ["Tavern", "Garrick"] {
        store.delete_nodes(vec![name.to_string()]).await.unwrap();
        let graph = store.read_graph().await;
        assert!(graph.edges.iter().all(|e| !e.touches(name)));
        for edge in &graph.edges {
            assert!(graph.contains_node(&edge.from));
            assert!(graph.contains_node(&edge.to));
        }
    }

    let reopened = open(&dir).read_graph().await;
    assert_eq!(
        reopened.edges,
        vec![Edge::new("Mira", "FindTheAmulet", "gives_quest")]
    );
}

#[tokio::test]
async fn test_search_is_stable() {
    let dir = tempfile::tempdir().unwrap();
    let store = open(&dir);
    build_village(&store).await;

    let first = store.search_nodes("a").await.unwrap();
    let second = store.search_nodes("a").await.unwrap();
    assert_eq!(first, second);
    assert!(!first.nodes.is_empty());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_adds_all_persist() {
    let dir = tempfile::tempdir().unwrap();
    let store = open(&dir);

    let mut handles = Vec::new();
    for i in 0..16 {
        let store = store.clone();
        handles.push(tokio::spawn(async move {
            store
                .add_nodes(vec![Node::new(format!("npc-{i}"), "npc")])
                .await
                .unwrap()
        }));
    }
    for handle in handles {
        assert!(handle.await.unwrap().is_complete());
    }

    let text = std::fs::read_to_string(store.path()).unwrap();
    let mut names = HashSet::new();
    for line in text.lines() {
        match serde_json::from_str::<GraphRecord>(line).unwrap() {
            GraphRecord::Node(node) => {
                names.insert(node.name);
            }
            GraphRecord::Edge(_) => panic!("no edges expected"),
        }
    }
    assert_eq!(names.len(), 16);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_readers_never_see_partial_entities() {
    let dir = tempfile::tempdir().unwrap();
    let store = open(&dir);
    store
        .add_nodes(vec![Node::new("Tavern", "location")])
        .await
        .unwrap();

    let writer = {
        let store = store.clone();
        tokio::spawn(async move {
            for i in 0..20 {
                let name = format!("patron-{i}");
                store
                    .create_entity(
                        Node::new(&name, "npc"),
                        vec![Edge::new(&name, "Tavern", "located_in")],
                    )
                    .await
                    .unwrap();
            }
        })
    };

    let reader = {
        let store = store.clone();
        tokio::spawn(async move {
            for _ in 0..50 {
                let graph = store.read_graph().await;
                // Every patron node appears together with its edge.
                let patrons = graph.nodes.iter().filter(|n| n.node_type == "npc").count();
                assert_eq!(patrons, graph.edges.len());
                tokio::task::yield_now().await;
            }
        })
    };

    writer.await.unwrap();
    reader.await.unwrap();
}

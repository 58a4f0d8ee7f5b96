//! JSONL codec for the backing file.
//!
//! One record per line: every node first, then every edge, in store order.
//! Writes go to a temporary file in the same directory that is synced and
//! renamed over the target, so a failed write never leaves a truncated file.

use std::collections::HashSet;
use std::io::{BufWriter, Write};
use std::path::Path;

use serde::Serialize;

use loregraph_core::{Edge, GraphRecord, KnowledgeGraph, LoreError, Node, Result};

/// Borrowed form of [`GraphRecord`] so writing does not clone the graph.
#[derive(Serialize)]
#[serde(tag = "type", rename_all = "lowercase")]
enum RecordRef<'a> {
    Node(&'a Node),
    Edge(&'a Edge),
}

pub(crate) fn io_error(path: &Path, source: std::io::Error) -> LoreError {
    LoreError::Persistence {
        path: path.display().to_string(),
        source,
    }
}

/// Load a graph from `path`. A missing file is an empty graph.
pub fn load_graph(path: &Path) -> Result<KnowledgeGraph> {
    let bytes = match std::fs::read(path) {
        Ok(bytes) => bytes,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            return Ok(KnowledgeGraph::default())
        }
        Err(e) => return Err(io_error(path, e)),
    };
    parse_graph(&bytes)
}

/// Parse JSONL into a graph, enforcing name uniqueness and edge endpoints.
///
/// Each line must be UTF-8 on its own. Edges may precede the nodes they
/// reference; endpoints are checked once the whole file has been read.
pub fn parse_graph(text: impl AsRef<[u8]>) -> Result<KnowledgeGraph> {
    let mut graph = KnowledgeGraph::default();
    let mut names: HashSet<String> = HashSet::new();
    let mut edge_lines = Vec::new();

    for (idx, raw) in text.as_ref().split(|b| *b == b'\n').enumerate() {
        let line = idx + 1;
        let raw = std::str::from_utf8(raw).map_err(|e| LoreError::CorruptStore {
            line,
            reason: format!("invalid UTF-8: {e}"),
        })?;
        if raw.trim().is_empty() {
            continue;
        }

        let record: GraphRecord =
            serde_json::from_str(raw).map_err(|e| LoreError::CorruptStore {
                line,
                reason: e.to_string(),
            })?;

        match record {
            GraphRecord::Node(node) => {
                if !names.insert(node.name.clone()) {
                    return Err(LoreError::CorruptStore {
                        line,
                        reason: format!("duplicate node name '{}'", node.name),
                    });
                }
                graph.nodes.push(node);
            }
            GraphRecord::Edge(edge) => {
                edge_lines.push(line);
                graph.edges.push(edge);
            }
        }
    }

    for (edge, line) in graph.edges.iter().zip(edge_lines) {
        for endpoint in [&edge.from, &edge.to] {
            if !names.contains(endpoint) {
                return Err(LoreError::CorruptStore {
                    line,
                    reason: format!("edge {edge} references missing node '{endpoint}'"),
                });
            }
        }
    }

    Ok(graph)
}

/// Serialize a graph to JSONL text.
pub fn encode_graph(graph: &KnowledgeGraph) -> Result<String> {
    let mut out = String::new();
    for record in records(graph) {
        out.push_str(&serde_json::to_string(&record)?);
        out.push('\n');
    }
    Ok(out)
}

fn records(graph: &KnowledgeGraph) -> impl Iterator<Item = RecordRef<'_>> {
    graph
        .nodes
        .iter()
        .map(RecordRef::Node)
        .chain(graph.edges.iter().map(RecordRef::Edge))
}

fn write_records<W: Write>(writer: &mut W, graph: &KnowledgeGraph) -> std::io::Result<()> {
    for record in records(graph) {
        serde_json::to_writer(&mut *writer, &record)?;
        writer.write_all(b"\n")?;
    }
    Ok(())
}

/// Replace the file at `path` with the full contents of `graph`.
pub fn write_graph(path: &Path, graph: &KnowledgeGraph) -> Result<()> {
    let dir = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };

    let mut tmp = tempfile::NamedTempFile::new_in(dir).map_err(|e| io_error(path, e))?;
    {
        let mut writer = BufWriter::new(tmp.as_file_mut());
        write_records(&mut writer, graph).map_err(|e| io_error(path, e))?;
        writer.flush().map_err(|e| io_error(path, e))?;
    }
    tmp.as_file().sync_all().map_err(|e| io_error(path, e))?;
    tmp.persist(path).map_err(|e| io_error(path, e.error))?;

    Ok(())
}

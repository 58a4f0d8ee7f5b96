//! Shared graph store handle: in-memory state plus its backing file.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use tokio::sync::RwLock;

use loregraph_core::{KnowledgeGraph, Result};

use crate::persist;

/// Thread-safe graph store backed by a JSONL file.
///
/// This is the single point of access for all graph reads and writes.
/// Clone is cheap (inner Arc).
#[derive(Clone)]
pub struct GraphStore {
    inner: Arc<Inner>,
}

struct Inner {
    path: PathBuf,
    graph: RwLock<KnowledgeGraph>,
}

impl GraphStore {
    /// Open the store at `path`, loading the graph if the file exists.
    ///
    /// Parent directories are created so the first write cannot fail on a
    /// missing directory.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|e| persist::io_error(&path, e))?;
        }

        let graph = persist::load_graph(&path)?;
        tracing::info!(
            path = %path.display(),
            nodes = graph.nodes.len(),
            edges = graph.edges.len(),
            "Graph store opened"
        );

        Ok(Self {
            inner: Arc::new(Inner {
                path,
                graph: RwLock::new(graph),
            }),
        })
    }

    /// The backing file.
    pub fn path(&self) -> &Path {
        &self.inner.path
    }

    /// Run a read-only closure against a consistent view of the graph.
    pub(crate) async fn read<R>(&self, f: impl FnOnce(&KnowledgeGraph) -> R) -> R {
        let guard = self.inner.graph.read().await;
        f(&guard)
    }

    /// Apply a mutation as one critical section.
    ///
    /// The closure works on a copy of the graph. If it fails, nothing changes.
    /// If it succeeds and the copy differs from the current graph, the copy is
    /// written to disk first and published only once the write is confirmed.
    /// No `.await` happens after the write guard is taken, so a dropped caller
    /// cannot interrupt a mutation halfway.
    pub(crate) async fn mutate<R>(
        &self,
        operation: &'static str,
        f: impl FnOnce(&mut KnowledgeGraph) -> Result<R>,
    ) -> Result<R> {
        let mut guard = self.inner.graph.write().await;
        let mut working = guard.clone();

        let result = f(&mut working)?;

        if working != *guard {
            persist::write_graph(&self.inner.path, &working)?;
            tracing::debug!(
                operation,
                nodes = working.nodes.len(),
                edges = working.edges.len(),
                "Graph persisted"
            );
            *guard = working;
        }

        Ok(result)
    }
}

//! Reads schema documents from a directory.

use std::fs;
use std::path::{Path, PathBuf};

use crate::document::SchemaDocument;
use crate::error::{Result, SchemaError};

/// Load every `*.json` document in `dir` (non-recursive), ordered by file name.
pub fn load_schema_dir(dir: &Path) -> Result<Vec<SchemaDocument>> {
    if !dir.is_dir() {
        return Err(SchemaError::DirectoryNotFound {
            path: dir.display().to_string(),
        });
    }

    let entries = fs::read_dir(dir).map_err(|e| io_error(dir, e))?;
    let mut paths: Vec<PathBuf> = entries
        .flatten()
        .map(|entry| entry.path())
        .filter(|path| path.is_file() && path.extension().and_then(|e| e.to_str()) == Some("json"))
        .collect();
    paths.sort();

    let mut documents = Vec::with_capacity(paths.len());
    for path in &paths {
        documents.push(load_schema_file(path)?);
    }

    tracing::info!(dir = %dir.display(), count = documents.len(), "Schema documents loaded");
    Ok(documents)
}

/// Load a single schema document.
pub fn load_schema_file(path: &Path) -> Result<SchemaDocument> {
    let json = fs::read_to_string(path).map_err(|e| io_error(path, e))?;
    let document: SchemaDocument =
        serde_json::from_str(&json).map_err(|source| SchemaError::Parse {
            path: path.display().to_string(),
            source,
        })?;

    tracing::debug!(path = %path.display(), schema = %document.name, "Schema document parsed");
    Ok(document)
}

fn io_error(path: &Path, source: std::io::Error) -> SchemaError {
    SchemaError::Io {
        path: path.display().to_string(),
        source,
    }
}

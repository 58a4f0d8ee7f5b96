//! Configuration management for loregraph.
//!
//! Configuration is loaded from (in priority order):
//! 1. Environment variables (LOREGRAPH__ prefix, e.g. `LOREGRAPH__SCHEMA_DIR`)
//! 2. Config file (`loregraph.toml`)
//! 3. Defaults

use std::path::PathBuf;

use serde::Deserialize;

/// Where the graph lives and where schema documents are read from.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct LoreConfig {
    /// JSONL file backing the graph store.
    #[serde(default = "default_memory_file_path")]
    pub memory_file_path: PathBuf,

    /// Directory of schema documents compiled into tools at startup.
    #[serde(default = "default_schema_dir")]
    pub schema_dir: PathBuf,
}

fn default_memory_file_path() -> PathBuf {
    PathBuf::from("memory.jsonl")
}

fn default_schema_dir() -> PathBuf {
    PathBuf::from("schemas")
}

impl Default for LoreConfig {
    fn default() -> Self {
        Self {
            memory_file_path: default_memory_file_path(),
            schema_dir: default_schema_dir(),
        }
    }
}

impl LoreConfig {
    /// Load from `<file_prefix>.{toml,json,...}` and `LOREGRAPH__*` variables.
    ///
    /// A missing file falls back to defaults; a file that exists but cannot
    /// be parsed is an error.
    pub fn load(file_prefix: &str) -> Result<Self, config::ConfigError> {
        let cfg = config::Config::builder()
            .add_source(config::File::with_name(file_prefix).required(false))
            .add_source(
                config::Environment::with_prefix("LOREGRAPH")
                    .prefix_separator("__")
                    .try_parsing(true),
            )
            .build()?;

        let loaded: LoreConfig = cfg.try_deserialize()?;
        tracing::debug!(
            memory_file_path = %loaded.memory_file_path.display(),
            schema_dir = %loaded.schema_dir.display(),
            "Configuration loaded"
        );
        Ok(loaded)
    }
}

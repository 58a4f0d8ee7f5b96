//! loregraph-core: Shared types, configuration, and error handling for loregraph.
//!
//! This crate provides the foundational types used across all loregraph crates:
//! - Node and edge types, plus the JSONL record shape of the persisted graph
//! - Batch input types for the built-in graph tools
//! - Configuration management
//! - The tool error taxonomy

pub mod config;
pub mod error;
pub mod types;

pub use config::LoreConfig;
pub use error::{LoreError, Result};
pub use types::{
    Edge, EdgeUpdate, EntityUpdate, GraphRecord, KnowledgeGraph, MetadataAddition,
    MetadataChange, MetadataDeletion, Node, NodeUpdate, RelationshipChange,
};

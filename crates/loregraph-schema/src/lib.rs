//! loregraph-schema: compiles schema documents into graph tools.
//!
//! Each JSON schema document describes one node type. Compiling it yields
//! `add_<type>`, `update_<type>` and `delete_<type>` tools whose validators
//! turn raw arguments into entity operations for the graph store:
//! plain fields become ordered `"Label: value"` metadata lines, and fields
//! with a `relationship` annotation become outgoing edges.

pub mod compiler;
pub mod document;
pub mod error;
pub mod loader;
pub mod tool;

pub use compiler::{compile, compile_all, CompiledSchema, FieldRole, FieldSpec};
pub use document::{SchemaDocument, ValueType};
pub use error::SchemaError;
pub use loader::{load_schema_dir, load_schema_file};
pub use tool::{CompiledTool, EntityOperation, ToolKind};

//! loregraph-tools: Tool registry and dispatcher for the loregraph graph.
//!
//! Exposes the fixed built-in graph tools alongside the add/update/delete
//! tools compiled from schema documents, and turns every call into either a
//! [`ToolResponse`] or a structured [`ErrorEnvelope`].

pub mod builtin;
pub mod envelope;
pub mod registry;
pub mod serve;

pub use builtin::{BuiltinCall, BuiltinTool};
pub use envelope::{ErrorEnvelope, ToolRequest, ToolResponse, ToolResult};
pub use registry::{Operation, ToolDescriptor, ToolHandler, ToolRegistry};

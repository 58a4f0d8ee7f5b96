//! loregraph-store: the file-backed graph store.
//!
//! This crate is the single mutation point for the graph. All reads and
//! writes flow through [`GraphStore`], which keeps the in-memory graph and
//! its JSONL backing file in lockstep and enforces name uniqueness and
//! edge endpoint integrity.

pub mod mutations;
pub mod outcome;
pub mod persist;
pub mod queries;
pub mod store;

pub use outcome::{
    BatchOutcome, EdgeRemoval, EdgeRewrite, EntityCreation, ItemFailure, NodeRemoval, OpenNodes,
};
pub use queries::SearchQuery;
pub use store::GraphStore;

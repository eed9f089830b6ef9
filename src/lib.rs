//! # Assetgraph - Project resource graph
//!
//! Maps every markup document of a project to the style sheets and scripts
//! it pulls in, following `@import` and `require` chains until nothing new
//! turns up.
//!
//! Assetgraph provides:
//! - Pattern-based reference extraction for markup, style and script files
//! - A three-table node graph keyed by canonical path
//! - An asynchronous, bounded, fixed-point scanner
//! - A build driver with cancellation and per-build diagnostics
//! - Impact analysis and stale-reference queries over the finished graph

pub mod kind;
pub mod node;
pub mod edge;
pub mod resolve;
pub mod extract;
pub mod graph;
pub mod filename;
pub mod exclude;
pub mod index;
pub mod source;
pub mod scanner;
pub mod report;
pub mod build;
pub mod watcher;
pub mod output;
pub mod config;
pub mod ui;


// Re-exports for convenient access
pub use kind::NodeKind;
pub use node::{Node, NodeId, ReadStatus};
pub use edge::{Edge, EdgeKind};
pub use graph::Graph;
pub use build::{BuildOutcome, ProjectEvent, ProjectMap};

/// Result type alias for Assetgraph operations
pub type Result<T> = std::result::Result<T, Error>;

/// Error types for Assetgraph operations
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to read {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid edge: {0}")]
    InvalidEdge(String),

    #[error("Unknown node kind: {0}")]
    UnknownKind(String),

    #[error("Node not found: {0}")]
    NodeNotFound(String),

    #[error("Watch error: {0}")]
    Watch(#[from] notify::Error),

    #[error("Build cancelled")]
    Cancelled,
}

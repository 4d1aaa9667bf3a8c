//! Skillgraph Core Library
//!
//! This crate provides the core functionality for Skillgraph, including:
//! - Typed property graph of documents, concepts, skills, issues and pull requests
//! - Traversal (one-hop neighbors, bounded dependency walks)
//! - Tracker event correlation (issue/PR lifecycle into graph structure)
//! - Storage (SQLite + JSONL export)
//! - Configuration

pub mod config;
pub mod domain;
pub mod error;
pub mod infrastructure;
pub mod storage;

pub use error::{Error, Result};

/// Re-export commonly used types
pub mod prelude {
    pub use crate::config::Config;
    pub use crate::domain::graph::{
        Edge, GraphEvent, GraphRepository, GraphStats, GraphTraversal, Node, NodeType,
        NodeView, Properties, PropertyValue, Relationship, DEFAULT_MAX_DEPTH,
    };
    pub use crate::domain::tracker::{
        CorrelationOutcome, EventCorrelator, ExtractionRules, IssuePayload, PullRequestPayload,
    };
    pub use crate::error::{Error, Result};
    pub use crate::infrastructure::graph::SqliteGraphRepository;
    pub use crate::storage::Database;
}

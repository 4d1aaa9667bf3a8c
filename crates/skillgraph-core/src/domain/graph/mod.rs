//! Typed property graph domain module
//!
//! This module models the dependency graph between tracker activity and
//! documentation:
//!
//! - **Nodes**: typed entities keyed by `"<type>:<localId>"`
//! - **Edges**: directed, typed, deduplicated on `(from, to, relationship)`
//! - **Traversal**: one-hop neighbors and bounded dependency walks
//! - **Events**: an operator-readable trace of every mutation
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────┐
//! │                     EventCorrelator                       │
//! │  issue/PR events → extraction → upserts + edge inserts    │
//! └──────────────────────────────────────────────────────────┘
//!                             ↓
//! ┌──────────────────────────────────────────────────────────┐
//! │          GraphRepository        GraphTraversal            │
//! │   nodes, edges, stats     find_related, find_dependents   │
//! └──────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//!
//! ```rust,ignore
//! use skillgraph_core::domain::graph::{GraphTraversal, NodeType, Relationship};
//!
//! let issue = repository.upsert_node(NodeType::Issue, "42", props).await?;
//! repository
//!     .insert_edge(&issue, "Concept:StorageAPI", Relationship::About, Properties::new())
//!     .await?;
//!
//! let traversal = GraphTraversal::new(repository.clone());
//! let skills = traversal.find_dependents("Document:docs/auth.md", 3).await?;
//! ```

mod edge;
mod event;
mod node;
mod property;
mod repository;
mod traversal;
mod view;

pub use edge::{Edge, Relationship};
pub use event::GraphEvent;
pub use node::{split_node_id, Node, NodeType};
pub use property::{merge_properties, properties_from_json, Properties, PropertyValue};
pub use repository::{GraphRepository, GraphStats};
pub use traversal::{GraphTraversal, DEFAULT_MAX_DEPTH};
pub use view::{
    ConceptView, DocumentView, IssueView, NodeView, PullRequestView, SkillView, TrackerStatus,
};

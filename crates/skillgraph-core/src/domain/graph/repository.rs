//! Repository trait for graph persistence
//!
//! This module defines the storage contract for nodes and edges. The trait
//! abstracts over storage backends; the SQLite implementation lives in
//! `infrastructure::graph`.

use std::collections::BTreeMap;

use async_trait::async_trait;
use serde::Serialize;

use crate::error::Result;

use super::edge::{Edge, Relationship};
use super::node::{Node, NodeType};
use super::property::Properties;

/// Repository trait for graph persistence
///
/// Every call is atomic against the backing store: it either fully applies
/// or has no observable effect. Nothing is ever deleted.
#[async_trait]
pub trait GraphRepository: Send + Sync {
    // ========== Node Operations ==========

    /// Insert a node or fully replace its properties
    ///
    /// Builds the id as `"<type>:<local_id>"`, sets `updated_at` to now and
    /// returns the id. Never fails on conflict; the last writer wins.
    async fn upsert_node(
        &self,
        node_type: NodeType,
        local_id: &str,
        properties: Properties,
    ) -> Result<String>;

    /// Get a node by id; absence is not an error
    async fn get_node(&self, node_id: &str) -> Result<Option<Node>>;

    /// Overlay `partial` onto an existing node's properties
    ///
    /// Fails with `NotFound` if the node does not exist. Returns the node as
    /// stored after the update.
    async fn merge_update_node(&self, node_id: &str, partial: Properties) -> Result<Node>;

    /// List nodes of one type, newest first
    async fn list_nodes_by_type(&self, node_type: NodeType) -> Result<Vec<Node>>;

    /// List every node, oldest first
    async fn list_nodes(&self) -> Result<Vec<Node>>;

    // ========== Edge Operations ==========

    /// Insert an edge unless `(from_id, to_id, relationship)` already exists
    ///
    /// Returns `true` if a new edge was created. A duplicate is a silent
    /// no-op. Neither end has to exist as a node.
    async fn insert_edge(
        &self,
        from_id: &str,
        to_id: &str,
        relationship: Relationship,
        properties: Properties,
    ) -> Result<bool>;

    /// List every edge, in insertion order
    async fn list_edges(&self) -> Result<Vec<Edge>>;

    /// List edges touching a node in either direction, in insertion order
    async fn list_edges_for_node(
        &self,
        node_id: &str,
        relationship: Option<Relationship>,
    ) -> Result<Vec<Edge>>;

    /// List edges leaving a node, in insertion order
    async fn list_outgoing_edges(&self, node_id: &str) -> Result<Vec<Edge>>;

    // ========== Statistics ==========

    /// Aggregate counts, recomputed on every call
    async fn get_stats(&self) -> Result<GraphStats>;
}

/// Statistics about the graph
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct GraphStats {
    /// Total number of nodes
    pub total_nodes: u64,
    /// Total number of edges
    pub total_edges: u64,
    /// Node count per type (types with no nodes are omitted)
    pub nodes_by_type: BTreeMap<NodeType, u64>,
}

impl GraphStats {
    /// Count for one node type, zero if absent
    pub fn count_of(&self, node_type: NodeType) -> u64 {
        self.nodes_by_type.get(&node_type).copied().unwrap_or(0)
    }
}

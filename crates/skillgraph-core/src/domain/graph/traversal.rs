//! Read-side graph traversal
//!
//! Two queries built on top of [`GraphRepository`]:
//!
//! - [`GraphTraversal::find_related`]: one-hop neighbors, both directions,
//!   optionally filtered to one relationship.
//! - [`GraphTraversal::find_dependents`]: bounded forward breadth-first walk
//!   that answers "what depends on this node".

use std::collections::{HashSet, VecDeque};
use std::sync::Arc;

use tracing::debug;

use crate::error::Result;

use super::edge::Relationship;
use super::node::Node;
use super::repository::GraphRepository;

/// Default hop bound for [`GraphTraversal::find_dependents`]
pub const DEFAULT_MAX_DEPTH: u32 = 3;

/// Traversal queries over a graph repository
pub struct GraphTraversal<R: GraphRepository + ?Sized> {
    repository: Arc<R>,
}

impl<R: GraphRepository + ?Sized> Clone for GraphTraversal<R> {
    fn clone(&self) -> Self {
        Self {
            repository: Arc::clone(&self.repository),
        }
    }
}

impl<R: GraphRepository + ?Sized> GraphTraversal<R> {
    /// Create a traversal over the given repository
    pub fn new(repository: Arc<R>) -> Self {
        Self { repository }
    }

    /// Nodes connected to `node_id` by a single edge in either direction
    ///
    /// Results are deduplicated by node id and ordered by edge insertion.
    /// Edges whose other end has no stored node contribute nothing. The
    /// seed itself only appears when it has a self-loop.
    pub async fn find_related(
        &self,
        node_id: &str,
        relationship: Option<Relationship>,
    ) -> Result<Vec<Node>> {
        let edges = self
            .repository
            .list_edges_for_node(node_id, relationship)
            .await?;

        let mut seen = HashSet::new();
        let mut related = Vec::new();

        for edge in &edges {
            let Some(other_id) = edge.other_end(node_id) else {
                continue;
            };
            if !seen.insert(other_id.to_string()) {
                continue;
            }
            if let Some(node) = self.repository.get_node(other_id).await? {
                related.push(node);
            }
        }

        debug!(
            node_id = %node_id,
            relationship = ?relationship,
            related = related.len(),
            "Found related nodes"
        );
        Ok(related)
    }

    /// Node ids reachable from `node_id` along outgoing edges
    ///
    /// Breadth-first, at most `max_depth` hops. The visited check happens
    /// when a node is dequeued: the seed is dequeued at depth 0, so
    /// `max_depth == 0` yields nothing. Cycles terminate because every
    /// expanded node enters the visited set exactly once.
    ///
    /// A target reached from two nodes before it is itself expanded is
    /// listed once per discovery; callers that need a set should dedup.
    pub async fn find_dependents(&self, node_id: &str, max_depth: u32) -> Result<Vec<String>> {
        let mut visited: HashSet<String> = HashSet::new();
        let mut frontier: VecDeque<(String, u32)> = VecDeque::from([(node_id.to_string(), 0)]);
        let mut dependents = Vec::new();

        while let Some((current_id, depth)) = frontier.pop_front() {
            if depth >= max_depth || visited.contains(&current_id) {
                continue;
            }
            visited.insert(current_id.clone());

            for edge in self.repository.list_outgoing_edges(&current_id).await? {
                if !visited.contains(&edge.to_id) {
                    dependents.push(edge.to_id.clone());
                    frontier.push_back((edge.to_id, depth + 1));
                }
            }
        }

        debug!(
            node_id = %node_id,
            max_depth,
            dependents = dependents.len(),
            "Walked dependents"
        );
        Ok(dependents)
    }
}

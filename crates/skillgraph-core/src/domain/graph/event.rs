//! Graph mutation events
//!
//! Events describe what a correlator call did to the graph. They are logged
//! as they happen and returned to the caller as an operator-readable trace.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::edge::Relationship;
use super::node::NodeType;

/// Events that can occur in the graph
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event_type", rename_all = "snake_case")]
pub enum GraphEvent {
    /// A node was inserted or had its properties replaced
    NodeUpserted {
        node_id: String,
        node_type: NodeType,
        timestamp: DateTime<Utc>,
    },
    /// A node had some properties overlaid
    NodeUpdated {
        node_id: String,
        changes: Vec<String>,
        timestamp: DateTime<Utc>,
    },
    /// An edge insert was attempted; `created` is false for duplicates
    EdgeInserted {
        from_id: String,
        to_id: String,
        relationship: Relationship,
        created: bool,
        timestamp: DateTime<Utc>,
    },
    /// Skills reachable from a changed document were found
    ImpactDetected {
        source_id: String,
        skill_ids: Vec<String>,
        timestamp: DateTime<Utc>,
    },
}

impl GraphEvent {
    /// Get the timestamp of the event
    pub fn timestamp(&self) -> DateTime<Utc> {
        match self {
            Self::NodeUpserted { timestamp, .. }
            | Self::NodeUpdated { timestamp, .. }
            | Self::EdgeInserted { timestamp, .. }
            | Self::ImpactDetected { timestamp, .. } => *timestamp,
        }
    }

    /// Get the event type name
    pub fn event_type_name(&self) -> &'static str {
        match self {
            Self::NodeUpserted { .. } => "node_upserted",
            Self::NodeUpdated { .. } => "node_updated",
            Self::EdgeInserted { .. } => "edge_inserted",
            Self::ImpactDetected { .. } => "impact_detected",
        }
    }

    /// Get the primary node id for this event
    pub fn aggregate_id(&self) -> &str {
        match self {
            Self::NodeUpserted { node_id, .. } | Self::NodeUpdated { node_id, .. } => node_id,
            Self::EdgeInserted { from_id, .. } => from_id,
            Self::ImpactDetected { source_id, .. } => source_id,
        }
    }

    /// Create a new NodeUpserted event
    pub fn node_upserted(node_id: impl Into<String>, node_type: NodeType) -> Self {
        Self::NodeUpserted {
            node_id: node_id.into(),
            node_type,
            timestamp: Utc::now(),
        }
    }

    /// Create a new NodeUpdated event
    pub fn node_updated(node_id: impl Into<String>, changes: Vec<String>) -> Self {
        Self::NodeUpdated {
            node_id: node_id.into(),
            changes,
            timestamp: Utc::now(),
        }
    }

    /// Create a new EdgeInserted event
    pub fn edge_inserted(
        from_id: impl Into<String>,
        to_id: impl Into<String>,
        relationship: Relationship,
        created: bool,
    ) -> Self {
        Self::EdgeInserted {
            from_id: from_id.into(),
            to_id: to_id.into(),
            relationship,
            created,
            timestamp: Utc::now(),
        }
    }

    /// Create a new ImpactDetected event
    pub fn impact_detected(source_id: impl Into<String>, skill_ids: Vec<String>) -> Self {
        Self::ImpactDetected {
            source_id: source_id.into(),
            skill_ids,
            timestamp: Utc::now(),
        }
    }
}

impl std::fmt::Display for GraphEvent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NodeUpserted { node_id, .. } => write!(f, "Upserted node: {}", node_id),
            Self::NodeUpdated {
                node_id, changes, ..
            } => write!(f, "Updated {} ({})", node_id, changes.join(", ")),
            Self::EdgeInserted {
                from_id,
                to_id,
                relationship,
                created: true,
                ..
            } => write!(f, "Linked {} --{}--> {}", from_id, relationship, to_id),
            Self::EdgeInserted {
                from_id,
                to_id,
                relationship,
                created: false,
                ..
            } => write!(
                f,
                "Already linked {} --{}--> {}",
                from_id, relationship, to_id
            ),
            Self::ImpactDetected {
                source_id,
                skill_ids,
                ..
            } => write!(
                f,
                "{} affects {} skill(s): {}",
                source_id,
                skill_ids.len(),
                skill_ids.join(", ")
            ),
        }
    }
}

//! Graph node types
//!
//! Nodes are typed entities keyed by a composite id of the form
//! `"<type>:<localId>"`. The type set is closed: anything outside
//! [`NodeType::all`] is rejected rather than stored.

use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::Error;

use super::property::{Properties, PropertyValue};

/// A node in the graph
///
/// `created_at` and `updated_at` are assigned by the store; callers only
/// supply the type, local id and properties.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Node {
    /// Composite id, `"<type>:<localId>"`
    pub id: String,
    /// Node type
    #[serde(rename = "type")]
    pub node_type: NodeType,
    /// Open property bag; its schema varies per type and is not validated
    pub properties: Properties,
    /// When the node was first inserted
    pub created_at: DateTime<Utc>,
    /// When the node was last upserted or merge-updated
    pub updated_at: DateTime<Utc>,
}

impl Node {
    /// The local part of the id (everything after the first `:`)
    pub fn local_id(&self) -> &str {
        split_node_id(&self.id)
            .map(|(_, local)| local)
            .unwrap_or(self.id.as_str())
    }

    /// Get a property by key
    pub fn property(&self, key: &str) -> Option<&PropertyValue> {
        self.properties.get(key)
    }

    /// Get a string property by key
    pub fn str_property(&self, key: &str) -> Option<&str> {
        self.property(key).and_then(PropertyValue::as_str)
    }

    /// The `status` property, if any
    pub fn status(&self) -> Option<&str> {
        self.str_property("status")
    }
}

/// Types of graph nodes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum NodeType {
    /// A documentation file (markdown, script, yaml)
    Document,
    /// A domain concept mentioned in tracker text
    Concept,
    /// A reusable skill generated from documentation
    Skill,
    /// A tracker issue
    Issue,
    /// A tracker pull request
    PullRequest,
}

impl NodeType {
    /// Get the string representation, also used as the id prefix
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Document => "Document",
            Self::Concept => "Concept",
            Self::Skill => "Skill",
            Self::Issue => "Issue",
            Self::PullRequest => "PullRequest",
        }
    }

    /// Parse from string
    ///
    /// Accepts the canonical names case-insensitively plus the plural and
    /// short forms used on the command line.
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "document" | "documents" | "doc" | "docs" => Some(Self::Document),
            "concept" | "concepts" => Some(Self::Concept),
            "skill" | "skills" => Some(Self::Skill),
            "issue" | "issues" => Some(Self::Issue),
            "pullrequest" | "pull_request" | "pullrequests" | "pr" | "prs" => {
                Some(Self::PullRequest)
            }
            _ => None,
        }
    }

    /// Get all node types
    pub fn all() -> &'static [NodeType] {
        &[
            Self::Document,
            Self::Concept,
            Self::Skill,
            Self::Issue,
            Self::PullRequest,
        ]
    }

    /// Build the composite node id for a local id of this type
    pub fn node_id(&self, local_id: &str) -> String {
        format!("{}:{}", self.as_str(), local_id)
    }
}

impl std::fmt::Display for NodeType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for NodeType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s).ok_or_else(|| Error::UnknownNodeType(s.to_string()))
    }
}

/// Split a composite node id into its type and local id
///
/// Returns `None` when the prefix is not a known node type. Only the first
/// `:` separates the parts, so local ids may themselves contain colons.
pub fn split_node_id(node_id: &str) -> Option<(NodeType, &str)> {
    let (prefix, local) = node_id.split_once(':')?;
    let node_type = match prefix {
        "Document" => NodeType::Document,
        "Concept" => NodeType::Concept,
        "Skill" => NodeType::Skill,
        "Issue" => NodeType::Issue,
        "PullRequest" => NodeType::PullRequest,
        _ => return None,
    };
    Some((node_type, local))
}

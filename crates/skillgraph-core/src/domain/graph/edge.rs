//! Graph edges
//!
//! An edge is identified by `(from_id, to_id, relationship)`. Direction is
//! significant for dependency traversal and ignored by one-hop neighbor
//! queries.

use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::Error;

use super::property::Properties;

/// A directed, typed relationship between two node ids
///
/// Either end may name a node that is not (yet) stored; events can arrive
/// out of order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Edge {
    /// Source node id
    pub from_id: String,
    /// Target node id
    pub to_id: String,
    /// Relationship type
    pub relationship: Relationship,
    /// Informational properties
    pub properties: Properties,
    /// When the edge was inserted
    pub created_at: DateTime<Utc>,
}

impl Edge {
    /// Whether the edge touches the given node in either direction
    pub fn touches(&self, node_id: &str) -> bool {
        self.from_id == node_id || self.to_id == node_id
    }

    /// The id at the opposite end from `node_id`
    ///
    /// For a self-loop this is the node itself. Returns `None` if the edge
    /// does not touch `node_id`.
    pub fn other_end(&self, node_id: &str) -> Option<&str> {
        if self.from_id == node_id {
            Some(&self.to_id)
        } else if self.to_id == node_id {
            Some(&self.from_id)
        } else {
            None
        }
    }
}

impl std::fmt::Display for Edge {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} --{}--> {}", self.from_id, self.relationship, self.to_id)
    }
}

/// Types of relationships between nodes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Relationship {
    /// Issue is about a concept or document
    About,
    /// Issue is fixed by a pull request
    FixedBy,
    /// Pull request modifies a document
    Modifies,
    /// Document generates a skill
    Generates,
    /// Document explains a concept
    Explains,
    /// Skill includes a document
    Includes,
}

impl Relationship {
    /// Get the string representation
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::About => "ABOUT",
            Self::FixedBy => "FIXED_BY",
            Self::Modifies => "MODIFIES",
            Self::Generates => "GENERATES",
            Self::Explains => "EXPLAINS",
            Self::Includes => "INCLUDES",
        }
    }

    /// Parse from string (case-insensitive, `-` accepted for `_`)
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_uppercase().replace('-', "_").as_str() {
            "ABOUT" => Some(Self::About),
            "FIXED_BY" | "FIXEDBY" => Some(Self::FixedBy),
            "MODIFIES" => Some(Self::Modifies),
            "GENERATES" => Some(Self::Generates),
            "EXPLAINS" => Some(Self::Explains),
            "INCLUDES" => Some(Self::Includes),
            _ => None,
        }
    }

    /// Get all relationship types
    pub fn all() -> &'static [Relationship] {
        &[
            Self::About,
            Self::FixedBy,
            Self::Modifies,
            Self::Generates,
            Self::Explains,
            Self::Includes,
        ]
    }
}

impl std::fmt::Display for Relationship {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for Relationship {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s).ok_or_else(|| Error::UnknownRelationship(s.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn edge(from: &str, to: &str) -> Edge {
        Edge {
            from_id: from.into(),
            to_id: to.into(),
            relationship: Relationship::About,
            properties: Properties::new(),
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_relationship_parsing() {
        assert_eq!(Relationship::parse("ABOUT"), Some(Relationship::About));
        assert_eq!(Relationship::parse("fixed_by"), Some(Relationship::FixedBy));
        assert_eq!(Relationship::parse("fixed-by"), Some(Relationship::FixedBy));
        assert_eq!(Relationship::parse("Includes"), Some(Relationship::Includes));
        assert_eq!(Relationship::parse("BLOCKS"), None);
    }

    #[test]
    fn test_relationship_round_trips_through_as_str() {
        for relationship in Relationship::all() {
            assert_eq!(Relationship::parse(relationship.as_str()), Some(*relationship));
        }
    }

    #[test]
    fn test_unknown_relationship_is_rejected() {
        let err = "DEPENDS_ON".parse::<Relationship>().unwrap_err();
        assert!(matches!(err, Error::UnknownRelationship(_)));
    }

    #[test]
    fn test_other_end() {
        let e = edge("Issue:1", "Concept:Flows");
        assert_eq!(e.other_end("Issue:1"), Some("Concept:Flows"));
        assert_eq!(e.other_end("Concept:Flows"), Some("Issue:1"));
        assert_eq!(e.other_end("Issue:2"), None);

        let self_loop = edge("Skill:a", "Skill:a");
        assert_eq!(self_loop.other_end("Skill:a"), Some("Skill:a"));
    }

    #[test]
    fn test_edge_serializes_export_shape() {
        let json = serde_json::to_value(edge("Issue:1", "Document:docs/a.md")).unwrap();
        assert_eq!(json["fromId"], "Issue:1");
        assert_eq!(json["toId"], "Document:docs/a.md");
        assert_eq!(json["relationship"], "ABOUT");
        assert!(json["properties"].is_object());
        assert!(json.get("createdAt").is_some());
    }

    #[test]
    fn test_edge_display() {
        let e = edge("Issue:42", "Concept:StorageAPI");
        assert_eq!(e.to_string(), "Issue:42 --ABOUT--> Concept:StorageAPI");
    }
}

//! Typed views over graph nodes
//!
//! The store keeps properties as an untyped bag. These views decode a
//! [`Node`] into the fields each node type is expected to carry, at the
//! boundary where callers need them (CLI output, exporters, correlator).

use std::path::Path;

use serde::Serialize;

use crate::error::{Error, Result};

use super::node::{Node, NodeType};

/// Lifecycle status of tracker entities
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TrackerStatus {
    Open,
    Closed,
    Merged,
}

impl TrackerStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Open => "open",
            Self::Closed => "closed",
            Self::Merged => "merged",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "open" => Some(Self::Open),
            "closed" => Some(Self::Closed),
            "merged" => Some(Self::Merged),
            _ => None,
        }
    }
}

impl std::fmt::Display for TrackerStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct IssueView {
    pub id: String,
    pub number: Option<i64>,
    pub title: String,
    pub body: String,
    pub status: Option<TrackerStatus>,
    pub labels: Vec<String>,
    pub url: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PullRequestView {
    pub id: String,
    pub number: Option<i64>,
    pub title: String,
    pub body: String,
    pub status: Option<TrackerStatus>,
    pub url: Option<String>,
    pub additions: i64,
    pub deletions: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DocumentView {
    pub id: String,
    pub path: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ConceptView {
    pub id: String,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SkillView {
    pub id: String,
    pub name: String,
    pub path: Option<String>,
}

/// A node decoded according to its type
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type")]
pub enum NodeView {
    Document(DocumentView),
    Concept(ConceptView),
    Skill(SkillView),
    Issue(IssueView),
    PullRequest(PullRequestView),
}

impl NodeView {
    /// Decode a node into its typed view
    pub fn from_node(node: &Node) -> Self {
        match node.node_type {
            NodeType::Document => Self::Document(DocumentView::decode(node)),
            NodeType::Concept => Self::Concept(ConceptView::decode(node)),
            NodeType::Skill => Self::Skill(SkillView::decode(node)),
            NodeType::Issue => Self::Issue(IssueView::decode(node)),
            NodeType::PullRequest => Self::PullRequest(PullRequestView::decode(node)),
        }
    }

    /// Short display label for listings
    pub fn label(&self) -> String {
        match self {
            Self::Document(doc) => Path::new(&doc.path)
                .file_stem()
                .map(|stem| stem.to_string_lossy().into_owned())
                .unwrap_or_else(|| doc.path.clone()),
            Self::Issue(issue) => match issue.number {
                Some(n) => format!("Issue #{}", n),
                None => format!("Issue {}", issue.id),
            },
            Self::PullRequest(pr) => match pr.number {
                Some(n) => format!("PR #{}", n),
                None => format!("PR {}", pr.id),
            },
            Self::Concept(concept) => concept.name.clone(),
            Self::Skill(skill) => skill.name.clone(),
        }
    }
}

fn expect_type(node: &Node, expected: NodeType) -> Result<()> {
    if node.node_type == expected {
        Ok(())
    } else {
        Err(Error::MalformedInput(format!(
            "node '{}' is a {}, not a {}",
            node.id, node.node_type, expected
        )))
    }
}

fn string_or_empty(node: &Node, key: &str) -> String {
    node.str_property(key).unwrap_or_default().to_string()
}

fn status_of(node: &Node) -> Option<TrackerStatus> {
    node.status().and_then(TrackerStatus::parse)
}

impl IssueView {
    /// Decode an `Issue` node
    pub fn from_node(node: &Node) -> Result<Self> {
        expect_type(node, NodeType::Issue)?;
        Ok(Self::decode(node))
    }

    fn decode(node: &Node) -> Self {
        Self {
            id: node.id.clone(),
            number: node
                .property("number")
                .and_then(|v| v.as_i64())
                .or_else(|| node.local_id().parse().ok()),
            title: string_or_empty(node, "title"),
            body: string_or_empty(node, "body"),
            status: status_of(node),
            labels: node
                .property("labels")
                .and_then(|v| v.as_list())
                .map(<[String]>::to_vec)
                .unwrap_or_default(),
            url: node.str_property("url").map(String::from),
        }
    }
}

impl PullRequestView {
    /// Decode a `PullRequest` node
    pub fn from_node(node: &Node) -> Result<Self> {
        expect_type(node, NodeType::PullRequest)?;
        Ok(Self::decode(node))
    }

    fn decode(node: &Node) -> Self {
        Self {
            id: node.id.clone(),
            number: node
                .property("number")
                .and_then(|v| v.as_i64())
                .or_else(|| node.local_id().parse().ok()),
            title: string_or_empty(node, "title"),
            body: string_or_empty(node, "body"),
            status: status_of(node),
            url: node.str_property("url").map(String::from),
            additions: node.property("additions").and_then(|v| v.as_i64()).unwrap_or(0),
            deletions: node.property("deletions").and_then(|v| v.as_i64()).unwrap_or(0),
        }
    }
}

impl DocumentView {
    /// Decode a `Document` node; the path falls back to the local id
    pub fn from_node(node: &Node) -> Result<Self> {
        expect_type(node, NodeType::Document)?;
        Ok(Self::decode(node))
    }

    fn decode(node: &Node) -> Self {
        Self {
            id: node.id.clone(),
            path: node
                .str_property("path")
                .unwrap_or(node.local_id())
                .to_string(),
        }
    }
}

impl ConceptView {
    pub fn from_node(node: &Node) -> Result<Self> {
        expect_type(node, NodeType::Concept)?;
        Ok(Self::decode(node))
    }

    fn decode(node: &Node) -> Self {
        Self {
            id: node.id.clone(),
            name: node
                .str_property("name")
                .unwrap_or(node.local_id())
                .to_string(),
        }
    }
}

impl SkillView {
    pub fn from_node(node: &Node) -> Result<Self> {
        expect_type(node, NodeType::Skill)?;
        Ok(Self::decode(node))
    }

    fn decode(node: &Node) -> Self {
        Self {
            id: node.id.clone(),
            name: node
                .str_property("name")
                .unwrap_or(node.local_id())
                .to_string(),
            path: node.str_property("path").map(String::from),
        }
    }
}

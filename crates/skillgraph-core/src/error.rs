//! Error types for Skillgraph

use thiserror::Error;

/// Result type alias using Skillgraph's Error
pub type Result<T> = std::result::Result<T, Error>;

/// Skillgraph error types with helpful messages and suggestions
#[derive(Error, Debug)]
pub enum Error {
    // Graph errors (E001-E099)
    #[error("Node '{0}' not found. Was its creation event delivered first?")]
    NotFound(String),

    #[error("Unknown node type '{0}'. Expected one of: Document, Concept, Skill, Issue, PullRequest.")]
    UnknownNodeType(String),

    #[error(
        "Unknown relationship '{0}'. Expected one of: ABOUT, FIXED_BY, MODIFIES, GENERATES, EXPLAINS, INCLUDES."
    )]
    UnknownRelationship(String),

    // Input errors (E100-E199)
    #[error("Malformed input: {0}")]
    MalformedInput(String),

    // Database errors (E400-E499)
    #[error("Database error: {0}")]
    DatabaseError(#[from] sqlx::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    // Config errors (E600-E699)
    #[error("Configuration error: {0}")]
    ConfigError(String),

    // Generic errors
    #[error("{0}")]
    Other(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Get error code for this error type
    pub fn code(&self) -> &'static str {
        match self {
            Self::NotFound(_) => "E001",
            Self::UnknownNodeType(_) => "E002",
            Self::UnknownRelationship(_) => "E003",
            Self::MalformedInput(_) => "E100",
            Self::DatabaseError(_) => "E400",
            Self::SerializationError(_) => "E401",
            Self::ConfigError(_) => "E600",
            Self::Other(_) | Self::Io(_) => "E9999",
        }
    }

    /// Get suggestion for how to fix this error
    pub fn suggestion(&self) -> Option<String> {
        match self {
            Self::NotFound(id) => match id.split_once(':') {
                Some(("Issue", number)) => {
                    Some(format!("skillgraph issue created {} --data <file>", number))
                }
                Some(("PullRequest", number)) => {
                    Some(format!("skillgraph pr created {} --data <file>", number))
                }
                _ => None,
            },
            Self::ConfigError(_) => Some("skillgraph config list".to_string()),
            _ => None,
        }
    }

    /// Whether this error is the `NotFound` raised for an absent node
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_))
    }
}

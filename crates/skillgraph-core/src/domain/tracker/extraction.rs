//! Text extraction rules for tracker events
//!
//! Pulls three kinds of references out of free text:
//!
//! - concept mentions, by case-insensitive keyword lookup
//! - documentation paths, by regex
//! - issue numbers closed by a pull request (`fixes #12`, `Closes #3`)
//!
//! No match is never an error; the extractors just return nothing.

use std::collections::HashSet;
use std::sync::OnceLock;

use regex::{Regex, RegexBuilder};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Built-in pattern for documentation file references
pub const DEFAULT_DOCUMENT_PATTERN: &str = r"(?:docs|skills)/[\w/\-]+\.(?:md|py|yaml)";

/// Built-in pattern for issue-closing references; group 1 is the number
pub const DEFAULT_FIX_REFERENCE_PATTERN: &str = r"(?:fixes|closes|resolves)\s+#(\d+)";

/// Built-in keyword table, in matching order
const DEFAULT_CONCEPTS: &[(&str, &str)] = &[
    ("Storage API", "StorageAPI"),
    ("Jobs API", "JobsAPI"),
    ("Stack URL", "StackURL"),
    ("Project ID", "ProjectID"),
    ("Token", "Authentication"),
    ("Input Mapping", "InputMapping"),
    ("Output Mapping", "OutputMapping"),
    ("Custom Python", "CustomPython"),
    ("Streamlit", "Streamlit"),
    ("Flow", "Flows"),
];

/// One keyword-to-concept mapping
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConceptRule {
    /// Text to look for (case-insensitive substring)
    pub keyword: String,
    /// Concept name recorded when the keyword is present
    pub concept: String,
}

impl ConceptRule {
    pub fn new(keyword: impl Into<String>, concept: impl Into<String>) -> Self {
        Self {
            keyword: keyword.into(),
            concept: concept.into(),
        }
    }

    /// The built-in keyword table
    pub fn defaults() -> Vec<ConceptRule> {
        DEFAULT_CONCEPTS
            .iter()
            .map(|(keyword, concept)| Self::new(*keyword, *concept))
            .collect()
    }
}

fn default_document_regex() -> &'static Regex {
    static DOCUMENT_REGEX: OnceLock<Regex> = OnceLock::new();
    DOCUMENT_REGEX.get_or_init(|| Regex::new(DEFAULT_DOCUMENT_PATTERN).unwrap())
}

fn default_fix_reference_regex() -> &'static Regex {
    static FIX_REGEX: OnceLock<Regex> = OnceLock::new();
    FIX_REGEX.get_or_init(|| {
        RegexBuilder::new(DEFAULT_FIX_REFERENCE_PATTERN)
            .case_insensitive(true)
            .build()
            .unwrap()
    })
}

/// Compiled extraction tables
///
/// Built from configuration in production; tests substitute minimal sets.
#[derive(Debug, Clone)]
pub struct ExtractionRules {
    concepts: Vec<ConceptRule>,
    document_pattern: Regex,
    fix_reference_pattern: Regex,
}

impl Default for ExtractionRules {
    fn default() -> Self {
        Self {
            concepts: ConceptRule::defaults(),
            document_pattern: default_document_regex().clone(),
            fix_reference_pattern: default_fix_reference_regex().clone(),
        }
    }
}

impl ExtractionRules {
    /// Compile a rule set
    ///
    /// The document pattern is case-sensitive; the fix-reference pattern is
    /// matched case-insensitively and must capture the issue number in
    /// group 1.
    pub fn new(
        concepts: Vec<ConceptRule>,
        document_pattern: &str,
        fix_reference_pattern: &str,
    ) -> Result<Self> {
        let document_pattern = Regex::new(document_pattern).map_err(|e| {
            Error::ConfigError(format!("invalid document pattern '{}': {}", document_pattern, e))
        })?;

        let fix_reference_pattern = RegexBuilder::new(fix_reference_pattern)
            .case_insensitive(true)
            .build()
            .map_err(|e| {
                Error::ConfigError(format!(
                    "invalid fix reference pattern '{}': {}",
                    fix_reference_pattern, e
                ))
            })?;

        if fix_reference_pattern.captures_len() < 2 {
            return Err(Error::ConfigError(format!(
                "fix reference pattern '{}' must capture the issue number",
                fix_reference_pattern.as_str()
            )));
        }

        if let Some(rule) = concepts.iter().find(|r| r.keyword.trim().is_empty()) {
            return Err(Error::ConfigError(format!(
                "concept '{}' has an empty keyword",
                rule.concept
            )));
        }

        Ok(Self {
            concepts,
            document_pattern,
            fix_reference_pattern,
        })
    }

    /// Concept rules, in matching order
    pub fn concepts(&self) -> &[ConceptRule] {
        &self.concepts
    }

    /// Concept names whose keyword occurs in `text`
    ///
    /// Ordered by rule order; a concept reached by several keywords is
    /// reported once.
    pub fn extract_concepts(&self, text: &str) -> Vec<String> {
        let haystack = text.to_lowercase();
        let mut seen = HashSet::new();

        self.concepts
            .iter()
            .filter(|rule| haystack.contains(&rule.keyword.to_lowercase()))
            .filter(|rule| seen.insert(rule.concept.as_str()))
            .map(|rule| rule.concept.clone())
            .collect()
    }

    /// Documentation paths referenced in `text`, first occurrence order
    pub fn extract_document_paths(&self, text: &str) -> Vec<String> {
        let mut seen = HashSet::new();

        self.document_pattern
            .find_iter(text)
            .map(|m| m.as_str())
            .filter(|path| seen.insert(*path))
            .map(String::from)
            .collect()
    }

    /// Issue numbers named by closing keywords in `text`
    pub fn extract_fixed_issues(&self, text: &str) -> Vec<u64> {
        let mut seen = HashSet::new();

        self.fix_reference_pattern
            .captures_iter(text)
            .filter_map(|caps| caps.get(1))
            .filter_map(|m| m.as_str().parse::<u64>().ok())
            .filter(|number| seen.insert(*number))
            .collect()
    }
}

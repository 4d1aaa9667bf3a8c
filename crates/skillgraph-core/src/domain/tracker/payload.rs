//! Tracker event payloads
//!
//! Accepts both the camelCase field names used by our own fixtures and the
//! snake_case names the hosting provider's API returns (`created_at`,
//! `changed_files`). When both `url` and `html_url` are present the latter
//! is the one stored. Labels and changed files may be plain
//! strings or objects carrying `name` / `filename`.

use serde::{Deserialize, Serialize};

use crate::domain::graph::{Properties, PropertyValue, TrackerStatus};
use crate::error::{Error, Result};

/// A label as it appears in a payload
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum LabelRef {
    Name(String),
    Object { name: String },
}

impl LabelRef {
    pub fn name(&self) -> &str {
        match self {
            Self::Name(name) | Self::Object { name } => name,
        }
    }
}

/// A changed file as it appears in a pull request payload
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ChangedFile {
    Path(String),
    Object { filename: String },
}

impl ChangedFile {
    pub fn path(&self) -> &str {
        match self {
            Self::Path(path) | Self::Object { filename: path } => path,
        }
    }
}

/// The changed-files field of a pull request payload
///
/// The provider's pull request object reports only a count here; event
/// fixtures carry the file list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ChangedFiles {
    Count(u64),
    List(Vec<ChangedFile>),
}

impl ChangedFiles {
    pub fn files(&self) -> &[ChangedFile] {
        match self {
            Self::Count(_) => &[],
            Self::List(files) => files,
        }
    }
}

/// Issue creation payload
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IssuePayload {
    pub title: String,
    #[serde(default)]
    pub body: Option<String>,
    #[serde(default)]
    pub labels: Option<Vec<LabelRef>>,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default, rename = "html_url")]
    pub html_url: Option<String>,
    #[serde(default, alias = "created_at")]
    pub created_at: Option<String>,
}

impl IssuePayload {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            ..Default::default()
        }
    }

    pub fn with_body(mut self, body: impl Into<String>) -> Self {
        self.body = Some(body.into());
        self
    }

    pub fn with_labels<I, S>(mut self, labels: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.labels = Some(labels.into_iter().map(|l| LabelRef::Name(l.into())).collect());
        self
    }

    pub fn with_url(mut self, url: impl Into<String>) -> Self {
        self.url = Some(url.into());
        self
    }

    pub fn with_created_at(mut self, created_at: impl Into<String>) -> Self {
        self.created_at = Some(created_at.into());
        self
    }

    /// Parse a payload document
    pub fn from_json(json: &str) -> Result<Self> {
        let payload: Self = serde_json::from_str(json)
            .map_err(|e| Error::MalformedInput(format!("invalid issue payload: {}", e)))?;
        payload.validate()?;
        Ok(payload)
    }

    /// Decode an already-parsed payload document
    pub fn from_value(value: serde_json::Value) -> Result<Self> {
        let payload: Self = serde_json::from_value(value)
            .map_err(|e| Error::MalformedInput(format!("invalid issue payload: {}", e)))?;
        payload.validate()?;
        Ok(payload)
    }

    /// Reject payloads that cannot produce a meaningful node
    pub fn validate(&self) -> Result<()> {
        validate_title("issue", &self.title)
    }

    pub fn body(&self) -> &str {
        self.body.as_deref().unwrap_or_default()
    }

    /// Browser link, preferring `html_url` over `url`
    pub fn web_url(&self) -> Option<String> {
        self.html_url.clone().or_else(|| self.url.clone())
    }

    pub fn label_names(&self) -> Vec<String> {
        self.labels
            .iter()
            .flatten()
            .map(|label| label.name().to_string())
            .collect()
    }

    /// Text scanned for concept and document references
    pub fn searchable_text(&self) -> String {
        format!("{} {}", self.title, self.body())
    }

    /// Property bag for the `Issue:<number>` node
    pub fn to_properties(&self, number: u64) -> Result<Properties> {
        let mut properties = tracker_properties(number, &self.title, self.body())?;
        properties.insert("labels".into(), PropertyValue::List(self.label_names()));
        insert_optional(&mut properties, "url", &self.web_url());
        insert_optional(&mut properties, "createdAt", &self.created_at);
        Ok(properties)
    }
}

/// Pull request creation payload
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PullRequestPayload {
    pub title: String,
    #[serde(default)]
    pub body: Option<String>,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default, rename = "html_url")]
    pub html_url: Option<String>,
    #[serde(default, alias = "created_at")]
    pub created_at: Option<String>,
    #[serde(default)]
    pub additions: Option<u64>,
    #[serde(default)]
    pub deletions: Option<u64>,
    #[serde(default, alias = "changed_files")]
    pub changed_files: Option<ChangedFiles>,
}

impl PullRequestPayload {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            ..Default::default()
        }
    }

    pub fn with_body(mut self, body: impl Into<String>) -> Self {
        self.body = Some(body.into());
        self
    }

    pub fn with_url(mut self, url: impl Into<String>) -> Self {
        self.url = Some(url.into());
        self
    }

    pub fn with_diff_stats(mut self, additions: u64, deletions: u64) -> Self {
        self.additions = Some(additions);
        self.deletions = Some(deletions);
        self
    }

    pub fn with_changed_files<I, S>(mut self, files: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.changed_files = Some(ChangedFiles::List(
            files.into_iter().map(|f| ChangedFile::Path(f.into())).collect(),
        ));
        self
    }

    /// Parse a payload document
    pub fn from_json(json: &str) -> Result<Self> {
        let payload: Self = serde_json::from_str(json)
            .map_err(|e| Error::MalformedInput(format!("invalid pull request payload: {}", e)))?;
        payload.validate()?;
        Ok(payload)
    }

    /// Decode an already-parsed payload document
    pub fn from_value(value: serde_json::Value) -> Result<Self> {
        let payload: Self = serde_json::from_value(value)
            .map_err(|e| Error::MalformedInput(format!("invalid pull request payload: {}", e)))?;
        payload.validate()?;
        Ok(payload)
    }

    pub fn validate(&self) -> Result<()> {
        validate_title("pull request", &self.title)?;

        if let Some(file) = self
            .changed_file_list()
            .iter()
            .find(|file| file.path().is_empty())
        {
            return Err(Error::MalformedInput(format!(
                "pull request changed file has an empty path: {:?}",
                file
            )));
        }
        Ok(())
    }

    pub fn body(&self) -> &str {
        self.body.as_deref().unwrap_or_default()
    }

    /// Browser link, preferring `html_url` over `url`
    pub fn web_url(&self) -> Option<String> {
        self.html_url.clone().or_else(|| self.url.clone())
    }

    /// Paths of changed files, in payload order (empty when not supplied)
    pub fn changed_paths(&self) -> Vec<&str> {
        self.changed_file_list()
            .iter()
            .map(ChangedFile::path)
            .collect()
    }

    fn changed_file_list(&self) -> &[ChangedFile] {
        self.changed_files
            .as_ref()
            .map(ChangedFiles::files)
            .unwrap_or_default()
    }

    /// Text scanned for closing references
    pub fn searchable_text(&self) -> String {
        format!("{} {}", self.title, self.body())
    }

    /// Property bag for the `PullRequest:<number>` node
    pub fn to_properties(&self, number: u64) -> Result<Properties> {
        let mut properties = tracker_properties(number, &self.title, self.body())?;
        insert_optional(&mut properties, "url", &self.web_url());
        insert_optional(&mut properties, "createdAt", &self.created_at);
        properties.insert("additions".into(), count_value("additions", self.additions)?);
        properties.insert("deletions".into(), count_value("deletions", self.deletions)?);
        Ok(properties)
    }
}

fn validate_title(kind: &str, title: &str) -> Result<()> {
    if title.trim().is_empty() {
        return Err(Error::MalformedInput(format!("{} title must not be empty", kind)));
    }
    Ok(())
}

fn integer(field: &str, value: u64) -> Result<PropertyValue> {
    i64::try_from(value)
        .map(PropertyValue::Integer)
        .map_err(|_| Error::MalformedInput(format!("{} {} is out of range", field, value)))
}

fn count_value(field: &str, value: Option<u64>) -> Result<PropertyValue> {
    integer(field, value.unwrap_or(0))
}

fn tracker_properties(number: u64, title: &str, body: &str) -> Result<Properties> {
    Ok(Properties::from([
        ("number".to_string(), integer("number", number)?),
        ("title".to_string(), PropertyValue::from(title)),
        ("body".to_string(), PropertyValue::from(body)),
        (
            "status".to_string(),
            PropertyValue::from(TrackerStatus::Open.as_str()),
        ),
    ]))
}

fn insert_optional(properties: &mut Properties, key: &str, value: &Option<String>) {
    if let Some(value) = value {
        properties.insert(key.to_string(), PropertyValue::from(value.as_str()));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_issue_payload_accepts_provider_shape() {
        let payload = IssuePayload::from_value(json!({
            "title": "Storage API token error",
            "body": null,
            "labels": [{"name": "bug"}, "docs"],
            "url": "https://api.example.com/repos/o/r/issues/42",
            "html_url": "https://example.com/issues/42",
            "created_at": "2024-05-01T10:00:00Z"
        }))
        .unwrap();

        assert_eq!(payload.body(), "");
        assert_eq!(payload.label_names(), vec!["bug", "docs"]);
        assert_eq!(
            payload.web_url().as_deref(),
            Some("https://example.com/issues/42")
        );

        let props = payload.to_properties(42).unwrap();
        assert_eq!(props["number"].as_i64(), Some(42));
        assert_eq!(props["status"].as_str(), Some("open"));
        assert_eq!(props["url"].as_str(), Some("https://example.com/issues/42"));
        assert_eq!(props["createdAt"].as_str(), Some("2024-05-01T10:00:00Z"));
        assert_eq!(props["labels"].as_list().map(|l| l.len()), Some(2));
    }

    #[test]
    fn test_issue_payload_requires_title() {
        let err = IssuePayload::from_json(r#"{"body": "no title"}"#).unwrap_err();
        assert!(matches!(err, Error::MalformedInput(_)));

        let err = IssuePayload::from_json(r#"{"title": "   "}"#).unwrap_err();
        assert!(matches!(err, Error::MalformedInput(_)));
    }

    #[test]
    fn test_issue_optional_fields_omitted_from_properties() {
        let props = IssuePayload::new("Flow fails").to_properties(1).unwrap();

        assert!(!props.contains_key("url"));
        assert!(!props.contains_key("createdAt"));
        assert_eq!(props["body"].as_str(), Some(""));
        assert_eq!(props["labels"].as_list(), Some(&[][..]));
    }

    #[test]
    fn test_issue_builder_properties() {
        let props = IssuePayload::new("Flow fails")
            .with_url("https://example.com/issues/3")
            .with_created_at("2024-05-01T10:00:00Z")
            .with_labels(["bug"])
            .to_properties(3)
            .unwrap();

        assert_eq!(props["url"].as_str(), Some("https://example.com/issues/3"));
        assert_eq!(props["createdAt"].as_str(), Some("2024-05-01T10:00:00Z"));
        assert_eq!(props["labels"].as_list(), Some(&["bug".to_string()][..]));
    }

    #[test]
    fn test_pull_request_payload_changed_files() {
        let payload = PullRequestPayload::from_value(json!({
            "title": "Fix auth docs",
            "body": "Fixes #42",
            "additions": 10,
            "changed_files": [{"filename": "docs/keboola/auth.md"}, "skills/a/SKILL.md"]
        }))
        .unwrap();

        assert_eq!(
            payload.changed_paths(),
            vec!["docs/keboola/auth.md", "skills/a/SKILL.md"]
        );

        let props = payload.to_properties(7).unwrap();
        assert_eq!(props["additions"].as_i64(), Some(10));
        assert_eq!(props["deletions"].as_i64(), Some(0));
        assert_eq!(props["number"].as_i64(), Some(7));
    }

    #[test]
    fn test_pull_request_camel_case_fields() {
        let payload = PullRequestPayload::from_json(
            r#"{"title": "T", "changedFiles": ["docs/a.md"], "createdAt": "2024-01-01T00:00:00Z"}"#,
        )
        .unwrap();
        assert_eq!(payload.changed_paths(), vec!["docs/a.md"]);
        assert_eq!(payload.created_at.as_deref(), Some("2024-01-01T00:00:00Z"));
    }

    #[test]
    fn test_pull_request_changed_file_count_is_not_a_list() {
        let payload =
            PullRequestPayload::from_json(r#"{"title": "T", "changed_files": 3}"#).unwrap();
        assert!(payload.changed_paths().is_empty());
    }

    #[test]
    fn test_pull_request_rejects_wrong_types() {
        let err = PullRequestPayload::from_json(r#"{"title": "T", "additions": "many"}"#)
            .unwrap_err();
        assert!(matches!(err, Error::MalformedInput(_)));

        let err = PullRequestPayload::from_json(r#"{"title": "T", "changedFiles": [""]}"#)
            .unwrap_err();
        assert!(matches!(err, Error::MalformedInput(_)));
    }

    #[test]
    fn test_searchable_text() {
        let payload = PullRequestPayload::new("Title").with_body("Closes #3");
        assert_eq!(payload.searchable_text(), "Title Closes #3");
    }
}

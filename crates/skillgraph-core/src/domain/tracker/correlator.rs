//! Tracker event correlator
//!
//! Translates issue and pull request lifecycle events into graph mutations:
//!
//! - issue created: `Issue` node, `ABOUT` edges to mentioned concepts and documents
//! - issue closed: `status = closed`
//! - pull request created: `PullRequest` node, `FIXED_BY` edges from referenced
//!   issues, `MODIFIES` edges to changed documents
//! - pull request merged: `status = merged`, linked issues closed, skills that
//!   depend on modified documents reported
//!
//! Lifecycle: Issue `absent -> open -> closed`, PullRequest
//! `absent -> open -> merged`. A transition on an absent entity fails with
//! `NotFound`; nothing is created implicitly. A pull request closed without
//! merging has no transition and stays `open`.

use std::collections::BTreeSet;
use std::sync::Arc;

use serde::Serialize;
use tracing::{debug, info, warn};

use crate::domain::graph::{
    GraphEvent, GraphRepository, GraphTraversal, NodeType, Properties, PropertyValue,
    Relationship, TrackerStatus, DEFAULT_MAX_DEPTH,
};
use crate::error::Result;

use super::extraction::ExtractionRules;
use super::payload::{ChangedFiles, IssuePayload, PullRequestPayload};

/// What a single correlator call did
#[derive(Debug, Clone, Default, Serialize)]
pub struct CorrelationOutcome {
    /// Id of the issue or pull request the event was about
    pub entity_id: String,
    /// Every mutation, in the order it was applied
    pub events: Vec<GraphEvent>,
    /// Issues closed as a side effect of a merge
    pub closed_issues: Vec<String>,
    /// Skills reachable from documents a merged pull request modified (sorted)
    pub affected_skills: Vec<String>,
}

impl CorrelationOutcome {
    fn new(entity_id: impl Into<String>) -> Self {
        Self {
            entity_id: entity_id.into(),
            ..Default::default()
        }
    }

    /// Number of edges that did not exist before this call
    pub fn edges_created(&self) -> usize {
        self.events
            .iter()
            .filter(|e| matches!(e, GraphEvent::EdgeInserted { created: true, .. }))
            .count()
    }
}

/// Event correlator over a graph repository
pub struct EventCorrelator<R: GraphRepository + ?Sized> {
    repository: Arc<R>,
    traversal: GraphTraversal<R>,
    rules: ExtractionRules,
    impact_depth: u32,
}

impl<R: GraphRepository + ?Sized> EventCorrelator<R> {
    /// Create a correlator with the built-in extraction rules
    pub fn new(repository: Arc<R>) -> Self {
        Self {
            traversal: GraphTraversal::new(Arc::clone(&repository)),
            repository,
            rules: ExtractionRules::default(),
            impact_depth: DEFAULT_MAX_DEPTH,
        }
    }

    /// Replace the extraction rules
    pub fn with_rules(mut self, rules: ExtractionRules) -> Self {
        self.rules = rules;
        self
    }

    /// Set the hop bound used when looking for affected skills
    pub fn with_impact_depth(mut self, depth: u32) -> Self {
        self.impact_depth = depth;
        self
    }

    pub fn rules(&self) -> &ExtractionRules {
        &self.rules
    }

    // ========== Issues ==========

    /// Record a newly opened issue and link it to what it mentions
    pub async fn on_issue_created(
        &self,
        number: u64,
        payload: &IssuePayload,
    ) -> Result<CorrelationOutcome> {
        payload.validate()?;
        let properties = payload.to_properties(number)?;

        let issue_id = self
            .repository
            .upsert_node(NodeType::Issue, &number.to_string(), properties)
            .await?;

        let mut outcome = CorrelationOutcome::new(&issue_id);
        outcome
            .events
            .push(GraphEvent::node_upserted(&issue_id, NodeType::Issue));

        let text = payload.searchable_text();

        for concept in self.rules.extract_concepts(&text) {
            let concept_id = self
                .repository
                .upsert_node(NodeType::Concept, &concept, named("name", &concept))
                .await?;
            outcome
                .events
                .push(GraphEvent::node_upserted(&concept_id, NodeType::Concept));
            self.link(&mut outcome, &issue_id, &concept_id, Relationship::About)
                .await?;
        }

        for path in self.rules.extract_document_paths(&text) {
            let document_id = self.upsert_document(&mut outcome, &path).await?;
            self.link(&mut outcome, &issue_id, &document_id, Relationship::About)
                .await?;
        }

        info!(
            issue_id = %issue_id,
            title = %payload.title,
            edges_created = outcome.edges_created(),
            "Issue tracked"
        );
        Ok(outcome)
    }

    /// Mark an issue closed
    pub async fn on_issue_closed(&self, number: u64) -> Result<CorrelationOutcome> {
        let issue_id = NodeType::Issue.node_id(&number.to_string());
        let mut outcome = CorrelationOutcome::new(&issue_id);

        self.close_issue(&mut outcome, &issue_id).await?;

        info!(issue_id = %issue_id, "Issue closed");
        Ok(outcome)
    }

    // ========== Pull requests ==========

    /// Record a newly opened pull request with its fix references and changed files
    pub async fn on_pr_created(
        &self,
        number: u64,
        payload: &PullRequestPayload,
    ) -> Result<CorrelationOutcome> {
        payload.validate()?;
        let properties = payload.to_properties(number)?;

        let pr_id = self
            .repository
            .upsert_node(NodeType::PullRequest, &number.to_string(), properties)
            .await?;

        let mut outcome = CorrelationOutcome::new(&pr_id);
        outcome
            .events
            .push(GraphEvent::node_upserted(&pr_id, NodeType::PullRequest));

        for issue_number in self.rules.extract_fixed_issues(&payload.searchable_text()) {
            let issue_id = NodeType::Issue.node_id(&issue_number.to_string());
            self.link(&mut outcome, &issue_id, &pr_id, Relationship::FixedBy)
                .await?;
        }

        if let Some(ChangedFiles::Count(count)) = payload.changed_files {
            warn!(
                pr_id = %pr_id,
                changed_files = count,
                "Payload carries only a changed-file count; no MODIFIES edges recorded"
            );
        }

        for path in payload.changed_paths() {
            let document_id = self.upsert_document(&mut outcome, path).await?;
            self.link(&mut outcome, &pr_id, &document_id, Relationship::Modifies)
                .await?;
        }

        info!(
            pr_id = %pr_id,
            title = %payload.title,
            edges_created = outcome.edges_created(),
            "Pull request tracked"
        );
        Ok(outcome)
    }

    /// Mark a pull request merged, close the issues it fixes and report affected skills
    pub async fn on_pr_merged(&self, number: u64) -> Result<CorrelationOutcome> {
        let pr_id = NodeType::PullRequest.node_id(&number.to_string());
        let mut outcome = CorrelationOutcome::new(&pr_id);

        let changed = status_update(TrackerStatus::Merged);
        let keys: Vec<String> = changed.keys().cloned().collect();
        self.repository.merge_update_node(&pr_id, changed).await?;
        outcome.events.push(GraphEvent::node_updated(&pr_id, keys));

        let fixed = self
            .traversal
            .find_related(&pr_id, Some(Relationship::FixedBy))
            .await?;
        for issue in fixed.iter().filter(|n| n.node_type == NodeType::Issue) {
            self.close_issue(&mut outcome, &issue.id).await?;
            outcome.closed_issues.push(issue.id.clone());
        }

        let modified = self
            .traversal
            .find_related(&pr_id, Some(Relationship::Modifies))
            .await?;

        let mut affected = BTreeSet::new();
        for document in &modified {
            let skills: BTreeSet<String> = self
                .traversal
                .find_dependents(&document.id, self.impact_depth)
                .await?
                .into_iter()
                .filter(|id| id.starts_with("Skill:"))
                .collect();

            if !skills.is_empty() {
                debug!(document_id = %document.id, skills = skills.len(), "Document has dependent skills");
                outcome.events.push(GraphEvent::impact_detected(
                    &document.id,
                    skills.iter().cloned().collect(),
                ));
                affected.extend(skills);
            }
        }
        outcome.affected_skills = affected.into_iter().collect();

        info!(
            pr_id = %pr_id,
            closed_issues = outcome.closed_issues.len(),
            modified_documents = modified.len(),
            affected_skills = outcome.affected_skills.len(),
            "Pull request merged"
        );
        Ok(outcome)
    }

    // ========== Helpers ==========

    async fn close_issue(&self, outcome: &mut CorrelationOutcome, issue_id: &str) -> Result<()> {
        let changed = status_update(TrackerStatus::Closed);
        let keys: Vec<String> = changed.keys().cloned().collect();
        self.repository.merge_update_node(issue_id, changed).await?;
        outcome.events.push(GraphEvent::node_updated(issue_id, keys));
        Ok(())
    }

    async fn upsert_document(&self, outcome: &mut CorrelationOutcome, path: &str) -> Result<String> {
        let document_id = self
            .repository
            .upsert_node(NodeType::Document, path, named("path", path))
            .await?;
        outcome
            .events
            .push(GraphEvent::node_upserted(&document_id, NodeType::Document));
        Ok(document_id)
    }

    async fn link(
        &self,
        outcome: &mut CorrelationOutcome,
        from_id: &str,
        to_id: &str,
        relationship: Relationship,
    ) -> Result<()> {
        let created = self
            .repository
            .insert_edge(from_id, to_id, relationship, Properties::new())
            .await?;
        outcome
            .events
            .push(GraphEvent::edge_inserted(from_id, to_id, relationship, created));
        Ok(())
    }
}

fn named(key: &str, value: &str) -> Properties {
    Properties::from([(key.to_string(), PropertyValue::from(value))])
}

fn status_update(status: TrackerStatus) -> Properties {
    named("status", status.as_str())
}

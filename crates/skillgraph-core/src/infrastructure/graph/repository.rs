//! SQLite implementation of the GraphRepository
//!
//! Properties are stored as one JSON document per row. Timestamps are
//! RFC 3339 UTC strings with microsecond precision, so lexical order in SQL
//! matches chronological order.

use async_trait::async_trait;
use chrono::{DateTime, SecondsFormat, Utc};
use sqlx::{FromRow, SqlitePool};
use tracing::{debug, info};

use crate::domain::graph::{
    merge_properties, Edge, GraphRepository, GraphStats, Node, NodeType, Properties, Relationship,
};
use crate::error::{Error, Result};

/// SQLite implementation of the graph repository
#[derive(Clone)]
pub struct SqliteGraphRepository {
    pool: SqlitePool,
}

impl SqliteGraphRepository {
    /// Create a new SQLite graph repository
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

fn timestamp(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Micros, true)
}

#[async_trait]
impl GraphRepository for SqliteGraphRepository {
    // ========== Node Operations ==========

    async fn upsert_node(
        &self,
        node_type: NodeType,
        local_id: &str,
        properties: Properties,
    ) -> Result<String> {
        if local_id.is_empty() {
            return Err(Error::MalformedInput(format!(
                "{} node requires a non-empty local id",
                node_type
            )));
        }

        let node_id = node_type.node_id(local_id);
        let properties_json = serde_json::to_string(&properties)?;
        let now = timestamp(Utc::now());

        sqlx::query(
            r#"
            INSERT INTO graph_nodes (id, node_type, properties, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?)
            ON CONFLICT(id) DO UPDATE SET
                node_type = excluded.node_type,
                properties = excluded.properties,
                updated_at = excluded.updated_at
            "#,
        )
        .bind(&node_id)
        .bind(node_type.as_str())
        .bind(&properties_json)
        .bind(&now)
        .bind(&now)
        .execute(&self.pool)
        .await?;

        debug!(node_id = %node_id, node_type = %node_type, "Node upserted");
        Ok(node_id)
    }

    async fn get_node(&self, node_id: &str) -> Result<Option<Node>> {
        let row: Option<NodeRow> = sqlx::query_as("SELECT * FROM graph_nodes WHERE id = ?")
            .bind(node_id)
            .fetch_optional(&self.pool)
            .await?;

        row.map(|r| r.into_node()).transpose()
    }

    async fn merge_update_node(&self, node_id: &str, partial: Properties) -> Result<Node> {
        let mut tx = self.pool.begin().await?;

        let row: Option<NodeRow> = sqlx::query_as("SELECT * FROM graph_nodes WHERE id = ?")
            .bind(node_id)
            .fetch_optional(&mut *tx)
            .await?;

        let Some(row) = row else {
            return Err(Error::NotFound(node_id.to_string()));
        };

        let mut node = row.into_node()?;
        let changed = merge_properties(&mut node.properties, partial);
        node.updated_at = Utc::now();

        sqlx::query("UPDATE graph_nodes SET properties = ?, updated_at = ? WHERE id = ?")
            .bind(serde_json::to_string(&node.properties)?)
            .bind(timestamp(node.updated_at))
            .bind(node_id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;

        info!(node_id = %node_id, changed = ?changed, "Node updated");
        Ok(node)
    }

    async fn list_nodes_by_type(&self, node_type: NodeType) -> Result<Vec<Node>> {
        let rows: Vec<NodeRow> = sqlx::query_as(
            "SELECT * FROM graph_nodes WHERE node_type = ? ORDER BY created_at DESC, rowid DESC",
        )
        .bind(node_type.as_str())
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(|r| r.into_node()).collect()
    }

    async fn list_nodes(&self) -> Result<Vec<Node>> {
        let rows: Vec<NodeRow> =
            sqlx::query_as("SELECT * FROM graph_nodes ORDER BY created_at, rowid")
                .fetch_all(&self.pool)
                .await?;

        rows.into_iter().map(|r| r.into_node()).collect()
    }

    // ========== Edge Operations ==========

    async fn insert_edge(
        &self,
        from_id: &str,
        to_id: &str,
        relationship: Relationship,
        properties: Properties,
    ) -> Result<bool> {
        let result = sqlx::query(
            r#"
            INSERT INTO graph_edges (from_id, to_id, relationship, properties, created_at)
            VALUES (?, ?, ?, ?, ?)
            ON CONFLICT(from_id, to_id, relationship) DO NOTHING
            "#,
        )
        .bind(from_id)
        .bind(to_id)
        .bind(relationship.as_str())
        .bind(serde_json::to_string(&properties)?)
        .bind(timestamp(Utc::now()))
        .execute(&self.pool)
        .await?;

        let created = result.rows_affected() == 1;
        debug!(
            from_id = %from_id,
            to_id = %to_id,
            relationship = %relationship,
            created,
            "Edge inserted"
        );
        Ok(created)
    }

    async fn list_edges(&self) -> Result<Vec<Edge>> {
        let rows: Vec<EdgeRow> = sqlx::query_as("SELECT * FROM graph_edges ORDER BY id")
            .fetch_all(&self.pool)
            .await?;

        rows.into_iter().map(|r| r.into_edge()).collect()
    }

    async fn list_edges_for_node(
        &self,
        node_id: &str,
        relationship: Option<Relationship>,
    ) -> Result<Vec<Edge>> {
        let relationship = relationship.map(|r| r.as_str());

        let rows: Vec<EdgeRow> = sqlx::query_as(
            r#"
            SELECT * FROM graph_edges
            WHERE (from_id = ? OR to_id = ?)
              AND (? IS NULL OR relationship = ?)
            ORDER BY id
            "#,
        )
        .bind(node_id)
        .bind(node_id)
        .bind(relationship)
        .bind(relationship)
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(|r| r.into_edge()).collect()
    }

    async fn list_outgoing_edges(&self, node_id: &str) -> Result<Vec<Edge>> {
        let rows: Vec<EdgeRow> =
            sqlx::query_as("SELECT * FROM graph_edges WHERE from_id = ? ORDER BY id")
                .bind(node_id)
                .fetch_all(&self.pool)
                .await?;

        rows.into_iter().map(|r| r.into_edge()).collect()
    }

    // ========== Statistics ==========

    async fn get_stats(&self) -> Result<GraphStats> {
        let mut tx = self.pool.begin().await?;

        let (total_nodes,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM graph_nodes")
            .fetch_one(&mut *tx)
            .await?;

        let (total_edges,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM graph_edges")
            .fetch_one(&mut *tx)
            .await?;

        let nodes_by_type: Vec<(String, i64)> =
            sqlx::query_as("SELECT node_type, COUNT(*) FROM graph_nodes GROUP BY node_type")
                .fetch_all(&mut *tx)
                .await?;

        tx.commit().await?;

        Ok(GraphStats {
            total_nodes: total_nodes as u64,
            total_edges: total_edges as u64,
            nodes_by_type: nodes_by_type
                .into_iter()
                .filter_map(|(t, c)| NodeType::parse(&t).map(|nt| (nt, c as u64)))
                .collect(),
        })
    }
}

// ========== Database Row Types ==========

fn parse_timestamp(value: &str) -> Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(value)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| Error::Other(format!("Invalid stored timestamp '{}': {}", value, e)))
}

#[derive(Debug, FromRow)]
struct NodeRow {
    id: String,
    node_type: String,
    properties: String,
    created_at: String,
    updated_at: String,
}

impl NodeRow {
    fn into_node(self) -> Result<Node> {
        let node_type = NodeType::parse(&self.node_type)
            .ok_or_else(|| Error::UnknownNodeType(self.node_type.clone()))?;

        Ok(Node {
            properties: serde_json::from_str(&self.properties)?,
            created_at: parse_timestamp(&self.created_at)?,
            updated_at: parse_timestamp(&self.updated_at)?,
            id: self.id,
            node_type,
        })
    }
}

#[derive(Debug, FromRow)]
struct EdgeRow {
    #[allow(dead_code)]
    id: i64,
    from_id: String,
    to_id: String,
    relationship: String,
    properties: String,
    created_at: String,
}

impl EdgeRow {
    fn into_edge(self) -> Result<Edge> {
        let relationship = Relationship::parse(&self.relationship)
            .ok_or_else(|| Error::UnknownRelationship(self.relationship.clone()))?;

        Ok(Edge {
            properties: serde_json::from_str(&self.properties)?,
            created_at: parse_timestamp(&self.created_at)?,
            from_id: self.from_id,
            to_id: self.to_id,
            relationship,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::graph::PropertyValue;
    use crate::storage::migrations::run_migrations;
    use sqlx::sqlite::SqlitePoolOptions;

    async fn setup_test_db() -> SqliteGraphRepository {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await
            .expect("Failed to create test pool");

        run_migrations(&pool)
            .await
            .expect("Failed to run migrations");

        SqliteGraphRepository::new(pool)
    }

    fn props(pairs: &[(&str, &str)]) -> Properties {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), PropertyValue::from(*v)))
            .collect()
    }

    #[tokio::test]
    async fn test_upsert_and_get_node() {
        let repo = setup_test_db().await;

        let id = repo
            .upsert_node(NodeType::Concept, "StorageAPI", props(&[("name", "StorageAPI")]))
            .await
            .unwrap();
        assert_eq!(id, "Concept:StorageAPI");

        let node = repo.get_node(&id).await.unwrap().unwrap();
        assert_eq!(node.node_type, NodeType::Concept);
        assert_eq!(node.str_property("name"), Some("StorageAPI"));
        assert_eq!(node.local_id(), "StorageAPI");
    }

    #[tokio::test]
    async fn test_get_missing_node_is_none() {
        let repo = setup_test_db().await;
        assert!(repo.get_node("Issue:1").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_upsert_replaces_properties_and_keeps_created_at() {
        let repo = setup_test_db().await;

        repo.upsert_node(NodeType::Issue, "1", props(&[("title", "A"), ("body", "x")]))
            .await
            .unwrap();
        let first = repo.get_node("Issue:1").await.unwrap().unwrap();

        repo.upsert_node(NodeType::Issue, "1", props(&[("title", "B")]))
            .await
            .unwrap();
        let second = repo.get_node("Issue:1").await.unwrap().unwrap();

        assert_eq!(second.properties, props(&[("title", "B")]));
        assert_eq!(second.created_at, first.created_at);
        assert!(second.updated_at >= first.updated_at);

        let stats = repo.get_stats().await.unwrap();
        assert_eq!(stats.total_nodes, 1);
    }

    #[tokio::test]
    async fn test_upsert_rejects_empty_local_id() {
        let repo = setup_test_db().await;
        let err = repo
            .upsert_node(NodeType::Document, "", Properties::new())
            .await
            .unwrap_err();
        assert!(matches!(err, Error::MalformedInput(_)));
    }

    #[tokio::test]
    async fn test_merge_update_overlays_keys() {
        let repo = setup_test_db().await;
        repo.upsert_node(NodeType::Issue, "1", props(&[("title", "B"), ("status", "open")]))
            .await
            .unwrap();

        let updated = repo
            .merge_update_node("Issue:1", props(&[("status", "closed")]))
            .await
            .unwrap();
        assert_eq!(updated.str_property("title"), Some("B"));
        assert_eq!(updated.status(), Some("closed"));

        let stored = repo.get_node("Issue:1").await.unwrap().unwrap();
        assert_eq!(stored.properties, props(&[("title", "B"), ("status", "closed")]));
    }

    #[tokio::test]
    async fn test_merge_update_missing_node_fails() {
        let repo = setup_test_db().await;

        let err = repo
            .merge_update_node("Issue:999", props(&[("status", "closed")]))
            .await
            .unwrap_err();
        assert!(err.is_not_found());
        assert!(repo.get_node("Issue:999").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_insert_edge_is_idempotent() {
        let repo = setup_test_db().await;

        let created = repo
            .insert_edge("Issue:1", "Concept:Flows", Relationship::About, Properties::new())
            .await
            .unwrap();
        let duplicate = repo
            .insert_edge("Issue:1", "Concept:Flows", Relationship::About, Properties::new())
            .await
            .unwrap();

        assert!(created);
        assert!(!duplicate);
        assert_eq!(repo.list_edges().await.unwrap().len(), 1);

        // Same endpoints, different relationship, is a distinct edge
        assert!(repo
            .insert_edge("Issue:1", "Concept:Flows", Relationship::Explains, Properties::new())
            .await
            .unwrap());
        assert_eq!(repo.get_stats().await.unwrap().total_edges, 2);
    }

    #[tokio::test]
    async fn test_edges_may_reference_missing_nodes() {
        let repo = setup_test_db().await;

        assert!(repo
            .insert_edge("Issue:5", "PullRequest:9", Relationship::FixedBy, Properties::new())
            .await
            .unwrap());
        let edges = repo.list_edges_for_node("PullRequest:9", None).await.unwrap();
        assert_eq!(edges.len(), 1);
        assert_eq!(edges[0].from_id, "Issue:5");
    }

    #[tokio::test]
    async fn test_list_edges_for_node_with_filter() {
        let repo = setup_test_db().await;
        repo.insert_edge("Issue:1", "PullRequest:2", Relationship::FixedBy, Properties::new())
            .await
            .unwrap();
        repo.insert_edge("PullRequest:2", "Document:docs/a.md", Relationship::Modifies, Properties::new())
            .await
            .unwrap();
        repo.insert_edge("Issue:3", "Concept:Flows", Relationship::About, Properties::new())
            .await
            .unwrap();

        let all = repo.list_edges_for_node("PullRequest:2", None).await.unwrap();
        assert_eq!(all.len(), 2);

        let fixes = repo
            .list_edges_for_node("PullRequest:2", Some(Relationship::FixedBy))
            .await
            .unwrap();
        assert_eq!(fixes.len(), 1);
        assert_eq!(fixes[0].relationship, Relationship::FixedBy);

        let outgoing = repo.list_outgoing_edges("PullRequest:2").await.unwrap();
        assert_eq!(outgoing.len(), 1);
        assert_eq!(outgoing[0].to_id, "Document:docs/a.md");
    }

    #[tokio::test]
    async fn test_list_nodes_by_type_newest_first() {
        let repo = setup_test_db().await;
        repo.upsert_node(NodeType::Issue, "1", Properties::new()).await.unwrap();
        repo.upsert_node(NodeType::Issue, "2", Properties::new()).await.unwrap();
        repo.upsert_node(NodeType::Concept, "Flows", Properties::new()).await.unwrap();

        let issues = repo.list_nodes_by_type(NodeType::Issue).await.unwrap();
        let ids: Vec<_> = issues.iter().map(|n| n.id.as_str()).collect();
        assert_eq!(ids, vec!["Issue:2", "Issue:1"]);

        let all = repo.list_nodes().await.unwrap();
        let ids: Vec<_> = all.iter().map(|n| n.id.as_str()).collect();
        assert_eq!(ids, vec!["Issue:1", "Issue:2", "Concept:Flows"]);

        assert!(repo.list_nodes_by_type(NodeType::Skill).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_stats() {
        let repo = setup_test_db().await;
        repo.upsert_node(NodeType::Issue, "1", Properties::new()).await.unwrap();
        repo.upsert_node(NodeType::Concept, "Flows", Properties::new()).await.unwrap();
        repo.upsert_node(NodeType::Concept, "JobsAPI", Properties::new()).await.unwrap();
        repo.insert_edge("Issue:1", "Concept:Flows", Relationship::About, Properties::new())
            .await
            .unwrap();

        let stats = repo.get_stats().await.unwrap();
        assert_eq!(stats.total_nodes, 3);
        assert_eq!(stats.total_edges, 1);
        assert_eq!(stats.count_of(NodeType::Concept), 2);
        assert_eq!(stats.count_of(NodeType::Issue), 1);
        assert_eq!(stats.count_of(NodeType::Document), 0);
    }

    #[tokio::test]
    async fn test_properties_round_trip_types() {
        let repo = setup_test_db().await;
        let mut properties = props(&[("title", "T")]);
        properties.insert("number".into(), PropertyValue::from(42i64));
        properties.insert("labels".into(), PropertyValue::from(vec!["bug".to_string()]));
        properties.insert("draft".into(), PropertyValue::from(false));

        repo.upsert_node(NodeType::PullRequest, "42", properties.clone())
            .await
            .unwrap();
        let node = repo.get_node("PullRequest:42").await.unwrap().unwrap();
        assert_eq!(node.properties, properties);
    }
}

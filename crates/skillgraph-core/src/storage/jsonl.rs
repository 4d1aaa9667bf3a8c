//! JSONL and snapshot export
//!
//! Two read-only export formats over a [`GraphRepository`]:
//!
//! - **JSONL**: one record per line for clean diffs, written into a
//!   directory alongside a `_metadata.json` summary
//! - **Snapshot**: a single JSON document (`metadata`, `nodes`, `edges`)
//!   for visualization and report consumers
//!
//! # File Structure
//!
//! ```text
//! <dir>/
//! ├── nodes.jsonl
//! ├── edges.jsonl
//! └── _metadata.json
//! ```
//!
//! Nodes and edges are written oldest first, so re-exporting an unchanged
//! graph produces identical record lines.

use std::collections::BTreeMap;
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::graph::{Edge, GraphRepository, Node, NodeType, NodeView};
use crate::error::Result;
use crate::storage::CURRENT_VERSION;

/// Node records file name
pub const NODES_FILE: &str = "nodes.jsonl";

/// Edge records file name
pub const EDGES_FILE: &str = "edges.jsonl";

/// Metadata file name
pub const METADATA_FILE: &str = "_metadata.json";

/// Snapshot format version
pub const SNAPSHOT_VERSION: &str = "1.0";

const GENERATOR: &str = concat!("skillgraph ", env!("CARGO_PKG_VERSION"));

// =============================================================================
// Export Metadata
// =============================================================================

/// Summary written next to a JSONL export
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExportMetadata {
    /// When the export was created
    pub exported_at: DateTime<Utc>,
    /// Schema version of the database
    pub schema_version: i32,
    /// Number of nodes exported
    pub node_count: usize,
    /// Number of edges exported
    pub edge_count: usize,
    /// Node count per type
    pub nodes_by_type: BTreeMap<NodeType, usize>,
}

impl ExportMetadata {
    fn from_records(nodes: &[Node], edges: &[Edge]) -> Self {
        let mut nodes_by_type = BTreeMap::new();
        for node in nodes {
            *nodes_by_type.entry(node.node_type).or_insert(0) += 1;
        }

        Self {
            exported_at: Utc::now(),
            schema_version: CURRENT_VERSION,
            node_count: nodes.len(),
            edge_count: edges.len(),
            nodes_by_type,
        }
    }
}

/// Result of an export operation
#[derive(Debug, Clone)]
pub struct ExportResult {
    /// Directory the export was written to
    pub export_dir: PathBuf,
    /// Metadata about the export
    pub metadata: ExportMetadata,
    /// Files that were written
    pub files_written: Vec<PathBuf>,
}

// =============================================================================
// JSONL Export
// =============================================================================

/// Export every node and edge to JSONL files in `dir`
///
/// The directory is created if needed; existing export files are replaced.
pub async fn export_to_jsonl<R>(repository: &R, dir: &Path) -> Result<ExportResult>
where
    R: GraphRepository + ?Sized,
{
    fs::create_dir_all(dir)?;

    let nodes = repository.list_nodes().await?;
    let edges = repository.list_edges().await?;

    let nodes_path = dir.join(NODES_FILE);
    write_records(&nodes_path, &nodes)?;

    let edges_path = dir.join(EDGES_FILE);
    write_records(&edges_path, &edges)?;

    let metadata = ExportMetadata::from_records(&nodes, &edges);
    let metadata_path = dir.join(METADATA_FILE);
    let metadata_file = File::create(&metadata_path)?;
    serde_json::to_writer_pretty(metadata_file, &metadata)?;

    tracing::info!(
        export_dir = %dir.display(),
        nodes = metadata.node_count,
        edges = metadata.edge_count,
        "Graph exported to JSONL"
    );

    Ok(ExportResult {
        export_dir: dir.to_path_buf(),
        metadata,
        files_written: vec![nodes_path, edges_path, metadata_path],
    })
}

fn write_records<T: Serialize>(path: &Path, records: &[T]) -> Result<()> {
    let file = File::create(path)?;
    let mut writer = BufWriter::new(file);

    for record in records {
        serde_json::to_writer(&mut writer, record)?;
        writeln!(writer)?;
    }

    writer.flush()?;
    Ok(())
}

// =============================================================================
// Snapshot Export
// =============================================================================

/// Snapshot header
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SnapshotMetadata {
    pub exported_at: DateTime<Utc>,
    pub node_count: usize,
    pub edge_count: usize,
    pub version: String,
    pub generator: String,
}

/// A node with its display label
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SnapshotNode {
    pub label: String,
    #[serde(flatten)]
    pub node: Node,
}

/// The whole graph as one document
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GraphSnapshot {
    pub metadata: SnapshotMetadata,
    pub nodes: Vec<SnapshotNode>,
    pub edges: Vec<Edge>,
}

/// Read the whole graph into a snapshot
pub async fn export_snapshot<R>(repository: &R) -> Result<GraphSnapshot>
where
    R: GraphRepository + ?Sized,
{
    let nodes: Vec<SnapshotNode> = repository
        .list_nodes()
        .await?
        .into_iter()
        .map(|node| SnapshotNode {
            label: NodeView::from_node(&node).label(),
            node,
        })
        .collect();
    let edges = repository.list_edges().await?;

    Ok(GraphSnapshot {
        metadata: SnapshotMetadata {
            exported_at: Utc::now(),
            node_count: nodes.len(),
            edge_count: edges.len(),
            version: SNAPSHOT_VERSION.to_string(),
            generator: GENERATOR.to_string(),
        },
        nodes,
        edges,
    })
}

/// Write a snapshot document to `path`, creating parent directories
pub async fn write_snapshot<R>(repository: &R, path: &Path) -> Result<GraphSnapshot>
where
    R: GraphRepository + ?Sized,
{
    let snapshot = export_snapshot(repository).await?;

    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }

    let file = File::create(path)?;
    let mut writer = BufWriter::new(file);
    serde_json::to_writer_pretty(&mut writer, &snapshot)?;
    writer.flush()?;

    tracing::info!(
        path = %path.display(),
        nodes = snapshot.metadata.node_count,
        edges = snapshot.metadata.edge_count,
        "Graph snapshot written"
    );
    Ok(snapshot)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::graph::{Properties, PropertyValue, Relationship};
    use crate::infrastructure::graph::SqliteGraphRepository;
    use crate::storage::Database;
    use tempfile::TempDir;

    async fn setup_test_db() -> (SqliteGraphRepository, TempDir) {
        let db = Database::in_memory().await.expect("Failed to create database");
        let repo = SqliteGraphRepository::new(db.pool().clone());
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        (repo, temp_dir)
    }

    async fn seed(repo: &SqliteGraphRepository) {
        repo.upsert_node(
            NodeType::Document,
            "docs/keboola/auth.md",
            Properties::from([("path".to_string(), PropertyValue::from("docs/keboola/auth.md"))]),
        )
        .await
        .unwrap();
        repo.upsert_node(
            NodeType::Skill,
            "auth",
            Properties::from([("name".to_string(), PropertyValue::from("auth"))]),
        )
        .await
        .unwrap();
        repo.insert_edge(
            "Document:docs/keboola/auth.md",
            "Skill:auth",
            Relationship::Generates,
            Properties::new(),
        )
        .await
        .unwrap();
    }

    #[tokio::test]
    async fn test_export_creates_files() {
        let (repo, temp_dir) = setup_test_db().await;
        seed(&repo).await;

        let dir = temp_dir.path().join("export");
        let result = export_to_jsonl(&repo, &dir).await.unwrap();

        assert_eq!(result.files_written.len(), 3);
        for file in &result.files_written {
            assert!(file.exists(), "Expected {} to exist", file.display());
        }
        assert_eq!(result.metadata.node_count, 2);
        assert_eq!(result.metadata.edge_count, 1);
        assert_eq!(result.metadata.nodes_by_type.get(&NodeType::Skill), Some(&1));
    }

    #[tokio::test]
    async fn test_exported_lines_decode() {
        let (repo, temp_dir) = setup_test_db().await;
        seed(&repo).await;

        export_to_jsonl(&repo, temp_dir.path()).await.unwrap();

        let nodes = fs::read_to_string(temp_dir.path().join(NODES_FILE)).unwrap();
        let decoded: Vec<Node> = nodes
            .lines()
            .map(|line| serde_json::from_str(line).unwrap())
            .collect();
        assert_eq!(decoded.len(), 2);
        assert_eq!(decoded[0].id, "Document:docs/keboola/auth.md");

        let edges = fs::read_to_string(temp_dir.path().join(EDGES_FILE)).unwrap();
        let line: serde_json::Value = serde_json::from_str(edges.trim()).unwrap();
        assert_eq!(line["fromId"], "Document:docs/keboola/auth.md");
        assert_eq!(line["relationship"], "GENERATES");

        let metadata: ExportMetadata = serde_json::from_str(
            &fs::read_to_string(temp_dir.path().join(METADATA_FILE)).unwrap(),
        )
        .unwrap();
        assert_eq!(metadata.schema_version, CURRENT_VERSION);
    }

    #[tokio::test]
    async fn test_export_empty_graph() {
        let (repo, temp_dir) = setup_test_db().await;

        let result = export_to_jsonl(&repo, temp_dir.path()).await.unwrap();
        assert_eq!(result.metadata.node_count, 0);
        let nodes = fs::read_to_string(temp_dir.path().join(NODES_FILE)).unwrap();
        assert!(nodes.is_empty());
    }

    #[tokio::test]
    async fn test_snapshot_shape() {
        let (repo, temp_dir) = setup_test_db().await;
        seed(&repo).await;

        let path = temp_dir.path().join("web").join("graph.json");
        let snapshot = write_snapshot(&repo, &path).await.unwrap();
        assert_eq!(snapshot.metadata.node_count, 2);
        assert_eq!(snapshot.nodes[0].label, "auth");

        let json: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(json["metadata"]["version"], SNAPSHOT_VERSION);
        assert_eq!(json["metadata"]["edge_count"], 1);
        assert_eq!(json["nodes"][0]["id"], "Document:docs/keboola/auth.md");
        assert_eq!(json["nodes"][0]["type"], "Document");
        assert_eq!(json["nodes"][0]["label"], "auth");
        assert_eq!(json["nodes"][1]["properties"]["name"], "auth");
        assert_eq!(json["edges"][0]["toId"], "Skill:auth");
    }
}

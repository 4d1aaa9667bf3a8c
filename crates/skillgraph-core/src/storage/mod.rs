//! Storage layer - SQLite + JSONL export
//!
//! Provides database management, migrations and export for the graph store.
//!
//! # Architecture
//!
//! - `database`: Connection pool management and initialization
//! - `migrations`: Schema versioning and automatic migration
//! - `jsonl`: JSONL and snapshot export
//!
//! # Usage
//!
//! ```ignore
//! use skillgraph_core::storage::Database;
//!
//! // In-memory database for tests
//! let db = Database::in_memory().await?;
//!
//! // Or a file database
//! let db = Database::open("graph.db").await?;
//! ```

pub mod database;
pub mod jsonl;
pub mod migrations;

// Re-export commonly used types
pub use database::{Database, DatabaseConfig};
pub use jsonl::{
    export_snapshot, export_to_jsonl, write_snapshot, ExportMetadata, ExportResult,
    GraphSnapshot, SnapshotMetadata, SnapshotNode,
};
pub use migrations::{migration_status, run_migrations, MigrationStatus, CURRENT_VERSION};

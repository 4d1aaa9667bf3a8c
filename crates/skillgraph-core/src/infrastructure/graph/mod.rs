//! Graph infrastructure implementations
//!
//! This module contains the SQLite implementation of the graph repository
//! trait.

mod repository;

pub use repository::SqliteGraphRepository;

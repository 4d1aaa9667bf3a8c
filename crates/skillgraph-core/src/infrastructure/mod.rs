//! Infrastructure layer
//!
//! Contains implementations for external systems, currently the SQLite
//! graph store.

pub mod graph;

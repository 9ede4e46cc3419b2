//! In-memory relational store
//!
//! Replaces per-row lookups against a live legacy database with map lookups
//! over a snapshot loaded once per run.

pub mod relational;
pub mod table;

pub use relational::{InMemoryStore, LoadOptions, LoadReport};
pub use table::{ChildIndex, Table, TableStats};

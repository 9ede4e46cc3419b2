//! Error types for each stage of a migration run.
//!
//! Field-level and entity-level problems never surface here: they degrade to
//! `None` or an empty collection and are logged where they happen. What remains
//! are the errors that either abort a run or reject a single destination record.

use std::path::PathBuf;
use thiserror::Error;

use crate::destination::EntityKind;

/// Errors raised while reading raw snapshot files.
#[derive(Debug, Error)]
pub enum SnapshotError {
    #[error("snapshot directory not found: {0}")]
    DirectoryMissing(PathBuf),

    #[error("failed to read table `{table}`: {source}")]
    Io {
        table: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse table `{table}`: {message}")]
    Parse { table: String, message: String },
}

/// Errors raised by the in-memory relational store.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("store has not finished loading")]
    NotLoaded,

    #[error("store is already loaded")]
    AlreadyLoaded,

    #[error("{table} {id} not found")]
    NotFound { table: &'static str, id: i64 },

    #[error("store lock poisoned")]
    Poisoned,

    #[error(transparent)]
    Snapshot(#[from] SnapshotError),
}

/// Errors reported by a destination persistence backend.
///
/// A natural-key conflict is not an error; see [`crate::destination::CreateOutcome`].
#[derive(Debug, Error)]
pub enum DestinationError {
    #[error("destination unavailable: {0}")]
    Unavailable(String),

    #[error("{kind} record rejected: {reason}")]
    Rejected { kind: EntityKind, reason: String },

    #[error("{kind} {id} not found")]
    NotFound { kind: EntityKind, id: String },

    #[error("destination I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("destination serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl DestinationError {
    /// Whether this error means the destination itself cannot be reached,
    /// as opposed to one record being refused.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            DestinationError::Unavailable(_) | DestinationError::Io(_)
        )
    }
}

/// Stage of a run that failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Load,
    PrimaryJoin,
    Destination,
}

impl std::fmt::Display for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Stage::Load => "snapshot load",
            Stage::PrimaryJoin => "primary project join",
            Stage::Destination => "destination write",
        };
        f.write_str(name)
    }
}

/// A run-level failure. Anything surfacing as this aborts the migration.
#[derive(Debug, Error)]
pub enum MigrateError {
    #[error("{stage} failed: {source}")]
    Store {
        stage: Stage,
        #[source]
        source: StoreError,
    },

    #[error("{} failed: {0}", Stage::Destination)]
    Destination(#[from] DestinationError),
}

impl MigrateError {
    pub fn stage(&self) -> Stage {
        match self {
            MigrateError::Store { stage, .. } => *stage,
            MigrateError::Destination(_) => Stage::Destination,
        }
    }

    pub(crate) fn load(source: StoreError) -> Self {
        MigrateError::Store {
            stage: Stage::Load,
            source,
        }
    }

    pub(crate) fn primary_join(source: StoreError) -> Self {
        MigrateError::Store {
            stage: Stage::PrimaryJoin,
            source,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_only_unreachable_destination_is_fatal() {
        assert!(DestinationError::Unavailable("down".into()).is_fatal());
        assert!(!DestinationError::Rejected {
            kind: EntityKind::Project,
            reason: "missing slug".into(),
        }
        .is_fatal());
    }

    #[test]
    fn test_migrate_error_names_stage() {
        let err = MigrateError::primary_join(StoreError::NotLoaded);
        assert_eq!(err.stage(), Stage::PrimaryJoin);
        assert_eq!(
            err.to_string(),
            "primary project join failed: store has not finished loading"
        );
    }
}

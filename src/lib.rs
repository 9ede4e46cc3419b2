//! # Foundry - Legacy Real-Estate Snapshot Migration
//!
//! Moves a legacy relational real-estate catalogue, exported as one JSON file
//! per table, into a document-oriented destination schema.
//!
//! ## Modules
//!
//! - **snapshot**: read table exports off disk
//! - **legacy**: typed legacy entities decoded from raw rows
//! - **store**: in-memory relational graph with parent/child indexes
//! - **decode**: fallback decoders for inconsistently encoded columns
//! - **projector**: web card aggregation, merge-upsert and the migration passes
//! - **destination**: the persistence interface plus memory and JSON Lines backends
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use foundry::{migrate_snapshot, CancellationToken, MemoryDestination, MigrateConfig};
//!
//! # fn main() -> anyhow::Result<()> {
//! let destination = MemoryDestination::new();
//! let report = migrate_snapshot(
//!     "exports/2024-06-01",
//!     &destination,
//!     &MigrateConfig::default(),
//!     &CancellationToken::new(),
//! )?;
//!
//! println!("created {} records", report.total_created());
//! # Ok(())
//! # }
//! ```

use std::path::Path;
use tracing::info;

pub mod config;
pub mod decode;
pub mod destination;
pub mod error;
pub mod legacy;
pub mod logging;
pub mod projector;
pub mod snapshot;
pub mod store;

// Re-export commonly used types for convenience
pub use config::{MigrateConfig, ReraDefaults};
pub use destination::{
    CreateOutcome, Destination, DestinationId, Document, EntityKind, JsonlDestination,
    MemoryDestination, NaturalKey, Record,
};
pub use error::{DestinationError, MigrateError, SnapshotError, Stage, StoreError};
pub use projector::{KindCounts, MigrationReport, Migrator};
pub use snapshot::SnapshotReader;
pub use store::{InMemoryStore, LoadReport};
pub use tokio_util::sync::CancellationToken;

/// Main entry point: load a snapshot directory and migrate it into `destination`
pub fn migrate_snapshot<P, D>(
    dir: P,
    destination: &D,
    config: &MigrateConfig,
    cancel: &CancellationToken,
) -> Result<MigrationReport, MigrateError>
where
    P: AsRef<Path>,
    D: Destination + ?Sized,
{
    let reader = SnapshotReader::open(dir).map_err(|e| MigrateError::load(e.into()))?;
    let store = InMemoryStore::new();
    let loaded = store
        .load(&reader, &config.load_options())
        .map_err(MigrateError::load)?;

    let mut report = Migrator::new(&store, destination, config).run(cancel)?;
    report.tables_loaded = loaded.tables_loaded();
    report.rows_loaded = loaded.rows_decoded();

    info!(
        tables = report.tables_loaded,
        rows = report.rows_loaded,
        created = report.total_created(),
        merged = report.total_merged(),
        failed = report.total_failed(),
        cancelled = report.cancelled,
        "migration finished"
    );
    Ok(report)
}

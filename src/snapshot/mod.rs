//! Legacy snapshot files
//!
//! A snapshot is a directory holding one JSON export per legacy table. This
//! module only gets rows off disk; typed decoding happens in [`crate::legacy`].

pub mod reader;

pub use reader::{RawRow, SnapshotReader, TableExport};

//! Projection of the legacy graph onto the destination schema
//!
//! - [`web_card`]: pure aggregation of a project's children
//! - [`documents`]: destination documents per entity kind
//! - [`merge`] and [`upsert`]: create-or-merge against a
//!   [`Destination`](crate::destination::Destination)
//! - [`engine`]: the ordered migration passes

pub mod documents;
pub mod engine;
pub mod merge;
pub mod translation;
pub mod upsert;
pub mod web_card;

pub use engine::{KindCounts, MigrationReport, Migrator};
pub use merge::{is_truthy, merge_into};
pub use translation::TranslationMap;
pub use upsert::{upsert, UpsertAction, Upserted};
pub use web_card::{build_web_card, WebCard, WebCardSources};

//! Destination persistence collaborator
//!
//! The projector needs exactly three capabilities from the new schema's store:
//! create, query by natural key, and update. Creating a record whose natural
//! key is already taken is reported as [`CreateOutcome::Conflict`], an ordinary
//! value the caller matches on, not an error.

pub mod jsonl;
pub mod memory;

pub use jsonl::JsonlDestination;
pub use memory::MemoryDestination;

use crate::error::DestinationError;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;

/// Field map of a destination document
pub type Document = Map<String, Value>;

/// Kinds of destination entity the migration writes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityKind {
    Developer,
    Locality,
    Project,
    Property,
    Blog,
}

impl EntityKind {
    pub const ALL: [EntityKind; 5] = [
        EntityKind::Developer,
        EntityKind::Locality,
        EntityKind::Project,
        EntityKind::Property,
        EntityKind::Blog,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            EntityKind::Developer => "developer",
            EntityKind::Locality => "locality",
            EntityKind::Project => "project",
            EntityKind::Property => "property",
            EntityKind::Blog => "blog",
        }
    }

    /// The field holding this kind's unique natural key
    pub fn natural_key_field(self) -> &'static str {
        match self {
            EntityKind::Developer => "name",
            _ => "slug",
        }
    }

    /// Whether several legacy rows may fold into one record of this kind.
    ///
    /// Only developers are de-duplicated on purpose, by name. Any other kind
    /// holds exactly one legacy row per record.
    pub fn merges_legacy_rows(self) -> bool {
        matches!(self, EntityKind::Developer)
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Identifier generated by the destination
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct DestinationId(pub String);

impl DestinationId {
    pub fn new(id: impl Into<String>) -> Self {
        DestinationId(id.into())
    }

    pub fn generate() -> Self {
        DestinationId(uuid::Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for DestinationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&DestinationId> for Value {
    fn from(id: &DestinationId) -> Self {
        Value::String(id.0.clone())
    }
}

/// The natural key a record is unique on
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct NaturalKey {
    pub field: &'static str,
    pub value: String,
}

impl NaturalKey {
    /// Extract the natural key of `kind` from a document. Blank keys count as missing.
    pub fn of(kind: EntityKind, fields: &Document) -> Option<Self> {
        let field = kind.natural_key_field();
        let value = fields.get(field)?.as_str()?.trim();
        (!value.is_empty()).then(|| NaturalKey {
            field,
            value: value.to_string(),
        })
    }
}

impl fmt::Display for NaturalKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}={:?}", self.field, self.value)
    }
}

/// A stored destination document
#[derive(Debug, Clone, PartialEq)]
pub struct Record {
    pub id: DestinationId,
    pub kind: EntityKind,
    pub fields: Document,
}

/// Result of attempting to create a record
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CreateOutcome {
    Created(DestinationId),
    /// A record with this natural key already exists
    Conflict(NaturalKey),
}

/// Persistence interface of the destination schema
pub trait Destination: Send + Sync {
    fn try_create(
        &self,
        kind: EntityKind,
        fields: &Document,
    ) -> Result<CreateOutcome, DestinationError>;

    fn find_by_unique_key(
        &self,
        kind: EntityKind,
        key: &NaturalKey,
    ) -> Result<Option<Record>, DestinationError>;

    fn update(
        &self,
        kind: EntityKind,
        id: &DestinationId,
        fields: &Document,
    ) -> Result<Record, DestinationError>;
}

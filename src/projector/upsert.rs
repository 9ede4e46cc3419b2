use crate::destination::{CreateOutcome, Destination, DestinationId, Document, EntityKind};
use crate::error::DestinationError;
use crate::projector::merge::merge_into;
use serde::Serialize;
use tracing::debug;

/// Field every projected document carries its legacy row id in
const LEGACY_ID: &str = "legacy_id";

/// What an upsert did to the destination
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum UpsertAction {
    Created,
    /// Conflicted on natural key and merged new values into the existing record
    Merged,
    /// Conflicted, but the existing record already held every value
    Unchanged,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Upserted {
    pub id: DestinationId,
    pub action: UpsertAction,
}

/// Create a record, or on natural-key conflict fetch the existing one and merge into it.
///
/// A conflict with a record of another legacy row is refused as
/// [`DestinationError::Rejected`] unless the kind merges legacy rows.
pub fn upsert<D: Destination + ?Sized>(
    destination: &D,
    kind: EntityKind,
    fields: Document,
) -> Result<Upserted, DestinationError> {
    let key = match destination.try_create(kind, &fields)? {
        CreateOutcome::Created(id) => {
            return Ok(Upserted {
                id,
                action: UpsertAction::Created,
            })
        }
        CreateOutcome::Conflict(key) => key,
    };

    let existing = destination
        .find_by_unique_key(kind, &key)?
        .ok_or_else(|| DestinationError::NotFound {
            kind,
            id: key.to_string(),
        })?;

    if !kind.merges_legacy_rows() {
        let held = existing.fields.get(LEGACY_ID);
        let incoming = fields.get(LEGACY_ID);
        if let (Some(held), Some(incoming)) = (held, incoming) {
            if held != incoming {
                return Err(DestinationError::Rejected {
                    kind,
                    reason: format!("{} already holds legacy id {}, not {}", key, held, incoming),
                });
            }
        }
    }

    let mut merged = existing.fields;
    if !merge_into(&mut merged, &fields) {
        debug!(kind = %kind, key = %key, "existing record already up to date");
        return Ok(Upserted {
            id: existing.id,
            action: UpsertAction::Unchanged,
        });
    }

    let updated = destination.update(kind, &existing.id, &merged)?;
    debug!(kind = %kind, key = %key, id = %updated.id, "merged into existing record");
    Ok(Upserted {
        id: updated.id,
        action: UpsertAction::Merged,
    })
}

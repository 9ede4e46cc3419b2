use crate::destination::{
    CreateOutcome, Destination, DestinationId, Document, EntityKind, NaturalKey, Record,
};
use crate::error::DestinationError;
use std::collections::HashMap;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

#[derive(Debug, Default)]
struct Collection {
    records: Vec<Record>,
    by_id: HashMap<DestinationId, usize>,
    by_key: HashMap<String, usize>,
}

impl Collection {
    fn push(&mut self, key: NaturalKey, record: Record) {
        let idx = self.records.len();
        self.by_id.insert(record.id.clone(), idx);
        self.by_key.insert(key.value, idx);
        self.records.push(record);
    }
}

/// Destination held entirely in memory, unique on each kind's natural key
#[derive(Debug, Default)]
pub struct MemoryDestination {
    collections: RwLock<HashMap<EntityKind, Collection>>,
}

impl MemoryDestination {
    pub fn new() -> Self {
        Self::default()
    }

    fn read(
        &self,
    ) -> Result<RwLockReadGuard<'_, HashMap<EntityKind, Collection>>, DestinationError> {
        self.collections
            .read()
            .map_err(|_| DestinationError::Unavailable("destination lock poisoned".into()))
    }

    fn write(
        &self,
    ) -> Result<RwLockWriteGuard<'_, HashMap<EntityKind, Collection>>, DestinationError> {
        self.collections
            .write()
            .map_err(|_| DestinationError::Unavailable("destination lock poisoned".into()))
    }

    /// Insert an already-identified record, e.g. one read back from disk
    pub fn insert_record(&self, record: Record) -> Result<(), DestinationError> {
        let key = natural_key(record.kind, &record.fields)?;
        let mut collections = self.write()?;
        let collection = collections.entry(record.kind).or_default();
        if collection.by_key.contains_key(&key.value) || collection.by_id.contains_key(&record.id) {
            return Err(DestinationError::Rejected {
                kind: record.kind,
                reason: format!("duplicate record {} ({})", record.id, key),
            });
        }
        collection.push(key, record);
        Ok(())
    }

    /// All records of a kind in creation order
    pub fn records(&self, kind: EntityKind) -> Result<Vec<Record>, DestinationError> {
        Ok(self
            .read()?
            .get(&kind)
            .map(|c| c.records.clone())
            .unwrap_or_default())
    }

    pub fn count(&self, kind: EntityKind) -> Result<usize, DestinationError> {
        Ok(self.read()?.get(&kind).map_or(0, |c| c.records.len()))
    }

    pub fn get(
        &self,
        kind: EntityKind,
        id: &DestinationId,
    ) -> Result<Option<Record>, DestinationError> {
        Ok(self.read()?.get(&kind).and_then(|c| {
            c.by_id.get(id).map(|&idx| c.records[idx].clone())
        }))
    }
}

fn natural_key(kind: EntityKind, fields: &Document) -> Result<NaturalKey, DestinationError> {
    NaturalKey::of(kind, fields).ok_or_else(|| DestinationError::Rejected {
        kind,
        reason: format!("missing natural key `{}`", kind.natural_key_field()),
    })
}

impl Destination for MemoryDestination {
    fn try_create(
        &self,
        kind: EntityKind,
        fields: &Document,
    ) -> Result<CreateOutcome, DestinationError> {
        let key = natural_key(kind, fields)?;
        let mut collections = self.write()?;
        let collection = collections.entry(kind).or_default();
        if collection.by_key.contains_key(&key.value) {
            return Ok(CreateOutcome::Conflict(key));
        }

        let id = DestinationId::generate();
        collection.push(
            key,
            Record {
                id: id.clone(),
                kind,
                fields: fields.clone(),
            },
        );
        Ok(CreateOutcome::Created(id))
    }

    fn find_by_unique_key(
        &self,
        kind: EntityKind,
        key: &NaturalKey,
    ) -> Result<Option<Record>, DestinationError> {
        Ok(self.read()?.get(&kind).and_then(|c| {
            c.by_key.get(&key.value).map(|&idx| c.records[idx].clone())
        }))
    }

    fn update(
        &self,
        kind: EntityKind,
        id: &DestinationId,
        fields: &Document,
    ) -> Result<Record, DestinationError> {
        let new_key = natural_key(kind, fields)?;
        let mut collections = self.write()?;
        let collection = collections.entry(kind).or_default();
        let Some(&idx) = collection.by_id.get(id) else {
            return Err(DestinationError::NotFound {
                kind,
                id: id.to_string(),
            });
        };

        match collection.by_key.get(&new_key.value) {
            Some(&owner) if owner != idx => {
                return Err(DestinationError::Rejected {
                    kind,
                    reason: format!("{} already belongs to another record", new_key),
                });
            }
            Some(_) => {}
            None => {
                collection.by_key.retain(|_, &mut owner| owner != idx);
                collection.by_key.insert(new_key.value, idx);
            }
        }

        let record = &mut collection.records[idx];
        record.fields = fields.clone();
        Ok(record.clone())
    }
}

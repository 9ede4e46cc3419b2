use crate::destination::{
    CreateOutcome, Destination, DestinationId, Document, EntityKind, MemoryDestination, NaturalKey,
    Record,
};
use crate::error::DestinationError;
use serde_json::Value;
use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Destination persisted as one JSON Lines file per entity kind.
///
/// Existing files are read back on [`open`](Self::open), so a re-run merges into
/// what the previous run wrote instead of duplicating it. Nothing touches disk
/// until [`flush`](Self::flush).
#[derive(Debug)]
pub struct JsonlDestination {
    dir: PathBuf,
    inner: MemoryDestination,
}

impl JsonlDestination {
    pub fn open<P: AsRef<Path>>(dir: P) -> Result<Self, DestinationError> {
        let dir = dir.as_ref().to_path_buf();
        std::fs::create_dir_all(&dir)?;

        let inner = MemoryDestination::new();
        for kind in EntityKind::ALL {
            let path = Self::path_for(&dir, kind);
            if !path.exists() {
                continue;
            }
            let mut loaded = 0;
            let reader = BufReader::new(File::open(&path)?);
            for line in reader.lines() {
                let line = line?;
                if line.trim().is_empty() {
                    continue;
                }
                let mut fields: Document = serde_json::from_str(&line)?;
                let id = match fields.remove("id") {
                    Some(Value::String(id)) => DestinationId(id),
                    _ => {
                        return Err(DestinationError::Rejected {
                            kind,
                            reason: format!("record without id in {}", path.display()),
                        })
                    }
                };
                inner.insert_record(Record { id, kind, fields })?;
                loaded += 1;
            }
            debug!(kind = %kind, records = loaded, "loaded existing destination records");
        }

        Ok(JsonlDestination { dir, inner })
    }

    fn path_for(dir: &Path, kind: EntityKind) -> PathBuf {
        dir.join(format!("{}.jsonl", kind))
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn records(&self, kind: EntityKind) -> Result<Vec<Record>, DestinationError> {
        self.inner.records(kind)
    }

    pub fn count(&self, kind: EntityKind) -> Result<usize, DestinationError> {
        self.inner.count(kind)
    }

    /// Rewrite every kind's file with the current records
    pub fn flush(&self) -> Result<(), DestinationError> {
        for kind in EntityKind::ALL {
            let records = self.inner.records(kind)?;
            if records.is_empty() && !Self::path_for(&self.dir, kind).exists() {
                continue;
            }

            let path = Self::path_for(&self.dir, kind);
            let tmp = path.with_extension("jsonl.tmp");
            {
                let mut writer = BufWriter::new(File::create(&tmp)?);
                for record in &records {
                    let mut line = Document::new();
                    line.insert("id".to_string(), Value::from(&record.id));
                    line.extend(record.fields.clone());
                    writeln!(writer, "{}", serde_json::to_string(&line)?)?;
                }
                writer.flush()?;
            }
            std::fs::rename(&tmp, &path)?;
        }

        info!(dir = %self.dir.display(), "destination flushed");
        Ok(())
    }
}

impl Destination for JsonlDestination {
    fn try_create(
        &self,
        kind: EntityKind,
        fields: &Document,
    ) -> Result<CreateOutcome, DestinationError> {
        self.inner.try_create(kind, fields)
    }

    fn find_by_unique_key(
        &self,
        kind: EntityKind,
        key: &NaturalKey,
    ) -> Result<Option<Record>, DestinationError> {
        self.inner.find_by_unique_key(kind, key)
    }

    fn update(
        &self,
        kind: EntityKind,
        id: &DestinationId,
        fields: &Document,
    ) -> Result<Record, DestinationError> {
        self.inner.update(kind, id, fields)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_flush_and_reopen() {
        let dir = std::env::temp_dir().join(format!("foundry-jsonl-{}", uuid::Uuid::new_v4()));
        let fields: Document = serde_json::from_value(json!({"name": "Acme Builders"})).unwrap();

        let dest = JsonlDestination::open(&dir).unwrap();
        let outcome = dest.try_create(EntityKind::Developer, &fields).unwrap();
        let CreateOutcome::Created(id) = outcome else {
            panic!("expected Created");
        };
        dest.flush().unwrap();

        let content = std::fs::read_to_string(dir.join("developer.jsonl")).unwrap();
        assert!(content.contains("Acme Builders"));
        assert!(!dir.join("project.jsonl").exists());

        let reopened = JsonlDestination::open(&dir).unwrap();
        assert_eq!(reopened.count(EntityKind::Developer).unwrap(), 1);
        assert_eq!(
            reopened.try_create(EntityKind::Developer, &fields).unwrap(),
            CreateOutcome::Conflict(NaturalKey { field: "name", value: "Acme Builders".into() })
        );
        assert_eq!(reopened.records(EntityKind::Developer).unwrap()[0].id, id);
    }
}

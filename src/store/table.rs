use crate::legacy::LegacyRecord;
use crate::snapshot::RawRow;
use serde::Serialize;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::warn;

/// One-to-many child index keyed by parent primary key
pub type ChildIndex<T> = HashMap<i64, Vec<Arc<T>>>;

/// Typed rows of one legacy table, keyed by primary key, in snapshot order
#[derive(Debug)]
pub struct Table<T> {
    rows: HashMap<i64, Arc<T>>,
    order: Vec<i64>,
}

impl<T> Default for Table<T> {
    fn default() -> Self {
        Table {
            rows: HashMap::new(),
            order: Vec::new(),
        }
    }
}

impl<T: LegacyRecord> Table<T> {
    /// Insert a record. A repeated primary key keeps the first row.
    pub fn insert(&mut self, record: T) -> Option<Arc<T>> {
        let id = record.id();
        if self.rows.contains_key(&id) {
            return None;
        }
        let record = Arc::new(record);
        self.rows.insert(id, Arc::clone(&record));
        self.order.push(id);
        Some(record)
    }

    pub fn get(&self, id: i64) -> Option<&Arc<T>> {
        self.rows.get(&id)
    }

    pub fn contains(&self, id: i64) -> bool {
        self.rows.contains_key(&id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Arc<T>> {
        self.order.iter().filter_map(|id| self.rows.get(id))
    }

    pub fn all(&self) -> Vec<Arc<T>> {
        self.iter().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// Decode raw rows into this table, returning the newly inserted records
    pub fn decode(&mut self, rows: Vec<RawRow>, stats: &mut TableStats) -> Vec<Arc<T>> {
        let mut inserted = Vec::with_capacity(rows.len());
        stats.rows_read += rows.len();

        for row in rows {
            let Some(record) = T::from_row(&row) else {
                stats.skipped += 1;
                continue;
            };
            let id = record.id();
            match self.insert(record) {
                Some(record) => inserted.push(record),
                None => {
                    stats.duplicates += 1;
                    warn!(table = T::TABLE, id, "duplicate primary key, keeping first row");
                }
            }
        }

        stats.decoded += inserted.len();
        if stats.skipped > 0 {
            warn!(
                table = T::TABLE,
                skipped = stats.skipped,
                "rows without a usable id were skipped"
            );
        }
        inserted
    }

    /// Decode rows and side-collect them under their parent key
    pub fn decode_children(
        &mut self,
        rows: Vec<RawRow>,
        index: &mut ChildIndex<T>,
        parent_of: impl Fn(&T) -> Option<i64>,
        stats: &mut TableStats,
    ) {
        for record in self.decode(rows, stats) {
            match parent_of(&record) {
                Some(parent_id) => index.entry(parent_id).or_default().push(record),
                None => stats.orphans += 1,
            }
        }
    }
}

/// Row accounting for one loaded table
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct TableStats {
    pub rows_read: usize,
    pub decoded: usize,
    /// Rows with no decodable primary key
    pub skipped: usize,
    pub duplicates: usize,
    /// Rows whose parent key is absent or does not resolve
    pub orphans: usize,
}

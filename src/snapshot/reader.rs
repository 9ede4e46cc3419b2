use crate::error::SnapshotError;
use serde::Deserialize;
use serde_json::{Map, Value};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// One legacy row, column name to value, in whatever JSON shape the exporter wrote.
pub type RawRow = Map<String, Value>;

/// The on-disk shape of one exported table
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TableExport {
    #[serde(default)]
    pub table_name: String,

    #[serde(default)]
    pub exported_at: Option<String>,

    #[serde(default)]
    pub row_count: Option<u64>,

    #[serde(default)]
    pub columns: Vec<String>,

    /// Declared SQL types. Informational only; cells are decoded from their JSON shape.
    #[serde(default)]
    pub column_types: Vec<String>,

    #[serde(default)]
    pub data: Vec<RawRow>,
}

/// Older exports wrote the rows array on its own.
#[derive(Deserialize)]
#[serde(untagged)]
enum SnapshotFile {
    Export(TableExport),
    Rows(Vec<RawRow>),
}

/// Reads per-table JSON exports out of a snapshot directory
#[derive(Debug, Clone)]
pub struct SnapshotReader {
    dir: PathBuf,
}

impl SnapshotReader {
    /// Open a snapshot directory. The directory itself must exist; individual
    /// table files may be missing.
    pub fn open<P: AsRef<Path>>(dir: P) -> Result<Self, SnapshotError> {
        let dir = dir.as_ref().to_path_buf();
        if !dir.is_dir() {
            return Err(SnapshotError::DirectoryMissing(dir));
        }
        Ok(SnapshotReader { dir })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Path of the export file for a table
    pub fn table_path(&self, table: &str) -> PathBuf {
        self.dir.join(format!("{}.json", table))
    }

    /// Names of all tables present in the directory, sorted
    pub fn available_tables(&self) -> Result<Vec<String>, SnapshotError> {
        let entries = std::fs::read_dir(&self.dir).map_err(|source| SnapshotError::Io {
            table: self.dir.display().to_string(),
            source,
        })?;

        let mut tables: Vec<String> = entries
            .filter_map(|entry| entry.ok())
            .map(|entry| entry.path())
            .filter(|path| path.extension().is_some_and(|ext| ext == "json"))
            .filter_map(|path| path.file_stem().map(|s| s.to_string_lossy().into_owned()))
            .collect();
        tables.sort();
        Ok(tables)
    }

    /// Load the full export for a table. `Ok(None)` means the file does not exist.
    pub fn load_export(&self, table: &str) -> Result<Option<TableExport>, SnapshotError> {
        let path = self.table_path(table);
        let content = match std::fs::read(&path) {
            Ok(content) => content,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(source) => {
                return Err(SnapshotError::Io {
                    table: table.to_string(),
                    source,
                })
            }
        };

        let export = match parse_export(content, table)? {
            SnapshotFile::Export(export) => export,
            SnapshotFile::Rows(data) => TableExport {
                table_name: table.to_string(),
                row_count: Some(data.len() as u64),
                data,
                ..TableExport::default()
            },
        };

        if let Some(declared) = export.row_count {
            if declared != export.data.len() as u64 {
                warn!(
                    table,
                    declared,
                    actual = export.data.len(),
                    "row_count disagrees with exported rows"
                );
            }
        }

        Ok(Some(export))
    }

    /// Load the rows of one table. A missing file yields no rows.
    pub fn load_table(&self, table: &str) -> Result<Vec<RawRow>, SnapshotError> {
        match self.load_export(table)? {
            Some(export) => {
                debug!(table, rows = export.data.len(), "read table export");
                Ok(export.data)
            }
            None => {
                warn!(
                    table,
                    path = %self.table_path(table).display(),
                    "table export missing, treating as empty"
                );
                Ok(Vec::new())
            }
        }
    }
}

/// Parse with simd-json first, falling back to serde_json for its error messages
fn parse_export(content: Vec<u8>, table: &str) -> Result<SnapshotFile, SnapshotError> {
    // simd-json parses in place, so keep the original bytes for the fallback
    let mut scratch = content.clone();
    if let Ok(file) = simd_json::serde::from_slice::<SnapshotFile>(&mut scratch) {
        return Ok(file);
    }

    serde_json::from_slice::<SnapshotFile>(&content).map_err(|err| SnapshotError::Parse {
        table: table.to_string(),
        message: err.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn scratch_dir() -> PathBuf {
        let dir = std::env::temp_dir().join(format!("foundry-reader-{}", uuid::Uuid::new_v4()));
        std::fs::create_dir_all(&dir).unwrap();
        dir
    }

    #[test]
    fn test_load_table_export() {
        let dir = scratch_dir();
        let export = json!({
            "table_name": "developer",
            "exported_at": "2024-01-01T00:00:00Z",
            "row_count": 2,
            "columns": ["id", "developer_name"],
            "column_types": ["BIGINT", "VARCHAR"],
            "data": [
                {"id": 1, "developer_name": "Acme Builders"},
                {"id": "2", "developer_name": null}
            ]
        });
        std::fs::write(dir.join("developer.json"), export.to_string()).unwrap();

        let reader = SnapshotReader::open(&dir).unwrap();
        let rows = reader.load_table("developer").unwrap();

        assert_eq!(rows.len(), 2);
        // Values keep their JSON shape
        assert_eq!(rows[0]["id"], json!(1));
        assert_eq!(rows[1]["id"], json!("2"));
        assert_eq!(rows[1]["developer_name"], Value::Null);
    }

    #[test]
    fn test_missing_table_is_empty() {
        let dir = scratch_dir();
        let reader = SnapshotReader::open(&dir).unwrap();
        assert!(reader.load_table("faq").unwrap().is_empty());
        assert!(reader.load_export("faq").unwrap().is_none());
    }

    #[test]
    fn test_bare_row_array() {
        let dir = scratch_dir();
        std::fs::write(dir.join("city.json"), r#"[{"id": 7, "name": "Pune"}]"#).unwrap();

        let reader = SnapshotReader::open(&dir).unwrap();
        let export = reader.load_export("city").unwrap().unwrap();
        assert_eq!(export.table_name, "city");
        assert_eq!(export.data.len(), 1);
    }

    #[test]
    fn test_malformed_table_is_an_error() {
        let dir = scratch_dir();
        std::fs::write(dir.join("project.json"), "{not json").unwrap();

        let reader = SnapshotReader::open(&dir).unwrap();
        let err = reader.load_table("project").unwrap_err();
        assert!(matches!(err, SnapshotError::Parse { ref table, .. } if table == "project"));
    }

    #[test]
    fn test_open_missing_directory() {
        let dir = std::env::temp_dir().join(format!("foundry-absent-{}", uuid::Uuid::new_v4()));
        assert!(matches!(
            SnapshotReader::open(&dir),
            Err(SnapshotError::DirectoryMissing(_))
        ));
    }

    #[test]
    fn test_available_tables_sorted() {
        let dir = scratch_dir();
        std::fs::write(dir.join("project.json"), "[]").unwrap();
        std::fs::write(dir.join("amenity.json"), "[]").unwrap();
        std::fs::write(dir.join("notes.txt"), "ignored").unwrap();

        let reader = SnapshotReader::open(&dir).unwrap();
        assert_eq!(reader.available_tables().unwrap(), vec!["amenity", "project"]);
    }
}

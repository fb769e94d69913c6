use std::path::Path;

use rusqlite::{Connection, OpenFlags, OptionalExtension, params};

use crate::error::StorageError;
use crate::models::{PaperRecord, split_authors};

const SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS pdf_info (
    path TEXT PRIMARY KEY,
    title TEXT,
    authors TEXT
);
"#;

/// The paper catalog: one `pdf_info` row per PDF path.
///
/// Holds a single connection for its whole lifetime; it is closed on drop.
pub struct PaperStore {
    conn: Connection,
}

impl PaperStore {
    pub fn open(path: &Path) -> Result<Self, StorageError> {
        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent)?;
        }
        let conn = Connection::open(path)?;
        Self::init(conn)
    }

    /// Open a catalog that must already exist; nothing is created on disk.
    pub fn open_existing(path: &Path) -> Result<Self, StorageError> {
        if !path.is_file() {
            return Err(StorageError::NotFound(path.to_path_buf()));
        }
        let flags = OpenFlags::SQLITE_OPEN_READ_WRITE
            | OpenFlags::SQLITE_OPEN_URI
            | OpenFlags::SQLITE_OPEN_NO_MUTEX;
        let conn = Connection::open_with_flags(path, flags)?;
        Self::init(conn)
    }

    pub fn open_in_memory() -> Result<Self, StorageError> {
        Self::init(Connection::open_in_memory()?)
    }

    fn init(conn: Connection) -> Result<Self, StorageError> {
        conn.execute_batch(SCHEMA)?;
        Ok(Self { conn })
    }

    /// Insert a record, replacing any existing row for the same path.
    ///
    /// One autocommitted statement, so the row is durable on return.
    pub fn upsert(&self, record: &PaperRecord) -> Result<(), StorageError> {
        self.conn.execute(
            "INSERT OR REPLACE INTO pdf_info (path, title, authors) VALUES (?1, ?2, ?3)",
            params![record.path, record.title, record.authors_column()],
        )?;
        Ok(())
    }

    pub fn exists(&self, path: &str) -> Result<bool, StorageError> {
        let found = self
            .conn
            .query_row(
                "SELECT 1 FROM pdf_info WHERE path = ?1",
                params![path],
                |_| Ok(()),
            )
            .optional()?;
        Ok(found.is_some())
    }

    pub fn get(&self, path: &str) -> Result<Option<PaperRecord>, StorageError> {
        let record = self
            .conn
            .query_row(
                "SELECT path, title, authors FROM pdf_info WHERE path = ?1",
                params![path],
                row_to_record,
            )
            .optional()?;
        Ok(record)
    }

    pub fn list(&self) -> Result<Vec<PaperRecord>, StorageError> {
        let mut stmt = self
            .conn
            .prepare("SELECT path, title, authors FROM pdf_info ORDER BY path")?;
        let records = stmt
            .query_map([], row_to_record)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(records)
    }

    pub fn count(&self) -> Result<u64, StorageError> {
        let count: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM pdf_info", [], |row| row.get(0))?;
        Ok(count as u64)
    }
}

/// Title and authors are nullable for rows written by other tools.
fn row_to_record(row: &rusqlite::Row<'_>) -> rusqlite::Result<PaperRecord> {
    let title: Option<String> = row.get(1)?;
    let authors: Option<String> = row.get(2)?;
    Ok(PaperRecord {
        path: row.get(0)?,
        title: title.unwrap_or_default(),
        authors: authors.as_deref().map(split_authors).unwrap_or_default(),
    })
}

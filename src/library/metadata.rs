//! Book metadata lookup against the device's library database

use rusqlite::types::ValueRef;
use rusqlite::{params, Connection, OpenFlags, OptionalExtension};
use std::collections::HashMap;
use std::path::Path;

use crate::error::{AnnotationError, Result};

/// Identifier and display title of one library record
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BookRecord {
    pub id: String,
    pub title: String,
}

/// Point lookup of book metadata by raw device path
pub trait MetadataStore {
    /// Find the record stored for `raw_path`.
    ///
    /// Fails with [`AnnotationError::BookNotFound`] when nothing matches.
    fn lookup(&self, raw_path: &str) -> Result<BookRecord>;
}

/// Read-only view of the device's SQLite library database
pub struct SqliteMetadataStore {
    conn: Connection,
}

impl SqliteMetadataStore {
    /// Open the database without write access
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let conn = Connection::open_with_flags(
            path,
            OpenFlags::SQLITE_OPEN_READ_ONLY | OpenFlags::SQLITE_OPEN_NO_MUTEX,
        )?;
        Ok(Self { conn })
    }

    /// Wrap an existing connection
    pub fn from_connection(conn: Connection) -> Self {
        Self { conn }
    }
}

impl MetadataStore for SqliteMetadataStore {
    fn lookup(&self, raw_path: &str) -> Result<BookRecord> {
        // Paths are unique per record; if duplicates exist the first row wins.
        let record = self
            .conn
            .query_row(
                "SELECT id, title FROM books WHERE path = ?1",
                params![raw_path],
                |row| {
                    Ok(BookRecord {
                        id: value_to_string(row.get_ref(0)?),
                        title: value_to_string(row.get_ref(1)?),
                    })
                },
            )
            .optional()?;

        record.ok_or_else(|| AnnotationError::BookNotFound(raw_path.to_string()))
    }
}

/// The device stores ids as integers and titles as text; both are opaque here.
fn value_to_string(value: ValueRef<'_>) -> String {
    match value {
        ValueRef::Null => String::new(),
        ValueRef::Integer(i) => i.to_string(),
        ValueRef::Real(f) => f.to_string(),
        ValueRef::Text(t) | ValueRef::Blob(t) => String::from_utf8_lossy(t).into_owned(),
    }
}

/// Map-backed store for callers that already hold the metadata
#[derive(Debug, Clone, Default)]
pub struct InMemoryMetadataStore {
    records: HashMap<String, BookRecord>,
}

impl InMemoryMetadataStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, raw_path: &str, id: &str, title: &str) {
        self.records.insert(
            raw_path.to_string(),
            BookRecord {
                id: id.to_string(),
                title: title.to_string(),
            },
        );
    }
}

impl MetadataStore for InMemoryMetadataStore {
    fn lookup(&self, raw_path: &str) -> Result<BookRecord> {
        self.records
            .get(raw_path)
            .cloned()
            .ok_or_else(|| AnnotationError::BookNotFound(raw_path.to_string()))
    }
}

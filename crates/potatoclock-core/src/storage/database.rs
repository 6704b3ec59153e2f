//! SQLite-backed storage.
//!
//! Provides:
//! - A key-value table for the local fallback store and persisted timer state
//! - A document table backing [`crate::sync::SqliteAdapter`]

use rusqlite::{params, Connection, OptionalExtension};
use std::path::Path;

use crate::error::DatabaseError;

use super::data_dir;

/// SQLite database holding the `kv` and `documents` tables.
pub struct Database {
    conn: Connection,
}

impl std::fmt::Debug for Database {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Database").finish_non_exhaustive()
    }
}

impl Database {
    /// Get a reference to the underlying SQLite connection.
    pub fn conn(&self) -> &Connection {
        &self.conn
    }

    /// Open the database at `<data dir>/potatoclock.db`.
    ///
    /// Creates the database file and schema if they don't exist.
    pub fn open() -> Result<Self, crate::error::CoreError> {
        let path = data_dir()?.join("potatoclock.db");
        Ok(Self::open_at(&path)?)
    }

    /// Open (or create) a database file at `path`.
    pub fn open_at(path: &Path) -> Result<Self, DatabaseError> {
        let conn = Connection::open(path).map_err(|source| DatabaseError::OpenFailed {
            path: path.to_path_buf(),
            source,
        })?;
        let db = Self { conn };
        db.migrate()?;
        Ok(db)
    }

    /// Open an in-memory database.
    pub fn open_memory() -> Result<Self, DatabaseError> {
        let conn = Connection::open_in_memory()?;
        let db = Self { conn };
        db.migrate()?;
        Ok(db)
    }

    fn migrate(&self) -> Result<(), DatabaseError> {
        self.conn.execute_batch(
            "CREATE TABLE IF NOT EXISTS kv (
                key   TEXT PRIMARY KEY,
                value TEXT NOT NULL
            );

            CREATE TABLE IF NOT EXISTS documents (
                seq        INTEGER PRIMARY KEY AUTOINCREMENT,
                collection TEXT NOT NULL,
                doc_id     TEXT NOT NULL,
                data       TEXT NOT NULL,
                UNIQUE (collection, doc_id)
            );

            CREATE INDEX IF NOT EXISTS idx_documents_collection ON documents(collection, seq);",
        )?;
        Ok(())
    }

    /// Get a value from the kv store.
    pub fn kv_get(&self, key: &str) -> Result<Option<String>, DatabaseError> {
        let value = self
            .conn
            .query_row("SELECT value FROM kv WHERE key = ?1", params![key], |row| {
                row.get::<_, String>(0)
            })
            .optional()?;
        Ok(value)
    }

    /// Set a value in the kv store.
    pub fn kv_set(&self, key: &str, value: &str) -> Result<(), DatabaseError> {
        self.conn.execute(
            "INSERT OR REPLACE INTO kv (key, value) VALUES (?1, ?2)",
            params![key, value],
        )?;
        Ok(())
    }

    pub fn kv_delete(&self, key: &str) -> Result<(), DatabaseError> {
        self.conn
            .execute("DELETE FROM kv WHERE key = ?1", params![key])?;
        Ok(())
    }

    /// Fetch one document's JSON text.
    pub fn doc_get(&self, collection: &str, id: &str) -> Result<Option<String>, DatabaseError> {
        let value = self
            .conn
            .query_row(
                "SELECT data FROM documents WHERE collection = ?1 AND doc_id = ?2",
                params![collection, id],
                |row| row.get::<_, String>(0),
            )
            .optional()?;
        Ok(value)
    }

    /// Insert or overwrite a document. An existing document keeps its
    /// position in the collection.
    pub fn doc_put(&self, collection: &str, id: &str, data: &str) -> Result<(), DatabaseError> {
        self.conn.execute(
            "INSERT INTO documents (collection, doc_id, data) VALUES (?1, ?2, ?3)
             ON CONFLICT(collection, doc_id) DO UPDATE SET data = excluded.data",
            params![collection, id, data],
        )?;
        Ok(())
    }

    pub fn doc_delete(&self, collection: &str, id: &str) -> Result<(), DatabaseError> {
        self.conn.execute(
            "DELETE FROM documents WHERE collection = ?1 AND doc_id = ?2",
            params![collection, id],
        )?;
        Ok(())
    }

    /// All documents of a collection in insertion order.
    pub fn doc_list(&self, collection: &str) -> Result<Vec<(String, String)>, DatabaseError> {
        let mut stmt = self.conn.prepare(
            "SELECT doc_id, data FROM documents WHERE collection = ?1 ORDER BY seq",
        )?;
        let rows = stmt.query_map(params![collection], |row| {
            Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?))
        })?;
        let mut out = Vec::new();
        for row in rows {
            out.push(row?);
        }
        Ok(out)
    }
}

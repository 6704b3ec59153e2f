//! Local fallback persistence: JSON arrays under fixed kv keys.
//!
//! Used when no authenticated adapter session exists, and as the offline
//! fallback when a subscription fails.

use serde::de::DeserializeOwned;
use serde::Serialize;

use super::database::Database;
use crate::error::DatabaseError;
use crate::sync::CollectionKind;

#[derive(Debug)]
pub struct LocalStore {
    db: Database,
}

impl LocalStore {
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    /// Store backed by an in-memory database.
    pub fn in_memory() -> Result<Self, DatabaseError> {
        Ok(Self::new(Database::open_memory()?))
    }

    pub fn database(&self) -> &Database {
        &self.db
    }

    /// Read a collection. Missing or unparseable data yields an empty list.
    pub fn load<T: DeserializeOwned>(&self, kind: CollectionKind) -> Vec<T> {
        let raw = match self.db.kv_get(kind.local_key()) {
            Ok(Some(raw)) => raw,
            Ok(None) => return Vec::new(),
            Err(e) => {
                tracing::warn!(key = kind.local_key(), error = %e, "failed to read local collection");
                return Vec::new();
            }
        };
        match serde_json::from_str(&raw) {
            Ok(items) => items,
            Err(e) => {
                tracing::error!(key = kind.local_key(), error = %e, "error parsing local collection");
                Vec::new()
            }
        }
    }

    /// Overwrite a collection with `items`.
    pub fn save<T: Serialize>(&self, kind: CollectionKind, items: &[T]) -> Result<(), DatabaseError> {
        let json = serde_json::to_string(items)
            .map_err(|e| DatabaseError::QueryFailed(format!("encode {}: {e}", kind.local_key())))?;
        self.db.kv_set(kind.local_key(), &json)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::activity::{Activity, Category};

    #[test]
    fn save_and_load_round_trip_uses_fixed_key() {
        let store = LocalStore::in_memory().unwrap();
        let a = Activity::new("Walk", Category::Exercise, 30).unwrap();
        store.save(CollectionKind::Tasks, std::slice::from_ref(&a)).unwrap();

        let raw = store.database().kv_get("local_tasks").unwrap().unwrap();
        assert!(raw.starts_with('['));

        let loaded: Vec<Activity> = store.load(CollectionKind::Tasks);
        assert_eq!(loaded, vec![a]);
    }

    #[test]
    fn corrupt_json_loads_as_empty() {
        let store = LocalStore::in_memory().unwrap();
        store.database().kv_set("local_sessions", "{not json").unwrap();
        let loaded: Vec<crate::session::Session> = store.load(CollectionKind::Sessions);
        assert!(loaded.is_empty());
    }
}

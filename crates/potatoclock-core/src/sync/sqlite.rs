//! Document store backed by the `documents` table of a SQLite file.
//!
//! Stands in for a remote document database: records are stored per
//! collection path, merges ignore `null`, and subscribers get a full
//! snapshot after every change made through this handle.

use serde_json::Value;

use super::fanout::SubscriberSet;
use super::types::{
    merge_ignoring_nulls, CollectionPath, Document, PutMode, Snapshot, SnapshotStream,
    SyncAdapter, SyncError,
};
use crate::storage::Database;

#[derive(Debug)]
pub struct SqliteAdapter {
    db: Database,
    subscribers: SubscriberSet,
}

impl SqliteAdapter {
    pub fn new(db: Database) -> Self {
        Self {
            db,
            subscribers: SubscriberSet::default(),
        }
    }

    pub fn database(&self) -> &Database {
        &self.db
    }

    fn snapshot(&self, path: &CollectionPath) -> Result<Snapshot, SyncError> {
        let mut documents = Vec::new();
        for (id, raw) in self.db.doc_list(path.as_str())? {
            documents.push(Document {
                id,
                data: serde_json::from_str(&raw)?,
            });
        }
        Ok(Snapshot {
            path: path.clone(),
            documents,
        })
    }

    fn changed(&mut self, path: &CollectionPath) {
        match self.snapshot(path) {
            Ok(snapshot) => self.subscribers.notify(&snapshot),
            Err(e) => {
                tracing::warn!(path = %path, error = %e, "failed to build snapshot after write");
                self.subscribers.fail_all(&e);
            }
        }
    }
}

impl SyncAdapter for SqliteAdapter {
    fn name(&self) -> &str {
        "sqlite"
    }

    fn subscribe(&mut self, path: &CollectionPath) -> Result<SnapshotStream, SyncError> {
        let snapshot = self.snapshot(path)?;
        Ok(self.subscribers.add(snapshot))
    }

    fn put(
        &mut self,
        path: &CollectionPath,
        id: &str,
        record: Value,
        mode: PutMode,
    ) -> Result<(), SyncError> {
        let stored = match mode {
            PutMode::Merge => {
                let Some(raw) = self.db.doc_get(path.as_str(), id)? else {
                    return Err(SyncError::NotFound {
                        path: path.to_string(),
                        id: id.to_string(),
                    });
                };
                let mut existing: Value = serde_json::from_str(&raw)?;
                merge_ignoring_nulls(&mut existing, record);
                existing
            }
            PutMode::Replace => record,
        };
        self.db
            .doc_put(path.as_str(), id, &serde_json::to_string(&stored)?)?;
        self.changed(path);
        Ok(())
    }

    fn delete(&mut self, path: &CollectionPath, id: &str) -> Result<(), SyncError> {
        self.db.doc_delete(path.as_str(), id)?;
        self.changed(path);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn sessions() -> CollectionPath {
        CollectionPath::new("users/u1/sessions")
    }

    #[test]
    fn documents_survive_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("remote.db");
        {
            let mut adapter = SqliteAdapter::new(Database::open_at(&path).unwrap());
            adapter
                .put(&sessions(), "s1", json!({"taskTitle": "Write"}), PutMode::Replace)
                .unwrap();
        }
        let mut adapter = SqliteAdapter::new(Database::open_at(&path).unwrap());
        let mut stream = adapter.subscribe(&sessions()).unwrap();
        let snap = stream.try_recv().unwrap().unwrap();
        assert_eq!(snap.documents.len(), 1);
        assert_eq!(snap.documents[0].data["taskTitle"], "Write");
    }

    #[test]
    fn merge_ignores_nulls_and_replace_overwrites() {
        let mut adapter = SqliteAdapter::new(Database::open_memory().unwrap());
        let tasks = CollectionPath::new("users/u1/tasks");
        adapter
            .put(&tasks, "a", json!({"title": "x", "dayIndex": 3}), PutMode::Replace)
            .unwrap();
        adapter
            .put(&tasks, "a", json!({"dayIndex": null, "title": "y"}), PutMode::Merge)
            .unwrap();

        let mut stream = adapter.subscribe(&tasks).unwrap();
        let snap = stream.try_recv().unwrap().unwrap();
        assert_eq!(snap.documents[0].data, json!({"title": "y", "dayIndex": 3}));

        adapter
            .put(&tasks, "a", json!({"title": "y", "dayIndex": null}), PutMode::Replace)
            .unwrap();
        let snap = stream.try_recv().unwrap().unwrap();
        assert!(snap.documents[0].data["dayIndex"].is_null());

        adapter.delete(&tasks, "a").unwrap();
        let snap = stream.try_recv().unwrap().unwrap();
        assert!(snap.documents.is_empty());
    }

    #[test]
    fn merge_onto_missing_record_is_refused() {
        let mut adapter = SqliteAdapter::new(Database::open_memory().unwrap());
        let tasks = CollectionPath::new("users/u1/tasks");
        let err = adapter
            .put(&tasks, "gone", json!({"dayIndex": 2}), PutMode::Merge)
            .unwrap_err();
        assert!(matches!(err, SyncError::NotFound { .. }));

        let mut stream = adapter.subscribe(&tasks).unwrap();
        assert!(stream.try_recv().unwrap().unwrap().documents.is_empty());
    }
}

//! In-process document store.
//!
//! Behaves like a remote document database (merge ignores `null`, snapshots
//! after every change) and supports failure injection, so store behaviour
//! can be tested without a network. Cloning yields another handle to the
//! same documents.

use indexmap::IndexMap;
use serde_json::Value;
use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use super::fanout::SubscriberSet;
use super::types::{
    merge_ignoring_nulls, CollectionPath, Document, PutMode, Snapshot, SnapshotStream,
    SyncAdapter, SyncError,
};

#[derive(Debug, Default)]
struct Inner {
    collections: HashMap<CollectionPath, IndexMap<String, Value>>,
    subscribers: SubscriberSet,
    reject_writes: Option<String>,
    deny_subscribe: bool,
    write_count: usize,
}

impl Inner {
    fn snapshot(&self, path: &CollectionPath) -> Snapshot {
        let documents = self
            .collections
            .get(path)
            .map(|docs| {
                docs.iter()
                    .map(|(id, data)| Document {
                        id: id.clone(),
                        data: data.clone(),
                    })
                    .collect()
            })
            .unwrap_or_default();
        Snapshot {
            path: path.clone(),
            documents,
        }
    }

    fn check_writable(&self, path: &CollectionPath, id: &str) -> Result<(), SyncError> {
        match &self.reject_writes {
            Some(message) => Err(SyncError::Rejected {
                path: path.to_string(),
                id: id.to_string(),
                message: message.clone(),
            }),
            None => Ok(()),
        }
    }

    fn changed(&mut self, path: &CollectionPath) {
        self.write_count += 1;
        let snapshot = self.snapshot(path);
        self.subscribers.notify(&snapshot);
    }
}

#[derive(Debug, Clone, Default)]
pub struct MemoryAdapter {
    inner: Rc<RefCell<Inner>>,
}

impl MemoryAdapter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reject every subsequent write with `message`.
    pub fn reject_writes(&self, message: impl Into<String>) {
        self.inner.borrow_mut().reject_writes = Some(message.into());
    }

    /// Accept writes again.
    pub fn accept_writes(&self) {
        self.inner.borrow_mut().reject_writes = None;
    }

    /// Refuse new subscriptions.
    pub fn deny_subscriptions(&self) {
        self.inner.borrow_mut().deny_subscribe = true;
    }

    /// Terminate all open subscriptions with a permission error.
    pub fn revoke_access(&self, message: impl Into<String>) {
        let err = SyncError::PermissionDenied(message.into());
        self.inner.borrow_mut().subscribers.fail_all(&err);
    }

    pub fn document(&self, path: &CollectionPath, id: &str) -> Option<Value> {
        self.inner
            .borrow()
            .collections
            .get(path)
            .and_then(|docs| docs.get(id).cloned())
    }

    pub fn len(&self, path: &CollectionPath) -> usize {
        self.inner
            .borrow()
            .collections
            .get(path)
            .map(IndexMap::len)
            .unwrap_or(0)
    }

    pub fn is_empty(&self, path: &CollectionPath) -> bool {
        self.len(path) == 0
    }

    /// Number of successful writes so far.
    pub fn write_count(&self) -> usize {
        self.inner.borrow().write_count
    }

    pub fn subscriber_count(&self, path: &CollectionPath) -> usize {
        self.inner.borrow().subscribers.count(path)
    }
}

impl SyncAdapter for MemoryAdapter {
    fn name(&self) -> &str {
        "memory"
    }

    fn subscribe(&mut self, path: &CollectionPath) -> Result<SnapshotStream, SyncError> {
        let mut inner = self.inner.borrow_mut();
        if inner.deny_subscribe {
            return Err(SyncError::PermissionDenied(path.to_string()));
        }
        let snapshot = inner.snapshot(path);
        Ok(inner.subscribers.add(snapshot))
    }

    fn put(
        &mut self,
        path: &CollectionPath,
        id: &str,
        record: Value,
        mode: PutMode,
    ) -> Result<(), SyncError> {
        let mut inner = self.inner.borrow_mut();
        inner.check_writable(path, id)?;
        match mode {
            PutMode::Merge => {
                let existing = inner
                    .collections
                    .get_mut(path)
                    .and_then(|docs| docs.get_mut(id))
                    .ok_or_else(|| SyncError::NotFound {
                        path: path.to_string(),
                        id: id.to_string(),
                    })?;
                merge_ignoring_nulls(existing, record);
            }
            // Overwriting an existing key keeps its position.
            PutMode::Replace => {
                inner
                    .collections
                    .entry(path.clone())
                    .or_default()
                    .insert(id.to_string(), record);
            }
        }
        inner.changed(path);
        Ok(())
    }

    fn delete(&mut self, path: &CollectionPath, id: &str) -> Result<(), SyncError> {
        let mut inner = self.inner.borrow_mut();
        inner.check_writable(path, id)?;
        if let Some(docs) = inner.collections.get_mut(path) {
            docs.shift_remove(id);
        }
        inner.changed(path);
        Ok(())
    }
}

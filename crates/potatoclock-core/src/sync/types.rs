//! Core types for the sync adapter contract.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use tokio::sync::mpsc::UnboundedReceiver;

use crate::activity::Activity;
use crate::review::DailyReview;
use crate::session::Session;

/// Collections managed by the activity store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CollectionKind {
    Tasks,
    Sessions,
    Reviews,
}

impl CollectionKind {
    pub const ALL: [CollectionKind; 3] = [
        CollectionKind::Tasks,
        CollectionKind::Sessions,
        CollectionKind::Reviews,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Tasks => "tasks",
            Self::Sessions => "sessions",
            Self::Reviews => "reviews",
        }
    }

    /// Key of the JSON array in the local fallback store.
    pub fn local_key(&self) -> &'static str {
        match self {
            Self::Tasks => "local_tasks",
            Self::Sessions => "local_sessions",
            Self::Reviews => "local_reviews",
        }
    }
}

/// Document collection address, e.g. `users/u1/tasks`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CollectionPath(String);

impl CollectionPath {
    pub fn new(path: impl Into<String>) -> Self {
        Self(path.into())
    }

    pub fn for_user(uid: &str, kind: CollectionKind) -> Self {
        Self(format!("users/{uid}/{}", kind.as_str()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CollectionPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// How a `put` combines with an existing record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PutMode {
    /// Shallow field merge. `null` fields are ignored, so a merge can never
    /// remove a field from the stored record. Fails with
    /// [`SyncError::NotFound`] when the record does not exist.
    Merge,
    /// Whole-record overwrite.
    Replace,
}

/// Durable operation reported in persistence events.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WriteOp {
    Merge,
    Replace,
    Delete,
}

impl From<PutMode> for WriteOp {
    fn from(mode: PutMode) -> Self {
        match mode {
            PutMode::Merge => WriteOp::Merge,
            PutMode::Replace => WriteOp::Replace,
        }
    }
}

/// One stored document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Document {
    pub id: String,
    pub data: Value,
}

/// Full contents of a collection at one point in time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    pub path: CollectionPath,
    pub documents: Vec<Document>,
}

impl Snapshot {
    /// Decode every document, injecting the document id. Undecodable
    /// documents are skipped with a warning.
    pub fn decode<T: DeserializeOwned>(&self) -> Vec<T> {
        self.documents
            .iter()
            .filter_map(|doc| {
                let mut data = doc.data.clone();
                if let Some(obj) = data.as_object_mut() {
                    obj.insert("id".into(), Value::String(doc.id.clone()));
                }
                match serde_json::from_value(data) {
                    Ok(v) => Some(v),
                    Err(e) => {
                        tracing::warn!(path = %self.path, id = %doc.id, error = %e, "skipping undecodable document");
                        None
                    }
                }
            })
            .collect()
    }
}

/// Asynchronous stream of snapshots for one collection.
pub type SnapshotStream = UnboundedReceiver<Result<Snapshot, SyncError>>;

/// Durable storage behind a uniform interface.
///
/// Every call may fail; callers log failures and never propagate them into
/// gesture or timer handling.
pub trait SyncAdapter {
    /// Short backend name for logs.
    fn name(&self) -> &str;

    /// Subscribe to full-collection snapshots. The current contents are
    /// delivered immediately, then once after every change.
    fn subscribe(&mut self, path: &CollectionPath) -> Result<SnapshotStream, SyncError>;

    fn put(
        &mut self,
        path: &CollectionPath,
        id: &str,
        record: Value,
        mode: PutMode,
    ) -> Result<(), SyncError>;

    fn delete(&mut self, path: &CollectionPath, id: &str) -> Result<(), SyncError>;
}

/// Entity stored through the sync contract.
pub trait SyncRecord: Serialize + DeserializeOwned + Clone {
    const KIND: CollectionKind;
    /// Keys that must be present as explicit `null` when unset.
    const OPTIONAL_FIELDS: &'static [&'static str];

    fn record_id(&self) -> &str;

    fn to_wire(&self) -> Result<Value, SyncError> {
        Ok(sanitize(serde_json::to_value(self)?, Self::OPTIONAL_FIELDS))
    }
}

impl SyncRecord for Activity {
    const KIND: CollectionKind = CollectionKind::Tasks;
    const OPTIONAL_FIELDS: &'static [&'static str] = &["startMinutes", "dayIndex"];

    fn record_id(&self) -> &str {
        &self.id
    }
}

impl SyncRecord for Session {
    const KIND: CollectionKind = CollectionKind::Sessions;
    const OPTIONAL_FIELDS: &'static [&'static str] = &["taskId", "interruptionReason"];

    fn record_id(&self) -> &str {
        &self.id
    }
}

impl SyncRecord for DailyReview {
    const KIND: CollectionKind = CollectionKind::Reviews;
    const OPTIONAL_FIELDS: &'static [&'static str] = &[];

    fn record_id(&self) -> &str {
        &self.id
    }
}

/// Normalize a record before it is handed to an adapter: every optional
/// key becomes an explicit `null` when absent.
pub fn sanitize(mut record: Value, optional_fields: &[&str]) -> Value {
    if let Some(obj) = record.as_object_mut() {
        for key in optional_fields {
            obj.entry(key.to_string()).or_insert(Value::Null);
        }
    }
    record
}

/// Apply a shallow merge, skipping `null` values.
pub(crate) fn merge_ignoring_nulls(target: &mut Value, patch: Value) {
    match patch {
        Value::Object(fields) if target.is_object() => {
            if let Some(obj) = target.as_object_mut() {
                for (k, v) in fields {
                    if !v.is_null() {
                        obj.insert(k, v);
                    }
                }
            }
        }
        patch => *target = patch,
    }
}

/// Sync error types.
#[derive(Debug, Clone, thiserror::Error)]
pub enum SyncError {
    #[error("Write rejected for {path}/{id}: {message}")]
    Rejected {
        path: String,
        id: String,
        message: String,
    },

    #[error("No record {path}/{id} to update")]
    NotFound { path: String, id: String },

    #[error("Permission denied for {0}")]
    PermissionDenied(String),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl From<serde_json::Error> for SyncError {
    fn from(err: serde_json::Error) -> Self {
        SyncError::Serialization(err.to_string())
    }
}

impl From<crate::error::DatabaseError> for SyncError {
    fn from(err: crate::error::DatabaseError) -> Self {
        SyncError::Storage(err.to_string())
    }
}

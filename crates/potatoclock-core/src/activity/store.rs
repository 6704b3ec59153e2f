//! In-memory activities, sessions and reviews with optimistic persistence.
//!
//! Every mutation is applied to memory immediately and queued in the
//! outbox. [`ActivityStore::flush`] hands the queue to durable storage and
//! reports each outcome on the event stream. Failed writes are logged and
//! never rolled back.

use chrono::{DateTime, NaiveDate, Utc};
use serde_json::{json, Value};
use tokio::sync::mpsc::error::TryRecvError;
use tokio::sync::mpsc::UnboundedReceiver;

use super::{Activity, ActivityDraft, ActivityPatch, CreateMode, Placement};
use crate::error::{DatabaseError, ValidationError};
use crate::events::{Event, EventBus};
use crate::review::DailyReview;
use crate::session::{Session, SessionSink, SessionType};
use crate::storage::LocalStore;
use crate::sync::types::merge_ignoring_nulls;
use crate::sync::{
    CollectionKind, CollectionPath, PutMode, Snapshot, SnapshotStream, SyncAdapter, SyncRecord,
    WriteOp,
};

/// Who the store is acting for.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum SessionContext {
    #[default]
    Anonymous,
    User { uid: String },
}

impl SessionContext {
    pub fn user(uid: impl Into<String>) -> Self {
        SessionContext::User { uid: uid.into() }
    }

    pub fn uid(&self) -> Option<&str> {
        match self {
            SessionContext::Anonymous => None,
            SessionContext::User { uid } => Some(uid.as_str()),
        }
    }
}

/// Durable storage for a store.
pub enum Backend {
    /// Document store for a signed-in user. `fallback` takes over when a
    /// subscription fails.
    Remote {
        adapter: Box<dyn SyncAdapter>,
        fallback: LocalStore,
    },
    /// Anonymous, device-local persistence.
    Local(LocalStore),
}

enum PendingOp {
    Put { record: Value, mode: PutMode },
    Delete,
}

impl PendingOp {
    fn write_op(&self) -> WriteOp {
        match self {
            PendingOp::Put { mode, .. } => (*mode).into(),
            PendingOp::Delete => WriteOp::Delete,
        }
    }
}

struct PendingWrite {
    kind: CollectionKind,
    id: String,
    op: PendingOp,
}

struct RemoteLink {
    adapter: Box<dyn SyncAdapter>,
    uid: String,
    streams: Vec<(CollectionKind, SnapshotStream)>,
}

/// Outcome counts of one [`ActivityStore::flush`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FlushSummary {
    pub persisted: usize,
    pub failed: usize,
}

pub struct ActivityStore {
    context: SessionContext,
    local: LocalStore,
    remote: Option<RemoteLink>,
    offline: bool,
    activities: Vec<Activity>,
    sessions: Vec<Session>,
    reviews: Vec<DailyReview>,
    outbox: Vec<PendingWrite>,
    events: EventBus,
}

impl std::fmt::Debug for ActivityStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ActivityStore")
            .field("context", &self.context)
            .field("backend", &self.backend_name())
            .field("offline", &self.offline)
            .field("activities", &self.activities.len())
            .field("sessions", &self.sessions.len())
            .field("reviews", &self.reviews.len())
            .field("pending", &self.outbox.len())
            .finish()
    }
}

impl ActivityStore {
    /// Open a store. A remote backend is subscribed to right away and its
    /// initial snapshots are applied; if subscribing fails the store starts
    /// offline on the fallback.
    pub fn new(context: SessionContext, backend: Backend) -> Self {
        let uid = context.uid().map(str::to_string);
        let (local, adapter) = match backend {
            Backend::Local(local) => (local, None),
            Backend::Remote { adapter, fallback } => (fallback, Some(adapter)),
        };
        let mut store = Self {
            context,
            local,
            remote: None,
            offline: false,
            activities: Vec::new(),
            sessions: Vec::new(),
            reviews: Vec::new(),
            outbox: Vec::new(),
            events: EventBus::new(),
        };
        match (adapter, uid) {
            (Some(adapter), Some(uid)) => store.connect(adapter, uid),
            (Some(adapter), None) => {
                tracing::warn!(
                    adapter = adapter.name(),
                    "no signed-in user, using local storage"
                );
                store.load_local();
            }
            (None, _) => store.load_local(),
        }
        store
    }

    fn connect(&mut self, mut adapter: Box<dyn SyncAdapter>, uid: String) {
        let mut streams = Vec::with_capacity(CollectionKind::ALL.len());
        for kind in CollectionKind::ALL {
            let path = CollectionPath::for_user(&uid, kind);
            match adapter.subscribe(&path) {
                Ok(stream) => streams.push((kind, stream)),
                Err(e) => {
                    self.go_offline(format!("subscribe {path}: {e}"));
                    return;
                }
            }
        }
        tracing::info!(adapter = adapter.name(), %uid, "subscribed to remote collections");
        self.remote = Some(RemoteLink {
            adapter,
            uid,
            streams,
        });
        self.sync_snapshots();
    }

    fn load_local(&mut self) {
        self.activities = self.local.load(CollectionKind::Tasks);
        self.sessions = self.local.load(CollectionKind::Sessions);
        self.reviews = self.local.load(CollectionKind::Reviews);
        tracing::debug!(
            activities = self.activities.len(),
            sessions = self.sessions.len(),
            reviews = self.reviews.len(),
            "loaded local collections"
        );
    }

    fn go_offline(&mut self, reason: String) {
        tracing::warn!(%reason, "remote subscription failed, falling back to local storage");
        self.remote = None;
        self.offline = true;
        self.load_local();
        self.events.publish(Event::WentOffline {
            reason,
            at: Utc::now(),
        });
    }

    pub fn subscribe_events(&mut self) -> UnboundedReceiver<Event> {
        self.events.subscribe()
    }

    pub fn context(&self) -> &SessionContext {
        &self.context
    }

    /// True after a subscription failure forced the switch to local storage.
    pub fn is_offline(&self) -> bool {
        self.offline
    }

    pub fn backend_name(&self) -> &str {
        match &self.remote {
            Some(link) => link.adapter.name(),
            None => "local",
        }
    }

    pub fn pending_writes(&self) -> usize {
        self.outbox.len()
    }

    // Queries

    pub fn get(&self, id: &str) -> Option<&Activity> {
        self.activities.iter().find(|a| a.id == id)
    }

    /// All activities in insertion order.
    pub fn activities(&self) -> &[Activity] {
        &self.activities
    }

    pub fn inbox(&self) -> Vec<&Activity> {
        self.activities.iter().filter(|a| !a.is_scheduled()).collect()
    }

    pub fn scheduled_on(&self, day_index: u8) -> Vec<&Activity> {
        self.activities
            .iter()
            .filter(|a| a.day_index() == Some(day_index))
            .collect()
    }

    pub fn sessions(&self) -> &[Session] {
        &self.sessions
    }

    pub fn reviews(&self) -> &[DailyReview] {
        &self.reviews
    }

    pub fn review_for(&self, date: NaiveDate) -> Option<&DailyReview> {
        self.reviews.iter().find(|r| r.date == date)
    }

    // Activity mutations

    /// Add the activities described by `draft` and `mode`. Returns the new ids.
    pub fn add(
        &mut self,
        draft: &ActivityDraft,
        mode: &CreateMode,
    ) -> Result<Vec<String>, ValidationError> {
        let created = draft.build(mode)?;
        Ok(created.into_iter().map(|a| self.create(a)).collect())
    }

    /// Insert a fully built activity. An existing activity with the same id
    /// is replaced in place.
    pub fn create(&mut self, activity: Activity) -> String {
        let id = activity.id.clone();
        self.queue_record(&activity, PutMode::Replace);
        match self.position(&id) {
            Some(idx) => self.activities[idx] = activity,
            None => self.activities.push(activity),
        }
        tracing::debug!(%id, "activity created");
        id
    }

    /// Move an activity onto the grid. Only the placement changes.
    pub fn reschedule(&mut self, id: &str, placement: Placement) -> bool {
        let Some(idx) = self.find(id) else {
            return false;
        };
        self.activities[idx].scheduled = Some(placement);
        self.enqueue(
            CollectionKind::Tasks,
            id,
            PendingOp::Put {
                record: json!({
                    "dayIndex": placement.day_index,
                    "startMinutes": placement.start_minutes,
                }),
                mode: PutMode::Merge,
            },
        );
        true
    }

    /// Move an activity back to the inbox.
    ///
    /// Persisted as a whole-record replace: a merge cannot clear fields on
    /// backends that ignore `null`.
    pub fn unschedule(&mut self, id: &str) -> bool {
        let Some(idx) = self.find(id) else {
            return false;
        };
        self.activities[idx].scheduled = None;
        let record = self.activities[idx].clone();
        self.queue_record(&record, PutMode::Replace);
        true
    }

    /// Change the duration and recompute the estimate.
    pub fn resize(&mut self, id: &str, duration_minutes: u32) -> Result<bool, ValidationError> {
        self.edit(
            id,
            &ActivityPatch {
                duration_minutes: Some(duration_minutes),
                ..ActivityPatch::default()
            },
        )
    }

    pub fn edit(&mut self, id: &str, patch: &ActivityPatch) -> Result<bool, ValidationError> {
        let Some(idx) = self.find(id) else {
            return Ok(false);
        };
        self.activities[idx].apply(patch)?;
        if patch.is_empty() {
            return Ok(true);
        }
        let wire = self.activities[idx]
            .to_wire()
            .map_err(|e| ValidationError::invalid("activity", e.to_string()))?;
        let record = pick(
            &wire,
            &["title", "category", "status", "duration", "estimatedPomodoros"],
        );
        self.enqueue(
            CollectionKind::Tasks,
            id,
            PendingOp::Put {
                record,
                mode: PutMode::Merge,
            },
        );
        Ok(true)
    }

    pub fn remove(&mut self, id: &str) -> bool {
        let Some(idx) = self.find(id) else {
            return false;
        };
        self.activities.remove(idx);
        self.enqueue(CollectionKind::Tasks, id, PendingOp::Delete);
        true
    }

    // Sessions and reviews

    /// Record a session entered by hand. With a linked activity and no
    /// title, the activity's title is used.
    pub fn log_manual_session(
        &mut self,
        task_id: Option<&str>,
        title: Option<&str>,
        session_type: SessionType,
        start_time: DateTime<Utc>,
        end_time: DateTime<Utc>,
        duration_minutes: Option<u32>,
    ) -> Result<String, ValidationError> {
        let linked = task_id.and_then(|id| self.get(id));
        if let (Some(id), None) = (task_id, linked) {
            return Err(ValidationError::invalid(
                "taskId",
                format!("no activity with id {id}"),
            ));
        }
        let title = match (title, linked) {
            (Some(t), _) => t.to_string(),
            (None, Some(a)) => a.title.clone(),
            (None, None) => String::new(),
        };
        let session = Session::manual(
            task_id.map(str::to_string),
            title,
            session_type,
            start_time,
            end_time,
            duration_minutes,
        )?;
        let id = session.id.clone();
        self.append_session(session);
        Ok(id)
    }

    pub fn remove_session(&mut self, id: &str) -> bool {
        let Some(idx) = self.sessions.iter().position(|s| s.id == id) else {
            tracing::debug!(%id, "unknown session");
            return false;
        };
        self.sessions.remove(idx);
        self.enqueue(CollectionKind::Sessions, id, PendingOp::Delete);
        true
    }

    /// Save a review, replacing any earlier review for the same date.
    pub fn record_review(&mut self, review: DailyReview) {
        self.queue_record(&review, PutMode::Replace);
        match self.reviews.iter().position(|r| r.id == review.id) {
            Some(idx) => self.reviews[idx] = review,
            None => self.reviews.push(review),
        }
    }

    // Phase two

    /// Write every queued change to durable storage.
    pub fn flush(&mut self) -> FlushSummary {
        let pending = std::mem::take(&mut self.outbox);
        if pending.is_empty() {
            return FlushSummary::default();
        }

        let mut outcomes: Vec<(CollectionKind, String, WriteOp, Result<(), String>)> =
            Vec::with_capacity(pending.len());
        match self.remote.as_mut() {
            Some(link) => {
                for write in pending {
                    let path = CollectionPath::for_user(&link.uid, write.kind);
                    let op = write.op.write_op();
                    let result = match write.op {
                        PendingOp::Put { record, mode } => {
                            link.adapter.put(&path, &write.id, record, mode)
                        }
                        PendingOp::Delete => link.adapter.delete(&path, &write.id),
                    };
                    outcomes.push((write.kind, write.id, op, result.map_err(|e| e.to_string())));
                }
            }
            None => {
                for kind in CollectionKind::ALL {
                    if !pending.iter().any(|w| w.kind == kind) {
                        continue;
                    }
                    let result = self.save_local(kind).map_err(|e| e.to_string());
                    for write in pending.iter().filter(|w| w.kind == kind) {
                        outcomes.push((kind, write.id.clone(), write.op.write_op(), result.clone()));
                    }
                }
            }
        }

        let mut summary = FlushSummary::default();
        let at = Utc::now();
        for (collection, id, op, result) in outcomes {
            match result {
                Ok(()) => {
                    summary.persisted += 1;
                    self.events.publish(Event::Persisted {
                        collection,
                        id,
                        op,
                        at,
                    });
                }
                Err(error) => {
                    summary.failed += 1;
                    tracing::warn!(
                        collection = collection.as_str(),
                        %id,
                        ?op,
                        %error,
                        "failed to persist change"
                    );
                    self.events.publish(Event::PersistFailed {
                        collection,
                        id,
                        op,
                        error,
                        at,
                    });
                }
            }
        }
        summary
    }

    fn save_local(&self, kind: CollectionKind) -> Result<(), DatabaseError> {
        match kind {
            CollectionKind::Tasks => self.local.save(kind, &self.activities),
            CollectionKind::Sessions => self.local.save(kind, &self.sessions),
            CollectionKind::Reviews => self.local.save(kind, &self.reviews),
        }
    }

    /// Apply every snapshot delivered since the last call. A subscription
    /// error switches the store to local storage. Returns the number of
    /// snapshots applied.
    pub fn sync_snapshots(&mut self) -> usize {
        let Some(link) = self.remote.as_mut() else {
            return 0;
        };

        let mut received: Vec<(CollectionKind, Snapshot)> = Vec::new();
        let mut failure = None;
        'streams: for (kind, stream) in link.streams.iter_mut() {
            loop {
                match stream.try_recv() {
                    Ok(Ok(snapshot)) => received.push((*kind, snapshot)),
                    Ok(Err(e)) => {
                        failure = Some(format!("{} subscription: {e}", kind.as_str()));
                        break 'streams;
                    }
                    Err(TryRecvError::Empty) => break,
                    Err(TryRecvError::Disconnected) => {
                        tracing::debug!(collection = kind.as_str(), "snapshot stream closed");
                        break;
                    }
                }
            }
        }

        if let Some(reason) = failure {
            self.go_offline(reason);
            return 0;
        }

        let applied = received.len();
        for (kind, snapshot) in received {
            self.apply_snapshot(kind, &snapshot);
        }
        applied
    }

    fn apply_snapshot(&mut self, kind: CollectionKind, snapshot: &Snapshot) {
        let count = match kind {
            CollectionKind::Tasks => {
                self.activities = snapshot.decode();
                self.activities.len()
            }
            CollectionKind::Sessions => {
                self.sessions = snapshot.decode();
                self.sessions.len()
            }
            CollectionKind::Reviews => {
                self.reviews = snapshot.decode();
                self.reviews.len()
            }
        };
        tracing::debug!(collection = kind.as_str(), count, "applied snapshot");
        self.events.publish(Event::SnapshotApplied {
            collection: kind,
            count,
            at: Utc::now(),
        });
    }

    // Outbox

    fn queue_record<T: SyncRecord>(&mut self, record: &T, mode: PutMode) {
        match record.to_wire() {
            Ok(value) => self.enqueue(
                T::KIND,
                record.record_id(),
                PendingOp::Put {
                    record: value,
                    mode,
                },
            ),
            Err(e) => tracing::warn!(
                collection = T::KIND.as_str(),
                id = record.record_id(),
                error = %e,
                "failed to encode record, change stays in memory only"
            ),
        }
    }

    /// Queue a write. Writes to the same record coalesce: a merge folds
    /// into whatever is already queued, anything else supersedes it.
    fn enqueue(&mut self, kind: CollectionKind, id: &str, op: PendingOp) {
        if let Some(existing) = self
            .outbox
            .iter_mut()
            .find(|w| w.kind == kind && w.id == id)
        {
            let previous = std::mem::replace(&mut existing.op, PendingOp::Delete);
            existing.op = match (previous, op) {
                (
                    PendingOp::Put {
                        record: mut base,
                        mode,
                    },
                    PendingOp::Put {
                        record,
                        mode: PutMode::Merge,
                    },
                ) => {
                    merge_ignoring_nulls(&mut base, record);
                    PendingOp::Put { record: base, mode }
                }
                (_, newer) => newer,
            };
            return;
        }
        self.outbox.push(PendingWrite {
            kind,
            id: id.to_string(),
            op,
        });
    }

    fn position(&self, id: &str) -> Option<usize> {
        self.activities.iter().position(|a| a.id == id)
    }

    fn find(&self, id: &str) -> Option<usize> {
        let idx = self.position(id);
        if idx.is_none() {
            tracing::debug!(%id, "unknown activity");
        }
        idx
    }
}

impl SessionSink for ActivityStore {
    fn append_session(&mut self, session: Session) {
        self.queue_record(&session, PutMode::Replace);
        self.sessions.push(session);
    }
}

fn pick(record: &Value, keys: &[&str]) -> Value {
    let mut out = serde_json::Map::new();
    for key in keys {
        if let Some(v) = record.get(*key) {
            out.insert((*key).to_string(), v.clone());
        }
    }
    Value::Object(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::activity::{Category, TaskStatus};
    use crate::sync::MemoryAdapter;

    fn local_store() -> ActivityStore {
        ActivityStore::new(
            SessionContext::Anonymous,
            Backend::Local(LocalStore::in_memory().unwrap()),
        )
    }

    fn remote_store(adapter: &MemoryAdapter) -> ActivityStore {
        ActivityStore::new(
            SessionContext::user("u1"),
            Backend::Remote {
                adapter: Box::new(adapter.clone()),
                fallback: LocalStore::in_memory().unwrap(),
            },
        )
    }

    fn tasks_path() -> CollectionPath {
        CollectionPath::for_user("u1", CollectionKind::Tasks)
    }

    fn drain(rx: &mut UnboundedReceiver<Event>) -> Vec<Event> {
        let mut out = Vec::new();
        while let Ok(ev) = rx.try_recv() {
            out.push(ev);
        }
        out
    }

    #[test]
    fn add_modes_create_inbox_or_scheduled_entries() {
        let mut store = local_store();
        let draft = ActivityDraft::new("Stretch", Category::Exercise);

        let ids = store.add(&draft, &CreateMode::Copies(3)).unwrap();
        assert_eq!(ids.len(), 3);
        assert_eq!(store.inbox().len(), 3);

        store
            .add(&draft, &CreateMode::Weekdays(vec![1, 3, 5]))
            .unwrap();
        assert_eq!(store.scheduled_on(3).len(), 1);
        assert_eq!(store.scheduled_on(3)[0].start_minutes(), Some(540));

        let empty = ActivityDraft::new("  ", Category::Work);
        assert_eq!(
            store.add(&empty, &CreateMode::Single),
            Err(ValidationError::EmptyTitle)
        );
        assert_eq!(store.activities().len(), 6);
    }

    #[test]
    fn reschedule_changes_only_the_placement() {
        let mut store = local_store();
        let id = store.create(Activity::new("Report", Category::Work, 60).unwrap());
        let before = store.get(&id).unwrap().clone();

        assert!(store.reschedule(&id, Placement::new(2, 600).unwrap()));
        let placement = Placement::new(2, 600).unwrap();
        let after = store.get(&id).unwrap();
        assert_eq!(
            *after,
            Activity {
                scheduled: Some(placement),
                ..before.clone()
            }
        );

        // Stored form differs only in the placement fields.
        let strip = |a: &Activity| {
            let mut wire = serde_json::to_value(a).unwrap();
            let fields = wire.as_object_mut().unwrap();
            fields.remove("dayIndex");
            fields.remove("startMinutes");
            wire
        };
        assert_eq!(strip(after), strip(&before));

        assert!(!store.reschedule("missing", Placement::new(2, 600).unwrap()));
    }

    #[test]
    fn edit_rejects_empty_title_without_mutating() {
        let mut store = local_store();
        let id = store.create(Activity::new("Report", Category::Work, 60).unwrap());
        let patch = ActivityPatch {
            title: Some(" ".into()),
            duration_minutes: Some(90),
            ..ActivityPatch::default()
        };
        assert_eq!(store.edit(&id, &patch), Err(ValidationError::EmptyTitle));
        assert_eq!(store.get(&id).unwrap().duration_minutes, 60);

        let patch = ActivityPatch {
            status: Some(TaskStatus::Completed),
            duration_minutes: Some(90),
            ..ActivityPatch::default()
        };
        assert_eq!(store.edit(&id, &patch), Ok(true));
        let a = store.get(&id).unwrap();
        assert_eq!(a.status, TaskStatus::Completed);
        assert_eq!(a.progress.estimated, 3.0);
    }

    #[test]
    fn local_flush_writes_whole_collections() {
        let mut store = local_store();
        let mut events = store.subscribe_events();
        let id = store.create(Activity::new("Read", Category::Personal, 30).unwrap());
        store.reschedule(&id, Placement::new(0, 420).unwrap());
        assert_eq!(store.pending_writes(), 1);

        let summary = store.flush();
        assert_eq!(summary, FlushSummary { persisted: 1, failed: 0 });
        let events = drain(&mut events);
        assert!(matches!(
            events.as_slice(),
            [Event::Persisted { collection: CollectionKind::Tasks, op: WriteOp::Replace, .. }]
        ));

        let saved: Vec<Activity> = store.local.load(CollectionKind::Tasks);
        assert_eq!(saved[0].start_minutes(), Some(420));
    }

    #[test]
    fn merges_fold_into_a_queued_replace() {
        let adapter = MemoryAdapter::new();
        let mut store = remote_store(&adapter);
        let id = store.create(Activity::new("Gym", Category::Exercise, 60).unwrap());
        store.reschedule(&id, Placement::new(4, 1080).unwrap());
        store.resize(&id, 90).unwrap();
        assert_eq!(store.pending_writes(), 1);

        store.flush();
        let doc = adapter.document(&tasks_path(), &id).unwrap();
        assert_eq!(doc["dayIndex"], 4);
        assert_eq!(doc["startMinutes"], 1080);
        assert_eq!(doc["duration"], 90);
        assert_eq!(doc["estimatedPomodoros"], 3.0);
    }

    #[test]
    fn unschedule_survives_a_null_ignoring_backend() {
        let adapter = MemoryAdapter::new();
        let mut store = remote_store(&adapter);
        let id = store.create(
            Activity::new("Write report", Category::Work, 60)
                .unwrap()
                .with_placement(Placement::new(1, 600).unwrap()),
        );
        store.flush();
        store.sync_snapshots();

        assert!(store.unschedule(&id));
        store.flush();
        assert_eq!(store.sync_snapshots(), 1);

        let a = store.get(&id).unwrap();
        assert!(a.day_index().is_none() && a.start_minutes().is_none());
        let doc = adapter.document(&tasks_path(), &id).unwrap();
        assert!(doc["dayIndex"].is_null() && doc["startMinutes"].is_null());
    }

    #[test]
    fn failed_writes_keep_optimistic_state() {
        let adapter = MemoryAdapter::new();
        let mut store = remote_store(&adapter);
        let mut events = store.subscribe_events();
        adapter.reject_writes("quota exceeded");

        let id = store.create(Activity::new("Plan", Category::Meeting, 30).unwrap());
        let summary = store.flush();
        assert_eq!(summary.failed, 1);
        assert!(store.get(&id).is_some());
        assert_eq!(store.pending_writes(), 0);

        let events = drain(&mut events);
        match events.as_slice() {
            [Event::PersistFailed { id: failed, error, .. }] => {
                assert_eq!(failed, &id);
                assert!(error.contains("quota exceeded"));
            }
            other => panic!("unexpected events: {other:?}"),
        }
    }

    #[test]
    fn subscription_error_falls_back_to_local_state() {
        let adapter = MemoryAdapter::new();
        let fallback = LocalStore::in_memory().unwrap();
        let saved = Activity::new("Offline copy", Category::Rest, 30).unwrap();
        fallback
            .save(CollectionKind::Tasks, std::slice::from_ref(&saved))
            .unwrap();

        let mut store = ActivityStore::new(
            SessionContext::user("u1"),
            Backend::Remote {
                adapter: Box::new(adapter.clone()),
                fallback,
            },
        );
        let mut events = store.subscribe_events();
        assert!(store.activities().is_empty());
        assert_eq!(store.backend_name(), "memory");

        adapter.revoke_access("signed out");
        assert_eq!(store.sync_snapshots(), 0);
        assert!(store.is_offline());
        assert_eq!(store.backend_name(), "local");
        assert_eq!(store.activities(), &[saved]);
        assert!(matches!(
            drain(&mut events).as_slice(),
            [Event::WentOffline { .. }]
        ));
    }

    #[test]
    fn denied_subscription_starts_offline() {
        let adapter = MemoryAdapter::new();
        adapter.deny_subscriptions();
        let store = remote_store(&adapter);
        assert!(store.is_offline());
    }

    #[test]
    fn anonymous_context_ignores_the_adapter() {
        let adapter = MemoryAdapter::new();
        let mut store = ActivityStore::new(
            SessionContext::Anonymous,
            Backend::Remote {
                adapter: Box::new(adapter.clone()),
                fallback: LocalStore::in_memory().unwrap(),
            },
        );
        store.create(Activity::new("Walk", Category::Exercise, 30).unwrap());
        store.flush();
        assert_eq!(adapter.write_count(), 0);
        assert!(!store.is_offline());
    }

    #[test]
    fn sessions_and_reviews_round_trip_through_the_adapter() {
        let adapter = MemoryAdapter::new();
        let mut store = remote_store(&adapter);
        let id = store.create(Activity::new("Essay", Category::Work, 60).unwrap());
        let start = Utc::now() - chrono::Duration::minutes(40);
        let sid = store
            .log_manual_session(Some(&id), None, SessionType::Work, start, Utc::now(), None)
            .unwrap();
        let date = NaiveDate::from_ymd_opt(2025, 5, 1).unwrap();
        store.record_review(DailyReview::new(date, 6, "ok").unwrap());
        store.record_review(DailyReview::new(date, 8, "better").unwrap());
        store.flush();
        store.sync_snapshots();

        assert_eq!(store.sessions()[0].id, sid);
        assert_eq!(store.sessions()[0].task_title, "Essay");
        assert_eq!(store.reviews().len(), 1);
        assert_eq!(store.review_for(date).unwrap().score, 8);

        let sessions = CollectionPath::for_user("u1", CollectionKind::Sessions);
        let doc = adapter.document(&sessions, &sid).unwrap();
        assert!(doc.as_object().unwrap().contains_key("interruptionReason"));

        assert!(store.remove_session(&sid));
        store.flush();
        store.sync_snapshots();
        assert!(store.sessions().is_empty());
    }

    #[test]
    fn manual_session_for_unknown_activity_is_rejected() {
        let mut store = local_store();
        let err = store
            .log_manual_session(Some("nope"), Some("x"), SessionType::Work, Utc::now(), Utc::now(), Some(5))
            .unwrap_err();
        assert!(matches!(err, ValidationError::InvalidValue { .. }));
        assert!(store.sessions().is_empty());
    }

    #[test]
    fn remote_snapshots_replace_memory() {
        let adapter = MemoryAdapter::new();
        let mut other = adapter.clone();
        let mut store = remote_store(&adapter);
        let a = Activity::new("From another device", Category::Work, 45).unwrap();
        other
            .put(&tasks_path(), &a.id, a.to_wire().unwrap(), PutMode::Replace)
            .unwrap();
        store.sync_snapshots();
        assert_eq!(store.activities(), &[a]);
    }
}

//! Focus flow: timer sessions land in the activity store, the store falls
//! back to local state when the remote subscription dies.

use chrono::{DateTime, Utc};
use potatoclock_core::storage::LocalStore;
use potatoclock_core::sync::{CollectionKind, MemoryAdapter};
use potatoclock_core::{
    Activity, ActivityStore, Backend, Category, Event, SessionContext, SessionStatus, SessionType,
    TimerEngine, TimerMode, ValidationError,
};

fn now() -> DateTime<Utc> {
    "2025-03-03T11:00:00Z".parse().unwrap()
}

fn local_store() -> ActivityStore {
    ActivityStore::new(
        SessionContext::Anonymous,
        Backend::Local(LocalStore::in_memory().unwrap()),
    )
}

#[test]
fn deep_work_interval_produces_one_completed_session() {
    let mut store = local_store();
    let mut engine = TimerEngine::default();

    assert_eq!(engine.start(), Err(ValidationError::MissingSelection));
    engine.select_manual("Deep work");
    engine.start().unwrap();
    for _ in 0..1500 {
        engine.tick();
    }
    engine.complete(&mut store, now()).unwrap();

    assert_eq!(store.sessions().len(), 1);
    let s = &store.sessions()[0];
    assert_eq!(s.session_type, SessionType::Work);
    assert_eq!(s.status, SessionStatus::Completed);
    assert_eq!(s.duration_minutes, 25);
    assert!(s.end_time >= s.start_time);
    assert_eq!(engine.mode(), TimerMode::Break);
    assert_eq!(engine.remaining_secs(), 300);

    let summary = store.flush();
    assert_eq!(summary.persisted, 1);
}

#[test]
fn planned_activity_sessions_reference_the_activity() {
    let mut store = local_store();
    let id = store.create(Activity::new("Write report", Category::Work, 60).unwrap());
    let mut engine = TimerEngine::default();
    engine.select_planned(store.get(&id).unwrap());
    engine.start().unwrap();
    engine.interrupt().unwrap();
    engine
        .confirm_interrupt("fire alarm", &mut store, now())
        .unwrap();

    let s = &store.sessions()[0];
    assert_eq!(s.task_id.as_deref(), Some(id.as_str()));
    assert_eq!(s.status, SessionStatus::Interrupted);
    assert_eq!(s.interruption_reason.as_deref(), Some("fire alarm"));

    // Renaming the activity does not rewrite history.
    store
        .edit(
            &id,
            &potatoclock_core::ActivityPatch {
                title: Some("Final report".into()),
                ..Default::default()
            },
        )
        .unwrap();
    assert_eq!(store.sessions()[0].task_title, "Write report");
}

#[test]
fn revoked_subscription_falls_back_to_local_sessions() {
    let adapter = MemoryAdapter::new();
    let fallback = LocalStore::in_memory().unwrap();

    // A break logged earlier while signed out.
    let mut engine = TimerEngine::default();
    engine.switch_mode(TimerMode::Break);
    let mut local_sessions = Vec::new();
    engine.complete(&mut local_sessions, now()).unwrap();
    fallback
        .save(CollectionKind::Sessions, &local_sessions)
        .unwrap();

    let mut store = ActivityStore::new(
        SessionContext::user("focus"),
        Backend::Remote {
            adapter: Box::new(adapter.clone()),
            fallback,
        },
    );
    let mut events = store.subscribe_events();
    assert!(store.sessions().is_empty());

    adapter.revoke_access("token expired");
    store.sync_snapshots();

    assert!(store.is_offline());
    assert_eq!(store.sessions().len(), 1);
    assert_eq!(store.sessions()[0].session_type, SessionType::Break);
    assert!(matches!(events.try_recv(), Ok(Event::WentOffline { .. })));

    // Writes now go to the local store.
    engine.complete(&mut store, now()).unwrap();
    let summary = store.flush();
    assert_eq!(summary.persisted, 1);
    assert_eq!(adapter.write_count(), 0);
}

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc::{unbounded_channel, UnboundedReceiver, UnboundedSender};

use crate::sync::{CollectionKind, WriteOp};
use crate::timer::TimerMode;

/// Every state change in the system produces an Event.
///
/// Timer transitions are returned directly from the engine. Durable-write
/// outcomes and snapshot reconciliation are published on the store's
/// [`EventBus`] so callers can observe phase two of every mutation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Event {
    TimerStarted {
        mode: TimerMode,
        remaining_secs: i64,
        at: DateTime<Utc>,
    },
    TimerPaused {
        remaining_secs: i64,
        at: DateTime<Utc>,
    },
    /// Countdown passed zero and keeps counting.
    OvertimeStarted {
        mode: TimerMode,
        at: DateTime<Utc>,
    },
    TimerCompleted {
        session_id: String,
        mode: TimerMode,
        elapsed_minutes: u32,
        at: DateTime<Utc>,
    },
    /// Work interval stopped; waiting for the reason.
    InterruptionRequested {
        remaining_secs: i64,
        at: DateTime<Utc>,
    },
    InterruptionLogged {
        reason: String,
        session_id: Option<String>,
        at: DateTime<Utc>,
    },
    ModeSwitched {
        mode: TimerMode,
        remaining_secs: i64,
        at: DateTime<Utc>,
    },
    DurationAdjusted {
        minutes: u32,
        at: DateTime<Utc>,
    },
    StateSnapshot {
        mode: TimerMode,
        running: bool,
        remaining_secs: i64,
        overtime_secs: i64,
        display: String,
        task_title: Option<String>,
        awaiting_reason: bool,
        at: DateTime<Utc>,
    },
    /// A queued write reached durable storage.
    Persisted {
        collection: CollectionKind,
        id: String,
        op: WriteOp,
        at: DateTime<Utc>,
    },
    /// A queued write was rejected. Local state is kept as-is.
    PersistFailed {
        collection: CollectionKind,
        id: String,
        op: WriteOp,
        error: String,
        at: DateTime<Utc>,
    },
    /// A remote snapshot replaced a managed collection.
    SnapshotApplied {
        collection: CollectionKind,
        count: usize,
        at: DateTime<Utc>,
    },
    /// Subscription failed; the store now runs on local persisted state.
    WentOffline {
        reason: String,
        at: DateTime<Utc>,
    },
}

/// Fan-out of events to any number of receivers.
///
/// Closed receivers are pruned on the next publish.
#[derive(Debug, Default)]
pub struct EventBus {
    subscribers: Vec<UnboundedSender<Event>>,
}

impl EventBus {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe(&mut self) -> UnboundedReceiver<Event> {
        let (tx, rx) = unbounded_channel();
        self.subscribers.push(tx);
        rx
    }

    pub fn publish(&mut self, event: Event) {
        self.subscribers.retain(|tx| tx.send(event.clone()).is_ok());
    }

    pub fn subscriber_count(&self) -> usize {
        self.subscribers.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn publish_reaches_every_subscriber_and_prunes_closed() {
        let mut bus = EventBus::new();
        let mut a = bus.subscribe();
        let b = bus.subscribe();
        drop(b);

        bus.publish(Event::WentOffline {
            reason: "permission denied".into(),
            at: Utc::now(),
        });

        assert_eq!(bus.subscriber_count(), 1);
        assert!(matches!(a.try_recv(), Ok(Event::WentOffline { .. })));
    }

    #[test]
    fn events_serialize_with_type_tag() {
        let ev = Event::DurationAdjusted {
            minutes: 50,
            at: Utc::now(),
        };
        let json = serde_json::to_value(&ev).unwrap();
        assert_eq!(json["type"], "DurationAdjusted");
        assert_eq!(json["minutes"], 50);
    }
}

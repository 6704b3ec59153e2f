//! Snapshot delivery to subscribers, shared by the adapters.

use std::collections::HashMap;
use tokio::sync::mpsc::{unbounded_channel, UnboundedSender};

use super::types::{CollectionPath, Snapshot, SnapshotStream, SyncError};

type SnapshotSender = UnboundedSender<Result<Snapshot, SyncError>>;

#[derive(Debug, Default)]
pub(crate) struct SubscriberSet {
    by_path: HashMap<CollectionPath, Vec<SnapshotSender>>,
}

impl SubscriberSet {
    /// Register a subscriber and hand it the current contents.
    pub(crate) fn add(&mut self, initial: Snapshot) -> SnapshotStream {
        let (tx, rx) = unbounded_channel();
        // The receiver is alive here, so the send cannot fail.
        let _ = tx.send(Ok(initial.clone()));
        self.by_path.entry(initial.path).or_default().push(tx);
        rx
    }

    /// Push a snapshot to every live subscriber of its path.
    pub(crate) fn notify(&mut self, snapshot: &Snapshot) {
        if let Some(list) = self.by_path.get_mut(&snapshot.path) {
            list.retain(|tx| tx.send(Ok(snapshot.clone())).is_ok());
        }
    }

    /// Terminate every subscription with an error.
    pub(crate) fn fail_all(&mut self, err: &SyncError) {
        for (_, list) in self.by_path.drain() {
            for tx in list {
                let _ = tx.send(Err(err.clone()));
            }
        }
    }

    pub(crate) fn count(&self, path: &CollectionPath) -> usize {
        self.by_path.get(path).map(|l| l.iter().filter(|tx| !tx.is_closed()).count()).unwrap_or(0)
    }
}

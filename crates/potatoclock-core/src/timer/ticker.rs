//! One-second tick source for a running timer.

use std::time::Duration;
use tokio::sync::mpsc::{unbounded_channel, UnboundedReceiver};
use tokio::task::JoinHandle;

pub const TICK_PERIOD: Duration = Duration::from_secs(1);

/// Owns at most one live interval task.
#[derive(Debug, Default)]
pub struct Ticker {
    handle: Option<JoinHandle<()>>,
}

impl Ticker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start a fresh interval, aborting any previous one. The first tick
    /// arrives one `period` after arming.
    ///
    /// Must be called inside a tokio runtime.
    pub fn arm(&mut self, period: Duration) -> UnboundedReceiver<()> {
        self.disarm();
        let (tx, rx) = unbounded_channel();
        self.handle = Some(tokio::spawn(async move {
            let mut interval = tokio::time::interval(period);
            interval.tick().await;
            loop {
                interval.tick().await;
                if tx.send(()).is_err() {
                    break;
                }
            }
        }));
        rx
    }

    pub fn disarm(&mut self) {
        if let Some(handle) = self.handle.take() {
            handle.abort();
        }
    }

    pub fn is_armed(&self) -> bool {
        self.handle.as_ref().is_some_and(|h| !h.is_finished())
    }
}

impl Drop for Ticker {
    fn drop(&mut self) {
        self.disarm();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn rearming_replaces_the_previous_interval() {
        let mut ticker = Ticker::new();
        let mut first = ticker.arm(TICK_PERIOD);
        let mut second = ticker.arm(TICK_PERIOD);

        assert_eq!(first.recv().await, None);
        assert_eq!(second.recv().await, Some(()));
        assert_eq!(second.recv().await, Some(()));
        assert!(ticker.is_armed());

        ticker.disarm();
        assert!(!ticker.is_armed());
        while second.recv().await.is_some() {}
    }

    #[tokio::test(start_paused = true)]
    async fn dropping_the_ticker_stops_ticks() {
        let mut ticker = Ticker::new();
        let mut rx = ticker.arm(TICK_PERIOD);
        assert_eq!(rx.recv().await, Some(()));
        drop(ticker);
        while rx.recv().await.is_some() {}
    }
}

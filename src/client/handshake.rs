//! The single in-flight pairing wait.

use std::sync::{Condvar, Mutex, PoisonError};
use std::time::{Duration, Instant};

use crate::messages::InfoEvent;

/// How a [`PendingHandshake::wait`] ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum HandshakeOutcome {
    /// `info` arrived before the deadline.
    Paired(InfoEvent),
    /// The deadline passed.
    TimedOut,
    /// The connection closed while waiting.
    Cancelled,
}

#[derive(Debug, Default)]
struct Slot {
    info: Option<InfoEvent>,
    cancelled: bool,
}

/// Slot for the first `info` event, completed by the consumer and awaited
/// by `Client::connect`.
#[derive(Debug)]
pub(crate) struct PendingHandshake {
    slot: Mutex<Slot>,
    ready: Condvar,
}

impl PendingHandshake {
    pub(crate) fn new() -> Self {
        Self {
            slot: Mutex::new(Slot::default()),
            ready: Condvar::new(),
        }
    }

    /// Store `info` if nothing was stored yet. Returns whether it was the first.
    pub(crate) fn complete(&self, info: &InfoEvent) -> bool {
        let mut slot = self.slot.lock().unwrap_or_else(PoisonError::into_inner);
        if slot.info.is_some() || slot.cancelled {
            return false;
        }
        slot.info = Some(info.clone());
        self.ready.notify_all();
        true
    }

    /// Wake the waiter without a result.
    pub(crate) fn cancel(&self) {
        let mut slot = self.slot.lock().unwrap_or_else(PoisonError::into_inner);
        slot.cancelled = true;
        self.ready.notify_all();
    }

    /// Block until completed, cancelled or `timeout` elapses.
    pub(crate) fn wait(&self, timeout: Duration) -> HandshakeOutcome {
        let deadline = Instant::now() + timeout;
        let mut slot = self.slot.lock().unwrap_or_else(PoisonError::into_inner);
        loop {
            if let Some(info) = slot.info.take() {
                return HandshakeOutcome::Paired(info);
            }
            if slot.cancelled {
                return HandshakeOutcome::Cancelled;
            }
            let now = Instant::now();
            if now >= deadline {
                return HandshakeOutcome::TimedOut;
            }
            slot = self
                .ready
                .wait_timeout(slot, deadline - now)
                .unwrap_or_else(PoisonError::into_inner)
                .0;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::thread;

    fn info(status: &str) -> InfoEvent {
        serde_json::from_value(serde_json::json!({"type": "info", "status": status})).unwrap()
    }

    #[test]
    fn test_completed_from_other_thread() {
        let pending = Arc::new(PendingHandshake::new());
        let completer = Arc::clone(&pending);
        let handle = thread::spawn(move || {
            thread::sleep(Duration::from_millis(20));
            completer.complete(&info("paired"))
        });

        assert_eq!(
            pending.wait(Duration::from_secs(5)),
            HandshakeOutcome::Paired(info("paired"))
        );
        assert!(handle.join().unwrap());
    }

    #[test]
    fn test_first_completion_wins() {
        let pending = PendingHandshake::new();
        assert!(pending.complete(&info("first")));
        assert!(!pending.complete(&info("second")));
        assert_eq!(
            pending.wait(Duration::from_millis(10)),
            HandshakeOutcome::Paired(info("first"))
        );
    }

    #[test]
    fn test_times_out() {
        let pending = PendingHandshake::new();
        let started = Instant::now();
        assert_eq!(pending.wait(Duration::from_millis(50)), HandshakeOutcome::TimedOut);
        assert!(started.elapsed() >= Duration::from_millis(50));
    }

    #[test]
    fn test_cancel_wakes_waiter() {
        let pending = Arc::new(PendingHandshake::new());
        let canceller = Arc::clone(&pending);
        thread::spawn(move || {
            thread::sleep(Duration::from_millis(20));
            canceller.cancel();
        });
        assert_eq!(pending.wait(Duration::from_secs(5)), HandshakeOutcome::Cancelled);
        assert!(!pending.complete(&info("late")));
    }
}

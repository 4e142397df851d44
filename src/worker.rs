//! Named background threads with confirmed start and bounded stop.
//!
//! Both background contexts of a connection (the socket listener and the
//! event consumer) run on a [`Worker`]. Spawning blocks until the thread
//! has actually started running; stopping waits at most a grace period
//! and detaches a thread that misses it, so teardown never hangs on a
//! misbehaving thread.

// Rust guideline compliant 2026-02

use std::io;
use std::sync::mpsc::{self, RecvTimeoutError};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use scopeguard::defer;

/// Result of [`Worker::stop_within`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum StopOutcome {
    /// The thread exited and was joined.
    Stopped,
    /// The thread missed the deadline and was detached.
    Detached,
    /// Called from the worker's own thread; it exits when the caller returns.
    CurrentThread,
}

/// Handle to a running background thread.
pub(crate) struct Worker {
    name: String,
    handle: Option<JoinHandle<()>>,
    done_rx: mpsc::Receiver<()>,
}

impl std::fmt::Debug for Worker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Worker")
            .field("name", &self.name)
            .field("running", &self.handle.is_some())
            .finish_non_exhaustive()
    }
}

impl Worker {
    /// Spawn `body` on a thread named `name` and wait until it runs.
    ///
    /// # Errors
    ///
    /// Returns an error if the OS refuses the thread or it does not report
    /// in within `startup_timeout`.
    pub(crate) fn spawn<F>(name: &str, startup_timeout: Duration, body: F) -> io::Result<Self>
    where
        F: FnOnce() + Send + 'static,
    {
        let (done_tx, done_rx) = mpsc::channel::<()>();
        let (ready_tx, ready_rx) = mpsc::channel::<()>();
        let thread_name = name.to_owned();

        let handle = thread::Builder::new().name(name.to_owned()).spawn(move || {
            defer! {
                log::debug!("[{}] thread exited", thread_name);
                let _ = done_tx.send(());
            }
            let _ = ready_tx.send(());
            body();
        })?;

        match ready_rx.recv_timeout(startup_timeout) {
            // Disconnected means the body already ran to completion.
            Ok(()) | Err(RecvTimeoutError::Disconnected) => {}
            Err(RecvTimeoutError::Timeout) => {
                return Err(io::Error::new(
                    io::ErrorKind::TimedOut,
                    format!("{name} thread did not start within {startup_timeout:?}"),
                ));
            }
        }
        log::debug!("[{name}] thread started");

        Ok(Self {
            name: name.to_owned(),
            handle: Some(handle),
            done_rx,
        })
    }

    /// Whether the caller is running on this worker's thread.
    pub(crate) fn is_current(&self) -> bool {
        self.handle
            .as_ref()
            .is_some_and(|h| h.thread().id() == thread::current().id())
    }

    /// Whether the thread body has returned (or the worker was stopped).
    pub(crate) fn is_finished(&self) -> bool {
        self.handle.as_ref().map_or(true, JoinHandle::is_finished)
    }

    /// Wait up to `grace` for the thread to exit, then join it.
    ///
    /// The caller must already have signalled the thread to stop. After
    /// `Stopped` a second call is a no-op. After `Detached` the handle is
    /// kept, so [`is_finished`](Self::is_finished) keeps tracking the thread
    /// and a later call waits again.
    pub(crate) fn stop_within(&mut self, grace: Duration) -> StopOutcome {
        if self.is_current() {
            log::debug!("[{}] stop requested from its own thread, not waiting", self.name);
            self.handle = None;
            return StopOutcome::CurrentThread;
        }
        let Some(handle) = self.handle.take() else {
            return StopOutcome::Stopped;
        };

        match self.done_rx.recv_timeout(grace) {
            Ok(()) | Err(RecvTimeoutError::Disconnected) => {
                if handle.join().is_err() {
                    log::warn!("[{}] thread panicked", self.name);
                }
                StopOutcome::Stopped
            }
            Err(RecvTimeoutError::Timeout) => {
                log::warn!(
                    "[{}] thread is hung, did not stop within {:?}; detaching it",
                    self.name,
                    grace
                );
                self.handle = Some(handle);
                StopOutcome::Detached
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::Arc;

    #[test]
    fn test_spawn_confirms_start_and_stops() {
        let stop = Arc::new(AtomicBool::new(false));
        let stop_clone = Arc::clone(&stop);
        let mut worker = Worker::spawn("test-worker", Duration::from_secs(1), move || {
            while !stop_clone.load(Ordering::Acquire) {
                thread::sleep(Duration::from_millis(5));
            }
        })
        .unwrap();

        assert!(!worker.is_finished());
        assert!(!worker.is_current());
        stop.store(true, Ordering::Release);
        assert_eq!(worker.stop_within(Duration::from_secs(2)), StopOutcome::Stopped);
        assert!(worker.is_finished());
        assert_eq!(worker.stop_within(Duration::from_secs(2)), StopOutcome::Stopped);
    }

    #[test]
    fn test_hung_thread_is_detached() {
        let release = Arc::new(AtomicBool::new(false));
        let release_clone = Arc::clone(&release);
        let mut worker = Worker::spawn("test-hung", Duration::from_secs(1), move || {
            while !release_clone.load(Ordering::Acquire) {
                thread::sleep(Duration::from_millis(5));
            }
        })
        .unwrap();

        let started = std::time::Instant::now();
        assert_eq!(worker.stop_within(Duration::from_millis(50)), StopOutcome::Detached);
        assert!(started.elapsed() < Duration::from_secs(1));
        assert!(!worker.is_finished());

        release.store(true, Ordering::Release);
        assert_eq!(worker.stop_within(Duration::from_secs(2)), StopOutcome::Stopped);
        assert!(worker.is_finished());
    }

    #[test]
    fn test_panicking_body_still_signals_done() {
        let mut worker = Worker::spawn("test-panic", Duration::from_secs(1), || {
            panic!("boom");
        })
        .unwrap();
        assert_eq!(worker.stop_within(Duration::from_secs(2)), StopOutcome::Stopped);
    }

    #[test]
    fn test_stop_from_own_thread_does_not_wait() {
        let (tx, rx) = mpsc::channel::<Arc<std::sync::Mutex<Option<Worker>>>>();
        let slot: Arc<std::sync::Mutex<Option<Worker>>> = Arc::new(std::sync::Mutex::new(None));
        let (outcome_tx, outcome_rx) = mpsc::channel();

        let worker = Worker::spawn("test-self", Duration::from_secs(1), move || {
            let slot = rx.recv().unwrap();
            let mut guard = slot.lock().unwrap();
            let outcome = guard.as_mut().map(|w| w.stop_within(Duration::from_secs(5)));
            outcome_tx.send(outcome).unwrap();
        })
        .unwrap();

        *slot.lock().unwrap() = Some(worker);
        tx.send(Arc::clone(&slot)).unwrap();

        let outcome = outcome_rx.recv_timeout(Duration::from_secs(2)).unwrap();
        assert_eq!(outcome, Some(StopOutcome::CurrentThread));
    }
}

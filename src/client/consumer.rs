//! Event consumer thread.
//!
//! The listener thread pushes each completed frame into an unbounded
//! channel; this thread drains it in order, resolves every frame and calls
//! the matching [`EventHandler`] method. Handler code therefore never runs
//! on the socket thread, and a slow handler only delays later events.
//!
//! ```text
//! listener ──Frame──► mpsc ──► consumer ──resolve──► EventHandler::on_*
//!                                 │
//!                                 ├── info        → mark Ready, complete handshake
//!                                 └── closePlugin → request close (other thread)
//! ```

// Rust guideline compliant 2026-02

use std::io;
use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{Receiver, RecvTimeoutError};
use std::sync::Arc;

use super::handler::EventHandler;
use super::handshake::PendingHandshake;
use super::state::{ConnectionState, StateCell};
use crate::constants::{CONSUMER_POLL_INTERVAL, LISTENER_START_TIMEOUT};
use crate::messages::{resolve, Event, Resolution};
use crate::socket::Frame;
use crate::worker::Worker;

const CONSUMER_THREAD_NAME: &str = "touchportal-consumer";

/// Reason passed to `on_closed` when the host asks the plugin to exit.
pub(crate) const CLOSE_PLUGIN_REASON: &str = "Touch Portal sent a plugin close event";

/// Everything the consumer thread needs from the client.
pub(crate) struct ConsumerContext {
    pub(crate) handler: Arc<dyn EventHandler>,
    pub(crate) state: Arc<StateCell>,
    pub(crate) handshake: Arc<PendingHandshake>,
    pub(crate) stop: Arc<AtomicBool>,
    /// Starts a close on another thread. Never blocks the consumer.
    pub(crate) request_close: Box<dyn Fn(&str) + Send>,
}

/// Spawn the consumer on `frames` and return once it runs.
pub(crate) fn spawn(ctx: ConsumerContext, frames: Receiver<Frame>) -> io::Result<Worker> {
    Worker::spawn(CONSUMER_THREAD_NAME, LISTENER_START_TIMEOUT, move || {
        run(&ctx, &frames);
    })
}

fn run(ctx: &ConsumerContext, frames: &Receiver<Frame>) {
    loop {
        if ctx.stop.load(Ordering::Acquire) {
            break;
        }
        match frames.recv_timeout(CONSUMER_POLL_INTERVAL) {
            Ok(frame) => {
                if ctx.stop.load(Ordering::Acquire) {
                    break;
                }
                process(ctx, &frame);
            }
            Err(RecvTimeoutError::Timeout) => {}
            Err(RecvTimeoutError::Disconnected) => break,
        }
    }
    log::debug!("[Consumer] Stopped");
}

fn process(ctx: &ConsumerContext, frame: &Frame) {
    let resolution = match resolve(frame) {
        Ok(resolution) => resolution,
        Err(e) => {
            log::warn!("[Consumer] Skipping message: {e}");
            return;
        }
    };

    let event = match resolution {
        Resolution::Event(event) => event,
        Resolution::Unresolved(frame) => {
            let raw = frame.to_text_lossy();
            guarded("unhandled", || ctx.handler.on_unhandled(&raw));
            return;
        }
    };

    if let Event::Info(info) = &event {
        // Ready before the waiting caller wakes, so it can send at once.
        ctx.state
            .advance(ConnectionState::AwaitingPairAck, ConnectionState::Ready);
        if !ctx.handshake.complete(info) {
            log::debug!("[Consumer] info received outside pairing");
        }
    }

    let kind = event.kind();
    guarded(kind.as_str(), || dispatch(ctx.handler.as_ref(), &event));

    if matches!(event, Event::ClosePlugin(_)) {
        log::info!("[Consumer] Touch Portal requested plugin close");
        (ctx.request_close)(CLOSE_PLUGIN_REASON);
    }
}

fn dispatch(handler: &dyn EventHandler, event: &Event) {
    match event {
        Event::Info(e) => handler.on_info(e),
        Event::Settings(e) => handler.on_settings(e),
        Event::Action(e) => handler.on_action(e),
        Event::ConnectorChange(e) => handler.on_connector_change(e),
        Event::ListChange(e) => handler.on_list_change(e),
        Event::Broadcast(e) => handler.on_broadcast(e),
        Event::NotificationOptionClicked(e) => handler.on_notification_option_clicked(e),
        Event::ShortConnectorIdNotification(e) => handler.on_short_connector_id_notification(e),
        // Reported through on_closed once the close runs.
        Event::ClosePlugin(_) => {}
    }
}

/// Run a handler callback, logging instead of propagating a panic.
pub(crate) fn guarded(what: &str, f: impl FnOnce()) {
    if panic::catch_unwind(AssertUnwindSafe(f)).is_err() {
        log::warn!("[Consumer] Handler panicked while handling {what}");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::messages::{ActionEvent, InfoEvent};
    use std::sync::mpsc;
    use std::sync::Mutex;
    use std::time::Duration;

    use crate::client::handshake::HandshakeOutcome;

    #[derive(Default)]
    struct Recorder {
        seen: Mutex<Vec<String>>,
    }

    impl EventHandler for Recorder {
        fn plugin_id(&self) -> &str {
            "test.plugin"
        }

        fn on_closed(&self, reason: &str) {
            self.seen.lock().unwrap().push(format!("closed:{reason}"));
        }

        fn on_info(&self, _event: &InfoEvent) {
            self.seen.lock().unwrap().push("info".to_owned());
        }

        fn on_action(&self, event: &ActionEvent) {
            if event.action_id == "boom" {
                panic!("handler failure");
            }
            self.seen.lock().unwrap().push(format!("action:{}", event.action_id));
        }

        fn on_unhandled(&self, raw: &str) {
            self.seen.lock().unwrap().push(format!("raw:{raw}"));
        }
    }

    struct Harness {
        recorder: Arc<Recorder>,
        state: Arc<StateCell>,
        handshake: Arc<PendingHandshake>,
        close_requests: mpsc::Receiver<String>,
        ctx: ConsumerContext,
    }

    fn harness() -> Harness {
        let recorder = Arc::new(Recorder::default());
        let state = Arc::new(StateCell::new());
        let handshake = Arc::new(PendingHandshake::new());
        let (close_tx, close_requests) = mpsc::channel();
        let close_tx = Mutex::new(close_tx);
        let ctx = ConsumerContext {
            handler: recorder.clone(),
            state: Arc::clone(&state),
            handshake: Arc::clone(&handshake),
            stop: Arc::new(AtomicBool::new(false)),
            request_close: Box::new(move |reason| {
                let _ = close_tx.lock().unwrap().send(reason.to_owned());
            }),
        };
        Harness {
            recorder,
            state,
            handshake,
            close_requests,
            ctx,
        }
    }

    #[test]
    fn test_info_marks_ready_and_completes_handshake() {
        let h = harness();
        h.state
            .advance(ConnectionState::Disconnected, ConnectionState::AwaitingPairAck);

        process(&h.ctx, &Frame::from(r#"{"type":"info","status":"paired"}"#));

        assert_eq!(h.state.get(), ConnectionState::Ready);
        assert!(matches!(
            h.handshake.wait(Duration::from_millis(10)),
            HandshakeOutcome::Paired(_)
        ));
        assert_eq!(*h.recorder.seen.lock().unwrap(), vec!["info"]);
    }

    #[test]
    fn test_bad_frames_and_panics_do_not_stop_processing() {
        let h = harness();
        for text in [
            r#"{"type":"action","actionId":"boom"}"#,
            "garbage",
            r#"{"type":"connectorChange","value":"NaN"}"#,
            r#"{"type":"somethingNew","v":1}"#,
            r#"{"type":"action","actionId":"after"}"#,
        ] {
            process(&h.ctx, &Frame::from(text));
        }

        assert_eq!(
            *h.recorder.seen.lock().unwrap(),
            vec![r#"raw:{"type":"somethingNew","v":1}"#, "action:after"]
        );
    }

    #[test]
    fn test_close_plugin_requests_close() {
        let h = harness();
        process(&h.ctx, &Frame::from(r#"{"type":"closePlugin","pluginId":"test.plugin"}"#));
        assert_eq!(
            h.close_requests.recv_timeout(Duration::from_secs(1)).unwrap(),
            CLOSE_PLUGIN_REASON
        );
    }

    #[test]
    fn test_thread_delivers_in_order_and_stops() {
        let h = harness();
        let (tx, rx) = mpsc::channel();
        let stop = Arc::clone(&h.ctx.stop);
        let recorder = Arc::clone(&h.recorder);
        let mut worker = spawn(h.ctx, rx).unwrap();

        for id in ["a", "b", "c"] {
            let text = format!(r#"{{"type":"action","actionId":"{id}"}}"#);
            tx.send(Frame::new(text.into_bytes())).unwrap();
        }
        let deadline = std::time::Instant::now() + Duration::from_secs(2);
        while recorder.seen.lock().unwrap().len() < 3 && std::time::Instant::now() < deadline {
            std::thread::sleep(Duration::from_millis(5));
        }
        assert_eq!(
            *recorder.seen.lock().unwrap(),
            vec!["action:a", "action:b", "action:c"]
        );

        stop.store(true, Ordering::Release);
        assert_eq!(
            worker.stop_within(Duration::from_secs(1)),
            crate::worker::StopOutcome::Stopped
        );
    }
}

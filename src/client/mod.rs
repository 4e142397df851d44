//! Touch Portal client façade.
//!
//! [`Client`] owns one connection: the [`Transport`], the event consumer
//! and the pairing handshake. It exposes one method per outbound command
//! and delivers inbound events to an [`EventHandler`].
//!
//! # Lifecycle
//!
//! ```text
//! Client::new ──connect()──► Connecting ──► AwaitingPairAck ──info──► Ready
//!                                │                 │                   │
//!                         connect error     pair timeout          close() / peer
//!                                ▼                 ▼                   ▼
//!                              Closed     Closing ──────────────► Closed
//! ```
//!
//! # Close sequence
//!
//! Close runs at most once, whoever calls it first (the application, a
//! transport failure, a `closePlugin` event or `Drop`):
//!
//! 1. `EventHandler::on_closed(reason)`
//! 2. set the shared stop signal, shut the socket down, wait for the listener
//! 3. wait for the consumer (bounded by `CONSUMER_STOP_TIMEOUT`)
//! 4. state becomes `Closed`
//!
//! Later calls return immediately. A close triggered from a background
//! thread runs on a short-lived thread of its own so no thread ever waits
//! for itself.

// Rust guideline compliant 2026-02

mod consumer;
pub mod handler;
mod handshake;
pub mod state;

use std::io;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{self, Sender};
use std::sync::{Arc, Mutex, PoisonError, Weak};
use std::thread;

pub use handler::EventHandler;
pub use state::ConnectionState;

use self::consumer::{guarded, ConsumerContext};
use self::handshake::{HandshakeOutcome, PendingHandshake};
use self::state::StateCell;
use crate::config::ClientConfig;
use crate::constants::CONSUMER_STOP_TIMEOUT;
use crate::error::{ClientError, CommandError};
use crate::messages::{
    ActionDataType, ChoiceUpdate, CommandKind, ConnectorUpdate, ConnectorUpdateShort,
    CreateState, InfoEvent, NotificationOption, OutboundCommand, Pair, RawMessage, RemoveState,
    SettingUpdate, ShowNotification, StateUpdate, UpdateActionData,
};
use crate::socket::{Frame, FrameSink, Transport};
use crate::worker::{StopOutcome, Worker};

const CLOSER_THREAD_NAME: &str = "touchportal-closer";

/// Reason reported when the application closes the client.
pub const CLOSED_BY_PLUGIN: &str = "Closed by plugin";

/// Reason reported when pairing times out.
pub const PAIR_TIMEOUT_REASON: &str = "Pair response timed out";

/// A plugin-side connection to Touch Portal.
///
/// Single use: once closed (including after a failed [`connect`](Self::connect)),
/// create a new client to reconnect. Dropping the client closes it.
pub struct Client {
    inner: Arc<Inner>,
}

struct Inner {
    handler: Arc<dyn EventHandler>,
    config: ClientConfig,
    state: Arc<StateCell>,
    handshake: Arc<PendingHandshake>,
    stop: Arc<AtomicBool>,
    transport: Transport,
    consumer: Mutex<Option<Worker>>,
}

impl std::fmt::Debug for Client {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Client")
            .field("plugin_id", &self.inner.handler.plugin_id())
            .field("state", &self.inner.state.get())
            .finish_non_exhaustive()
    }
}

impl Client {
    /// Create a client for `handler` with `config`. Nothing is connected yet.
    ///
    /// # Errors
    ///
    /// Returns an error if the handler's plugin id is empty or the
    /// configuration is invalid.
    pub fn new(handler: Arc<dyn EventHandler>, config: ClientConfig) -> Result<Self, ClientError> {
        if handler.plugin_id().trim().is_empty() {
            return Err(CommandError::MissingPluginId.into());
        }
        config
            .validate()
            .map_err(|e| ClientError::InvalidConfig(format!("{e:#}")))?;

        let stop = Arc::new(AtomicBool::new(false));
        let transport = Transport::new(&config, Arc::clone(&stop));
        Ok(Self {
            inner: Arc::new(Inner {
                handler,
                config,
                state: Arc::new(StateCell::new()),
                handshake: Arc::new(PendingHandshake::new()),
                stop,
                transport,
                consumer: Mutex::new(None),
            }),
        })
    }

    /// Connect, start listening, send `pair` and wait for `info`.
    ///
    /// Blocks for at most the configured handshake timeout after the socket
    /// connects. Returns the pairing `info` event.
    ///
    /// # Errors
    ///
    /// - [`ClientError::InvalidState`] if `connect` was already called
    /// - [`ClientError::Connect`] if the socket cannot be opened
    /// - [`ClientError::HandshakeTimeout`] if `info` does not arrive in time;
    ///   the client is closed
    /// - [`ClientError::ConnectionClosed`] if the connection closed while
    ///   pairing
    pub fn connect(&self) -> Result<InfoEvent, ClientError> {
        let inner = &self.inner;
        if !inner
            .state
            .advance(ConnectionState::Disconnected, ConnectionState::Connecting)
        {
            return Err(ClientError::InvalidState {
                state: inner.state.get(),
                operation: "connect".to_owned(),
            });
        }

        if let Err(e) = inner.transport.connect() {
            inner.stop.store(true, Ordering::Release);
            inner.transport.close();
            inner.state.finish_close();
            return Err(ClientError::Connect(format!("{e:#}")));
        }

        // Consumer first, so the queue is drained from the first frame on.
        let (frame_tx, frame_rx) = mpsc::channel();
        let consumer = consumer::spawn(
            ConsumerContext {
                handler: Arc::clone(&inner.handler),
                state: Arc::clone(&inner.state),
                handshake: Arc::clone(&inner.handshake),
                stop: Arc::clone(&inner.stop),
                request_close: close_trigger(Arc::downgrade(inner)),
            },
            frame_rx,
        );
        match consumer {
            Ok(worker) => *lock(&inner.consumer) = Some(worker),
            Err(e) => {
                inner.close("Could not start event consumer");
                return Err(ClientError::Io(e));
            }
        }

        let sink = Arc::new(QueueSink {
            frames: frame_tx,
            inner: Arc::downgrade(inner),
        });
        if let Err(e) = inner.transport.start_listening(sink) {
            inner.close("Could not start listener");
            return Err(ClientError::Io(io::Error::other(format!("{e:#}"))));
        }

        if !inner
            .state
            .advance(ConnectionState::Connecting, ConnectionState::AwaitingPairAck)
        {
            return Err(ClientError::ConnectionClosed);
        }

        let plugin_id = inner.handler.plugin_id().to_owned();
        if let Err(e) = self.send_command(&Pair::new(plugin_id)) {
            inner.close("Could not send pair request");
            return Err(e);
        }

        match inner.handshake.wait(inner.config.handshake_timeout()) {
            HandshakeOutcome::Paired(info) => {
                inner
                    .state
                    .advance(ConnectionState::AwaitingPairAck, ConnectionState::Ready);
                log::info!(
                    "[Client] Paired with Touch Portal {} (sdk {})",
                    info.tp_version_string,
                    info.sdk_version
                );
                Ok(info)
            }
            HandshakeOutcome::TimedOut => {
                log::error!(
                    "[Client] No pair response within {:?}",
                    inner.config.handshake_timeout()
                );
                inner.close(PAIR_TIMEOUT_REASON);
                Err(ClientError::HandshakeTimeout)
            }
            HandshakeOutcome::Cancelled => Err(ClientError::ConnectionClosed),
        }
    }

    /// Close the connection. Idempotent; see the module docs for the order.
    pub fn close(&self) {
        self.inner.close(CLOSED_BY_PLUGIN);
    }

    /// Current lifecycle state.
    pub fn state(&self) -> ConnectionState {
        self.inner.state.get()
    }

    /// Whether the client is paired and the socket is open.
    pub fn is_connected(&self) -> bool {
        self.state() == ConnectionState::Ready && self.inner.transport.is_connected()
    }

    /// Plugin id used for pairing.
    pub fn plugin_id(&self) -> &str {
        self.inner.handler.plugin_id()
    }

    /// Change the receive buffer size before `connect`.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::ConfigLocked`] once listening has started.
    pub fn set_receive_buffer_size(&self, size: usize) -> Result<(), ClientError> {
        self.inner.transport.set_receive_buffer_size(size)
    }

    /// Validate, serialize and send `command`.
    ///
    /// Only `pair` is accepted while awaiting the pair acknowledgement; all
    /// commands are accepted once ready.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::InvalidState`] outside those states,
    /// [`ClientError::Validation`] without touching the socket when the
    /// command is invalid, or a transport error.
    pub fn send_command<C: OutboundCommand + ?Sized>(&self, command: &C) -> Result<(), ClientError> {
        let kind = command.kind();
        let state = self.state();
        let allowed = match state {
            ConnectionState::Ready => true,
            ConnectionState::AwaitingPairAck => kind == CommandKind::Pair,
            _ => false,
        };
        if !allowed {
            return Err(ClientError::InvalidState {
                state,
                operation: format!("send {kind}"),
            });
        }

        command.validate()?;
        let payload = command.encode()?;

        if let Err(e) = self.inner.transport.send(&payload) {
            if self.inner.stop.load(Ordering::Acquire) {
                return Err(ClientError::ConnectionClosed);
            }
            log::warn!("[Client] Failed to send {}: {e:#}", command.identifier());
            return Err(match e.downcast::<io::Error>() {
                Ok(io) => ClientError::Io(io),
                Err(e) => ClientError::Io(io::Error::other(format!("{e:#}"))),
            });
        }
        log::debug!("[Client] Sent {}", command.identifier());
        Ok(())
    }

    /// Send `settingUpdate`.
    ///
    /// # Errors
    ///
    /// See [`send_command`](Self::send_command).
    pub fn setting_update(&self, name: &str, value: &str) -> Result<(), ClientError> {
        self.send_command(&SettingUpdate::new(name, value))
    }

    /// Send `createState`.
    ///
    /// # Errors
    ///
    /// See [`send_command`](Self::send_command).
    pub fn create_state(&self, id: &str, desc: &str, default_value: &str) -> Result<(), ClientError> {
        self.send_command(&CreateState::new(id, desc, default_value))
    }

    /// Send `removeState`.
    ///
    /// # Errors
    ///
    /// See [`send_command`](Self::send_command).
    pub fn remove_state(&self, id: &str) -> Result<(), ClientError> {
        self.send_command(&RemoveState::new(id))
    }

    /// Send `stateUpdate`.
    ///
    /// # Errors
    ///
    /// See [`send_command`](Self::send_command).
    pub fn state_update(&self, id: &str, value: &str) -> Result<(), ClientError> {
        self.send_command(&StateUpdate::new(id, value))
    }

    /// Send `choiceUpdate`, optionally scoped to one action instance.
    ///
    /// # Errors
    ///
    /// See [`send_command`](Self::send_command).
    pub fn choice_update(
        &self,
        list_id: &str,
        values: Vec<String>,
        instance_id: Option<&str>,
    ) -> Result<(), ClientError> {
        self.send_command(&ChoiceUpdate::new(list_id, values, instance_id.map(str::to_owned)))
    }

    /// Send `updateActionData`.
    ///
    /// # Errors
    ///
    /// See [`send_command`](Self::send_command).
    pub fn update_action_data(
        &self,
        data_id: &str,
        min_value: f64,
        max_value: f64,
        data_type: ActionDataType,
        instance_id: Option<&str>,
    ) -> Result<(), ClientError> {
        self.send_command(&UpdateActionData::new(
            data_id,
            min_value,
            max_value,
            data_type,
            instance_id.map(str::to_owned),
        ))
    }

    /// Send `showNotification`. At least one option is required.
    ///
    /// # Errors
    ///
    /// See [`send_command`](Self::send_command).
    pub fn show_notification(
        &self,
        notification_id: &str,
        title: &str,
        msg: &str,
        options: Vec<NotificationOption>,
    ) -> Result<(), ClientError> {
        self.send_command(&ShowNotification::new(notification_id, title, msg, options))
    }

    /// Send `connectorUpdate` by connector id. The `pc_<pluginId>_` prefix
    /// is added; `value` must be within 0..=100.
    ///
    /// # Errors
    ///
    /// See [`send_command`](Self::send_command).
    pub fn connector_update(&self, connector_id: &str, value: i32) -> Result<(), ClientError> {
        self.send_command(&ConnectorUpdate::new(self.plugin_id(), connector_id, value))
    }

    /// Send `connectorUpdate` by short id; `value` must be within 0..=100.
    ///
    /// # Errors
    ///
    /// See [`send_command`](Self::send_command).
    pub fn connector_update_short(&self, short_id: &str, value: i32) -> Result<(), ClientError> {
        self.send_command(&ConnectorUpdateShort::new(short_id, value))
    }

    /// Send a pre-built message unmodified.
    ///
    /// # Errors
    ///
    /// See [`send_command`](Self::send_command).
    pub fn send_message(&self, message: &str) -> Result<(), ClientError> {
        self.send_command(&RawMessage(message.to_owned()))
    }
}

impl Drop for Client {
    fn drop(&mut self) {
        self.inner.close(CLOSED_BY_PLUGIN);
    }
}

impl Inner {
    fn close(&self, reason: &str) {
        let Some(previous) = self.state.begin_close() else {
            log::debug!("[Client] Close already in progress ({reason})");
            return;
        };

        if previous == ConnectionState::Disconnected {
            self.state.finish_close();
            return;
        }

        log::info!("[Client] Closing: {reason}");
        guarded("closed", || self.handler.on_closed(reason));

        self.handshake.cancel();
        self.stop.store(true, Ordering::Release);
        self.transport.close();

        let consumer = lock(&self.consumer).take();
        if let Some(mut worker) = consumer {
            if worker.stop_within(CONSUMER_STOP_TIMEOUT) == StopOutcome::Detached {
                log::warn!("[Client] Event consumer is hung, continuing shutdown without it");
                *lock(&self.consumer) = Some(worker);
            }
        }

        self.state.finish_close();
        if self.background_running() {
            log::warn!("[Client] Closed with a background thread still running");
        } else {
            log::info!("[Client] Closed");
        }
    }

    /// Whether the listener or the consumer thread is still alive.
    fn background_running(&self) -> bool {
        let consumer_running = lock(&self.consumer)
            .as_ref()
            .is_some_and(|worker| !worker.is_finished());
        consumer_running || self.transport.listener_running()
    }
}

/// Builds the consumer's close trigger. The close runs on its own thread
/// so the consumer never waits on itself.
fn close_trigger(inner: Weak<Inner>) -> Box<dyn Fn(&str) + Send> {
    Box::new(move |reason| spawn_close(inner.clone(), reason.to_owned()))
}

fn spawn_close(inner: Weak<Inner>, reason: String) {
    let spawned = thread::Builder::new()
        .name(CLOSER_THREAD_NAME.to_owned())
        .spawn(move || {
            if let Some(inner) = inner.upgrade() {
                inner.close(&reason);
            }
        });
    if let Err(e) = spawned {
        log::error!("[Client] Could not spawn close thread: {e}");
    }
}

/// Listener-side end of the frame queue.
struct QueueSink {
    frames: Sender<Frame>,
    inner: Weak<Inner>,
}

impl FrameSink for QueueSink {
    fn on_frame(&self, frame: Frame) {
        // Fails only once the consumer is gone, i.e. during close.
        let _ = self.frames.send(frame);
    }

    fn on_disconnect(&self, reason: String) {
        spawn_close(self.inner.clone(), format!("Connection terminated: {reason}"));
    }
}

fn lock<T>(mutex: &Mutex<T>) -> std::sync::MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

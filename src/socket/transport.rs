//! One TCP connection to Touch Portal.
//!
//! The socket operates in **blocking mode** with short read and write
//! timeouts. The listener thread reads into a [`FrameReader`] and forwards
//! each completed line to a [`FrameSink`]; the read timeout doubles as the
//! loop's poll interval so a stop request is seen within one tick.
//!
//! # Lifecycle
//!
//! ```text
//! Transport::new ──connect()──► start_listening(sink) ──► send(..)* ──► close()
//!                                    │
//!                        "touchportal-listener" thread
//!                                    │ Ok(0) / fatal error
//!                                    ▼
//!                        sink.on_disconnect(reason)   (unless stopping)
//! ```

// Rust guideline compliant 2026-02

use std::io::{self, Read, Write};
use std::net::{Shutdown, SocketAddr, TcpStream, ToSocketAddrs};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use anyhow::{anyhow, bail, Context, Result};

use super::framing::{Frame, FrameReader};
use crate::config::ClientConfig;
use crate::constants::{
    FRAME_DELIMITER, LISTENER_GRACE_FACTOR, LISTENER_START_TIMEOUT, MIN_RECEIVE_BUFFER_SIZE,
};
use crate::error::ClientError;
use crate::worker::{StopOutcome, Worker};

const LISTENER_THREAD_NAME: &str = "touchportal-listener";

/// Receiver of everything the listener thread produces.
///
/// Called on the listener thread; implementations must return quickly.
pub trait FrameSink: Send + Sync {
    /// A complete, non-empty line arrived.
    fn on_frame(&self, frame: Frame);

    /// The connection ended without a stop request.
    fn on_disconnect(&self, reason: String);
}

/// Raw byte transport over one TCP connection.
#[derive(Debug)]
pub struct Transport {
    host: String,
    port: u16,
    connect_timeout: Duration,
    read_timeout: Duration,
    write_timeout: Duration,
    receive_buffer_size: AtomicUsize,
    /// Write half. Also keeps the socket alive until close.
    writer: Mutex<Option<TcpStream>>,
    /// Separate handle used only for `shutdown`, so close never waits on a
    /// writer holding the lock.
    shutdown_handle: Mutex<Option<TcpStream>>,
    listener: Mutex<Option<Worker>>,
    listening: AtomicBool,
    closed: AtomicBool,
    stop: Arc<AtomicBool>,
}

impl Transport {
    /// Create an unconnected transport. `stop` is the shared stop signal
    /// observed by the listener thread.
    pub fn new(config: &ClientConfig, stop: Arc<AtomicBool>) -> Self {
        Self {
            host: config.host.clone(),
            port: config.port,
            connect_timeout: config.connect_timeout(),
            read_timeout: config.read_timeout(),
            write_timeout: config.write_timeout(),
            receive_buffer_size: AtomicUsize::new(config.receive_buffer_size),
            writer: Mutex::new(None),
            shutdown_handle: Mutex::new(None),
            listener: Mutex::new(None),
            listening: AtomicBool::new(false),
            closed: AtomicBool::new(false),
            stop,
        }
    }

    /// Resolve the host and open the TCP connection.
    ///
    /// Each resolved address is tried in turn. Failures are logged with the
    /// distinguishing cause (refused, unreachable, unknown host).
    ///
    /// # Errors
    ///
    /// Returns an error if no address accepts the connection or the socket
    /// options cannot be applied.
    pub fn connect(&self) -> Result<()> {
        if self.closed.load(Ordering::Acquire) {
            bail!("transport is closed");
        }
        if lock(&self.writer).is_some() {
            bail!("transport is already connected");
        }

        let target = format!("{}:{}", self.host, self.port);
        log::info!("[Transport] Connecting to Touch Portal at {target}");

        let addrs: Vec<SocketAddr> = match (self.host.as_str(), self.port).to_socket_addrs() {
            Ok(addrs) => addrs.collect(),
            Err(e) => {
                log::error!("[Transport] Unknown host {}: {e}", self.host);
                return Err(anyhow!(e).context(format!("resolve {target}")));
            }
        };
        if addrs.is_empty() {
            log::error!("[Transport] Unknown host {}: no addresses", self.host);
            bail!("resolve {target}: no addresses");
        }

        let mut last_err = None;
        let mut connected = None;
        for addr in &addrs {
            match TcpStream::connect_timeout(addr, self.connect_timeout) {
                Ok(stream) => {
                    connected = Some(stream);
                    break;
                }
                Err(e) => {
                    log_connect_failure(addr, &e);
                    last_err = Some(e);
                }
            }
        }
        let stream = match (connected, last_err) {
            (Some(stream), _) => stream,
            (None, Some(e)) => return Err(anyhow!(e).context(format!("connect to {target}"))),
            (None, None) => bail!("connect to {target}: no addresses"),
        };

        stream
            .set_read_timeout(Some(self.read_timeout))
            .context("set socket read timeout")?;
        stream
            .set_write_timeout(Some(self.write_timeout))
            .context("set socket write timeout")?;
        if let Err(e) = stream.set_nodelay(true) {
            log::debug!("[Transport] Could not disable Nagle: {e}");
        }
        let shutdown_handle = stream.try_clone().context("clone socket for shutdown")?;

        *lock(&self.shutdown_handle) = Some(shutdown_handle);
        *lock(&self.writer) = Some(stream);
        log::info!("[Transport] Connected to {target}");
        Ok(())
    }

    /// Whether a socket is held, close has not started and the listener
    /// (once started) is still reading.
    pub fn is_connected(&self) -> bool {
        if self.closed.load(Ordering::Acquire) || lock(&self.writer).is_none() {
            return false;
        }
        lock(&self.listener)
            .as_ref()
            .map_or(true, |worker| !worker.is_finished())
    }

    /// Whether the listener thread is alive. Stays true after `close` only
    /// for a listener that missed its stop deadline.
    pub(crate) fn listener_running(&self) -> bool {
        lock(&self.listener)
            .as_ref()
            .is_some_and(|worker| !worker.is_finished())
    }

    /// Current receive buffer size in bytes.
    pub fn receive_buffer_size(&self) -> usize {
        self.receive_buffer_size.load(Ordering::Acquire)
    }

    /// Change the receive buffer size.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::ConfigLocked`] once listening has started and
    /// [`ClientError::InvalidConfig`] for a size below the minimum.
    pub fn set_receive_buffer_size(&self, size: usize) -> Result<(), ClientError> {
        if self.listening.load(Ordering::Acquire) {
            return Err(ClientError::ConfigLocked);
        }
        if size < MIN_RECEIVE_BUFFER_SIZE {
            return Err(ClientError::InvalidConfig(format!(
                "receive buffer size {size} is below the minimum of {MIN_RECEIVE_BUFFER_SIZE} bytes"
            )));
        }
        self.receive_buffer_size.store(size, Ordering::Release);
        Ok(())
    }

    /// Spawn the listener thread and return once it is running.
    ///
    /// # Errors
    ///
    /// Returns an error if called twice, before `connect`, or if the
    /// thread cannot be started.
    pub fn start_listening(&self, sink: Arc<dyn FrameSink>) -> Result<()> {
        if self.closed.load(Ordering::Acquire) {
            bail!("transport is closed");
        }
        if self.listening.swap(true, Ordering::AcqRel) {
            bail!("listener already started");
        }
        let stream = lock(&self.writer)
            .as_ref()
            .context("start listening before connect")?
            .try_clone()
            .context("clone socket for listener")?;

        let capacity = self.receive_buffer_size.load(Ordering::Acquire);
        let stop = Arc::clone(&self.stop);
        let worker = Worker::spawn(LISTENER_THREAD_NAME, LISTENER_START_TIMEOUT, move || {
            receive_loop(stream, FrameReader::new(capacity), sink.as_ref(), &stop);
        })
        .context("spawn listener thread")?;

        *lock(&self.listener) = Some(worker);
        Ok(())
    }

    /// Write `payload` followed by the frame delimiter.
    ///
    /// Timed-out writes are retried until the frame is fully written or the
    /// stop signal is set. Concurrent callers are serialized.
    ///
    /// # Errors
    ///
    /// Returns an error when not connected, when stopped mid-write, or on
    /// any non-transient socket error.
    pub fn send(&self, payload: &[u8]) -> Result<()> {
        if self.closed.load(Ordering::Acquire) || self.stop.load(Ordering::Acquire) {
            bail!("transport is closed");
        }

        let mut line = Vec::with_capacity(payload.len() + 1);
        line.extend_from_slice(payload);
        line.push(FRAME_DELIMITER);

        let mut guard = lock(&self.writer);
        let stream = guard.as_mut().context("send before connect")?;

        let mut written = 0;
        while written < line.len() {
            match stream.write(&line[written..]) {
                Ok(0) => {
                    return Err(io::Error::from(io::ErrorKind::WriteZero))
                        .context("socket accepted no bytes");
                }
                Ok(n) => written += n,
                Err(e) if is_transient(&e) => {
                    if self.stop.load(Ordering::Acquire) {
                        bail!("stopped after writing {written} of {} bytes", line.len());
                    }
                }
                Err(e) => return Err(e).context("write to socket"),
            }
        }
        log::trace!("[Transport] Sent {written} bytes");
        Ok(())
    }

    /// Shut the socket down and stop the listener. Idempotent.
    ///
    /// Waits at most `read_timeout * LISTENER_GRACE_FACTOR` for the listener
    /// to exit, then detaches it. Never waits when called from the listener
    /// thread itself.
    pub fn close(&self) {
        if self.closed.swap(true, Ordering::AcqRel) {
            return;
        }
        self.stop.store(true, Ordering::Release);

        if let Some(stream) = lock(&self.shutdown_handle).take() {
            // NotConnected is expected when the peer already went away.
            if let Err(e) = stream.shutdown(Shutdown::Both) {
                log::debug!("[Transport] Socket shutdown: {e}");
            }
        }

        let worker = lock(&self.listener).take();
        if let Some(mut worker) = worker {
            let grace = self.read_timeout * LISTENER_GRACE_FACTOR;
            if worker.stop_within(grace) == StopOutcome::Detached {
                log::warn!("[Transport] Listener did not exit within {grace:?}");
                *lock(&self.listener) = Some(worker);
            }
        }

        lock(&self.writer).take();
        log::debug!("[Transport] Closed");
    }
}

impl Drop for Transport {
    fn drop(&mut self) {
        self.close();
    }
}

/// Listener thread body.
fn receive_loop(mut stream: TcpStream, mut reader: FrameReader, sink: &dyn FrameSink, stop: &AtomicBool) {
    log::debug!(
        "[Transport] Listener running with a {} byte buffer",
        reader.capacity()
    );

    let failure = loop {
        if stop.load(Ordering::Acquire) {
            break None;
        }
        match stream.read(reader.spare_mut()) {
            Ok(0) => break Some("Touch Portal closed the connection".to_owned()),
            Ok(n) => {
                reader.commit(n, |frame| sink.on_frame(frame));
            }
            Err(e) if is_transient(&e) => {}
            Err(e) => break Some(format!("socket error: {e}")),
        }
    };

    match failure {
        Some(reason) if !stop.load(Ordering::Acquire) => {
            log::warn!("[Transport] Listener stopped: {reason}");
            sink.on_disconnect(reason);
        }
        _ => log::debug!("[Transport] Listener stopped on request"),
    }
}

fn is_transient(e: &io::Error) -> bool {
    matches!(
        e.kind(),
        io::ErrorKind::WouldBlock | io::ErrorKind::TimedOut | io::ErrorKind::Interrupted
    )
}

fn log_connect_failure(addr: &SocketAddr, e: &io::Error) {
    match e.kind() {
        io::ErrorKind::ConnectionRefused => log::error!(
            "[Transport] Connection to {addr} refused, Touch Portal might not be running"
        ),
        io::ErrorKind::HostUnreachable | io::ErrorKind::NetworkUnreachable => {
            log::error!("[Transport] Host {addr} is unreachable: {e}");
        }
        io::ErrorKind::TimedOut => log::error!("[Transport] Connection to {addr} timed out"),
        _ => log::error!("[Transport] Could not connect to {addr}: {e}"),
    }
}

fn lock<T>(mutex: &Mutex<T>) -> std::sync::MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

//! Protocol-wide constants for the Touch Portal client.
//!
//! This module centralizes the magic numbers used by the transport, the
//! handshake and the command validators. Constants are grouped by domain.
//!
//! # Categories
//!
//! - **Connection**: default endpoint of the host
//! - **Timeouts**: handshake, socket and shutdown deadlines
//! - **Framing**: receive buffer sizing and the frame delimiter
//! - **Commands**: limits enforced before a command reaches the wire

use std::time::Duration;

// ============================================================================
// Connection
// ============================================================================

/// Default host address. Touch Portal only listens on loopback.
pub const DEFAULT_HOST: &str = "127.0.0.1";

/// Default Touch Portal plugin port.
pub const DEFAULT_PORT: u16 = 12136;

// ============================================================================
// Timeouts
// ============================================================================

/// How long `Client::connect` waits for the `info` reply to `pair`.
pub const HANDSHAKE_TIMEOUT: Duration = Duration::from_secs(10);

/// Socket read timeout.
///
/// Doubles as the polling interval of the receive loop, so a stop request
/// is noticed within one tick even when the host is silent.
pub const READ_TIMEOUT: Duration = Duration::from_millis(1000);

/// Socket write timeout. A timed-out write is retried until the frame is
/// fully written or the connection is stopped.
pub const WRITE_TIMEOUT: Duration = Duration::from_millis(1000);

/// Per-address TCP connect timeout.
pub const CONNECT_TIMEOUT: Duration = Duration::from_secs(5);

/// Multiplier applied to the read timeout to get the receive loop's
/// grace period during close.
pub const LISTENER_GRACE_FACTOR: u32 = 3;

/// How long close waits for the event consumer to stop.
pub const CONSUMER_STOP_TIMEOUT: Duration = Duration::from_secs(2);

/// Consumer queue wait tick. Bounds how late the consumer notices the
/// stop signal when no frames arrive.
pub const CONSUMER_POLL_INTERVAL: Duration = Duration::from_millis(100);

/// How long `start_listening` waits for the listener thread to report in.
pub const LISTENER_START_TIMEOUT: Duration = Duration::from_secs(2);

// ============================================================================
// Framing
// ============================================================================

/// Frame delimiter (`\n`).
pub const FRAME_DELIMITER: u8 = b'\n';

/// Default receive buffer size. Must hold at least one full message.
pub const DEFAULT_RECEIVE_BUFFER_SIZE: usize = 2 * 1024;

/// Smallest receive buffer accepted by configuration.
pub const MIN_RECEIVE_BUFFER_SIZE: usize = 64;

// ============================================================================
// Commands
// ============================================================================

/// Lowest value accepted by connector updates.
pub const CONNECTOR_VALUE_MIN: i32 = 0;

/// Highest value accepted by connector updates.
pub const CONNECTOR_VALUE_MAX: i32 = 100;

/// Maximum length of a fully-prefixed long connector id.
pub const MAX_CONNECTOR_ID_LEN: usize = 200;

/// Prefix the host prepends to plugin connector ids (`pc_<pluginId>_`).
pub const CONNECTOR_ID_PREFIX: &str = "pc_";

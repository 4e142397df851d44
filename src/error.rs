//! Error types surfaced by the client façade and the command validators.
//!
//! Peer-induced conditions never panic; they end up either here, as a
//! returned error, or in the handler's `on_closed` callback.

use std::fmt;

use crate::client::ConnectionState;

/// A command failed local validation and was not sent.
#[derive(Debug, Clone, PartialEq)]
pub enum CommandError {
    /// The handler supplied an empty plugin id.
    MissingPluginId,
    /// A required string field was empty or whitespace.
    EmptyField(&'static str),
    /// A numeric value was outside its allowed range.
    ValueOutOfRange {
        /// Rejected value.
        value: f64,
        /// Inclusive lower bound.
        min: f64,
        /// Inclusive upper bound.
        max: f64,
    },
    /// Numeric bounds were not finite or the minimum was above the maximum.
    InvalidBounds {
        /// Requested lower bound.
        min: f64,
        /// Requested upper bound.
        max: f64,
    },
    /// The prefixed connector id exceeds the host's limit.
    IdTooLong {
        /// Length of the rejected id.
        len: usize,
        /// Maximum allowed length.
        max: usize,
    },
    /// A notification was built without any options.
    MissingNotificationOptions,
}

impl fmt::Display for CommandError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MissingPluginId => write!(f, "Plugin id cannot be empty"),
            Self::EmptyField(field) => write!(f, "Field '{field}' cannot be empty"),
            Self::ValueOutOfRange { value, min, max } => {
                write!(f, "Value {value} outside allowed range {min}..={max}")
            }
            Self::InvalidBounds { min, max } => {
                write!(f, "Invalid bounds {min}..={max}, both must be finite with min <= max")
            }
            Self::IdTooLong { len, max } => {
                write!(f, "Id is {len} characters long, limit is {max}")
            }
            Self::MissingNotificationOptions => {
                write!(f, "Notification requires at least one option")
            }
        }
    }
}

impl std::error::Error for CommandError {}

/// Errors returned by [`crate::Client`] operations.
#[derive(Debug)]
pub enum ClientError {
    /// The operation is not allowed in the current connection state.
    InvalidState {
        /// State observed when the operation was attempted.
        state: ConnectionState,
        /// Operation that was refused.
        operation: String,
    },
    /// A command failed local validation; nothing was sent.
    Validation(CommandError),
    /// The TCP connection could not be established.
    Connect(String),
    /// The host did not acknowledge pairing before the deadline.
    HandshakeTimeout,
    /// The connection closed while the operation was in flight.
    ConnectionClosed,
    /// A socket write or thread spawn failed.
    Io(std::io::Error),
    /// A command could not be serialized.
    Serialize(serde_json::Error),
    /// Receive buffer settings cannot change once listening has started.
    ConfigLocked,
    /// A configuration value was rejected.
    InvalidConfig(String),
}

impl fmt::Display for ClientError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidState { state, operation } => {
                write!(f, "Cannot {operation} while {state}")
            }
            Self::Validation(err) => write!(f, "Invalid command: {err}"),
            Self::Connect(msg) => write!(f, "Connection failed: {msg}"),
            Self::HandshakeTimeout => write!(f, "Pair response timed out"),
            Self::ConnectionClosed => write!(f, "Connection closed"),
            Self::Io(err) => write!(f, "I/O error: {err}"),
            Self::Serialize(err) => write!(f, "Serialization error: {err}"),
            Self::ConfigLocked => {
                write!(f, "Receive buffer size must be set before listening starts")
            }
            Self::InvalidConfig(msg) => write!(f, "Invalid configuration: {msg}"),
        }
    }
}

impl std::error::Error for ClientError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Validation(err) => Some(err),
            Self::Io(err) => Some(err),
            Self::Serialize(err) => Some(err),
            _ => None,
        }
    }
}

impl From<CommandError> for ClientError {
    fn from(err: CommandError) -> Self {
        Self::Validation(err)
    }
}

impl From<std::io::Error> for ClientError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err)
    }
}

impl From<serde_json::Error> for ClientError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialize(err)
    }
}

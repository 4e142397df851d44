//! Connection state shared between the caller and the background threads.

use std::fmt;
use std::sync::atomic::{AtomicU8, Ordering};

/// Lifecycle of a [`crate::Client`]. States only move forward.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(u8)]
pub enum ConnectionState {
    /// Created, `connect` not called yet.
    Disconnected = 0,
    /// Opening the TCP connection.
    Connecting = 1,
    /// `pair` sent, waiting for `info`.
    AwaitingPairAck = 2,
    /// Paired; commands may be sent.
    Ready = 3,
    /// Shutdown in progress.
    Closing = 4,
    /// Terminal.
    Closed = 5,
}

impl ConnectionState {
    fn from_u8(value: u8) -> Self {
        match value {
            0 => Self::Disconnected,
            1 => Self::Connecting,
            2 => Self::AwaitingPairAck,
            3 => Self::Ready,
            4 => Self::Closing,
            _ => Self::Closed,
        }
    }

    /// Whether shutdown has started or finished.
    pub fn is_terminal(self) -> bool {
        self >= Self::Closing
    }
}

impl fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Disconnected => "disconnected",
            Self::Connecting => "connecting",
            Self::AwaitingPairAck => "awaiting pair ack",
            Self::Ready => "ready",
            Self::Closing => "closing",
            Self::Closed => "closed",
        })
    }
}

/// Atomic cell holding a [`ConnectionState`].
#[derive(Debug)]
pub(crate) struct StateCell(AtomicU8);

impl StateCell {
    pub(crate) fn new() -> Self {
        Self(AtomicU8::new(ConnectionState::Disconnected as u8))
    }

    pub(crate) fn get(&self) -> ConnectionState {
        ConnectionState::from_u8(self.0.load(Ordering::Acquire))
    }

    /// Move `from` → `to` if the cell still holds `from`. Backward moves are
    /// refused. Returns whether the transition happened.
    pub(crate) fn advance(&self, from: ConnectionState, to: ConnectionState) -> bool {
        if to <= from {
            return false;
        }
        self.0
            .compare_exchange(from as u8, to as u8, Ordering::AcqRel, Ordering::Acquire)
            .is_ok()
    }

    /// Enter `Closing` from any non-terminal state and return the state it
    /// left. `None` when another caller already started (or finished) the
    /// shutdown.
    pub(crate) fn begin_close(&self) -> Option<ConnectionState> {
        let mut current = self.0.load(Ordering::Acquire);
        loop {
            let state = ConnectionState::from_u8(current);
            if state.is_terminal() {
                return None;
            }
            match self.0.compare_exchange_weak(
                current,
                ConnectionState::Closing as u8,
                Ordering::AcqRel,
                Ordering::Acquire,
            ) {
                Ok(_) => return Some(state),
                Err(actual) => current = actual,
            }
        }
    }

    /// Enter `Closed` unconditionally.
    pub(crate) fn finish_close(&self) {
        self.0.store(ConnectionState::Closed as u8, Ordering::Release);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::thread;

    #[test]
    fn test_forward_transitions_only() {
        let cell = StateCell::new();
        assert!(cell.advance(ConnectionState::Disconnected, ConnectionState::Connecting));
        assert!(!cell.advance(ConnectionState::Disconnected, ConnectionState::Connecting));
        assert!(cell.advance(ConnectionState::Connecting, ConnectionState::AwaitingPairAck));
        assert!(!cell.advance(ConnectionState::AwaitingPairAck, ConnectionState::Connecting));
        assert!(cell.advance(ConnectionState::AwaitingPairAck, ConnectionState::Ready));
        assert_eq!(cell.get(), ConnectionState::Ready);
    }

    #[test]
    fn test_begin_close_wins_once() {
        let cell = Arc::new(StateCell::new());
        cell.advance(ConnectionState::Disconnected, ConnectionState::Ready);

        let winners: usize = (0..8)
            .map(|_| {
                let cell = Arc::clone(&cell);
                thread::spawn(move || usize::from(cell.begin_close().is_some()))
            })
            .collect::<Vec<_>>()
            .into_iter()
            .map(|h| h.join().unwrap())
            .sum();

        assert_eq!(winners, 1);
        assert_eq!(cell.get(), ConnectionState::Closing);
        cell.finish_close();
        assert_eq!(cell.begin_close(), None);
        assert_eq!(cell.get(), ConnectionState::Closed);
    }

    #[test]
    fn test_display_is_lowercase() {
        assert_eq!(ConnectionState::Closed.to_string(), "closed");
        assert_eq!(ConnectionState::AwaitingPairAck.to_string(), "awaiting pair ack");
    }
}

//! TCP plumbing between the plugin and Touch Portal.
//!
//! # Architecture
//!
//! ```text
//! Touch Portal (host, 127.0.0.1:12136)
//!     │  {"type":...}\n {"type":...}\n
//!     ▼
//! Transport ── listener thread ── FrameReader ──► FrameSink::on_frame
//!     ▲                                      └──► FrameSink::on_disconnect
//!     │
//! Transport::send(json) ◄── Client command methods
//! ```
//!
//! Nothing in this module knows about message types. [`framing`] splits the
//! byte stream into lines; [`transport`] owns the socket, the listener
//! thread and the bounded close.

pub mod framing;
pub mod transport;

pub use framing::{FeedStatus, Frame, FrameReader};
pub use transport::{FrameSink, Transport};

//! Touch Portal plugin client.
//!
//! A plugin connects to the Touch Portal host over TCP, pairs with a
//! `pair` command and then exchanges newline-delimited JSON messages:
//! events arrive from the host, commands go back.
//!
//! # Architecture
//!
//! - **Client** - Owns one connection, pairs, sends commands, closes once
//! - **Socket** - TCP transport with a framing listener thread
//! - **Messages** - Typed inbound events, outbound commands and the resolver
//!   that maps a frame to an event
//! - **EventHandler** - Application callbacks, run on a consumer thread
//!
//! # Modules
//!
//! - [`client`] - Connection lifecycle and the command surface
//! - [`messages`] - Wire types
//! - [`socket`] - Framing and transport
//! - [`config`] - Configuration loading

// Library modules
pub mod client;
pub mod messages;
pub mod socket;

pub mod config;
pub mod constants;
pub mod error;

mod worker;

// Re-export commonly used types
pub use client::{Client, ConnectionState, EventHandler};
pub use config::ClientConfig;
pub use error::{ClientError, CommandError};
pub use messages::{Event, EventKind, OutboundCommand};

//! Two-phase decoding of inbound frames.
//!
//! Phase one reads only the `type` field and looks it up in a static
//! table; phase two decodes the whole frame into the matching payload.
//! Unknown discriminators are not errors: the frame comes back as
//! [`Resolution::Unresolved`] so it can be passed on verbatim.

use std::collections::HashMap;
use std::fmt;
use std::sync::LazyLock;

use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::Value;

use super::events::{Event, EventKind};
use super::Press;
use crate::socket::Frame;

/// Payload shape selected by the discriminator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Shape {
    Info,
    ClosePlugin,
    Settings,
    Action(Press),
    ConnectorChange,
    ListChange,
    Broadcast,
    NotificationOptionClicked,
    ShortConnectorIdNotification,
}

/// Lowercased discriminator → shape. Matching is ASCII case-insensitive.
static SHAPES: LazyLock<HashMap<&'static str, Shape>> = LazyLock::new(|| {
    HashMap::from([
        ("info", Shape::Info),
        ("closeplugin", Shape::ClosePlugin),
        ("settings", Shape::Settings),
        ("action", Shape::Action(Press::Tap)),
        ("down", Shape::Action(Press::Down)),
        ("up", Shape::Action(Press::Up)),
        ("connectorchange", Shape::ConnectorChange),
        ("listchange", Shape::ListChange),
        ("broadcast", Shape::Broadcast),
        ("notificationoptionclicked", Shape::NotificationOptionClicked),
        ("shortconnectoridnotification", Shape::ShortConnectorIdNotification),
    ])
});

/// Outcome of resolving one frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    /// A known event kind, fully decoded.
    Event(Event),
    /// Missing, non-string or unknown `type`; the original frame.
    Unresolved(Frame),
}

/// A frame of a known kind (or not JSON at all) failed to decode.
#[derive(Debug)]
pub struct DecodeError {
    kind: Option<EventKind>,
    source: serde_json::Error,
}

impl DecodeError {
    /// Event kind selected before decoding failed; `None` if the frame was
    /// not a JSON object.
    pub fn kind(&self) -> Option<EventKind> {
        self.kind
    }
}

impl fmt::Display for DecodeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.kind {
            Some(kind) => write!(f, "Malformed {kind} message: {}", self.source),
            None => write!(f, "Malformed message: {}", self.source),
        }
    }
}

impl std::error::Error for DecodeError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(&self.source)
    }
}

#[derive(Deserialize)]
struct Discriminator {
    #[serde(rename = "type", default)]
    kind: Option<Value>,
}

/// Decode `frame` into an [`Event`].
///
/// # Errors
///
/// Returns [`DecodeError`] if the frame is not a JSON object or a known
/// kind's payload is malformed. The connection is unaffected either way.
pub fn resolve(frame: &Frame) -> Result<Resolution, DecodeError> {
    let bytes = frame.as_bytes();
    let discriminator: Discriminator =
        serde_json::from_slice(bytes).map_err(|source| DecodeError { kind: None, source })?;

    let shape = match discriminator.kind {
        Some(Value::String(kind)) => SHAPES.get(kind.to_ascii_lowercase().as_str()).copied(),
        _ => None,
    };
    let Some(shape) = shape else {
        return Ok(Resolution::Unresolved(frame.clone()));
    };

    let event = match shape {
        Shape::Info => Event::Info(decode(bytes, EventKind::Info)?),
        Shape::ClosePlugin => Event::ClosePlugin(decode(bytes, EventKind::ClosePlugin)?),
        Shape::Settings => Event::Settings(decode(bytes, EventKind::Settings)?),
        Shape::Action(press) => {
            let mut action: super::ActionEvent = decode(bytes, EventKind::Action)?;
            action.press = press;
            Event::Action(action)
        }
        Shape::ConnectorChange => {
            Event::ConnectorChange(decode(bytes, EventKind::ConnectorChange)?)
        }
        Shape::ListChange => Event::ListChange(decode(bytes, EventKind::ListChange)?),
        Shape::Broadcast => Event::Broadcast(decode(bytes, EventKind::Broadcast)?),
        Shape::NotificationOptionClicked => Event::NotificationOptionClicked(decode(
            bytes,
            EventKind::NotificationOptionClicked,
        )?),
        Shape::ShortConnectorIdNotification => Event::ShortConnectorIdNotification(decode(
            bytes,
            EventKind::ShortConnectorIdNotification,
        )?),
    };
    Ok(Resolution::Event(event))
}

fn decode<T: DeserializeOwned>(bytes: &[u8], kind: EventKind) -> Result<T, DecodeError> {
    serde_json::from_slice(bytes).map_err(|source| DecodeError {
        kind: Some(kind),
        source,
    })
}

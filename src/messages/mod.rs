//! Touch Portal message model.
//!
//! Inbound messages ([`events`]) are decoded by the [`resolver`]; outbound
//! messages ([`commands`]) are validated and serialized by the client. This
//! module holds the small value types shared by both directions.
//!
//! Field names on the wire are lowerCamelCase and every object carries a
//! string `type` discriminator.

pub mod commands;
pub mod connector_id;
pub mod events;
pub mod resolver;

use std::collections::HashMap;
use std::fmt;

use serde::{Deserialize, Deserializer};
use serde_json::Value;

pub use commands::{
    ActionDataType, ActionDataValue, ChoiceUpdate, CommandKind, ConnectorUpdate,
    ConnectorUpdateShort, CreateState, NotificationOption, OutboundCommand, Pair, RawMessage,
    RemoveState, SettingUpdate, ShowNotification, StateUpdate, UpdateActionData,
};
pub use connector_id::ConnectorId;
pub use events::{
    ActionEvent, BroadcastEvent, CloseEvent, ConnectorChangeEvent, Event, EventKind, InfoEvent,
    ListChangeEvent, NotificationOptionClickedEvent, SettingsEvent,
    ShortConnectorIdNotificationEvent,
};
pub use resolver::{resolve, DecodeError, Resolution};

/// Correlates a message with its logical subject.
///
/// `id` and `instance_id` are empty when the message kind has none.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Identifier {
    kind: String,
    id: String,
    instance_id: String,
}

impl Identifier {
    /// Build an identifier. `None` parts become empty strings.
    pub fn new(kind: impl Into<String>, id: Option<&str>, instance_id: Option<&str>) -> Self {
        Self {
            kind: kind.into(),
            id: id.unwrap_or_default().to_owned(),
            instance_id: instance_id.unwrap_or_default().to_owned(),
        }
    }

    /// Message discriminator, e.g. `"action"` or `"stateUpdate"`.
    pub fn kind(&self) -> &str {
        &self.kind
    }

    /// Subject id, or empty.
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Action instance id, or empty.
    pub fn instance_id(&self) -> &str {
        &self.instance_id
    }
}

impl fmt::Display for Identifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.kind)?;
        if !self.id.is_empty() {
            write!(f, ":{}", self.id)?;
        }
        if !self.instance_id.is_empty() {
            write!(f, "@{}", self.instance_id)?;
        }
        Ok(())
    }
}

/// One plugin setting as a name/value pair.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Setting {
    /// Setting name as declared in the plugin's entry file.
    pub name: String,
    /// Current value. Non-string JSON values are kept in their JSON text form.
    pub value: String,
}

/// One `{id, value}` entry of an action or connector data list.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ActionDataSelected {
    /// Data field id.
    #[serde(default, deserialize_with = "string_or_default")]
    pub id: String,
    /// Selected value; `None` when the host sent null.
    #[serde(default, deserialize_with = "optional_string")]
    pub value: Option<String>,
}

/// Data list of an event, kept in wire order and indexed by id.
///
/// Duplicate ids resolve to the last entry.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ActionData {
    entries: Vec<ActionDataSelected>,
    index: HashMap<String, usize>,
}

impl ActionData {
    /// Value of data field `id`, if present and non-null.
    pub fn get(&self, id: &str) -> Option<&str> {
        self.index
            .get(id)
            .and_then(|&i| self.entries[i].value.as_deref())
    }

    /// Whether a field with `id` exists (even with a null value).
    pub fn contains(&self, id: &str) -> bool {
        self.index.contains_key(id)
    }

    /// Entries in wire order, duplicates included.
    pub fn entries(&self) -> &[ActionDataSelected] {
        &self.entries
    }

    /// Number of entries, duplicates included.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the list is empty.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl FromIterator<ActionDataSelected> for ActionData {
    fn from_iter<I: IntoIterator<Item = ActionDataSelected>>(iter: I) -> Self {
        let entries: Vec<ActionDataSelected> = iter.into_iter().collect();
        let index = entries
            .iter()
            .enumerate()
            .map(|(i, entry)| (entry.id.clone(), i))
            .collect();
        Self { entries, index }
    }
}

impl<'de> Deserialize<'de> for ActionData {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let entries = Option::<Vec<ActionDataSelected>>::deserialize(deserializer)?;
        Ok(entries.into_iter().flatten().collect())
    }
}

/// How an action was triggered.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum Press {
    /// A complete press (`action`).
    #[default]
    Tap,
    /// Finger held down (`down`).
    Down,
    /// Finger released (`up`).
    Up,
}

impl Press {
    /// The discriminator that produces this press state.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Tap => "action",
            Self::Down => "down",
            Self::Up => "up",
        }
    }
}

impl fmt::Display for Press {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ── Lenient field decoding ──────────────────────────────────────────────────
//
// The host sends null for absent strings and occasionally numbers or bools
// where a string is documented. None of that should reject a whole message.

fn value_to_string(value: Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(s) => Some(s),
        other => Some(other.to_string()),
    }
}

pub(crate) fn string_or_default<'de, D: Deserializer<'de>>(d: D) -> Result<String, D::Error> {
    Ok(value_to_string(Value::deserialize(d)?).unwrap_or_default())
}

pub(crate) fn optional_string<'de, D: Deserializer<'de>>(d: D) -> Result<Option<String>, D::Error> {
    Ok(value_to_string(Value::deserialize(d)?))
}

/// Flattens `[{"name": value}, ...]` into settings, in wire order.
pub(crate) fn flatten_settings<'de, D: Deserializer<'de>>(d: D) -> Result<Vec<Setting>, D::Error> {
    let objects = Option::<Vec<serde_json::Map<String, Value>>>::deserialize(d)?;
    Ok(objects
        .into_iter()
        .flatten()
        .flat_map(|object| object.into_iter())
        .map(|(name, value)| Setting {
            name,
            value: value_to_string(value).unwrap_or_default(),
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[derive(Deserialize)]
    struct SettingsHolder {
        #[serde(default, deserialize_with = "flatten_settings")]
        settings: Vec<Setting>,
    }

    #[test]
    fn test_action_data_last_write_wins() {
        let data: ActionData = serde_json::from_value(json!([
            {"id": "mode", "value": "first"},
            {"id": "axis", "value": "x"},
            {"id": "mode", "value": "second"}
        ]))
        .unwrap();

        assert_eq!(data.get("mode"), Some("second"));
        assert_eq!(data.get("axis"), Some("x"));
        assert_eq!(data.get("missing"), None);
        assert_eq!(data.len(), 3);
    }

    #[test]
    fn test_action_data_null_and_non_string_values() {
        let data: ActionData = serde_json::from_value(json!([
            {"id": "n", "value": null},
            {"id": "num", "value": 42}
        ]))
        .unwrap();

        assert!(data.contains("n"));
        assert_eq!(data.get("n"), None);
        assert_eq!(data.get("num"), Some("42"));

        let empty: ActionData = serde_json::from_value(Value::Null).unwrap();
        assert!(empty.is_empty());
    }

    #[test]
    fn test_settings_flattened_in_order() {
        let holder: SettingsHolder = serde_json::from_value(json!({
            "settings": [{"Port": "1"}, {"Mode": 2}, {"Empty": null}]
        }))
        .unwrap();

        let pairs: Vec<(&str, &str)> = holder
            .settings
            .iter()
            .map(|s| (s.name.as_str(), s.value.as_str()))
            .collect();
        assert_eq!(pairs, vec![("Port", "1"), ("Mode", "2"), ("Empty", "")]);
    }

    #[test]
    fn test_settings_missing_or_null() {
        let holder: SettingsHolder = serde_json::from_value(json!({})).unwrap();
        assert!(holder.settings.is_empty());
        let holder: SettingsHolder = serde_json::from_value(json!({"settings": null})).unwrap();
        assert!(holder.settings.is_empty());
    }

    #[test]
    fn test_identifier_display() {
        assert_eq!(Identifier::new("info", None, None).to_string(), "info");
        assert_eq!(
            Identifier::new("listChange", Some("list"), Some("inst")).to_string(),
            "listChange:list@inst"
        );
        assert_eq!(Identifier::new("action", Some("a"), None).instance_id(), "");
    }
}

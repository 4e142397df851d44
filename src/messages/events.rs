//! Inbound events sent by Touch Portal.
//!
//! Each event kind has its own payload struct; [`Event`] is the sum type the
//! resolver produces and the consumer dispatches on.

use serde::Deserialize;

use super::{
    flatten_settings, optional_string, string_or_default, ActionData, ConnectorId, Identifier,
    Press, Setting,
};

/// Pairing acknowledgement, sent once in reply to `pair`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InfoEvent {
    /// Pairing status, normally `"paired"`.
    #[serde(default, deserialize_with = "string_or_default")]
    pub status: String,
    /// SDK version the host speaks.
    #[serde(default)]
    pub sdk_version: i64,
    /// Host version as `M.m.ppp`.
    #[serde(default, deserialize_with = "string_or_default")]
    pub tp_version_string: String,
    /// Host version as `Major * 10000 + Minor * 1000 + patch`.
    #[serde(default)]
    pub tp_version_code: i64,
    /// Plugin version from the entry file.
    #[serde(default)]
    pub plugin_version: i64,
    /// Current plugin settings.
    #[serde(default, deserialize_with = "flatten_settings")]
    pub settings: Vec<Setting>,
}

/// Settings changed in the host UI or after a `settingUpdate`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct SettingsEvent {
    /// All settings with their current values.
    #[serde(default, deserialize_with = "flatten_settings")]
    pub values: Vec<Setting>,
}

/// The host asks the plugin to shut down.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CloseEvent {
    /// Plugin being closed.
    #[serde(default, deserialize_with = "string_or_default")]
    pub plugin_id: String,
}

/// A button bound to one of the plugin's actions was pressed, held or released.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActionEvent {
    /// Which of `action`, `down` or `up` produced this event.
    #[serde(skip)]
    pub press: Press,
    /// Plugin owning the action.
    #[serde(default, deserialize_with = "string_or_default")]
    pub plugin_id: String,
    /// Action id.
    #[serde(default, deserialize_with = "string_or_default")]
    pub action_id: String,
    /// Values the user selected for the action's data fields.
    #[serde(default)]
    pub data: ActionData,
}

impl ActionEvent {
    /// Value of data field `id`.
    pub fn data_value(&self, id: &str) -> Option<&str> {
        self.data.get(id)
    }
}

/// A slider bound to one of the plugin's connectors moved.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConnectorChangeEvent {
    /// Plugin owning the connector.
    #[serde(default, deserialize_with = "string_or_default")]
    pub plugin_id: String,
    /// Connector id, without the host's `pc_` prefix.
    #[serde(default, deserialize_with = "string_or_default")]
    pub connector_id: String,
    /// New value, 0 to 100.
    #[serde(default)]
    pub value: i32,
    /// Values of the connector's data fields.
    #[serde(default)]
    pub data: ActionData,
}

impl ConnectorChangeEvent {
    /// Value of data field `id`.
    pub fn data_value(&self, id: &str) -> Option<&str> {
        self.data.get(id)
    }
}

/// A dropdown in the action editor changed selection.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListChangeEvent {
    /// Plugin owning the action.
    #[serde(default, deserialize_with = "string_or_default")]
    pub plugin_id: String,
    /// Action the list belongs to.
    #[serde(default, deserialize_with = "string_or_default")]
    pub action_id: String,
    /// Data field the list is built on.
    #[serde(default, deserialize_with = "string_or_default")]
    pub list_id: String,
    /// Action instance being edited. May be absent.
    #[serde(default, deserialize_with = "optional_string")]
    pub instance_id: Option<String>,
    /// Selected value; `None` if nothing is selected.
    #[serde(default, deserialize_with = "optional_string")]
    pub value: Option<String>,
}

/// Host-wide broadcast, e.g. a page change.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BroadcastEvent {
    /// Broadcast name, e.g. `"pageChange"`.
    #[serde(default, deserialize_with = "string_or_default")]
    pub event: String,
    /// Page the event refers to.
    #[serde(default, deserialize_with = "string_or_default")]
    pub page_name: String,
}

/// The user clicked an option of a notification shown by the plugin.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NotificationOptionClickedEvent {
    /// Notification id given in `showNotification`.
    #[serde(default, deserialize_with = "string_or_default")]
    pub notification_id: String,
    /// Option id that was clicked.
    #[serde(default, deserialize_with = "string_or_default")]
    pub option_id: String,
}

/// Maps a connector instance's long id to a short id for cheaper updates.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShortConnectorIdNotificationEvent {
    /// Plugin owning the connector.
    #[serde(default, deserialize_with = "string_or_default")]
    pub plugin_id: String,
    /// Long id: `pc_<pluginId>_<connectorId>|k=v|...`.
    #[serde(default, deserialize_with = "string_or_default")]
    pub connector_id: String,
    /// Short alias usable with `connectorUpdate`.
    #[serde(default, deserialize_with = "string_or_default")]
    pub short_id: String,
}

impl ShortConnectorIdNotificationEvent {
    /// Split the long id into connector id and data values.
    pub fn parse_connector_id(&self) -> ConnectorId {
        ConnectorId::parse(&self.connector_id, Some(self.plugin_id.as_str()))
    }
}

/// Discriminator of a resolved event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    /// `info`
    Info,
    /// `closePlugin`
    ClosePlugin,
    /// `settings`
    Settings,
    /// `action`, `down` and `up`
    Action,
    /// `connectorChange`
    ConnectorChange,
    /// `listChange`
    ListChange,
    /// `broadcast`
    Broadcast,
    /// `notificationOptionClicked`
    NotificationOptionClicked,
    /// `shortConnectorIdNotification`
    ShortConnectorIdNotification,
}

impl EventKind {
    /// Canonical wire discriminator.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Info => "info",
            Self::ClosePlugin => "closePlugin",
            Self::Settings => "settings",
            Self::Action => "action",
            Self::ConnectorChange => "connectorChange",
            Self::ListChange => "listChange",
            Self::Broadcast => "broadcast",
            Self::NotificationOptionClicked => "notificationOptionClicked",
            Self::ShortConnectorIdNotification => "shortConnectorIdNotification",
        }
    }
}

impl std::fmt::Display for EventKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A decoded inbound message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    /// Pairing acknowledgement.
    Info(InfoEvent),
    /// Host-initiated shutdown.
    ClosePlugin(CloseEvent),
    /// Settings changed.
    Settings(SettingsEvent),
    /// Action pressed, held or released.
    Action(ActionEvent),
    /// Connector value changed.
    ConnectorChange(ConnectorChangeEvent),
    /// Dropdown selection changed.
    ListChange(ListChangeEvent),
    /// Host broadcast.
    Broadcast(BroadcastEvent),
    /// Notification option clicked.
    NotificationOptionClicked(NotificationOptionClickedEvent),
    /// Short connector id issued.
    ShortConnectorIdNotification(ShortConnectorIdNotificationEvent),
}

impl Event {
    /// Event discriminator.
    pub fn kind(&self) -> EventKind {
        match self {
            Self::Info(_) => EventKind::Info,
            Self::ClosePlugin(_) => EventKind::ClosePlugin,
            Self::Settings(_) => EventKind::Settings,
            Self::Action(_) => EventKind::Action,
            Self::ConnectorChange(_) => EventKind::ConnectorChange,
            Self::ListChange(_) => EventKind::ListChange,
            Self::Broadcast(_) => EventKind::Broadcast,
            Self::NotificationOptionClicked(_) => EventKind::NotificationOptionClicked,
            Self::ShortConnectorIdNotification(_) => EventKind::ShortConnectorIdNotification,
        }
    }

    /// The event's subject. Actions report `down`/`up` as their kind when
    /// that is what the host sent.
    pub fn identifier(&self) -> Identifier {
        let kind = self.kind().as_str();
        match self {
            Self::Info(_) | Self::Settings(_) => Identifier::new(kind, None, None),
            Self::ClosePlugin(e) => Identifier::new(kind, Some(e.plugin_id.as_str()), None),
            Self::Action(e) => Identifier::new(e.press.as_str(), Some(e.action_id.as_str()), None),
            Self::ConnectorChange(e) => Identifier::new(kind, Some(e.connector_id.as_str()), None),
            Self::ListChange(e) => {
                Identifier::new(kind, Some(e.list_id.as_str()), e.instance_id.as_deref())
            }
            Self::Broadcast(e) => Identifier::new(kind, Some(e.page_name.as_str()), None),
            Self::NotificationOptionClicked(e) => {
                Identifier::new(kind, Some(e.notification_id.as_str()), None)
            }
            Self::ShortConnectorIdNotification(e) => {
                Identifier::new(kind, Some(e.connector_id.as_str()), None)
            }
        }
    }

    /// Value of data field `id`. `None` for kinds without a data list.
    pub fn data_value(&self, id: &str) -> Option<&str> {
        match self {
            Self::Action(e) => e.data_value(id),
            Self::ConnectorChange(e) => e.data_value(id),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_info_event_fields() {
        let info: InfoEvent = serde_json::from_value(json!({
            "type": "info",
            "status": "paired",
            "sdkVersion": 6,
            "tpVersionString": "3.1.10",
            "tpVersionCode": 301010,
            "pluginVersion": 2,
            "settings": [{"Refresh": "500"}]
        }))
        .unwrap();

        assert_eq!(info.status, "paired");
        assert_eq!(info.sdk_version, 6);
        assert_eq!(info.tp_version_code, 301_010);
        assert_eq!(info.settings[0].name, "Refresh");
        assert_eq!(info.settings[0].value, "500");
    }

    #[test]
    fn test_info_event_tolerates_nulls_and_missing_fields() {
        let info: InfoEvent =
            serde_json::from_value(json!({"type": "info", "tpVersionString": null})).unwrap();
        assert_eq!(info.status, "");
        assert_eq!(info.tp_version_string, "");
        assert!(info.settings.is_empty());
    }

    #[test]
    fn test_connector_change_identifier_and_data() {
        let event = Event::ConnectorChange(
            serde_json::from_value(json!({
                "type": "connectorChange",
                "pluginId": "tj",
                "connectorId": "axis",
                "value": 42,
                "data": [{"id": "axis.id", "value": "X"}]
            }))
            .unwrap(),
        );

        assert_eq!(event.kind(), EventKind::ConnectorChange);
        assert_eq!(event.identifier(), Identifier::new("connectorChange", Some("axis"), None));
        assert_eq!(event.data_value("axis.id"), Some("X"));
    }

    #[test]
    fn test_list_change_identifier_carries_instance() {
        let event = Event::ListChange(
            serde_json::from_value(json!({
                "type": "listChange",
                "pluginId": "tj",
                "actionId": "act",
                "listId": "device",
                "instanceId": "btn-1",
                "value": null
            }))
            .unwrap(),
        );

        let id = event.identifier();
        assert_eq!(id.id(), "device");
        assert_eq!(id.instance_id(), "btn-1");
        assert_eq!(event.data_value("device"), None);
    }

    #[test]
    fn test_short_connector_notification_parses_long_id() {
        let event: ShortConnectorIdNotificationEvent = serde_json::from_value(json!({
            "type": "shortConnectorIdNotification",
            "pluginId": "tj",
            "connectorId": "pc_tj_slider|axis=X|inverted=1",
            "shortId": "ch2"
        }))
        .unwrap();

        let parsed = event.parse_connector_id();
        assert_eq!(parsed.connector_id(), "slider");
        assert_eq!(parsed.get("axis"), Some("X"));
        assert_eq!(event.short_id, "ch2");
    }
}

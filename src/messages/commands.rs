//! Outbound commands sent to Touch Portal.
//!
//! Each command is a plain struct that serializes to its wire object with
//! the `type` discriminator added by serde. Constructors never fail;
//! [`OutboundCommand::validate`] is run by the client before anything is
//! written, so an invalid command never reaches the socket.

use serde::Serialize;

use super::Identifier;
use crate::constants::{
    CONNECTOR_ID_PREFIX, CONNECTOR_VALUE_MAX, CONNECTOR_VALUE_MIN, MAX_CONNECTOR_ID_LEN,
};
use crate::error::CommandError;

/// A message the plugin can send.
pub trait OutboundCommand {
    /// Stable discriminator of the command.
    fn kind(&self) -> CommandKind;

    /// Subject of the command.
    fn identifier(&self) -> Identifier;

    /// Check required fields and value ranges.
    ///
    /// # Errors
    ///
    /// Returns the first violated rule.
    fn validate(&self) -> Result<(), CommandError>;

    /// Wire bytes without the trailing delimiter.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    fn encode(&self) -> Result<Vec<u8>, serde_json::Error>;
}

/// Discriminator of an outbound command.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CommandKind {
    /// `pair`
    Pair,
    /// `settingUpdate`
    SettingUpdate,
    /// `createState`
    CreateState,
    /// `removeState`
    RemoveState,
    /// `stateUpdate`
    StateUpdate,
    /// `choiceUpdate`
    ChoiceUpdate,
    /// `updateActionData`
    UpdateActionData,
    /// `showNotification`
    ShowNotification,
    /// `connectorUpdate` addressed by long id.
    ConnectorUpdate,
    /// `connectorUpdate` addressed by short id.
    ConnectorUpdateShort,
    /// Pre-built message sent verbatim.
    Raw,
}

impl CommandKind {
    /// Stable name of the kind.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Pair => "pair",
            Self::SettingUpdate => "settingUpdate",
            Self::CreateState => "createState",
            Self::RemoveState => "removeState",
            Self::StateUpdate => "stateUpdate",
            Self::ChoiceUpdate => "choiceUpdate",
            Self::UpdateActionData => "updateActionData",
            Self::ShowNotification => "showNotification",
            Self::ConnectorUpdate => "connectorUpdate",
            Self::ConnectorUpdateShort => "connectorUpdateShort",
            Self::Raw => "raw",
        }
    }
}

impl std::fmt::Display for CommandKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

fn require(field: &'static str, value: &str) -> Result<(), CommandError> {
    if value.trim().is_empty() {
        return Err(CommandError::EmptyField(field));
    }
    Ok(())
}

fn require_connector_value(value: i32) -> Result<(), CommandError> {
    if !(CONNECTOR_VALUE_MIN..=CONNECTOR_VALUE_MAX).contains(&value) {
        return Err(CommandError::ValueOutOfRange {
            value: f64::from(value),
            min: f64::from(CONNECTOR_VALUE_MIN),
            max: f64::from(CONNECTOR_VALUE_MAX),
        });
    }
    Ok(())
}

fn empty_to_none(s: Option<String>) -> Option<String> {
    s.filter(|s| !s.trim().is_empty())
}

// ── pair ────────────────────────────────────────────────────────────────────

/// Pairing request. The host answers with `info`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename = "pair")]
pub struct Pair {
    /// Plugin id from the entry file.
    pub id: String,
}

impl Pair {
    /// Pair as `plugin_id`.
    pub fn new(plugin_id: impl Into<String>) -> Self {
        Self { id: plugin_id.into() }
    }
}

impl OutboundCommand for Pair {
    fn kind(&self) -> CommandKind {
        CommandKind::Pair
    }

    fn identifier(&self) -> Identifier {
        Identifier::new(self.kind().as_str(), Some(self.id.as_str()), None)
    }

    fn validate(&self) -> Result<(), CommandError> {
        if self.id.trim().is_empty() {
            return Err(CommandError::MissingPluginId);
        }
        Ok(())
    }

    fn encode(&self) -> Result<Vec<u8>, serde_json::Error> {
        serde_json::to_vec(self)
    }
}

// ── settings and states ─────────────────────────────────────────────────────

/// Change a plugin setting's value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename = "settingUpdate")]
pub struct SettingUpdate {
    /// Setting name.
    pub name: String,
    /// New value.
    pub value: String,
}

impl SettingUpdate {
    /// Set setting `name` to `value`.
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
        }
    }
}

impl OutboundCommand for SettingUpdate {
    fn kind(&self) -> CommandKind {
        CommandKind::SettingUpdate
    }

    fn identifier(&self) -> Identifier {
        Identifier::new(self.kind().as_str(), Some(self.name.as_str()), None)
    }

    fn validate(&self) -> Result<(), CommandError> {
        require("name", &self.name)
    }

    fn encode(&self) -> Result<Vec<u8>, serde_json::Error> {
        serde_json::to_vec(self)
    }
}

/// Create a dynamic state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename = "createState", rename_all = "camelCase")]
pub struct CreateState {
    /// State id.
    pub id: String,
    /// Description shown in the host UI.
    pub desc: String,
    /// Initial value.
    pub default_value: String,
}

impl CreateState {
    /// Create state `id` described as `desc` starting at `default_value`.
    pub fn new(
        id: impl Into<String>,
        desc: impl Into<String>,
        default_value: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            desc: desc.into(),
            default_value: default_value.into(),
        }
    }
}

impl OutboundCommand for CreateState {
    fn kind(&self) -> CommandKind {
        CommandKind::CreateState
    }

    fn identifier(&self) -> Identifier {
        Identifier::new(self.kind().as_str(), Some(self.id.as_str()), None)
    }

    fn validate(&self) -> Result<(), CommandError> {
        require("id", &self.id)?;
        require("desc", &self.desc)
    }

    fn encode(&self) -> Result<Vec<u8>, serde_json::Error> {
        serde_json::to_vec(self)
    }
}

/// Remove a dynamic state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename = "removeState")]
pub struct RemoveState {
    /// State id.
    pub id: String,
}

impl RemoveState {
    /// Remove state `id`.
    pub fn new(id: impl Into<String>) -> Self {
        Self { id: id.into() }
    }
}

impl OutboundCommand for RemoveState {
    fn kind(&self) -> CommandKind {
        CommandKind::RemoveState
    }

    fn identifier(&self) -> Identifier {
        Identifier::new(self.kind().as_str(), Some(self.id.as_str()), None)
    }

    fn validate(&self) -> Result<(), CommandError> {
        require("id", &self.id)
    }

    fn encode(&self) -> Result<Vec<u8>, serde_json::Error> {
        serde_json::to_vec(self)
    }
}

/// Set a state's value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename = "stateUpdate")]
pub struct StateUpdate {
    /// State id.
    pub id: String,
    /// New value.
    pub value: String,
}

impl StateUpdate {
    /// Set state `id` to `value`.
    pub fn new(id: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            value: value.into(),
        }
    }
}

impl OutboundCommand for StateUpdate {
    fn kind(&self) -> CommandKind {
        CommandKind::StateUpdate
    }

    fn identifier(&self) -> Identifier {
        Identifier::new(self.kind().as_str(), Some(self.id.as_str()), None)
    }

    fn validate(&self) -> Result<(), CommandError> {
        require("id", &self.id)
    }

    fn encode(&self) -> Result<Vec<u8>, serde_json::Error> {
        serde_json::to_vec(self)
    }
}

// ── action editor ───────────────────────────────────────────────────────────

/// Replace the entries of a choice list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename = "choiceUpdate", rename_all = "camelCase")]
pub struct ChoiceUpdate {
    /// List (data field) id.
    pub id: String,
    /// New choices.
    pub value: Vec<String>,
    /// Restrict the update to one action instance.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub instance_id: Option<String>,
}

impl ChoiceUpdate {
    /// Update list `id` everywhere, or only in `instance_id` when given.
    /// An empty instance id counts as none.
    pub fn new(id: impl Into<String>, value: Vec<String>, instance_id: Option<String>) -> Self {
        Self {
            id: id.into(),
            value,
            instance_id: empty_to_none(instance_id),
        }
    }
}

impl OutboundCommand for ChoiceUpdate {
    fn kind(&self) -> CommandKind {
        CommandKind::ChoiceUpdate
    }

    fn identifier(&self) -> Identifier {
        Identifier::new(
            self.kind().as_str(),
            Some(self.id.as_str()),
            self.instance_id.as_deref(),
        )
    }

    fn validate(&self) -> Result<(), CommandError> {
        require("id", &self.id)
    }

    fn encode(&self) -> Result<Vec<u8>, serde_json::Error> {
        serde_json::to_vec(self)
    }
}

/// Input type of an action data field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum ActionDataType {
    /// Free text.
    Text,
    /// Number with bounds.
    Number,
    /// On/off switch.
    Switch,
    /// Choice list.
    Choice,
    /// File picker.
    File,
    /// Folder picker.
    Folder,
    /// Color picker.
    Color,
}

/// Bounds and type of a numeric action data field.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ActionDataValue {
    /// Data field id.
    pub id: String,
    /// Lower bound.
    pub min_value: f64,
    /// Upper bound.
    pub max_value: f64,
    /// Field type.
    #[serde(rename = "type")]
    pub data_type: ActionDataType,
}

/// Change the bounds of an action data field.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename = "updateActionData", rename_all = "camelCase")]
pub struct UpdateActionData {
    /// Restrict the update to one action instance.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub instance_id: Option<String>,
    /// New field definition.
    pub data: ActionDataValue,
}

impl UpdateActionData {
    /// Bound field `data_id` to `min_value..=max_value`.
    pub fn new(
        data_id: impl Into<String>,
        min_value: f64,
        max_value: f64,
        data_type: ActionDataType,
        instance_id: Option<String>,
    ) -> Self {
        Self {
            instance_id: empty_to_none(instance_id),
            data: ActionDataValue {
                id: data_id.into(),
                min_value,
                max_value,
                data_type,
            },
        }
    }
}

impl OutboundCommand for UpdateActionData {
    fn kind(&self) -> CommandKind {
        CommandKind::UpdateActionData
    }

    fn identifier(&self) -> Identifier {
        Identifier::new(
            self.kind().as_str(),
            Some(self.data.id.as_str()),
            self.instance_id.as_deref(),
        )
    }

    fn validate(&self) -> Result<(), CommandError> {
        require("data.id", &self.data.id)?;
        let (min, max) = (self.data.min_value, self.data.max_value);
        // serde_json writes non-finite floats as null.
        if !min.is_finite() || !max.is_finite() || min > max {
            return Err(CommandError::InvalidBounds { min, max });
        }
        Ok(())
    }

    fn encode(&self) -> Result<Vec<u8>, serde_json::Error> {
        serde_json::to_vec(self)
    }
}

// ── notifications ───────────────────────────────────────────────────────────

/// A clickable option of a notification.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NotificationOption {
    /// Option id reported back in `notificationOptionClicked`.
    pub id: String,
    /// Button text.
    pub title: String,
}

impl NotificationOption {
    /// Option `id` labelled `title`.
    pub fn new(id: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
        }
    }
}

/// Show a notification in the host UI.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename = "showNotification", rename_all = "camelCase")]
pub struct ShowNotification {
    /// Notification id.
    pub notification_id: String,
    /// Title.
    pub title: String,
    /// Body text.
    pub msg: String,
    /// At least one option.
    pub options: Vec<NotificationOption>,
}

impl ShowNotification {
    /// Notification `notification_id` with `title`, body `msg` and `options`.
    pub fn new(
        notification_id: impl Into<String>,
        title: impl Into<String>,
        msg: impl Into<String>,
        options: Vec<NotificationOption>,
    ) -> Self {
        Self {
            notification_id: notification_id.into(),
            title: title.into(),
            msg: msg.into(),
            options,
        }
    }
}

impl OutboundCommand for ShowNotification {
    fn kind(&self) -> CommandKind {
        CommandKind::ShowNotification
    }

    fn identifier(&self) -> Identifier {
        Identifier::new(self.kind().as_str(), Some(self.notification_id.as_str()), None)
    }

    fn validate(&self) -> Result<(), CommandError> {
        require("notificationId", &self.notification_id)?;
        require("title", &self.title)?;
        require("msg", &self.msg)?;
        if self.options.is_empty() {
            return Err(CommandError::MissingNotificationOptions);
        }
        for option in &self.options {
            require("options.id", &option.id)?;
        }
        Ok(())
    }

    fn encode(&self) -> Result<Vec<u8>, serde_json::Error> {
        serde_json::to_vec(self)
    }
}

// ── connectors ──────────────────────────────────────────────────────────────

/// Push a connector value, addressed by its long id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename = "connectorUpdate", rename_all = "camelCase")]
pub struct ConnectorUpdate {
    /// `pc_<pluginId>_<connectorId>[|k=v...]`.
    pub connector_id: String,
    /// New value, 0 to 100.
    pub value: i32,
    #[serde(skip)]
    plugin_id: String,
}

impl ConnectorUpdate {
    /// Update connector `connector_id` of `plugin_id`. The host prefix is
    /// added here.
    pub fn new(plugin_id: &str, connector_id: &str, value: i32) -> Self {
        Self {
            connector_id: format!("{CONNECTOR_ID_PREFIX}{plugin_id}_{connector_id}"),
            value,
            plugin_id: plugin_id.to_owned(),
        }
    }
}

impl OutboundCommand for ConnectorUpdate {
    fn kind(&self) -> CommandKind {
        CommandKind::ConnectorUpdate
    }

    fn identifier(&self) -> Identifier {
        Identifier::new(self.kind().as_str(), Some(self.connector_id.as_str()), None)
    }

    fn validate(&self) -> Result<(), CommandError> {
        if self.plugin_id.trim().is_empty() {
            return Err(CommandError::MissingPluginId);
        }
        let prefix_len = CONNECTOR_ID_PREFIX.len() + self.plugin_id.len() + 1;
        require(
            "connectorId",
            self.connector_id.get(prefix_len..).unwrap_or_default(),
        )?;
        let len = self.connector_id.chars().count();
        if len > MAX_CONNECTOR_ID_LEN {
            return Err(CommandError::IdTooLong {
                len,
                max: MAX_CONNECTOR_ID_LEN,
            });
        }
        require_connector_value(self.value)
    }

    fn encode(&self) -> Result<Vec<u8>, serde_json::Error> {
        serde_json::to_vec(self)
    }
}

/// Push a connector value, addressed by a host-issued short id.
///
/// Serialized with the `connectorUpdate` discriminator; the host has no
/// separate type for the short form.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename = "connectorUpdate", rename_all = "camelCase")]
pub struct ConnectorUpdateShort {
    /// Short id from `shortConnectorIdNotification`.
    pub short_id: String,
    /// New value, 0 to 100.
    pub value: i32,
}

impl ConnectorUpdateShort {
    /// Update the connector aliased by `short_id`.
    pub fn new(short_id: impl Into<String>, value: i32) -> Self {
        Self {
            short_id: short_id.into(),
            value,
        }
    }
}

impl OutboundCommand for ConnectorUpdateShort {
    fn kind(&self) -> CommandKind {
        CommandKind::ConnectorUpdateShort
    }

    fn identifier(&self) -> Identifier {
        Identifier::new(self.kind().as_str(), Some(self.short_id.as_str()), None)
    }

    fn validate(&self) -> Result<(), CommandError> {
        require("shortId", &self.short_id)?;
        require_connector_value(self.value)
    }

    fn encode(&self) -> Result<Vec<u8>, serde_json::Error> {
        serde_json::to_vec(self)
    }
}

// ── raw ─────────────────────────────────────────────────────────────────────

/// A pre-built message, sent exactly as given.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawMessage(pub String);

impl OutboundCommand for RawMessage {
    fn kind(&self) -> CommandKind {
        CommandKind::Raw
    }

    fn identifier(&self) -> Identifier {
        Identifier::new(self.kind().as_str(), None, None)
    }

    fn validate(&self) -> Result<(), CommandError> {
        require("message", &self.0)
    }

    fn encode(&self) -> Result<Vec<u8>, serde_json::Error> {
        Ok(self.0.as_bytes().to_vec())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{json, Value};

    fn wire(command: &impl OutboundCommand) -> Value {
        serde_json::from_slice(&command.encode().unwrap()).unwrap()
    }

    #[test]
    fn test_pair_wire_shape() {
        let pair = Pair::new("tj.plugin");
        assert_eq!(wire(&pair), json!({"type": "pair", "id": "tj.plugin"}));
        assert!(pair.validate().is_ok());
        assert_eq!(Pair::new(" ").validate(), Err(CommandError::MissingPluginId));
    }

    #[test]
    fn test_state_commands_wire_shape() {
        assert_eq!(
            wire(&CreateState::new("s1", "State one", "0")),
            json!({"type": "createState", "id": "s1", "desc": "State one", "defaultValue": "0"})
        );
        assert_eq!(
            wire(&StateUpdate::new("s1", "on")),
            json!({"type": "stateUpdate", "id": "s1", "value": "on"})
        );
        assert_eq!(wire(&RemoveState::new("s1")), json!({"type": "removeState", "id": "s1"}));
        assert_eq!(
            wire(&SettingUpdate::new("Port", "")),
            json!({"type": "settingUpdate", "name": "Port", "value": ""})
        );
    }

    #[test]
    fn test_required_fields() {
        assert_eq!(
            CreateState::new("s1", "", "").validate(),
            Err(CommandError::EmptyField("desc"))
        );
        assert_eq!(StateUpdate::new("", "x").validate(), Err(CommandError::EmptyField("id")));
        assert_eq!(
            SettingUpdate::new("  ", "x").validate(),
            Err(CommandError::EmptyField("name"))
        );
        assert!(RawMessage(String::new()).validate().is_err());
    }

    #[test]
    fn test_choice_update_omits_empty_instance() {
        let scoped = ChoiceUpdate::new("list", vec!["a".into(), "b".into()], Some("inst".into()));
        assert_eq!(
            wire(&scoped),
            json!({"type": "choiceUpdate", "id": "list", "value": ["a", "b"], "instanceId": "inst"})
        );
        assert_eq!(scoped.identifier().instance_id(), "inst");

        let global = ChoiceUpdate::new("list", vec![], Some(String::new()));
        assert_eq!(wire(&global), json!({"type": "choiceUpdate", "id": "list", "value": []}));
    }

    #[test]
    fn test_update_action_data_wire_shape_and_bounds() {
        let cmd = UpdateActionData::new("speed", 0.0, 10.5, ActionDataType::Number, None);
        assert_eq!(
            wire(&cmd),
            json!({
                "type": "updateActionData",
                "data": {"id": "speed", "minValue": 0.0, "maxValue": 10.5, "type": "number"}
            })
        );
        assert!(cmd.validate().is_ok());

        let inverted = UpdateActionData::new("speed", 5.0, 1.0, ActionDataType::Number, None);
        assert_eq!(
            inverted.validate(),
            Err(CommandError::InvalidBounds { min: 5.0, max: 1.0 })
        );
        let nan = UpdateActionData::new("speed", f64::NAN, 1.0, ActionDataType::Number, None);
        assert!(nan.validate().is_err());

        let equal = UpdateActionData::new("speed", 3.0, 3.0, ActionDataType::Number, None);
        assert!(equal.validate().is_ok());
    }

    #[test]
    fn test_update_action_data_rejects_infinite_bounds() {
        for (min, max) in [
            (f64::NEG_INFINITY, f64::INFINITY),
            (0.0, f64::INFINITY),
            (f64::NEG_INFINITY, 0.0),
        ] {
            let cmd = UpdateActionData::new("speed", min, max, ActionDataType::Number, None);
            assert_eq!(cmd.validate(), Err(CommandError::InvalidBounds { min, max }));
        }
    }

    #[test]
    fn test_notification_requires_option() {
        let none = ShowNotification::new("n1", "Update", "v2 is out", vec![]);
        assert_eq!(none.validate(), Err(CommandError::MissingNotificationOptions));

        let cmd = ShowNotification::new(
            "n1",
            "Update",
            "v2 is out",
            vec![NotificationOption::new("dl", "Download")],
        );
        assert!(cmd.validate().is_ok());
        assert_eq!(
            wire(&cmd),
            json!({
                "type": "showNotification",
                "notificationId": "n1",
                "title": "Update",
                "msg": "v2 is out",
                "options": [{"id": "dl", "title": "Download"}]
            })
        );
    }

    #[test]
    fn test_connector_update_range() {
        for value in [0, 50, 100] {
            assert!(ConnectorUpdate::new("tj", "axis", value).validate().is_ok());
            assert!(ConnectorUpdateShort::new("s1", value).validate().is_ok());
        }
        for value in [-1, 101] {
            assert!(matches!(
                ConnectorUpdate::new("tj", "axis", value).validate(),
                Err(CommandError::ValueOutOfRange { .. })
            ));
            assert!(ConnectorUpdateShort::new("s1", value).validate().is_err());
        }
    }

    #[test]
    fn test_connector_update_prefix_and_length() {
        let cmd = ConnectorUpdate::new("tj", "axis|device=1", 10);
        assert_eq!(
            wire(&cmd),
            json!({"type": "connectorUpdate", "connectorId": "pc_tj_axis|device=1", "value": 10})
        );

        // "pc_tj_" plus the id fills the limit exactly.
        let fits = "x".repeat(MAX_CONNECTOR_ID_LEN - "pc_tj_".len());
        let at_limit = ConnectorUpdate::new("tj", &fits, 100);
        assert_eq!(at_limit.connector_id.chars().count(), MAX_CONNECTOR_ID_LEN);
        assert_eq!(at_limit.validate(), Ok(()));

        let long = format!("{fits}x");
        assert!(matches!(
            ConnectorUpdate::new("tj", &long, 10).validate(),
            Err(CommandError::IdTooLong { .. })
        ));
        assert_eq!(
            ConnectorUpdate::new("", "axis", 10).validate(),
            Err(CommandError::MissingPluginId)
        );
        assert_eq!(
            ConnectorUpdate::new("tj", "", 10).validate(),
            Err(CommandError::EmptyField("connectorId"))
        );
    }

    #[test]
    fn test_short_connector_update_uses_connector_update_type() {
        let cmd = ConnectorUpdateShort::new("ch2", 75);
        assert_eq!(cmd.kind().as_str(), "connectorUpdateShort");
        assert_eq!(
            wire(&cmd),
            json!({"type": "connectorUpdate", "shortId": "ch2", "value": 75})
        );
    }

    #[test]
    fn test_raw_message_sent_verbatim() {
        let raw = RawMessage(r#"{"type":"custom","x":1}"#.to_owned());
        assert_eq!(raw.encode().unwrap(), br#"{"type":"custom","x":1}"#.to_vec());
        assert_eq!(raw.kind(), CommandKind::Raw);
    }
}

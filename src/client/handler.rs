//! Callbacks the client invokes for inbound traffic.

use crate::messages::{
    ActionEvent, BroadcastEvent, ConnectorChangeEvent, InfoEvent, ListChangeEvent,
    NotificationOptionClickedEvent, SettingsEvent, ShortConnectorIdNotificationEvent,
};

/// Receives decoded events from a [`crate::Client`].
///
/// All event methods run on the client's consumer thread, one at a time and
/// in wire order. A slow method delays later events but never the socket.
/// A panicking method is logged and the next event is still delivered.
///
/// Only [`plugin_id`](Self::plugin_id) and [`on_closed`](Self::on_closed)
/// must be implemented; the rest log at debug level by default.
pub trait EventHandler: Send + Sync {
    /// Plugin id used for pairing. Must be non-empty.
    fn plugin_id(&self) -> &str;

    /// The connection closed. Called exactly once per connected client,
    /// before the socket is torn down.
    fn on_closed(&self, reason: &str);

    /// Pairing acknowledged; carries the initial settings.
    fn on_info(&self, event: &InfoEvent) {
        log::debug!("[Handler] info: status={} tp={}", event.status, event.tp_version_string);
    }

    /// A dropdown selection changed in the action editor.
    fn on_list_change(&self, event: &ListChangeEvent) {
        log::debug!("[Handler] listChange: {}", event.list_id);
    }

    /// Host broadcast.
    fn on_broadcast(&self, event: &BroadcastEvent) {
        log::debug!("[Handler] broadcast: {} {}", event.event, event.page_name);
    }

    /// Settings changed.
    fn on_settings(&self, event: &SettingsEvent) {
        log::debug!("[Handler] settings: {} values", event.values.len());
    }

    /// Action pressed, held or released.
    fn on_action(&self, event: &ActionEvent) {
        log::debug!("[Handler] {}: {}", event.press, event.action_id);
    }

    /// Notification option clicked.
    fn on_notification_option_clicked(&self, event: &NotificationOptionClickedEvent) {
        log::debug!(
            "[Handler] notificationOptionClicked: {} {}",
            event.notification_id,
            event.option_id
        );
    }

    /// Connector value changed.
    fn on_connector_change(&self, event: &ConnectorChangeEvent) {
        log::debug!("[Handler] connectorChange: {}={}", event.connector_id, event.value);
    }

    /// Short connector id issued.
    fn on_short_connector_id_notification(&self, event: &ShortConnectorIdNotificationEvent) {
        log::debug!("[Handler] shortConnectorIdNotification: {}", event.short_id);
    }

    /// A message of a kind this client does not know, as received.
    fn on_unhandled(&self, raw: &str) {
        log::debug!("[Handler] unhandled message: {raw}");
    }
}

//! Long connector id parsing.
//!
//! The host identifies a connector instance with a long id made of the
//! prefixed connector id followed by the instance's data values:
//!
//! ```text
//! pc_<pluginId>_<connectorId>|<dataId1>=<value1>|<dataId2>=<value2>
//! ```

use crate::constants::CONNECTOR_ID_PREFIX;

/// A parsed long connector id.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConnectorId {
    connector_id: String,
    data: Vec<(String, String)>,
}

impl ConnectorId {
    /// Parse `long_id`. With a `plugin_id`, a leading `pc_<pluginId>_` is
    /// stripped from the connector id.
    ///
    /// Empty `|` segments are skipped. A segment without `=` becomes a key
    /// with an empty value; only the first `=` splits, so values may
    /// contain `=`.
    pub fn parse(long_id: &str, plugin_id: Option<&str>) -> Self {
        let mut segments = long_id.split('|').filter(|s| !s.is_empty());
        let Some(first) = segments.next() else {
            return Self::default();
        };

        let connector_id = match plugin_id.filter(|p| !p.trim().is_empty()) {
            Some(plugin_id) => {
                let prefix = format!("{CONNECTOR_ID_PREFIX}{plugin_id}_");
                first.strip_prefix(prefix.as_str()).unwrap_or(first)
            }
            None => first,
        };

        let data = segments
            .map(|segment| match segment.split_once('=') {
                Some((key, value)) => (key.to_owned(), value.to_owned()),
                None => (segment.to_owned(), String::new()),
            })
            .collect();

        Self {
            connector_id: connector_id.to_owned(),
            data,
        }
    }

    /// Connector id, prefix stripped when a plugin id was given.
    pub fn connector_id(&self) -> &str {
        &self.connector_id
    }

    /// Value of data field `key`. Later duplicates win.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.data
            .iter()
            .rev()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    /// Data pairs in wire order.
    pub fn data(&self) -> &[(String, String)] {
        &self.data
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_full_long_id() {
        let id = ConnectorId::parse("pc_tj_axis|device=1|axis=X", Some("tj"));
        assert_eq!(id.connector_id(), "axis");
        assert_eq!(id.get("device"), Some("1"));
        assert_eq!(id.get("axis"), Some("X"));
        assert_eq!(id.data().len(), 2);
    }

    #[test]
    fn test_prefix_kept_without_plugin_id() {
        let id = ConnectorId::parse("pc_tj_axis|a=b", None);
        assert_eq!(id.connector_id(), "pc_tj_axis");

        let id = ConnectorId::parse("pc_other_axis", Some("tj"));
        assert_eq!(id.connector_id(), "pc_other_axis");
    }

    #[test]
    fn test_segments_without_value_and_extra_equals() {
        let id = ConnectorId::parse("pc_p_c||flag|expr=a=b||", Some("p"));
        assert_eq!(id.connector_id(), "c");
        assert_eq!(id.get("flag"), Some(""));
        assert_eq!(id.get("expr"), Some("a=b"));
        assert_eq!(id.data().len(), 2);
    }

    #[test]
    fn test_empty_input() {
        let id = ConnectorId::parse("", Some("p"));
        assert_eq!(id.connector_id(), "");
        assert!(id.data().is_empty());

        let id = ConnectorId::parse("|||", None);
        assert_eq!(id, ConnectorId::default());
    }

    #[test]
    fn test_duplicate_keys_last_wins() {
        let id = ConnectorId::parse("c|k=1|k=2", None);
        assert_eq!(id.get("k"), Some("2"));
    }
}

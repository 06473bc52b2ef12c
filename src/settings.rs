//! Workspace Settings
//!
//! Settings pushed by the editor through `workspace/didChangeConfiguration`.
//! Only the `standard` namespace is consulted.

use serde::Deserialize;
use serde_json::{Map, Value};

use crate::lenient::lenient;

/// The settings payload as sent by the client
#[derive(Debug, Default, Deserialize)]
pub struct SettingsPayload {
    #[serde(default, deserialize_with = "lenient")]
    pub standard: Option<StandardSection>,
}

/// The `standard` namespace
#[derive(Debug, Default, Deserialize)]
pub struct StandardSection {
    #[serde(default, deserialize_with = "lenient")]
    pub enable: Option<bool>,
    /// Forwarded to the engine untouched
    #[serde(default)]
    pub options: Option<Value>,
}

/// Settings currently in effect
#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    pub enabled: bool,
    pub options: Value,
    /// Bumped on every replacement, used to spot stale validations
    pub generation: u64,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            enabled: true,
            options: Value::Object(Map::new()),
            generation: 0,
        }
    }
}

impl Settings {
    /// Replace the active settings from a raw payload
    pub fn apply(&mut self, payload: &Value) {
        let payload = SettingsPayload::deserialize(payload).unwrap_or_default();

        if let Some(standard) = payload.standard {
            self.enabled = standard.enable.unwrap_or(true);
            self.options = match standard.options {
                Some(Value::Null) | None => Value::Object(Map::new()),
                Some(options) => options,
            };
        }

        self.generation += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_standard_namespace_replaces_options() {
        let mut settings = Settings::default();
        settings.apply(&json!({
            "standard": { "enable": true, "options": { "globals": ["describe"] } },
            "editor": { "tabSize": 2 },
        }));

        assert!(settings.enabled);
        assert_eq!(settings.options, json!({ "globals": ["describe"] }));
        assert_eq!(settings.generation, 1);
    }

    #[test]
    fn test_missing_options_default_to_empty_object() {
        let mut settings = Settings {
            options: json!({ "parser": "babel-eslint" }),
            ..Settings::default()
        };
        settings.apply(&json!({ "standard": { "enable": false } }));

        assert!(!settings.enabled);
        assert_eq!(settings.options, json!({}));
    }

    #[test]
    fn test_other_namespaces_leave_settings_alone() {
        let mut settings = Settings {
            options: json!({ "parser": "babel-eslint" }),
            ..Settings::default()
        };
        settings.apply(&json!({ "eslint": { "enable": false } }));
        settings.apply(&Value::Null);

        assert!(settings.enabled);
        assert_eq!(settings.options, json!({ "parser": "babel-eslint" }));
        assert_eq!(settings.generation, 2);
    }

    #[test]
    fn test_options_are_opaque() {
        let mut settings = Settings::default();
        settings.apply(&json!({ "standard": { "enable": "yes", "options": 5 } }));

        assert!(settings.enabled);
        assert_eq!(settings.options, json!(5));
    }
}

use crate::decode::truthy;
use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    #[default]
    Dark,
    Light,
}

impl Theme {
    /// Anything other than `light` renders dark.
    pub fn parse_loose(value: Option<&Value>) -> Self {
        match value.and_then(Value::as_str) {
            Some("light") => Theme::Light,
            _ => Theme::Dark,
        }
    }
}

/// Per-user preferences, always saved wholesale.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserSettings {
    pub auto_precall_email: bool,
    pub auto_postcall_coaching_email: bool,
    pub theme: Theme,
}

impl Default for UserSettings {
    fn default() -> Self {
        Self {
            auto_precall_email: true,
            auto_postcall_coaching_email: false,
            theme: Theme::Dark,
        }
    }
}

impl UserSettings {
    pub fn from_value(value: &Value) -> Self {
        Self {
            auto_precall_email: truthy(value.get("autoPrecallEmail")),
            auto_postcall_coaching_email: truthy(value.get("autoPostcallCoachingEmail")),
            theme: Theme::parse_loose(value.get("theme")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn loose_values_are_coerced() {
        let settings = UserSettings::from_value(&json!({
            "autoPrecallEmail": 1,
            "autoPostcallCoachingEmail": null,
            "theme": "solarized"
        }));
        assert!(settings.auto_precall_email);
        assert!(!settings.auto_postcall_coaching_email);
        assert_eq!(settings.theme, Theme::Dark);
    }

    #[test]
    fn save_payload_is_camel_case() {
        let settings = UserSettings {
            theme: Theme::Light,
            ..UserSettings::default()
        };
        assert_eq!(
            serde_json::to_value(&settings).unwrap(),
            json!({
                "autoPrecallEmail": true,
                "autoPostcallCoachingEmail": false,
                "theme": "light"
            })
        );
    }
}

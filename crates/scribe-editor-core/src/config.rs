use serde::{Deserialize, Serialize};

use crate::actions::KeybindingConfig;
use crate::error::{EditorError, Result};
use crate::undo::DEFAULT_MAX_UNDO_STEPS;

/// Upper bound accepted for `max_undo_steps`.
pub const MAX_UNDO_STEPS_LIMIT: usize = 10_000;

/// Which default shortcut set to install.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum KeybindingPreset {
    /// Ctrl as the primary modifier.
    #[default]
    Standard,
    /// Cmd as the primary modifier.
    Mac,
}

impl KeybindingPreset {
    pub fn is_mac(self) -> bool {
        self == Self::Mac
    }

    pub fn bindings(self) -> KeybindingConfig {
        KeybindingConfig::default_for_platform(self.is_mac())
    }
}

/// Editor configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EditorConfig {
    /// How many undo steps are kept. Oldest steps are evicted first.
    pub max_undo_steps: usize,
    pub keybindings: KeybindingPreset,
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self {
            max_undo_steps: DEFAULT_MAX_UNDO_STEPS,
            keybindings: KeybindingPreset::default(),
        }
    }
}

impl EditorConfig {
    /// Decode and validate a JSON config. Missing fields take their defaults.
    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.max_undo_steps > MAX_UNDO_STEPS_LIMIT {
            return Err(EditorError::InvalidConfig(format!(
                "max_undo_steps must be at most {MAX_UNDO_STEPS_LIMIT}, got {}",
                self.max_undo_steps
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_for_missing_fields() {
        let config = EditorConfig::from_json_str("{}").unwrap();
        assert_eq!(config, EditorConfig::default());
        assert_eq!(config.max_undo_steps, 100);
    }

    #[test]
    fn test_mac_preset() {
        let config = EditorConfig::from_json_str(r#"{"keybindings": "mac"}"#).unwrap();
        assert_eq!(config.keybindings, KeybindingPreset::Mac);
        assert!(config.keybindings.is_mac());
    }

    #[test]
    fn test_rejects_too_many_steps() {
        let err = EditorConfig::from_json_str(r#"{"max_undo_steps": 20000}"#).unwrap_err();
        assert!(matches!(err, EditorError::InvalidConfig(_)));
    }

    #[test]
    fn test_rejects_malformed_json() {
        let err = EditorConfig::from_json_str(r#"{"keybindings": "emacs"}"#).unwrap_err();
        assert!(matches!(err, EditorError::Config(_)));
    }
}

//! The persisted settings record.
//!
//! The file holds a single JSON object, `{"mode": "light" | "dark" | "system"}`.
//! Anything else is rejected at this boundary so the store can fall back to
//! its in-memory default.

use crate::theme::ThemeMode;
use schemars::JsonSchema;
use serde::Serialize;

/// Durable theme settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, JsonSchema)]
pub struct ThemeSettings {
    /// Stored theme preference
    pub mode: ThemeMode,
}

impl ThemeSettings {
    pub fn new(mode: ThemeMode) -> Self {
        Self { mode }
    }

    /// Parse and validate the contents of a settings file.
    ///
    /// Extra keys are ignored. A missing or mistyped `mode` is an error.
    pub fn decode(contents: &str) -> Result<Self, SettingsError> {
        let value: serde_json::Value =
            serde_json::from_str(contents).map_err(|e| SettingsError::ParseError(e.to_string()))?;

        let Some(object) = value.as_object() else {
            return Err(SettingsError::ParseError(
                "settings root is not a JSON object".to_string(),
            ));
        };

        let mode = object
            .get("mode")
            .ok_or_else(|| SettingsError::InvalidMode("missing 'mode' field".to_string()))?;

        let mode: ThemeMode = serde_json::from_value(mode.clone())
            .map_err(|_| SettingsError::InvalidMode(mode.to_string()))?;

        Ok(Self { mode })
    }

    /// Serialize to the on-disk representation.
    pub fn encode(&self) -> Result<String, SettingsError> {
        serde_json::to_string_pretty(self).map_err(|e| SettingsError::SerializeError(e.to_string()))
    }
}

/// JSON schema describing the settings file.
pub fn settings_schema() -> serde_json::Value {
    let schema = schemars::schema_for!(ThemeSettings);
    serde_json::to_value(&schema).unwrap_or_default()
}

/// Settings load/save errors.
///
/// These never reach store callers; they only describe why a stored
/// preference was ignored or not written.
#[derive(Debug)]
pub enum SettingsError {
    IoError(String),
    ParseError(String),
    InvalidMode(String),
    SerializeError(String),
}

impl std::fmt::Display for SettingsError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SettingsError::IoError(msg) => write!(f, "IO error: {msg}"),
            SettingsError::ParseError(msg) => write!(f, "Parse error: {msg}"),
            SettingsError::InvalidMode(msg) => write!(f, "Invalid mode: {msg}"),
            SettingsError::SerializeError(msg) => write!(f, "Serialize error: {msg}"),
        }
    }
}

impl std::error::Error for SettingsError {}

impl From<std::io::Error> for SettingsError {
    fn from(e: std::io::Error) -> Self {
        SettingsError::IoError(e.to_string())
    }
}

use std::fs;
use std::path::Path;

use formats::PropertyKeys;
use scene::{Canvas, NameCorrections};
use serde::{Deserialize, Serialize};

/// Tunables for one map widget.
///
/// Every field has a default, so a config file only needs the keys it changes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ViewerConfig {
    pub canvas: Canvas,
    /// Share of the canvas a selected state fills.
    pub state_fill: f64,
    /// Share of the canvas a selected district fills.
    pub district_fill: f64,
    pub transition_ms: u64,
    /// How long deselected districts stay mounted while the camera zooms out.
    pub exit_delay_ms: u64,
    pub frame_ms: u64,
    /// Label shown when nothing is selected.
    pub default_label: String,
    /// Regions drawn for context but never selectable.
    pub non_interactive: Vec<String>,
    pub session_key: String,
    pub route_prefix: String,
    pub route_separator: String,
    pub property_keys: PropertyKeys,
    pub corrections: NameCorrections,
}

impl Default for ViewerConfig {
    fn default() -> Self {
        Self {
            canvas: Canvas::default(),
            state_fill: 0.85,
            district_fill: 0.5,
            transition_ms: 750,
            exit_delay_ms: 800,
            frame_ms: 16,
            default_label: "Northeast India".to_string(),
            non_interactive: vec!["Bangladesh".to_string()],
            session_key: "ne-map-view-state".to_string(),
            route_prefix: "/explore".to_string(),
            route_separator: "-".to_string(),
            property_keys: PropertyKeys::default(),
            corrections: NameCorrections::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    Io(String),
    Parse(String),
    Invalid(String),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::Io(msg) => write!(f, "config read failed: {msg}"),
            ConfigError::Parse(msg) => write!(f, "config parse failed: {msg}"),
            ConfigError::Invalid(msg) => write!(f, "invalid config: {msg}"),
        }
    }
}

impl std::error::Error for ConfigError {}

impl ViewerConfig {
    pub fn from_json_str(payload: &str) -> Result<Self, ConfigError> {
        let config: Self =
            serde_json::from_str(payload).map_err(|e| ConfigError::Parse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let payload =
            fs::read_to_string(path).map_err(|e| ConfigError::Io(format!("{path:?}: {e}")))?;
        Self::from_json_str(&payload)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.canvas.width > 0.0 && self.canvas.height > 0.0) {
            return Err(ConfigError::Invalid(format!(
                "canvas must be positive, got {}x{}",
                self.canvas.width, self.canvas.height
            )));
        }
        for (name, fill) in [
            ("state_fill", self.state_fill),
            ("district_fill", self.district_fill),
        ] {
            if !(fill > 0.0 && fill <= 1.0) {
                return Err(ConfigError::Invalid(format!(
                    "{name} must be in (0, 1], got {fill}"
                )));
            }
        }
        if self.frame_ms == 0 {
            return Err(ConfigError::Invalid("frame_ms must be non-zero".to_string()));
        }
        if self.session_key.trim().is_empty() {
            return Err(ConfigError::Invalid("session_key must not be empty".to_string()));
        }
        Ok(())
    }
}

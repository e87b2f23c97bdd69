//! Engine configuration.
//!
//! The host owns persistence; this module only provides the serde shape,
//! defaults and validation so a settings file can be exported and imported.

use serde::{Deserialize, Serialize};
use web_time::Duration;

use crate::constants::{
    COLOR_RETRY_LIMIT, DEFAULT_MIN_SAMPLE_DISTANCE, DEFAULT_POINT_LIMIT,
    DEFAULT_REDUCTION_THRESHOLD, DOUBLE_CLICK_WINDOW, HANDLE_HIT_RADIUS, PASTE_OFFSET,
    UNDO_STACK_LIMIT,
};
use crate::drawing::BuilderSettings;
use crate::error::{EngineError, Result};

/// Log level setting for the engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    /// Show only errors
    Error,
    /// Show errors and warnings
    Warn,
    /// Show errors, warnings, and info messages
    #[default]
    Info,
    /// Show debug-level logging
    Debug,
    /// Show all log messages including trace
    Trace,
}

impl LogLevel {
    /// Convert to log crate's LevelFilter.
    pub fn to_level_filter(&self) -> log::LevelFilter {
        match self {
            LogLevel::Error => log::LevelFilter::Error,
            LogLevel::Warn => log::LevelFilter::Warn,
            LogLevel::Info => log::LevelFilter::Info,
            LogLevel::Debug => log::LevelFilter::Debug,
            LogLevel::Trace => log::LevelFilter::Trace,
        }
    }
}

/// Current configuration file format version.
/// Increment this when making breaking changes to the config format.
pub const CONFIG_VERSION: u32 = 1;

/// Engine configuration that can be exported and imported.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Version of the configuration file format
    pub version: u32,

    #[serde(default)]
    pub drawing: DrawingSettings,

    #[serde(default)]
    pub editing: EditingSettings,

    #[serde(default)]
    pub colors: ColorSettings,

    /// Log verbosity the host should install
    #[serde(default)]
    pub log_level: LogLevel,
}

/// Shape construction settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DrawingSettings {
    /// Auto-finalize after this many points (0 = unlimited)
    #[serde(default)]
    pub point_limit: usize,

    /// Minimum pointer travel between continuous samples
    #[serde(default = "default_min_sample_distance")]
    pub min_sample_distance: f64,

    /// Initial reduction preview threshold
    #[serde(default = "default_reduction_threshold")]
    pub reduction_threshold: f64,

    /// Double-click window in milliseconds
    #[serde(default = "default_double_click_ms")]
    pub double_click_ms: u64,
}

fn default_min_sample_distance() -> f64 {
    DEFAULT_MIN_SAMPLE_DISTANCE
}

fn default_reduction_threshold() -> f64 {
    DEFAULT_REDUCTION_THRESHOLD
}

fn default_double_click_ms() -> u64 {
    DOUBLE_CLICK_WINDOW.as_millis() as u64
}

impl Default for DrawingSettings {
    fn default() -> Self {
        Self {
            point_limit: DEFAULT_POINT_LIMIT,
            min_sample_distance: default_min_sample_distance(),
            reduction_threshold: default_reduction_threshold(),
            double_click_ms: default_double_click_ms(),
        }
    }
}

/// Editing and history settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EditingSettings {
    /// Offset applied to pasted annotations
    #[serde(default = "default_paste_offset")]
    pub paste_offset: (f64, f64),

    /// Hit radius for vertex handles and point annotations
    #[serde(default = "default_handle_hit_radius")]
    pub handle_hit_radius: f64,

    /// Undo depth per image (0 = unbounded)
    #[serde(default = "default_undo_limit")]
    pub undo_limit: usize,
}

fn default_paste_offset() -> (f64, f64) {
    PASTE_OFFSET
}

fn default_handle_hit_radius() -> f64 {
    HANDLE_HIT_RADIUS
}

fn default_undo_limit() -> usize {
    UNDO_STACK_LIMIT
}

impl Default for EditingSettings {
    fn default() -> Self {
        Self {
            paste_offset: default_paste_offset(),
            handle_hit_radius: default_handle_hit_radius(),
            undo_limit: default_undo_limit(),
        }
    }
}

/// Instance color allocation settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColorSettings {
    /// Random candidates tried before accepting a collision
    #[serde(default = "default_retry_limit")]
    pub retry_limit: usize,

    /// Fixed RNG seed for reproducible colors, random when unset
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub seed: Option<u64>,
}

fn default_retry_limit() -> usize {
    COLOR_RETRY_LIMIT
}

impl Default for ColorSettings {
    fn default() -> Self {
        Self {
            retry_limit: default_retry_limit(),
            seed: None,
        }
    }
}

impl EngineConfig {
    /// Create a new configuration with default values.
    pub fn new() -> Self {
        Self {
            version: CONFIG_VERSION,
            drawing: DrawingSettings::default(),
            editing: EditingSettings::default(),
            colors: ColorSettings::default(),
            log_level: LogLevel::default(),
        }
    }

    /// Settings for the shape builder.
    pub fn builder_settings(&self) -> BuilderSettings {
        BuilderSettings {
            point_limit: self.drawing.point_limit,
            min_sample_distance: self.drawing.min_sample_distance,
            reduction_threshold: self.drawing.reduction_threshold,
            double_click_window: Duration::from_millis(self.drawing.double_click_ms),
        }
    }

    /// Check value ranges.
    pub fn validate(&self) -> Result<()> {
        let non_negative = |name: &str, value: f64| {
            if value.is_finite() && value >= 0.0 {
                Ok(())
            } else {
                Err(EngineError::invalid_config(format!(
                    "{} must be a non-negative number, got {}",
                    name, value
                )))
            }
        };
        non_negative("min_sample_distance", self.drawing.min_sample_distance)?;
        non_negative("reduction_threshold", self.drawing.reduction_threshold)?;
        non_negative("handle_hit_radius", self.editing.handle_hit_radius)?;

        let (dx, dy) = self.editing.paste_offset;
        if !dx.is_finite() || !dy.is_finite() {
            return Err(EngineError::invalid_config("paste_offset must be finite"));
        }
        if self.colors.retry_limit == 0 {
            return Err(EngineError::invalid_config(
                "retry_limit must be at least 1",
            ));
        }
        Ok(())
    }

    /// Serialize the configuration to JSON.
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Deserialize and validate configuration from JSON.
    pub fn from_json(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)?;

        // Validate version compatibility
        if config.version > CONFIG_VERSION {
            return Err(EngineError::VersionMismatch {
                expected: CONFIG_VERSION,
                found: config.version,
            });
        }

        config.validate()?;
        log::debug!("Loaded engine configuration v{}", config.version);
        Ok(config)
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = EngineConfig::new();
        assert_eq!(config.version, CONFIG_VERSION);
        assert_eq!(config.drawing.point_limit, 0);
        assert_eq!(config.editing.undo_limit, UNDO_STACK_LIMIT);
        assert_eq!(config.editing.undo_limit, 0);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_serialization_roundtrip() {
        let mut config = EngineConfig::new();
        config.drawing.point_limit = 4;
        config.colors.seed = Some(42);
        config.log_level = LogLevel::Debug;

        let json = config.to_json().expect("Failed to serialize");
        let loaded = EngineConfig::from_json(&json).expect("Failed to deserialize");
        assert_eq!(loaded, config);
    }

    #[test]
    fn test_missing_sections_use_defaults() {
        let loaded =
            EngineConfig::from_json(r#"{"version": 1, "drawing": {"point_limit": 2}}"#)
                .expect("Failed to deserialize");
        assert_eq!(loaded.drawing.point_limit, 2);
        assert_eq!(loaded.drawing.double_click_ms, 250);
        assert_eq!(loaded.editing, EditingSettings::default());
        assert_eq!(loaded.log_level, LogLevel::Info);
    }

    #[test]
    fn test_version_too_new() {
        let result = EngineConfig::from_json(r#"{"version": 999}"#);
        assert!(matches!(
            result,
            Err(EngineError::VersionMismatch {
                expected: CONFIG_VERSION,
                found: 999
            })
        ));
    }

    #[test]
    fn test_invalid_values_rejected() {
        let result = EngineConfig::from_json(
            r#"{"version": 1, "drawing": {"min_sample_distance": -1.0}}"#,
        );
        assert!(matches!(result, Err(EngineError::InvalidConfig { .. })));

        let mut config = EngineConfig::new();
        config.colors.retry_limit = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_builder_settings() {
        let mut config = EngineConfig::new();
        config.drawing.double_click_ms = 400;
        let settings = config.builder_settings();
        assert_eq!(settings.double_click_window, Duration::from_millis(400));
        assert_eq!(settings.min_sample_distance, DEFAULT_MIN_SAMPLE_DISTANCE);
    }

    #[test]
    fn test_log_level_filter() {
        assert_eq!(LogLevel::Warn.to_level_filter(), log::LevelFilter::Warn);
        assert_eq!(LogLevel::default(), LogLevel::Info);
        assert_eq!(LogLevel::default().to_level_filter(), log::LevelFilter::Info);
        assert_eq!(LogLevel::Trace.to_level_filter(), log::LevelFilter::Trace);
    }
}

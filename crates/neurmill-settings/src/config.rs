//! Configuration management for NeurMill
//!
//! Provides configuration file handling and validation. Supports JSON and TOML
//! file formats; the default location is platform-specific.
//!
//! Configuration is organized into logical sections:
//! - Catalog sources (tool, machine and material JSON files)
//! - Wear calibration and limit clamping
//! - Recommendation generation switches
//! - Logging

use crate::error::{ConfigError, SettingsError, SettingsResult};
use neurmill_core::{MaterialId, ToolMaterial};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// File name of the default configuration
pub const CONFIG_FILE_NAME: &str = "config.toml";

/// Catalog sources. Unset paths fall back to the built-in catalogs.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CatalogSettings {
    /// JSON array of tools
    pub tools: Option<PathBuf>,
    /// JSON array of machine profiles
    pub machines: Option<PathBuf>,
    /// JSON array of materials with cutting tables
    pub materials: Option<PathBuf>,
}

/// Calibration for one material and/or tool material
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WearOverride {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub material: Option<MaterialId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tool_material: Option<ToolMaterial>,
    pub speed_factor: f64,
    pub feed_factor: f64,
}

/// Wear adjustment settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WearSettings {
    pub speed_factor: f64,
    pub feed_factor: f64,
    /// Cap adjusted values at the machine/tool limits
    pub clamp_to_limits: bool,
    pub overrides: Vec<WearOverride>,
}

impl Default for WearSettings {
    fn default() -> Self {
        Self {
            speed_factor: 8.0,
            feed_factor: 9.0,
            clamp_to_limits: true,
            overrides: Vec::new(),
        }
    }
}

/// Recommendation generation settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RecommendationSettings {
    /// Add ball end mill finishing entries for corner radii
    pub finishing_passes: bool,
    /// Use an undersized pilot drill when no full-size drill exists
    pub allow_undersized_drills: bool,
}

impl Default for RecommendationSettings {
    fn default() -> Self {
        Self {
            finishing_passes: true,
            allow_undersized_drills: true,
        }
    }
}

/// Logging settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingSettings {
    /// Default filter directive when `RUST_LOG` is unset
    pub level: String,
    /// Emit JSON lines instead of human-readable output
    pub json: bool,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json: false,
        }
    }
}

/// Complete application configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub catalog: CatalogSettings,
    pub wear: WearSettings,
    pub recommendation: RecommendationSettings,
    pub logging: LoggingSettings,
}

enum Format {
    Json,
    Toml,
}

fn format_of(path: &Path) -> SettingsResult<Format> {
    match path.extension().and_then(|ext| ext.to_str()) {
        Some("json") => Ok(Format::Json),
        Some("toml") => Ok(Format::Toml),
        other => Err(ConfigError::UnsupportedFormat(format!(
            "{} (config file must be .json or .toml)",
            other.unwrap_or("no extension")
        ))
        .into()),
    }
}

fn check_factor(key: &str, value: f64) -> SettingsResult<()> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(ConfigError::ValueOutOfRange {
            key: key.to_string(),
            value: value.to_string(),
        }
        .into())
    }
}

impl Config {
    /// Create new config with defaults
    pub fn new() -> Self {
        Self::default()
    }

    /// Load config from file (JSON or TOML)
    pub fn load_from_file(path: &Path) -> SettingsResult<Self> {
        let format = format_of(path)?;
        let content = std::fs::read_to_string(path).map_err(|e| {
            SettingsError::LoadError(format!("Failed to read {}: {}", path.display(), e))
        })?;

        let mut config: Self = match format {
            Format::Json => serde_json::from_str(&content)?,
            Format::Toml => toml::from_str(&content)?,
        };
        config.resolve_relative_paths(path.parent());
        config.validate()?;

        tracing::debug!(path = %path.display(), "Loaded configuration");
        Ok(config)
    }

    /// Save config to file (JSON or TOML)
    pub fn save_to_file(&self, path: &Path) -> SettingsResult<()> {
        self.validate()?;

        let content = match format_of(path)? {
            Format::Json => serde_json::to_string_pretty(self)?,
            Format::Toml => toml::to_string_pretty(self)
                .map_err(|e| SettingsError::SaveError(format!("Failed to serialize config: {}", e)))?,
        };

        std::fs::write(path, content).map_err(|e| {
            SettingsError::SaveError(format!("Failed to write {}: {}", path.display(), e))
        })?;
        Ok(())
    }

    /// Load `path` if given, else the default location if a file exists
    /// there, else built-in defaults.
    pub fn load_or_default(path: Option<&Path>) -> SettingsResult<Self> {
        if let Some(path) = path {
            return Self::load_from_file(path);
        }
        match default_config_path() {
            Ok(default) if default.exists() => Self::load_from_file(&default),
            _ => Ok(Self::default()),
        }
    }

    /// Catalog paths in a config file are relative to that file
    fn resolve_relative_paths(&mut self, base: Option<&Path>) {
        let Some(base) = base else { return };
        for path in [
            &mut self.catalog.tools,
            &mut self.catalog.machines,
            &mut self.catalog.materials,
        ]
        .into_iter()
        .flatten()
        {
            if path.is_relative() {
                *path = base.join(&*path);
            }
        }
    }

    /// Validate configuration
    pub fn validate(&self) -> SettingsResult<()> {
        check_factor("wear.speed_factor", self.wear.speed_factor)?;
        check_factor("wear.feed_factor", self.wear.feed_factor)?;

        for (i, entry) in self.wear.overrides.iter().enumerate() {
            if entry.material.is_none() && entry.tool_material.is_none() {
                return Err(SettingsError::invalid(
                    format!("wear.overrides[{}]", i),
                    "needs a material, a tool_material, or both",
                ));
            }
            check_factor(&format!("wear.overrides[{}].speed_factor", i), entry.speed_factor)?;
            check_factor(&format!("wear.overrides[{}].feed_factor", i), entry.feed_factor)?;
        }

        if self.logging.level.trim().is_empty() {
            return Err(ConfigError::MissingKey("logging.level".to_string()).into());
        }
        Ok(())
    }
}

/// Default config location, e.g. `~/.config/neurmill/config.toml` on Linux
pub fn default_config_path() -> SettingsResult<PathBuf> {
    dirs::config_dir()
        .map(|dir| dir.join("neurmill").join(CONFIG_FILE_NAME))
        .ok_or_else(|| {
            SettingsError::ConfigDirectory("No configuration directory on this platform".to_string())
        })
}

//! NeurMill Settings Crate
//!
//! Handles application configuration: catalog sources, wear calibration,
//! recommendation switches and logging.

pub mod config;
pub mod error;

pub use config::{
    default_config_path, CatalogSettings, Config, LoggingSettings, RecommendationSettings,
    WearOverride, WearSettings, CONFIG_FILE_NAME,
};
pub use error::{ConfigError, ConfigResult, SettingsError, SettingsResult};

//! # NeurMill
//!
//! A CNC tool recommendation and speed/feed adjustment engine:
//! - Tool selection for holes, pockets and slots detected on a CAD part
//! - Baseline spindle speed and feed from material cutting tables
//! - Wear-score derating with configurable calibration
//! - Reviewable recommendation sets with manual entries and operator feedback
//!
//! ## Architecture
//!
//! NeurMill is organized as a workspace with multiple crates:
//!
//! 1. **neurmill-core** - Error types, shared-state aliases, tool and material catalogs
//! 2. **neurmill-devicedb** - Machine capability profiles and catalog
//! 3. **neurmill-camtools** - Speed/feed calculation, wear adjustment, recommendations
//! 4. **neurmill-settings** - Configuration files and validation
//! 5. **neurmill** - This crate: logging, config-to-engine wiring and the CLI

use anyhow::Context;
use neurmill_camtools::wear::{CalibrationOverride, WearCalibration, WearCalibrationTable};
use neurmill_core::data::{materials, tools};
use neurmill_devicedb::init_standard_catalog;
use std::sync::Arc;

pub use neurmill_camtools::{
    AggregatorOptions, CamToolError, Feature, FeatureKind, Operation, RecommendationId,
    RecommendationSet, SpeedFeedEngine, SpeedFeedResult,
};
pub use neurmill_core::{
    Material, MaterialLibrary, Tool, ToolFilter, ToolId, ToolLibrary, ToolMaterial, ToolType,
};
pub use neurmill_devicedb::{MachineCatalog, MachineProfile, MachineProvider};
pub use neurmill_settings::{Config, WearSettings};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Initialize logging
///
/// Sets up structured logging with:
/// - stderr output, pretty or JSON lines
/// - RUST_LOG environment variable support, falling back to `default_level`
pub fn init_logging(default_level: &str, json: bool) -> anyhow::Result<()> {
    use tracing_subscriber::fmt;
    use tracing_subscriber::prelude::*;
    use tracing_subscriber::EnvFilter;

    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(default_level))
        .with_context(|| format!("invalid log level '{}'", default_level))?;

    let registry = tracing_subscriber::registry().with(env_filter);
    let result = if json {
        registry
            .with(
                fmt::layer()
                    .json()
                    .with_writer(std::io::stderr)
                    .with_target(true)
                    .with_thread_names(true),
            )
            .try_init()
    } else {
        registry
            .with(
                fmt::layer()
                    .with_writer(std::io::stderr)
                    .with_target(true)
                    .with_level(true)
                    .with_thread_ids(true)
                    .with_thread_names(true)
                    .with_line_number(true)
                    .pretty(),
            )
            .try_init()
    };
    result.context("failed to install tracing subscriber")
}

/// Wear calibration table described by the `[wear]` settings
pub fn calibration_table(settings: &WearSettings) -> anyhow::Result<WearCalibrationTable> {
    let default = WearCalibration::new(settings.speed_factor, settings.feed_factor)
        .context("invalid default wear calibration")?;

    let mut table = WearCalibrationTable::new(default);
    for (i, entry) in settings.overrides.iter().enumerate() {
        let calibration = WearCalibration::new(entry.speed_factor, entry.feed_factor)
            .with_context(|| format!("invalid wear override #{}", i + 1))?;
        table = table.with_override(CalibrationOverride {
            material: entry.material.clone(),
            tool_material: entry.tool_material,
            calibration,
        });
    }
    Ok(table)
}

/// Aggregator switches described by the config
pub fn aggregator_options(config: &Config) -> AggregatorOptions {
    AggregatorOptions {
        finishing_passes: config.recommendation.finishing_passes,
        allow_undersized_drills: config.recommendation.allow_undersized_drills,
        clamp_to_limits: config.wear.clamp_to_limits,
    }
}

/// Build an engine from configuration.
///
/// Catalog paths that are not configured fall back to the built-in catalogs.
pub fn build_engine(config: &Config) -> anyhow::Result<SpeedFeedEngine> {
    let tool_library = match &config.catalog.tools {
        Some(path) => ToolLibrary::load_from_file(path)
            .with_context(|| format!("failed to load tool catalog {}", path.display()))?,
        None => tools::init_standard_library(),
    };
    let machine_catalog = match &config.catalog.machines {
        Some(path) => MachineCatalog::load_from_file(path)
            .with_context(|| format!("failed to load machine catalog {}", path.display()))?,
        None => init_standard_catalog(),
    };
    let material_library = match &config.catalog.materials {
        Some(path) => MaterialLibrary::load_from_file(path)
            .with_context(|| format!("failed to load material catalog {}", path.display()))?,
        None => materials::init_standard_library(),
    };

    tracing::info!(
        tools = tool_library.len(),
        machines = machine_catalog.len(),
        materials = material_library.len(),
        "Catalogs ready"
    );

    Ok(SpeedFeedEngine::new(
        Arc::new(tool_library),
        Arc::new(machine_catalog),
        Arc::new(material_library),
    )
    .with_calibration(calibration_table(&config.wear)?)
    .with_options(aggregator_options(config)))
}

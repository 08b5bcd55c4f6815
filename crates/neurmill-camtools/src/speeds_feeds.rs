//! Baseline spindle speed and feed rate calculation.
//!
//! Speed comes from the material's recommended surface speed for the tool
//! material (`rpm = Vc * 1000 / (π * D)`), scaled per operation and clamped to
//! the tighter of the machine and tool RPM limits. Feed is
//! `chip load * flutes * rpm`, clamped to the machine's feed limit.

use crate::error::{CamToolError, CamToolResult, ParameterError};
use neurmill_core::{Material, Tool};
use neurmill_devicedb::MachineProfile;
use serde::{Deserialize, Serialize};
use std::f64::consts::PI;

/// Machining operation a tool is recommended for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Operation {
    Roughing,
    SemiFinishing,
    Finishing,
    Drilling,
}

impl Operation {
    /// Multiplier applied to the table surface speed
    pub fn speed_multiplier(&self) -> f64 {
        match self {
            Self::Roughing => 0.8,
            Self::SemiFinishing => 1.0,
            Self::Finishing => 1.2,
            Self::Drilling => 1.0,
        }
    }
}

impl std::fmt::Display for Operation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Roughing => write!(f, "roughing"),
            Self::SemiFinishing => write!(f, "semi-finishing"),
            Self::Finishing => write!(f, "finishing"),
            Self::Drilling => write!(f, "drilling"),
        }
    }
}

impl std::str::FromStr for Operation {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().replace(['-', ' '], "_").as_str() {
            "roughing" => Ok(Self::Roughing),
            "semi_finishing" => Ok(Self::SemiFinishing),
            "finishing" => Ok(Self::Finishing),
            "drilling" => Ok(Self::Drilling),
            _ => Err(format!("Unknown operation: {}", s)),
        }
    }
}

/// Result of a baseline calculation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CalculationResult {
    /// Spindle speed in RPM
    pub rpm: u32,
    /// Feed rate in mm/min
    pub feed_rate: u32,
    /// Effective surface speed in m/min after the operation multiplier
    pub surface_speed: f64,
    /// Chip load in mm/tooth
    pub chip_load: f64,
    /// Cutting edges used in the feed calculation
    pub flutes: u32,
    /// Limits that were applied, in plain words
    pub warnings: Vec<String>,
}

pub struct SpeedsFeedsCalculator;

impl SpeedsFeedsCalculator {
    /// Fail with `IncompatibleTool` unless the machine can hold the tool
    pub fn check_compatibility(tool: &Tool, machine: &MachineProfile) -> CamToolResult<()> {
        if machine.supports_tool_diameter(tool.diameter) {
            return Ok(());
        }
        Err(CamToolError::IncompatibleTool {
            tool_id: tool.id.to_string(),
            machine_id: machine.id.clone(),
            diameter: tool.diameter,
            min: machine.min_tool_diameter,
            max: machine.max_tool_diameter,
        })
    }

    /// Compute baseline spindle speed and feed rate.
    ///
    /// The tool/machine diameter check runs before anything is computed.
    pub fn compute_baseline(
        tool: &Tool,
        machine: &MachineProfile,
        material: &Material,
        operation: Operation,
    ) -> CamToolResult<CalculationResult> {
        Self::check_compatibility(tool, machine)?;

        let table_speed = material.surface_speed(tool.material).ok_or_else(|| {
            ParameterError::Missing(format!(
                "surface speed for {} tools in {}",
                tool.material, material.name
            ))
        })?;
        let chip_load = material.chip_load(tool.tool_type).ok_or_else(|| {
            ParameterError::Missing(format!("chip load for {} in {}", tool.tool_type, material.name))
        })?;

        let mut warnings = Vec::new();
        let surface_speed = table_speed * operation.speed_multiplier();

        let raw_rpm = surface_speed * 1000.0 / (PI * tool.diameter);
        let rpm_limit = machine.max_rpm.min(tool.max_rpm).max(1);
        let rpm = clamp_whole(raw_rpm, rpm_limit as f64);
        if raw_rpm.floor() > rpm_limit as f64 {
            let source = if tool.max_rpm < machine.max_rpm {
                "tool"
            } else {
                "machine"
            };
            warnings.push(format!(
                "Spindle speed limited to {} RPM by {} (calculated {:.0})",
                rpm_limit, source, raw_rpm
            ));
        }

        let flutes = tool.effective_flutes();
        let raw_feed = chip_load * flutes as f64 * rpm as f64;
        let feed_limit = machine.max_feed_rate.floor().max(1.0);
        let feed_rate = clamp_whole(raw_feed, feed_limit);
        if raw_feed.floor() > feed_limit {
            warnings.push(format!(
                "Feed rate limited to {:.0} mm/min by machine (calculated {:.0})",
                feed_limit, raw_feed
            ));
        }

        tracing::debug!(
            tool = %tool.id,
            machine = %machine.id,
            material = %material.id,
            %operation,
            rpm,
            feed_rate,
            "Computed baseline parameters"
        );

        Ok(CalculationResult {
            rpm,
            feed_rate,
            surface_speed,
            chip_load,
            flutes,
            warnings,
        })
    }
}

/// Floor to a whole number and clamp into `[1, limit]`
fn clamp_whole(value: f64, limit: f64) -> u32 {
    if !value.is_finite() {
        return limit.max(1.0) as u32;
    }
    value.floor().clamp(1.0, limit.max(1.0)) as u32
}

//! Wear adjustment of baseline speeds and feeds.
//!
//! A wear score `w` in `0..=10` derates a baseline as
//! `speed = floor(s * speed_factor / w)` and `feed = floor(f * feed_factor / w)`.
//! A missing score or a score of zero leaves the baseline untouched.

use crate::error::{CamToolError, CamToolResult, ParameterError, ParameterResult};
use neurmill_core::{MaterialId, Tool, ToolMaterial};
use neurmill_devicedb::MachineProfile;
use serde::{Deserialize, Serialize};

/// Highest wear score an operator can assign
pub const MAX_WEAR_SCORE: f64 = 10.0;

/// Default speed calibration factor
pub const DEFAULT_SPEED_FACTOR: f64 = 8.0;

/// Default feed calibration factor
pub const DEFAULT_FEED_FACTOR: f64 = 9.0;

/// Reject wear scores outside `0..=10`, including NaN and infinities
pub fn validate_wear_score(wear_score: f64) -> CamToolResult<f64> {
    if wear_score.is_finite() && (0.0..=MAX_WEAR_SCORE).contains(&wear_score) {
        Ok(wear_score)
    } else {
        Err(CamToolError::InvalidWearScore(wear_score))
    }
}

/// Calibration constants of the wear formula
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WearCalibration {
    pub speed_factor: f64,
    pub feed_factor: f64,
}

impl Default for WearCalibration {
    fn default() -> Self {
        Self {
            speed_factor: DEFAULT_SPEED_FACTOR,
            feed_factor: DEFAULT_FEED_FACTOR,
        }
    }
}

impl WearCalibration {
    pub fn new(speed_factor: f64, feed_factor: f64) -> ParameterResult<Self> {
        let calibration = Self {
            speed_factor,
            feed_factor,
        };
        calibration.validate()?;
        Ok(calibration)
    }

    pub fn validate(&self) -> ParameterResult<()> {
        for (name, value) in [
            ("speed_factor", self.speed_factor),
            ("feed_factor", self.feed_factor),
        ] {
            if !value.is_finite() || value <= 0.0 {
                return Err(ParameterError::InvalidValue {
                    name: name.to_string(),
                    reason: format!("must be a positive number, got {}", value),
                });
            }
        }
        Ok(())
    }
}

/// Calibration that applies to one material, one tool material, or both
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CalibrationOverride {
    #[serde(default)]
    pub material: Option<MaterialId>,
    #[serde(default)]
    pub tool_material: Option<ToolMaterial>,
    #[serde(flatten)]
    pub calibration: WearCalibration,
}

impl CalibrationOverride {
    /// 0 when it does not apply, otherwise higher for narrower overrides
    fn specificity(&self, material: &MaterialId, tool_material: ToolMaterial) -> u8 {
        let material_rank = match &self.material {
            Some(m) if m == material => 2,
            Some(_) => return 0,
            None => 0,
        };
        let tool_rank = match self.tool_material {
            Some(t) if t == tool_material => 1,
            Some(_) => return 0,
            None => 0,
        };
        // A blanket override (neither key set) still applies, just below every keyed one.
        material_rank + tool_rank + 1
    }
}

/// Default calibration plus per-material / per-tool-material overrides
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WearCalibrationTable {
    #[serde(default)]
    pub default: WearCalibration,
    #[serde(default)]
    pub overrides: Vec<CalibrationOverride>,
}

impl WearCalibrationTable {
    pub fn new(default: WearCalibration) -> Self {
        Self {
            default,
            overrides: Vec::new(),
        }
    }

    pub fn with_override(mut self, entry: CalibrationOverride) -> Self {
        self.overrides.push(entry);
        self
    }

    pub fn validate(&self) -> ParameterResult<()> {
        self.default.validate()?;
        for entry in &self.overrides {
            entry.calibration.validate()?;
        }
        Ok(())
    }

    /// Most specific override first: material and tool material, then
    /// material only, then tool material only. Ties go to the earliest entry.
    pub fn resolve(&self, material: &MaterialId, tool_material: ToolMaterial) -> WearCalibration {
        let mut best: Option<(u8, &CalibrationOverride)> = None;
        for entry in &self.overrides {
            let rank = entry.specificity(material, tool_material);
            if rank > 0 && best.is_none_or(|(r, _)| rank > r) {
                best = Some((rank, entry));
            }
        }
        best.map(|(_, entry)| entry.calibration)
            .unwrap_or(self.default)
    }
}

/// Upper bounds an adjusted speed/feed is capped to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParameterLimits {
    /// Highest spindle speed either the machine or the tool allows
    pub max_rpm: u32,
    /// Highest feed rate either the machine or the tool allows, in mm/min
    pub max_feed_rate: u32,
}

impl ParameterLimits {
    pub fn for_pair(tool: &Tool, machine: &MachineProfile) -> Self {
        let feed = tool
            .max_feed_rate
            .unwrap_or(machine.max_feed_rate)
            .min(machine.max_feed_rate);
        Self {
            max_rpm: tool.max_rpm.min(machine.max_rpm).max(1),
            max_feed_rate: (feed.floor() as u32).max(1),
        }
    }

    pub fn cap(&self, adjusted: AdjustedParameters) -> AdjustedParameters {
        AdjustedParameters {
            speed: adjusted.speed.min(self.max_rpm),
            feed: adjusted.feed.min(self.max_feed_rate),
            ..adjusted
        }
    }
}

/// Wear-adjusted spindle speed and feed
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AdjustedParameters {
    /// RPM
    pub speed: u32,
    /// mm/min
    pub feed: u32,
    pub wear_score: Option<f64>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct WearAdjuster {
    calibration: WearCalibration,
}

impl WearAdjuster {
    pub fn new(calibration: WearCalibration) -> Self {
        Self { calibration }
    }

    pub fn calibration(&self) -> WearCalibration {
        self.calibration
    }

    /// Derate a baseline by a wear score. Pure: the same inputs always give
    /// the same output.
    pub fn apply(
        &self,
        baseline_speed: u32,
        baseline_feed: u32,
        wear_score: Option<f64>,
    ) -> CamToolResult<AdjustedParameters> {
        let Some(wear) = wear_score else {
            return Ok(AdjustedParameters {
                speed: baseline_speed,
                feed: baseline_feed,
                wear_score: None,
            });
        };

        let wear = validate_wear_score(wear)?;
        if wear == 0.0 {
            return Ok(AdjustedParameters {
                speed: baseline_speed,
                feed: baseline_feed,
                wear_score: Some(wear),
            });
        }

        // `as` saturates, so tiny scores pin at u32::MAX rather than wrapping.
        let speed = (baseline_speed as f64 * self.calibration.speed_factor / wear).floor() as u32;
        let feed = (baseline_feed as f64 * self.calibration.feed_factor / wear).floor() as u32;

        tracing::debug!(
            baseline_speed,
            baseline_feed,
            wear,
            speed,
            feed,
            "Applied wear adjustment"
        );

        Ok(AdjustedParameters {
            speed,
            feed,
            wear_score: Some(wear),
        })
    }
}

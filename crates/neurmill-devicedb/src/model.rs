use crate::error::{ProfileError, ProfileResult};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum MachineType {
    VerticalMill,
    HorizontalMill,
    Lathe,
    MillTurn,
    Router,
}

impl Default for MachineType {
    fn default() -> Self {
        Self::VerticalMill
    }
}

impl std::fmt::Display for MachineType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::VerticalMill => write!(f, "Vertical Machining Center"),
            Self::HorizontalMill => write!(f, "Horizontal Machining Center"),
            Self::Lathe => write!(f, "CNC Lathe"),
            Self::MillTurn => write!(f, "Mill-Turn Center"),
            Self::Router => write!(f, "CNC Router"),
        }
    }
}

/// Operating envelope of a machine, as far as speed/feed selection cares.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct MachineProfile {
    pub id: String,
    pub name: String,
    pub model: String,
    pub manufacturer: String,
    pub machine_type: MachineType,

    // Spindle
    pub max_rpm: u32,
    /// Spindle power in kW
    #[serde(alias = "spindle_power")]
    pub spindle_power_kw: f64,

    // Axes
    /// Maximum programmable feed rate in mm/min
    pub max_feed_rate: f64,

    // Tooling
    /// Smallest tool diameter the spindle can hold, in mm
    pub min_tool_diameter: f64,
    /// Largest tool diameter the spindle/changer accepts, in mm
    pub max_tool_diameter: f64,
}

impl Default for MachineProfile {
    fn default() -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            name: "New Machine".to_string(),
            model: String::new(),
            manufacturer: String::new(),
            machine_type: MachineType::default(),
            max_rpm: 12000,
            spindle_power_kw: 7.5,
            max_feed_rate: 1000.0,
            min_tool_diameter: 0.5,
            max_tool_diameter: 50.0,
        }
    }
}

impl MachineProfile {
    /// Whether a tool of `diameter` mm fits the machine's tool range (inclusive)
    pub fn supports_tool_diameter(&self, diameter: f64) -> bool {
        diameter >= self.min_tool_diameter && diameter <= self.max_tool_diameter
    }

    /// The supported tool-diameter range as `(min, max)`
    pub fn tool_diameter_range(&self) -> (f64, f64) {
        (self.min_tool_diameter, self.max_tool_diameter)
    }

    pub fn validate(&self) -> ProfileResult<()> {
        if self.id.trim().is_empty() {
            return Err(ProfileError::MissingField("id".to_string()));
        }
        if self.name.trim().is_empty() {
            return Err(ProfileError::MissingField("name".to_string()));
        }
        if self.max_rpm == 0 {
            return Err(ProfileError::ValueOutOfRange {
                field: "max_rpm".to_string(),
                value: self.max_rpm.to_string(),
            });
        }
        if !self.max_feed_rate.is_finite() || self.max_feed_rate <= 0.0 {
            return Err(ProfileError::ValueOutOfRange {
                field: "max_feed_rate".to_string(),
                value: self.max_feed_rate.to_string(),
            });
        }
        if !(self.min_tool_diameter > 0.0 && self.min_tool_diameter <= self.max_tool_diameter) {
            return Err(ProfileError::InvalidToolRange {
                min: self.min_tool_diameter,
                max: self.max_tool_diameter,
            });
        }
        Ok(())
    }
}

//! Error types for the CAM tools crate.
//!
//! This module provides structured error types for speed/feed calculation,
//! wear adjustment, and recommendation management.

use neurmill_core::CatalogError;
use neurmill_devicedb::DeviceError;
use thiserror::Error;

/// The kind of record a lookup failed to find.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResourceKind {
    Tool,
    Machine,
    Material,
    Recommendation,
    Entry,
}

impl std::fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Tool => write!(f, "Tool"),
            Self::Machine => write!(f, "Machine"),
            Self::Material => write!(f, "Material"),
            Self::Recommendation => write!(f, "Recommendation"),
            Self::Entry => write!(f, "Recommendation entry"),
        }
    }
}

/// Errors that can occur during CAM tool operations.
#[derive(Error, Debug)]
pub enum CamToolError {
    /// An identifier did not resolve to a tool, machine, material, set or entry.
    #[error("{kind} not found: {id}")]
    NotFound { kind: ResourceKind, id: String },

    /// The tool cannot be held by the machine.
    #[error(
        "Tool {tool_id} ({diameter} mm) is outside the tool range of machine {machine_id} ({min}..{max} mm)"
    )]
    IncompatibleTool {
        tool_id: String,
        machine_id: String,
        diameter: f64,
        min: f64,
        max: f64,
    },

    /// The tool's workpiece list does not include the material.
    #[error("Tool {tool_id} is not rated for material {material_id}")]
    UnsupportedMaterial {
        tool_id: String,
        material_id: String,
    },

    /// A wear score outside 0..=10 (or not a number).
    #[error("Invalid wear score {0}: must be between 0 and 10")]
    InvalidWearScore(f64),

    /// Feedback that cannot be accepted.
    #[error("Invalid feedback: {0}")]
    InvalidFeedback(String),

    /// A parameter validation error occurred.
    #[error("Parameter error: {0}")]
    Parameter(#[from] ParameterError),

    /// A catalog failure other than a missing record.
    #[error("Catalog error: {0}")]
    Catalog(#[source] neurmill_core::Error),

    /// A machine catalog failure other than a missing record.
    #[error("Device error: {0}")]
    Device(#[source] DeviceError),
}

impl CamToolError {
    pub fn not_found(kind: ResourceKind, id: impl Into<String>) -> Self {
        Self::NotFound {
            kind,
            id: id.into(),
        }
    }

    /// Check if this is a lookup failure
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }

    /// Check if the tool/machine pairing was rejected
    pub fn is_incompatible_tool(&self) -> bool {
        matches!(self, Self::IncompatibleTool { .. })
    }

    pub fn is_unsupported_material(&self) -> bool {
        matches!(self, Self::UnsupportedMaterial { .. })
    }

    /// Check if a wear score was rejected
    pub fn is_invalid_wear_score(&self) -> bool {
        matches!(self, Self::InvalidWearScore(_))
    }
}

impl From<neurmill_core::Error> for CamToolError {
    fn from(err: neurmill_core::Error) -> Self {
        match err {
            neurmill_core::Error::Catalog(CatalogError::ToolNotFound { tool_id }) => {
                Self::not_found(ResourceKind::Tool, tool_id)
            }
            neurmill_core::Error::Catalog(CatalogError::MaterialNotFound { material_id }) => {
                Self::not_found(ResourceKind::Material, material_id)
            }
            other => Self::Catalog(other),
        }
    }
}

impl From<DeviceError> for CamToolError {
    fn from(err: DeviceError) -> Self {
        match err {
            DeviceError::MachineNotFound(id) => Self::not_found(ResourceKind::Machine, id),
            other => Self::Device(other),
        }
    }
}

/// Errors related to calculation inputs and reference-table coverage.
#[derive(Error, Debug)]
pub enum ParameterError {
    /// Reference data needed for a calculation is missing.
    #[error("Missing required parameter: {0}")]
    Missing(String),

    /// A parameter value is out of the valid range.
    #[error("Parameter '{name}' out of range: {value} (valid: {min}..{max})")]
    OutOfRange {
        name: String,
        value: f64,
        min: f64,
        max: f64,
    },

    /// A parameter value is invalid.
    #[error("Invalid value for '{name}': {reason}")]
    InvalidValue { name: String, reason: String },
}

/// Result type alias for CAM tool operations.
pub type CamToolResult<T> = Result<T, CamToolError>;

/// Result type alias for parameter validation.
pub type ParameterResult<T> = Result<T, ParameterError>;

//! Error types for the device database crate.
//!
//! This module provides structured error types for machine profile lookup,
//! catalog loading, and validation.

use std::io;
use thiserror::Error;

/// Errors that can occur during machine catalog operations.
#[derive(Error, Debug)]
pub enum DeviceError {
    /// The requested machine was not found.
    #[error("Machine not found: {0}")]
    MachineNotFound(String),

    /// A machine with this ID already exists.
    #[error("Machine already exists: {0}")]
    MachineAlreadyExists(String),

    /// Failed to load machines from storage.
    #[error("Failed to load machines: {0}")]
    LoadError(String),

    /// I/O error during file operations.
    #[error("I/O error: {0}")]
    IoError(#[from] io::Error),

    /// JSON serialization/deserialization error.
    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    /// A profile validation error occurred.
    #[error("Validation error: {0}")]
    Validation(#[from] ProfileError),
}

impl DeviceError {
    /// Check if this is a not-found lookup failure
    pub fn is_not_found(&self) -> bool {
        matches!(self, DeviceError::MachineNotFound(_))
    }
}

/// Errors related to machine profile validation.
#[derive(Error, Debug)]
pub enum ProfileError {
    /// A required field is missing or empty.
    #[error("Missing required field: {0}")]
    MissingField(String),

    /// The supported tool-diameter range is inverted or non-positive.
    #[error("Invalid tool diameter range: {min}..{max}")]
    InvalidToolRange { min: f64, max: f64 },

    /// A numeric value is out of valid range.
    #[error("Value out of range for '{field}': {value}")]
    ValueOutOfRange { field: String, value: String },
}

/// Result type alias for machine catalog operations.
pub type DeviceResult<T> = Result<T, DeviceError>;

/// Result type alias for profile validation operations.
pub type ProfileResult<T> = Result<T, ProfileError>;

//! Error handling for NeurMill
//!
//! Provides error types for the reference-data layer:
//! - Catalog errors (unknown or malformed tools and materials)
//! - Wrapped I/O and JSON errors raised while loading catalog files
//!
//! All error types use `thiserror` for ergonomic error handling.

use thiserror::Error;

/// Catalog error type
///
/// Represents lookup and validation failures against the tool and material
/// catalogs. Catalog data is immutable once loaded, so none of these are
/// transient.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum CatalogError {
    /// No tool with this identifier exists in the catalog
    #[error("Tool not found: {tool_id}")]
    ToolNotFound {
        /// The identifier that was looked up.
        tool_id: String,
    },

    /// No material with this identifier exists in the catalog
    #[error("Material not found: {material_id}")]
    MaterialNotFound {
        /// The identifier that was looked up.
        material_id: String,
    },

    /// Two catalog entries share the same identifier
    #[error("Duplicate catalog entry: {id}")]
    DuplicateEntry {
        /// The duplicated identifier.
        id: String,
    },

    /// A tool definition is physically impossible
    #[error("Invalid tool '{tool_id}': {reason}")]
    InvalidTool {
        /// The offending tool.
        tool_id: String,
        /// Why the definition was rejected.
        reason: String,
    },

    /// A material definition is incomplete or out of range
    #[error("Invalid material '{material_id}': {reason}")]
    InvalidMaterial {
        /// The offending material.
        material_id: String,
        /// Why the definition was rejected.
        reason: String,
    },
}

/// Main error type for the core crate
///
/// A unified error type covering catalog failures and the I/O needed to load
/// catalogs from disk.
#[derive(Error, Debug)]
pub enum Error {
    /// Catalog error
    #[error(transparent)]
    Catalog(#[from] CatalogError),

    /// Standard I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization error
    #[error("Serialization error: {0}")]
    Json(#[from] serde_json::Error),

    /// Generic error
    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Create an error from a string message
    pub fn other(msg: impl Into<String>) -> Self {
        Error::Other(msg.into())
    }

    /// Check if this is a not-found lookup failure
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            Error::Catalog(CatalogError::ToolNotFound { .. })
                | Error::Catalog(CatalogError::MaterialNotFound { .. })
        )
    }

    /// Check if this is a catalog error
    pub fn is_catalog_error(&self) -> bool {
        matches!(self, Error::Catalog(_))
    }
}

/// Result type using Error
pub type Result<T> = std::result::Result<T, Error>;

//! # NeurMill Core
//!
//! Core types, traits, and utilities for NeurMill.
//! Provides the reference-data catalogs (tools and materials), the shared
//! error types, and the thread-safe wrappers used by the recommendation engine.

pub mod data;
pub mod error;
pub mod types;

pub use data::{
    Material, MaterialCategory, MaterialId, MaterialLibrary, Tool, ToolCoating, ToolFilter,
    ToolId, ToolLibrary, ToolMaterial, ToolType,
};

pub use error::{CatalogError, Error, Result};

// Re-export type aliases for convenience
pub use types::{
    thread_safe, thread_safe_rw, thread_safe_rw_map, thread_safe_vec, ThreadSafe, ThreadSafeRw,
    ThreadSafeRwMap, ThreadSafeVec,
};

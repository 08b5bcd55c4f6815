//! Reference data models
//!
//! This module provides:
//! - Tool catalog with rated limits for speed/feed calculation
//! - Materials database with surface speed and chip load tables
//!
//! Both catalogs are loaded once at start-up and treated as read-only.

pub mod materials;
pub mod tools;

pub use materials::{Material, MaterialCategory, MaterialId, MaterialLibrary};
pub use tools::{Tool, ToolCoating, ToolFilter, ToolId, ToolLibrary, ToolMaterial, ToolType};

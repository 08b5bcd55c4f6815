//! Materials Database module
//!
//! This module provides:
//! - Material categories
//! - Machining characteristics (hardness, machinability)
//! - Cutting tables: surface speed per tool material, chip load per tool type
//! - Material library management and catalog loading

use crate::data::tools::{ToolMaterial, ToolType};
use crate::error::{CatalogError, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;

/// Material categories for organization
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Hash)]
#[serde(rename_all = "snake_case")]
pub enum MaterialCategory {
    /// Plastic and polymer materials
    Plastic,
    /// Non-ferrous metals (aluminum, brass, copper)
    NonFerrousMetal,
    /// Ferrous metals (steel, stainless)
    FerrousMetal,
    /// Titanium and nickel alloys
    Superalloy,
}

impl std::fmt::Display for MaterialCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Plastic => write!(f, "Plastic"),
            Self::NonFerrousMetal => write!(f, "Non-Ferrous Metal"),
            Self::FerrousMetal => write!(f, "Ferrous Metal"),
            Self::Superalloy => write!(f, "Superalloy"),
        }
    }
}

/// Material identifier
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize, Hash)]
pub struct MaterialId(pub String);

impl std::fmt::Display for MaterialId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for MaterialId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// Complete material definition
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Material {
    /// Unique material identifier
    pub id: MaterialId,
    /// Display name
    pub name: String,
    /// Material category
    pub category: MaterialCategory,
    /// Brinell hardness (HB), when known
    #[serde(default)]
    pub hardness: Option<f64>,
    /// Machinability rating (1-10, higher is easier)
    pub machinability_rating: u8,
    /// Recommended surface cutting speed in m/min, by tool material
    pub surface_speeds: HashMap<ToolMaterial, f64>,
    /// Recommended chip load in mm/tooth, by tool type
    pub chip_loads: HashMap<ToolType, f64>,
    /// Notes and tips
    #[serde(default)]
    pub notes: String,
}

impl Material {
    /// Create a new material with empty cutting tables
    pub fn new(id: MaterialId, name: String, category: MaterialCategory) -> Self {
        Self {
            id,
            name,
            category,
            hardness: None,
            machinability_rating: 5,
            surface_speeds: HashMap::new(),
            chip_loads: HashMap::new(),
            notes: String::new(),
        }
    }

    /// Set the recommended surface speed (m/min) for a tool material
    pub fn with_surface_speed(mut self, tool_material: ToolMaterial, m_per_min: f64) -> Self {
        self.surface_speeds.insert(tool_material, m_per_min);
        self
    }

    /// Set the recommended chip load (mm/tooth) for a tool type
    pub fn with_chip_load(mut self, tool_type: ToolType, mm_per_tooth: f64) -> Self {
        self.chip_loads.insert(tool_type, mm_per_tooth);
        self
    }

    /// Surface speed in m/min for a tool material.
    ///
    /// Coated carbide falls back to the plain carbide row.
    pub fn surface_speed(&self, tool_material: ToolMaterial) -> Option<f64> {
        self.surface_speeds.get(&tool_material).copied().or_else(|| {
            match tool_material {
                ToolMaterial::CoatedCarbide => {
                    self.surface_speeds.get(&ToolMaterial::Carbide).copied()
                }
                _ => None,
            }
        })
    }

    /// Chip load in mm/tooth for a tool type, falling back to its cutting family
    pub fn chip_load(&self, tool_type: ToolType) -> Option<f64> {
        self.chip_loads
            .get(&tool_type)
            .or_else(|| self.chip_loads.get(&tool_type.cutting_family()))
            .copied()
    }

    /// Get machinability description
    pub fn machinability_desc(&self) -> &'static str {
        match self.machinability_rating {
            1..=2 => "Very Difficult",
            3..=4 => "Difficult",
            5..=6 => "Moderate",
            7..=8 => "Easy",
            9..=10 => "Very Easy",
            _ => "Unknown",
        }
    }

    /// Reject tables with non-positive or non-finite entries
    pub fn validate(&self) -> std::result::Result<(), CatalogError> {
        let invalid = |reason: String| CatalogError::InvalidMaterial {
            material_id: self.id.to_string(),
            reason,
        };

        if self.surface_speeds.is_empty() {
            return Err(invalid("no surface speeds defined".to_string()));
        }
        for (tool_material, speed) in &self.surface_speeds {
            if !speed.is_finite() || *speed <= 0.0 {
                return Err(invalid(format!(
                    "surface speed for {} must be positive",
                    tool_material
                )));
            }
        }
        for (tool_type, load) in &self.chip_loads {
            if !load.is_finite() || *load <= 0.0 {
                return Err(invalid(format!(
                    "chip load for {} must be positive",
                    tool_type
                )));
            }
        }
        Ok(())
    }
}

/// Materials library - manages collection of materials
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MaterialLibrary {
    /// Collection of materials by ID
    materials: HashMap<MaterialId, Material>,
}

impl MaterialLibrary {
    /// Create a new empty library
    pub fn new() -> Self {
        Self {
            materials: HashMap::new(),
        }
    }

    /// Load a catalog from a JSON array of materials
    pub fn load_from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let materials: Vec<Material> = serde_json::from_str(&content)?;
        let mut library = Self::new();
        for material in materials {
            material.validate()?;
            if library.materials.contains_key(&material.id) {
                return Err(CatalogError::DuplicateEntry {
                    id: material.id.to_string(),
                }
                .into());
            }
            library.add_material(material);
        }
        tracing::info!(
            path = %path.display(),
            materials = library.len(),
            "Loaded material catalog"
        );
        Ok(library)
    }

    /// Add a material to the library
    pub fn add_material(&mut self, material: Material) {
        self.materials.insert(material.id.clone(), material);
    }

    /// Look up a material by ID, failing if it is not in the catalog
    pub fn get(&self, id: &MaterialId) -> Result<Material> {
        self.get_material(id).cloned().ok_or_else(|| {
            CatalogError::MaterialNotFound {
                material_id: id.to_string(),
            }
            .into()
        })
    }

    /// Get a material by ID
    pub fn get_material(&self, id: &MaterialId) -> Option<&Material> {
        self.materials.get(id)
    }

    /// Find a material by exact ID or case-insensitive name
    pub fn find(&self, id_or_name: &str) -> Option<&Material> {
        self.materials
            .get(&MaterialId(id_or_name.to_string()))
            .or_else(|| {
                let query = id_or_name.trim().to_lowercase();
                self.get_all_materials()
                    .into_iter()
                    .find(|m| m.name.to_lowercase() == query)
            })
    }

    /// Get all materials, ordered by ID
    pub fn get_all_materials(&self) -> Vec<&Material> {
        let mut materials: Vec<&Material> = self.materials.values().collect();
        materials.sort_by(|a, b| a.id.cmp(&b.id));
        materials
    }

    /// Get all materials in a specific category
    pub fn get_materials_by_category(&self, category: MaterialCategory) -> Vec<&Material> {
        self.get_all_materials()
            .into_iter()
            .filter(|m| m.category == category)
            .collect()
    }

    /// Get the number of materials in the library
    pub fn len(&self) -> usize {
        self.materials.len()
    }

    /// Check if library is empty
    pub fn is_empty(&self) -> bool {
        self.materials.is_empty()
    }
}

impl Default for MaterialLibrary {
    fn default() -> Self {
        Self::new()
    }
}

/// Initialize the standard materials library with common materials
pub fn init_standard_library() -> MaterialLibrary {
    use MaterialCategory::*;
    use ToolMaterial::{Carbide, Hss};
    use ToolType::{BallEndMill, Drill, EndMill};

    let mut library = MaterialLibrary::new();

    // Aluminum 6061-T6
    let mut aluminum = Material::new(
        MaterialId("aluminum_6061".to_string()),
        "Aluminum 6061".to_string(),
        NonFerrousMetal,
    )
    .with_surface_speed(Carbide, 300.0)
    .with_surface_speed(Hss, 90.0)
    .with_chip_load(EndMill, 0.05)
    .with_chip_load(BallEndMill, 0.04)
    .with_chip_load(Drill, 0.10);
    aluminum.hardness = Some(95.0);
    aluminum.machinability_rating = 8;
    aluminum.notes = "Flood coolant or mist; watch for built-up edge at low speeds".to_string();
    library.add_material(aluminum);

    // Mild steel
    let mut steel = Material::new(
        MaterialId("steel_1018".to_string()),
        "Steel 1018".to_string(),
        FerrousMetal,
    )
    .with_surface_speed(Carbide, 120.0)
    .with_surface_speed(Hss, 30.0)
    .with_chip_load(EndMill, 0.04)
    .with_chip_load(BallEndMill, 0.03)
    .with_chip_load(Drill, 0.08);
    steel.hardness = Some(126.0);
    steel.machinability_rating = 6;
    library.add_material(steel);

    // Austenitic stainless
    let mut stainless = Material::new(
        MaterialId("stainless_304".to_string()),
        "Stainless 304".to_string(),
        FerrousMetal,
    )
    .with_surface_speed(Carbide, 80.0)
    .with_surface_speed(Hss, 18.0)
    .with_chip_load(EndMill, 0.03)
    .with_chip_load(BallEndMill, 0.025)
    .with_chip_load(Drill, 0.06);
    stainless.hardness = Some(201.0);
    stainless.machinability_rating = 3;
    stainless.notes = "Work hardens; keep the tool engaged and avoid rubbing".to_string();
    library.add_material(stainless);

    // Free-machining brass
    let mut brass = Material::new(
        MaterialId("brass_360".to_string()),
        "Brass 360".to_string(),
        NonFerrousMetal,
    )
    .with_surface_speed(Carbide, 250.0)
    .with_surface_speed(Hss, 90.0)
    .with_chip_load(EndMill, 0.05)
    .with_chip_load(BallEndMill, 0.04)
    .with_chip_load(Drill, 0.10);
    brass.hardness = Some(78.0);
    brass.machinability_rating = 10;
    library.add_material(brass);

    // Titanium grade 5
    let mut titanium = Material::new(
        MaterialId("titanium_6al4v".to_string()),
        "Titanium Ti-6Al-4V".to_string(),
        Superalloy,
    )
    .with_surface_speed(Carbide, 50.0)
    .with_surface_speed(Hss, 12.0)
    .with_chip_load(EndMill, 0.03)
    .with_chip_load(BallEndMill, 0.02)
    .with_chip_load(Drill, 0.05);
    titanium.hardness = Some(334.0);
    titanium.machinability_rating = 2;
    library.add_material(titanium);

    // Cast acrylic
    let mut acrylic = Material::new(
        MaterialId("acrylic".to_string()),
        "Acrylic".to_string(),
        Plastic,
    )
    .with_surface_speed(Carbide, 250.0)
    .with_surface_speed(Hss, 150.0)
    .with_chip_load(EndMill, 0.08)
    .with_chip_load(BallEndMill, 0.06)
    .with_chip_load(Drill, 0.10);
    acrylic.machinability_rating = 9;
    acrylic.notes = "Keep chip load up to avoid melting and re-welding".to_string();
    library.add_material(acrylic);

    library
}

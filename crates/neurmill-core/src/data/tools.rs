//! Tool catalog module - Tool definitions and library management
//!
//! This module provides:
//! - Tool types and tool materials
//! - Tool geometry and rated limits
//! - Tool library management (add, lookup, filter)
//! - Catalog loading from JSON
//! - Standard tool library initialization

use crate::data::materials::Material;
use crate::error::{CatalogError, Error, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;

/// Tool types for classification
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Hash)]
#[serde(rename_all = "snake_case")]
pub enum ToolType {
    /// Flat end mill
    EndMill,
    /// Ball end mill / ball nose
    BallEndMill,
    /// Corner radius (bull nose) end mill
    CornerRadiusEndMill,
    /// Twist drill
    Drill,
    /// Spot drill
    SpotDrill,
    /// Chamfer mill
    Chamfer,
}

impl ToolType {
    /// The base family used when a cutting table has no row for this exact type
    pub fn cutting_family(&self) -> ToolType {
        match self {
            Self::EndMill | Self::CornerRadiusEndMill | Self::Chamfer => Self::EndMill,
            Self::BallEndMill => Self::BallEndMill,
            Self::Drill | Self::SpotDrill => Self::Drill,
        }
    }

    /// Whether the tool plunges axially rather than cutting on its periphery
    pub fn is_drill(&self) -> bool {
        matches!(self, Self::Drill | Self::SpotDrill)
    }
}

impl std::fmt::Display for ToolType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::EndMill => write!(f, "End Mill"),
            Self::BallEndMill => write!(f, "Ball End Mill"),
            Self::CornerRadiusEndMill => write!(f, "Corner Radius End Mill"),
            Self::Drill => write!(f, "Drill"),
            Self::SpotDrill => write!(f, "Spot Drill"),
            Self::Chamfer => write!(f, "Chamfer Mill"),
        }
    }
}

impl std::str::FromStr for ToolType {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().replace(['-', ' '], "_").as_str() {
            "end_mill" | "endmill" | "flat_endmill" => Ok(Self::EndMill),
            "ball_end_mill" | "ball_endmill" | "ball" => Ok(Self::BallEndMill),
            "corner_radius_end_mill" | "bull_nose" => Ok(Self::CornerRadiusEndMill),
            "drill" => Ok(Self::Drill),
            "spot_drill" => Ok(Self::SpotDrill),
            "chamfer" => Ok(Self::Chamfer),
            _ => Err(format!("Unknown tool type: {}", s)),
        }
    }
}

/// Tool material composition
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Hash)]
#[serde(rename_all = "snake_case")]
pub enum ToolMaterial {
    /// High Speed Steel
    Hss,
    /// Carbide
    Carbide,
    /// Coated carbide
    CoatedCarbide,
}

impl std::fmt::Display for ToolMaterial {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Hss => write!(f, "HSS"),
            Self::Carbide => write!(f, "Carbide"),
            Self::CoatedCarbide => write!(f, "Coated Carbide"),
        }
    }
}

impl std::str::FromStr for ToolMaterial {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().replace(['-', ' '], "_").as_str() {
            "hss" => Ok(Self::Hss),
            "carbide" => Ok(Self::Carbide),
            "coated_carbide" => Ok(Self::CoatedCarbide),
            _ => Err(format!("Unknown tool material: {}", s)),
        }
    }
}

/// Tool coating type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ToolCoating {
    /// Titanium Nitride coating
    TiN,
    /// Titanium Aluminum Nitride coating
    TiAlN,
}

impl std::fmt::Display for ToolCoating {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::TiN => write!(f, "TiN"),
            Self::TiAlN => write!(f, "TiAlN"),
        }
    }
}

/// Tool identifier
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize, Hash)]
pub struct ToolId(
    /// The unique string identifier for the tool.
    pub String,
);

impl std::fmt::Display for ToolId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for ToolId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// Complete tool definition
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Tool {
    /// Unique tool identifier
    pub id: ToolId,
    /// Tool number (for reference)
    #[serde(default)]
    pub number: u32,
    /// Display name
    pub name: String,
    /// Tool type
    #[serde(rename = "type")]
    pub tool_type: ToolType,
    /// Tool material composition
    pub material: ToolMaterial,
    /// Optional coating
    #[serde(default)]
    pub coating: Option<ToolCoating>,

    // Geometry
    /// Cutting diameter in mm
    pub diameter: f64,
    /// Number of flutes; drills are commonly listed without one
    #[serde(default, alias = "flute_count")]
    pub flutes: Option<u32>,
    /// Flute (cutting) length in mm
    #[serde(default)]
    pub cutting_length: f64,
    /// Overall length in mm
    #[serde(default)]
    pub overall_length: f64,
    /// Shank diameter in mm
    #[serde(default)]
    pub shank_diameter: Option<f64>,

    // Rated limits
    /// Maximum spindle speed the tool is rated for
    pub max_rpm: u32,
    /// Maximum axial depth of cut per pass in mm
    #[serde(alias = "max_doc")]
    pub max_depth_of_cut: f64,
    /// Maximum feed rate in mm/min, when the manufacturer publishes one
    #[serde(default)]
    pub max_feed_rate: Option<f64>,

    // Metadata
    /// Manufacturer name
    #[serde(default)]
    pub manufacturer: Option<String>,
    /// Workpiece materials the tool is rated for, by material id or name.
    /// Empty means any material.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub workpiece_materials: Vec<String>,
    /// Notes and tips
    #[serde(default)]
    pub notes: String,
}

impl Tool {
    /// Create a new tool with basic properties
    pub fn new(
        id: ToolId,
        number: u32,
        name: String,
        tool_type: ToolType,
        diameter: f64,
    ) -> Self {
        Self {
            id,
            number,
            name,
            tool_type,
            material: ToolMaterial::Carbide,
            coating: None,
            diameter,
            flutes: if tool_type.is_drill() { None } else { Some(2) },
            cutting_length: diameter * 2.5,
            overall_length: diameter * 6.0,
            shank_diameter: Some(diameter),
            max_rpm: 12000,
            max_depth_of_cut: diameter * 1.5,
            max_feed_rate: None,
            manufacturer: None,
            workpiece_materials: Vec::new(),
            notes: String::new(),
        }
    }

    /// Tool radius in mm
    pub fn radius(&self) -> f64 {
        self.diameter / 2.0
    }

    /// Cutting edges engaged per revolution for feed calculations.
    ///
    /// Drills are treated as a single edge regardless of their listed flutes.
    pub fn effective_flutes(&self) -> u32 {
        if self.tool_type.is_drill() {
            return 1;
        }
        self.flutes.filter(|f| *f > 0).unwrap_or(1)
    }

    /// Number of axial passes needed to reach `depth`
    pub fn passes_for_depth(&self, depth: f64) -> u32 {
        if depth <= 0.0 || self.max_depth_of_cut <= 0.0 {
            return 1;
        }
        (depth / self.max_depth_of_cut).ceil().max(1.0) as u32
    }

    /// Whether the tool is rated for cutting `material`.
    ///
    /// Entries match the material id exactly or any part of its name,
    /// ignoring case, so "aluminum" covers "Aluminum 6061".
    pub fn supports_material(&self, material: &Material) -> bool {
        if self.workpiece_materials.is_empty() {
            return true;
        }
        let name = material.name.to_lowercase();
        self.workpiece_materials.iter().any(|m| {
            let m = m.trim().to_lowercase();
            !m.is_empty() && (m == material.id.0.to_lowercase() || name.contains(&m))
        })
    }

    /// Reject definitions that cannot be used for parameter calculation
    pub fn validate(&self) -> std::result::Result<(), CatalogError> {
        let invalid = |reason: &str| CatalogError::InvalidTool {
            tool_id: self.id.to_string(),
            reason: reason.to_string(),
        };

        if self.id.0.trim().is_empty() {
            return Err(invalid("id must not be empty"));
        }
        if !self.diameter.is_finite() || self.diameter <= 0.0 {
            return Err(invalid("diameter must be positive"));
        }
        if self.max_rpm == 0 {
            return Err(invalid("max_rpm must be positive"));
        }
        if !self.max_depth_of_cut.is_finite() || self.max_depth_of_cut < 0.0 {
            return Err(invalid("max_depth_of_cut must not be negative"));
        }
        if let Some(feed) = self.max_feed_rate {
            if !feed.is_finite() || feed <= 0.0 {
                return Err(invalid("max_feed_rate must be positive"));
            }
        }
        Ok(())
    }
}

/// Criteria for narrowing the tool catalog.
///
/// Unset fields match everything.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ToolFilter {
    /// Only tools of this type
    #[serde(rename = "type")]
    pub tool_type: Option<ToolType>,
    /// Only tools of this material
    pub material: Option<ToolMaterial>,
    /// Minimum cutting diameter (inclusive)
    pub min_diameter: Option<f64>,
    /// Maximum cutting diameter (inclusive)
    pub max_diameter: Option<f64>,
    /// Case-insensitive manufacturer substring
    pub manufacturer: Option<String>,
}

impl ToolFilter {
    /// Whether `tool` satisfies every set criterion
    pub fn matches(&self, tool: &Tool) -> bool {
        if self.tool_type.is_some_and(|t| t != tool.tool_type) {
            return false;
        }
        if self.material.is_some_and(|m| m != tool.material) {
            return false;
        }
        if self.min_diameter.is_some_and(|d| tool.diameter < d) {
            return false;
        }
        if self.max_diameter.is_some_and(|d| tool.diameter > d) {
            return false;
        }
        if let Some(query) = &self.manufacturer {
            let query = query.to_lowercase();
            let matched = tool
                .manufacturer
                .as_ref()
                .is_some_and(|m| m.to_lowercase().contains(&query));
            if !matched {
                return false;
            }
        }
        true
    }
}

/// Tool library - manages collection of tools
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolLibrary {
    /// Collection of tools by ID
    tools: HashMap<ToolId, Tool>,
}

impl ToolLibrary {
    /// Create a new empty tool library
    pub fn new() -> Self {
        Self {
            tools: HashMap::new(),
        }
    }

    /// Build a library from a list of tools, rejecting invalid or duplicate entries
    pub fn from_tools(tools: Vec<Tool>) -> Result<Self> {
        let mut library = Self::new();
        for tool in tools {
            tool.validate()?;
            if library.tools.contains_key(&tool.id) {
                return Err(CatalogError::DuplicateEntry {
                    id: tool.id.to_string(),
                }
                .into());
            }
            library.add_tool(tool);
        }
        Ok(library)
    }

    /// Load a catalog from a JSON array of tools
    pub fn load_from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let tools: Vec<Tool> = serde_json::from_str(&content)?;
        let library = Self::from_tools(tools)?;
        tracing::info!(
            path = %path.display(),
            tools = library.len(),
            "Loaded tool catalog"
        );
        Ok(library)
    }

    /// Save the catalog as a JSON array, ordered by tool number
    pub fn save_to_file(&self, path: &Path) -> Result<()> {
        let tools: Vec<&Tool> = self.get_all_tools();
        let content = serde_json::to_string_pretty(&tools)?;
        std::fs::write(path, content).map_err(Error::from)
    }

    /// Add a tool to the library, replacing any tool with the same ID
    pub fn add_tool(&mut self, tool: Tool) {
        self.tools.insert(tool.id.clone(), tool);
    }

    /// Look up a tool by ID, failing if it is not in the catalog
    pub fn get(&self, id: &ToolId) -> Result<Tool> {
        self.get_tool(id).cloned().ok_or_else(|| {
            CatalogError::ToolNotFound {
                tool_id: id.to_string(),
            }
            .into()
        })
    }

    /// Get a tool by ID
    pub fn get_tool(&self, id: &ToolId) -> Option<&Tool> {
        self.tools.get(id)
    }

    /// Get all tools, ordered by tool number then ID
    pub fn get_all_tools(&self) -> Vec<&Tool> {
        let mut tools: Vec<&Tool> = self.tools.values().collect();
        tools.sort_by(|a, b| a.number.cmp(&b.number).then_with(|| a.id.cmp(&b.id)));
        tools
    }

    /// Get tools by type, ordered by diameter
    pub fn get_tools_by_type(&self, tool_type: ToolType) -> Vec<&Tool> {
        let mut tools: Vec<&Tool> = self
            .tools
            .values()
            .filter(|t| t.tool_type == tool_type)
            .collect();
        tools.sort_by(|a, b| {
            a.diameter
                .total_cmp(&b.diameter)
                .then_with(|| a.id.cmp(&b.id))
        });
        tools
    }

    /// Tools matching every criterion of `filter`
    pub fn filter(&self, filter: &ToolFilter) -> Vec<&Tool> {
        self.get_all_tools()
            .into_iter()
            .filter(|t| filter.matches(t))
            .collect()
    }

    /// Get the number of tools in the library
    pub fn len(&self) -> usize {
        self.tools.len()
    }

    /// Check if library is empty
    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }
}

impl Default for ToolLibrary {
    fn default() -> Self {
        Self::new()
    }
}

#[allow(clippy::too_many_arguments)]
fn catalog_tool(
    id: &str,
    name: &str,
    tool_type: ToolType,
    material: ToolMaterial,
    diameter: f64,
    flutes: Option<u32>,
    cutting_length: f64,
    overall_length: f64,
    max_doc: f64,
    max_rpm: u32,
    manufacturer: &str,
) -> Tool {
    let number = id.parse().unwrap_or(0);
    let mut tool = Tool::new(ToolId(id.to_string()), number, name.to_string(), tool_type, diameter);
    tool.material = material;
    tool.flutes = flutes;
    tool.cutting_length = cutting_length;
    tool.overall_length = overall_length;
    tool.shank_diameter = Some(diameter);
    tool.max_depth_of_cut = max_doc;
    tool.max_rpm = max_rpm;
    tool.manufacturer = Some(manufacturer.to_string());
    tool
}

/// Initialize standard tool library with common tools
pub fn init_standard_library() -> ToolLibrary {
    use ToolMaterial::{Carbide, Hss};
    use ToolType::{BallEndMill, Drill, EndMill};

    let mut library = ToolLibrary::new();

    let mut em10 = catalog_tool(
        "101",
        "End Mill 10mm 2-Flute",
        EndMill,
        Carbide,
        10.0,
        Some(2),
        25.0,
        75.0,
        15.0,
        18000,
        "Sandvik",
    );
    em10.coating = Some(ToolCoating::TiAlN);
    library.add_tool(em10);

    library.add_tool(catalog_tool(
        "102",
        "End Mill 16mm 4-Flute",
        EndMill,
        Carbide,
        16.0,
        Some(4),
        32.0,
        100.0,
        24.0,
        12000,
        "Kennametal",
    ));

    library.add_tool(catalog_tool(
        "103",
        "Ball End Mill 8mm",
        BallEndMill,
        Carbide,
        8.0,
        Some(2),
        20.0,
        60.0,
        12.0,
        20000,
        "Iscar",
    ));

    let mut drill_8_5 = catalog_tool(
        "104", "Drill 8.5mm", Drill, Hss, 8.5, None, 45.0, 80.0, 42.0, 10000, "Guhring",
    );
    drill_8_5.notes = "Oversize for 8mm holes that are reamed to size".to_string();
    library.add_tool(drill_8_5);

    library.add_tool(catalog_tool(
        "105", "Drill 12mm", Drill, Carbide, 12.0, None, 55.0, 95.0, 50.0, 12000, "Walter",
    ));

    library.add_tool(catalog_tool(
        "106",
        "End Mill 6mm 3-Flute",
        EndMill,
        Carbide,
        6.0,
        Some(3),
        18.0,
        57.0,
        9.0,
        24000,
        "Harvey",
    ));

    library.add_tool(catalog_tool(
        "107",
        "Ball End Mill 4mm",
        BallEndMill,
        Carbide,
        4.0,
        Some(2),
        10.0,
        50.0,
        6.0,
        24000,
        "Iscar",
    ));

    library.add_tool(catalog_tool(
        "108", "Drill 5mm", Drill, Hss, 5.0, None, 52.0, 86.0, 30.0, 12000, "Guhring",
    ));

    library.add_tool(catalog_tool(
        "109",
        "End Mill 20mm 4-Flute",
        EndMill,
        Carbide,
        20.0,
        Some(4),
        38.0,
        104.0,
        30.0,
        10000,
        "Kennametal",
    ));

    library
}

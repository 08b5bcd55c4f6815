//! Machinable features detected on a workpiece.
//!
//! Features are produced by the external CAD feature-extraction service and
//! consumed read-only here. The JSON shape matches that service: a flat object
//! with `id`, `name`, `type`, `confidence`, `x`/`y`/`z` and the kind-specific
//! dimensions.

use crate::error::{ParameterError, ParameterResult};
use serde::{Deserialize, Serialize};

/// Feature identifier, as assigned by the extraction service
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct FeatureId(pub String);

impl std::fmt::Display for FeatureId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for FeatureId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// Kind-specific feature geometry, all dimensions in mm
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum FeatureKind {
    /// Round hole
    Hole { diameter: f64, depth: f64 },
    /// Closed pocket
    Pocket {
        width: f64,
        length: f64,
        depth: f64,
        #[serde(default)]
        corner_radius: Option<f64>,
    },
    /// Open or closed slot
    Slot {
        width: f64,
        length: f64,
        depth: f64,
        #[serde(default)]
        corner_radius: Option<f64>,
    },
}

impl std::fmt::Display for FeatureKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Hole { .. } => write!(f, "hole"),
            Self::Pocket { .. } => write!(f, "pocket"),
            Self::Slot { .. } => write!(f, "slot"),
        }
    }
}

fn default_confidence() -> f64 {
    1.0
}

/// A detected machinable region
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Feature {
    pub id: FeatureId,
    #[serde(default)]
    pub name: String,
    /// Detection confidence reported by the extractor (0..=1)
    #[serde(default = "default_confidence")]
    pub confidence: f64,
    #[serde(default)]
    pub x: f64,
    #[serde(default)]
    pub y: f64,
    #[serde(default)]
    pub z: f64,
    #[serde(flatten)]
    pub kind: FeatureKind,
}

impl Feature {
    fn new(id: &str, kind: FeatureKind) -> Self {
        Self {
            id: FeatureId::from(id),
            name: String::new(),
            confidence: 1.0,
            x: 0.0,
            y: 0.0,
            z: 0.0,
            kind,
        }
    }

    pub fn hole(id: &str, diameter: f64, depth: f64) -> Self {
        Self::new(id, FeatureKind::Hole { diameter, depth })
    }

    pub fn pocket(
        id: &str,
        width: f64,
        length: f64,
        depth: f64,
        corner_radius: Option<f64>,
    ) -> Self {
        Self::new(
            id,
            FeatureKind::Pocket {
                width,
                length,
                depth,
                corner_radius,
            },
        )
    }

    pub fn slot(id: &str, width: f64, length: f64, depth: f64, corner_radius: Option<f64>) -> Self {
        Self::new(
            id,
            FeatureKind::Slot {
                width,
                length,
                depth,
                corner_radius,
            },
        )
    }

    /// Set the position, builder style
    pub fn at(mut self, x: f64, y: f64, z: f64) -> Self {
        self.x = x;
        self.y = y;
        self.z = z;
        self
    }

    /// Axial depth of the feature
    pub fn depth(&self) -> f64 {
        match self.kind {
            FeatureKind::Hole { depth, .. }
            | FeatureKind::Pocket { depth, .. }
            | FeatureKind::Slot { depth, .. } => depth,
        }
    }

    /// The narrowest lateral extent a cutter has to fit inside
    pub fn smallest_lateral_dimension(&self) -> f64 {
        match self.kind {
            FeatureKind::Hole { diameter, .. } => diameter,
            FeatureKind::Pocket { width, length, .. } | FeatureKind::Slot { width, length, .. } => {
                width.min(length)
            }
        }
    }

    pub fn corner_radius(&self) -> Option<f64> {
        match self.kind {
            FeatureKind::Hole { .. } => None,
            FeatureKind::Pocket { corner_radius, .. } | FeatureKind::Slot { corner_radius, .. } => {
                corner_radius
            }
        }
    }

    /// Label used in explanations, e.g. `Pocket_1` or `pocket feature-004`
    pub fn label(&self) -> String {
        if self.name.is_empty() {
            format!("{} {}", self.kind, self.id)
        } else {
            self.name.clone()
        }
    }

    /// Reject non-positive or non-finite dimensions
    pub fn validate(&self) -> ParameterResult<()> {
        let check = |name: &str, value: f64| {
            if value.is_finite() && value > 0.0 {
                Ok(())
            } else {
                Err(ParameterError::InvalidValue {
                    name: format!("{}.{}", self.id, name),
                    reason: format!("must be a positive length, got {}", value),
                })
            }
        };

        match self.kind {
            FeatureKind::Hole { diameter, depth } => {
                check("diameter", diameter)?;
                check("depth", depth)?;
            }
            FeatureKind::Pocket {
                width,
                length,
                depth,
                corner_radius,
            }
            | FeatureKind::Slot {
                width,
                length,
                depth,
                corner_radius,
            } => {
                check("width", width)?;
                check("length", length)?;
                check("depth", depth)?;
                if let Some(radius) = corner_radius {
                    check("corner_radius", radius)?;
                }
            }
        }
        Ok(())
    }
}

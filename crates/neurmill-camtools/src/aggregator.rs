//! Recommendation aggregation.
//!
//! Turns detected features into tool recommendations for one machine and one
//! material:
//! - holes get the smallest drill at or above the hole diameter
//! - pockets and slots get a roughing end mill that fits the narrowest side
//! - pockets and slots with a corner radius get a ball end mill finishing pass
//!
//! Only tools rated for the material are considered. Features that no catalog
//! tool can machine on the selected machine are reported as unresolved rather
//! than failing the whole set.

use crate::error::{CamToolError, CamToolResult, ResourceKind};
use crate::features::{Feature, FeatureKind};
use crate::recommendation::{
    BaselineParameters, EntryId, Feedback, FeedbackReceipt, FeedbackRecord, RecommendationEntry,
    RecommendationSet, UnresolvedFeature,
};
use crate::speeds_feeds::{Operation, SpeedsFeedsCalculator};
use crate::wear::{validate_wear_score, ParameterLimits, WearCalibrationTable};
use chrono::Utc;
use neurmill_core::{Material, Tool, ToolId, ToolLibrary, ToolType};
use neurmill_devicedb::MachineProfile;
use std::collections::BTreeSet;
use std::sync::Arc;
use uuid::Uuid;

/// Lowest and highest accepted feedback rating
const RATING_RANGE: std::ops::RangeInclusive<u8> = 1..=5;

/// Switches for how recommendations are generated
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AggregatorOptions {
    /// Add a ball end mill finishing entry for features with a corner radius
    pub finishing_passes: bool,
    /// Fall back to an undersized pilot drill when the catalog has no drill
    /// large enough for a hole
    pub allow_undersized_drills: bool,
    /// Cap adjusted values at the machine/tool limits
    pub clamp_to_limits: bool,
}

impl Default for AggregatorOptions {
    fn default() -> Self {
        Self {
            finishing_passes: true,
            allow_undersized_drills: true,
            clamp_to_limits: true,
        }
    }
}

/// A tool chosen for a feature, before speeds and feeds are attached
struct Selection<'a> {
    tool: &'a Tool,
    operation: Operation,
    tolerance_warning: bool,
    explanation: String,
}

pub struct RecommendationAggregator {
    tools: Arc<ToolLibrary>,
    calibration: WearCalibrationTable,
    options: AggregatorOptions,
}

impl RecommendationAggregator {
    pub fn new(tools: Arc<ToolLibrary>) -> Self {
        Self {
            tools,
            calibration: WearCalibrationTable::default(),
            options: AggregatorOptions::default(),
        }
    }

    pub fn with_calibration(mut self, calibration: WearCalibrationTable) -> Self {
        self.calibration = calibration;
        self
    }

    pub fn with_options(mut self, options: AggregatorOptions) -> Self {
        self.options = options;
        self
    }

    pub fn options(&self) -> AggregatorOptions {
        self.options
    }

    pub fn calibration(&self) -> &WearCalibrationTable {
        &self.calibration
    }

    /// Build a recommendation set that is not tied to an uploaded file
    pub fn build_recommendations(
        &self,
        features: &[Feature],
        machine: &MachineProfile,
        material: &Material,
    ) -> CamToolResult<RecommendationSet> {
        self.build_for_file("", features, machine, material)
    }

    /// Build a recommendation set for the features of one uploaded file
    pub fn build_for_file(
        &self,
        file_id: &str,
        features: &[Feature],
        machine: &MachineProfile,
        material: &Material,
    ) -> CamToolResult<RecommendationSet> {
        let mut set = RecommendationSet::new(file_id, machine.id.clone(), material.id.clone());

        for feature in features {
            match self.entries_for_feature(feature, machine, material) {
                Ok(entries) => {
                    for entry in entries {
                        set.push_entry(entry);
                    }
                }
                Err(reason) => Self::unresolved(&mut set, feature, reason),
            }
        }

        set.summary = Self::summarize(&set, machine, material);
        tracing::info!(
            recommendation = %set.id,
            machine = %machine.id,
            material = %material.id,
            entries = set.len(),
            unresolved = set.unresolved_features.len(),
            "Generated recommendation set"
        );
        Ok(set)
    }

    fn unresolved(set: &mut RecommendationSet, feature: &Feature, reason: String) {
        tracing::warn!(feature = %feature.id, %reason, "Feature left unresolved");
        set.unresolved_features.push(UnresolvedFeature {
            feature_id: feature.id.clone(),
            reason,
        });
    }

    /// Entries for one feature, or the reason it cannot be tooled.
    ///
    /// Every entry of a feature is built before any is returned, so a feature
    /// ends up either tooled or unresolved. A finishing pass that cannot be
    /// planned is dropped and noted on the roughing entry.
    fn entries_for_feature(
        &self,
        feature: &Feature,
        machine: &MachineProfile,
        material: &Material,
    ) -> Result<Vec<RecommendationEntry>, String> {
        feature.validate().map_err(|e| e.to_string())?;

        match feature.kind {
            FeatureKind::Hole { diameter, .. } => {
                let drill = self.select_drill(feature, diameter, machine, material)?;
                let entry = self
                    .make_entry(feature, drill, machine, material)
                    .map_err(|e| e.to_string())?;
                Ok(vec![entry])
            }
            FeatureKind::Pocket { .. } | FeatureKind::Slot { .. } => {
                let lateral = feature.smallest_lateral_dimension();
                let selection = self.select_roughing_mill(feature, lateral, machine, material)?;
                let roughing_radius = selection.tool.radius();
                let mut roughing = self
                    .make_entry(feature, selection, machine, material)
                    .map_err(|e| e.to_string())?;

                let corner_radius = match feature.corner_radius() {
                    Some(radius) if self.options.finishing_passes => radius,
                    _ => return Ok(vec![roughing]),
                };
                let finishing = self
                    .select_finishing_mill(feature, lateral, corner_radius, machine, material)
                    .and_then(|s| {
                        self.make_entry(feature, s, machine, material)
                            .map_err(|e| e.to_string())
                    });

                match finishing {
                    Ok(finishing) => Ok(vec![roughing, finishing]),
                    Err(reason) => {
                        tracing::warn!(
                            feature = %feature.id,
                            %reason,
                            "No finishing pass for feature"
                        );
                        roughing.tolerance_warning |= roughing_radius > corner_radius;
                        roughing.explanation.push_str(&format!(
                            " No finishing pass could be planned ({}); the {}mm corner radius \
                             is left as cut by the roughing end mill.",
                            reason, corner_radius
                        ));
                        Ok(vec![roughing])
                    }
                }
            }
        }
    }

    /// Tools of `tool_type` the machine can hold and that are rated for
    /// `material`, smallest diameter first
    fn fitting_tools(
        &self,
        tool_type: ToolType,
        machine: &MachineProfile,
        material: &Material,
    ) -> Vec<&Tool> {
        self.tools
            .get_tools_by_type(tool_type)
            .into_iter()
            .filter(|t| machine.supports_tool_diameter(t.diameter))
            .filter(|t| t.supports_material(material))
            .collect()
    }

    fn select_drill<'a>(
        &'a self,
        feature: &Feature,
        hole_diameter: f64,
        machine: &MachineProfile,
        material: &Material,
    ) -> Result<Selection<'a>, String> {
        let drills = self.fitting_tools(ToolType::Drill, machine, material);

        if let Some(drill) = drills.iter().copied().find(|d| d.diameter >= hole_diameter) {
            let exact = (drill.diameter - hole_diameter).abs() < 1e-6;
            let explanation = if exact {
                format!(
                    "For the {}mm hole ({}), the {} matches the hole diameter.",
                    hole_diameter,
                    feature.label(),
                    drill.name
                )
            } else {
                format!(
                    "For the {}mm hole ({}), the {} is the smallest available drill that is not \
                     undersized; the hole will be {}mm oversize.",
                    hole_diameter,
                    feature.label(),
                    drill.name,
                    round_mm(drill.diameter - hole_diameter)
                )
            };
            return Ok(Selection {
                tool: drill,
                operation: Operation::Drilling,
                tolerance_warning: !exact,
                explanation,
            });
        }

        // A large enough drill that the machine cannot hold makes the hole
        // unmachinable here; a pilot only helps when the catalog lacks the size.
        let oversize_in_catalog = self
            .tools
            .get_tools_by_type(ToolType::Drill)
            .into_iter()
            .filter(|d| d.supports_material(material))
            .find(|d| d.diameter >= hole_diameter);
        if let Some(drill) = oversize_in_catalog {
            return Err(format!(
                "{} ({}mm) is required for the {}mm hole but machine {} only accepts tools \
                 {}..{}mm",
                drill.name,
                drill.diameter,
                hole_diameter,
                machine.name,
                machine.min_tool_diameter,
                machine.max_tool_diameter
            ));
        }

        match drills.last().copied() {
            Some(pilot) if self.options.allow_undersized_drills => Ok(Selection {
                tool: pilot,
                operation: Operation::Drilling,
                tolerance_warning: true,
                explanation: format!(
                    "For the {}mm hole ({}), the {} is used for the initial hole; no drill of \
                     the full diameter is available, so the hole must be finished by boring.",
                    hole_diameter,
                    feature.label(),
                    pilot.name
                ),
            }),
            _ => Err(format!(
                "no drill of at least {}mm for {} fits machine {}",
                hole_diameter, material.name, machine.name
            )),
        }
    }

    fn select_roughing_mill<'a>(
        &'a self,
        feature: &Feature,
        lateral: f64,
        machine: &MachineProfile,
        material: &Material,
    ) -> Result<Selection<'a>, String> {
        let mill = self
            .fitting_tools(ToolType::EndMill, machine, material)
            .into_iter()
            .rev()
            .find(|t| t.diameter <= lateral)
            .ok_or_else(|| {
                format!(
                    "no end mill of at most {}mm for {} fits machine {}",
                    lateral, material.name, machine.name
                )
            })?;

        let flutes = mill.effective_flutes();
        Ok(Selection {
            tool: mill,
            operation: Operation::Roughing,
            tolerance_warning: false,
            explanation: format!(
                "For roughing the {} ({}), the {} is the largest end mill that fits the {}mm \
                 narrowest side, removing bulk material with {} flute{}.",
                feature.kind,
                feature.label(),
                mill.name,
                lateral,
                flutes,
                if flutes == 1 { "" } else { "s" }
            ),
        })
    }

    fn select_finishing_mill<'a>(
        &'a self,
        feature: &Feature,
        lateral: f64,
        corner_radius: f64,
        machine: &MachineProfile,
        material: &Material,
    ) -> Result<Selection<'a>, String> {
        let balls: Vec<&Tool> = self
            .fitting_tools(ToolType::BallEndMill, machine, material)
            .into_iter()
            .filter(|t| t.diameter <= lateral)
            .collect();

        if let Some(ball) = balls
            .iter()
            .rev()
            .copied()
            .find(|t| t.diameter <= 2.0 * corner_radius)
        {
            return Ok(Selection {
                tool: ball,
                operation: Operation::Finishing,
                tolerance_warning: false,
                explanation: format!(
                    "For finishing the {} ({}) with {}mm corner radius, the {} forms the corners \
                     and leaves a smooth surface.",
                    feature.kind,
                    feature.label(),
                    corner_radius,
                    ball.name
                ),
            });
        }

        let closest = balls.first().copied().ok_or_else(|| {
            format!(
                "no ball end mill of at most {}mm for {} fits machine {}",
                lateral, material.name, machine.name
            )
        })?;
        tracing::warn!(
            feature = %feature.id,
            tool = %closest.id,
            corner_radius,
            "Corner radius is tighter than the smallest ball end mill"
        );
        Ok(Selection {
            tool: closest,
            operation: Operation::Finishing,
            tolerance_warning: true,
            explanation: format!(
                "For finishing the {} ({}), the {} is the closest available ball end mill; its \
                 {}mm radius is larger than the {}mm corner radius, so corners will be left \
                 out of tolerance.",
                feature.kind,
                feature.label(),
                closest.name,
                closest.radius(),
                corner_radius
            ),
        })
    }

    fn limits_for(&self, tool: &Tool, machine: &MachineProfile) -> Option<ParameterLimits> {
        self.options
            .clamp_to_limits
            .then(|| ParameterLimits::for_pair(tool, machine))
    }

    fn make_entry(
        &self,
        feature: &Feature,
        selection: Selection<'_>,
        machine: &MachineProfile,
        material: &Material,
    ) -> CamToolResult<RecommendationEntry> {
        let tool = selection.tool;
        let result =
            SpeedsFeedsCalculator::compute_baseline(tool, machine, material, selection.operation)?;
        let baseline = BaselineParameters {
            speed: result.rpm,
            feed: result.feed_rate,
        };

        let passes = tool.passes_for_depth(feature.depth());
        let mut explanation = selection.explanation;
        if passes > 1 {
            explanation.push_str(&format!(
                " The {}mm depth takes {} passes at {}mm per pass.",
                feature.depth(),
                passes,
                tool.max_depth_of_cut
            ));
        }

        let mut entry = RecommendationEntry {
            id: EntryId::generate(),
            feature_id: Some(feature.id.clone()),
            tool_id: tool.id.clone(),
            tool_name: tool.name.clone(),
            operation: selection.operation,
            baseline: Some(baseline),
            reference: baseline,
            wear_score: None,
            adjusted_speed: baseline.speed,
            adjusted_feed: baseline.feed,
            tolerance_warning: selection.tolerance_warning,
            depth_passes: passes,
            calibration: self.calibration.resolve(&material.id, tool.material),
            limits: self.limits_for(tool, machine),
            explanation,
        };
        entry.apply_wear(None)?;
        Ok(entry)
    }

    fn summarize(set: &RecommendationSet, machine: &MachineProfile, material: &Material) -> String {
        let entries = set.entries();
        let tools: BTreeSet<&str> = entries.iter().map(|e| e.tool_name.as_str()).collect();
        let mut summary = format!(
            "{} operation{} using {} tool{} for machining {} on a {}",
            entries.len(),
            if entries.len() == 1 { "" } else { "s" },
            tools.len(),
            if tools.len() == 1 { "" } else { "s" },
            material.name,
            machine.name
        );
        if !tools.is_empty() {
            let names: Vec<&str> = tools.into_iter().collect();
            summary.push_str(&format!(": {}", names.join(", ")));
        }
        summary.push('.');

        let warnings = entries.iter().filter(|e| e.tolerance_warning).count();
        if warnings > 0 {
            summary.push_str(&format!(
                " {} operation{} cannot hold the drawn geometry exactly.",
                warnings,
                if warnings == 1 { "" } else { "s" }
            ));
        }
        if !set.unresolved_features.is_empty() {
            summary.push_str(&format!(
                " {} feature{} could not be tooled on this machine.",
                set.unresolved_features.len(),
                if set.unresolved_features.len() == 1 { "" } else { "s" }
            ));
        }
        summary
    }

    /// Append an operator-chosen tool to the set.
    ///
    /// Manual entries have no baseline; wear is applied to the tool/machine
    /// speed and feed ceilings instead.
    pub fn add_manual_entry(
        &self,
        set: &RecommendationSet,
        machine: &MachineProfile,
        material: &Material,
        tool_id: &ToolId,
        wear_score: Option<f64>,
    ) -> CamToolResult<RecommendationEntry> {
        let tool = self.tools.get(tool_id)?;
        SpeedsFeedsCalculator::check_compatibility(&tool, machine)?;
        if !tool.supports_material(material) {
            return Err(CamToolError::UnsupportedMaterial {
                tool_id: tool.id.to_string(),
                material_id: material.id.to_string(),
            });
        }
        if let Some(wear) = wear_score {
            validate_wear_score(wear)?;
        }

        let stand_in = ParameterLimits::for_pair(&tool, machine);
        let reference = BaselineParameters {
            speed: stand_in.max_rpm,
            feed: stand_in.max_feed_rate,
        };
        let operation = if tool.tool_type.is_drill() {
            Operation::Drilling
        } else {
            Operation::SemiFinishing
        };

        let mut entry = RecommendationEntry {
            id: EntryId::generate(),
            feature_id: None,
            tool_id: tool.id.clone(),
            tool_name: tool.name.clone(),
            operation,
            baseline: None,
            reference,
            wear_score: None,
            adjusted_speed: reference.speed,
            adjusted_feed: reference.feed,
            tolerance_warning: false,
            depth_passes: 1,
            calibration: self.calibration.resolve(&material.id, tool.material),
            limits: self.limits_for(&tool, machine),
            explanation: format!(
                "{} added manually; speed and feed start from the machine and tool limits.",
                tool.name
            ),
        };
        entry.apply_wear(wear_score)?;
        set.push_entry(entry.clone());

        tracing::info!(
            recommendation = %set.id,
            entry = %entry.id,
            tool = %tool.id,
            "Added manual entry"
        );
        Ok(entry)
    }

    /// Recompute one entry for a new wear score, in place
    pub fn update_wear_score(
        &self,
        set: &RecommendationSet,
        entry_id: &EntryId,
        wear_score: Option<f64>,
    ) -> CamToolResult<RecommendationEntry> {
        let handle = set.entry(entry_id)?;
        let mut entry = handle.lock();
        entry.apply_wear(wear_score)?;
        tracing::debug!(
            recommendation = %set.id,
            entry = %entry_id,
            wear_score = ?wear_score,
            speed = entry.adjusted_speed,
            feed = entry.adjusted_feed,
            "Updated wear score"
        );
        Ok(entry.clone())
    }

    /// Apply a wear score to every entry that uses `tool_id`.
    ///
    /// The score is validated before any entry is touched.
    pub fn update_wear_score_for_tool(
        &self,
        set: &RecommendationSet,
        tool_id: &ToolId,
        wear_score: Option<f64>,
    ) -> CamToolResult<Vec<RecommendationEntry>> {
        if let Some(wear) = wear_score {
            validate_wear_score(wear)?;
        }
        let ids: Vec<EntryId> = set
            .entries_for_tool(tool_id)
            .into_iter()
            .map(|e| e.id)
            .collect();
        if ids.is_empty() {
            return Err(CamToolError::not_found(
                ResourceKind::Tool,
                format!("{} in recommendation {}", tool_id, set.id),
            ));
        }
        ids.iter()
            .map(|id| self.update_wear_score(set, id, wear_score))
            .collect()
    }

    /// Record operator feedback on a set
    pub fn submit_feedback(
        &self,
        set: &RecommendationSet,
        feedback: Feedback,
    ) -> CamToolResult<FeedbackReceipt> {
        if !RATING_RANGE.contains(&feedback.rating) {
            return Err(CamToolError::InvalidFeedback(format!(
                "rating must be between {} and {}, got {}",
                RATING_RANGE.start(),
                RATING_RANGE.end(),
                feedback.rating
            )));
        }
        let feedback = Feedback {
            comments: feedback
                .comments
                .map(|c| c.trim().to_string())
                .filter(|c| !c.is_empty()),
            ..feedback
        };

        let receipt = FeedbackReceipt {
            feedback_id: format!("feedback-{}", Uuid::new_v4()),
            recommendation_id: set.id.clone(),
            submitted_at: Utc::now(),
        };
        set.record_feedback(FeedbackRecord {
            receipt: receipt.clone(),
            feedback,
        });
        tracing::info!(
            recommendation = %set.id,
            feedback = %receipt.feedback_id,
            "Feedback received"
        );
        Ok(receipt)
    }
}

fn round_mm(value: f64) -> f64 {
    (value * 1000.0).round() / 1000.0
}

//! Engine facade used by the service and CLI layers.
//!
//! Owns the shared catalogs, the aggregator and the store, and resolves
//! identifiers before handing off to the calculator, the wear adjuster or the
//! aggregator. Every method takes `&self`; the engine can be shared across
//! request threads behind an `Arc`.

use crate::aggregator::{AggregatorOptions, RecommendationAggregator};
use crate::error::{CamToolError, CamToolResult, ResourceKind};
use crate::features::Feature;
use crate::recommendation::{
    EntryId, Feedback, FeedbackReceipt, RecommendationEntry, RecommendationId, RecommendationSet,
};
use crate::speeds_feeds::{CalculationResult, Operation, SpeedsFeedsCalculator};
use crate::store::RecommendationStore;
use crate::wear::{AdjustedParameters, ParameterLimits, WearAdjuster, WearCalibrationTable};
use neurmill_core::data::{materials, tools};
use neurmill_core::{Material, MaterialLibrary, Tool, ToolFilter, ToolId, ToolLibrary};
use neurmill_devicedb::{init_standard_catalog, MachineProfile, MachineProvider};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Speed/feed for one tool on one machine in one material
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpeedFeedResult {
    pub tool_id: ToolId,
    pub machine_id: String,
    pub material_id: String,
    pub operation: Operation,
    pub wear_score: Option<f64>,
    /// Wear-adjusted spindle speed in RPM
    pub speed: u32,
    /// Wear-adjusted feed rate in mm/min
    pub feed: u32,
    pub baseline: CalculationResult,
}

pub struct SpeedFeedEngine {
    tools: Arc<ToolLibrary>,
    materials: Arc<MaterialLibrary>,
    machines: Arc<dyn MachineProvider>,
    aggregator: RecommendationAggregator,
    store: RecommendationStore,
}

impl SpeedFeedEngine {
    pub fn new(
        tools: Arc<ToolLibrary>,
        machines: Arc<dyn MachineProvider>,
        materials: Arc<MaterialLibrary>,
    ) -> Self {
        Self {
            aggregator: RecommendationAggregator::new(Arc::clone(&tools)),
            tools,
            materials,
            machines,
            store: RecommendationStore::new(),
        }
    }

    /// Engine over the built-in tool, machine and material catalogs
    pub fn with_standard_catalogs() -> Self {
        Self::new(
            Arc::new(tools::init_standard_library()),
            Arc::new(init_standard_catalog()),
            Arc::new(materials::init_standard_library()),
        )
    }

    pub fn with_calibration(mut self, calibration: WearCalibrationTable) -> Self {
        self.aggregator = self.aggregator.with_calibration(calibration);
        self
    }

    pub fn with_options(mut self, options: AggregatorOptions) -> Self {
        self.aggregator = self.aggregator.with_options(options);
        self
    }

    pub fn store(&self) -> &RecommendationStore {
        &self.store
    }

    pub fn get_tool(&self, tool_id: &ToolId) -> CamToolResult<Tool> {
        Ok(self.tools.get(tool_id)?)
    }

    pub fn filter_tools(&self, filter: &ToolFilter) -> Vec<Tool> {
        self.tools.filter(filter).into_iter().cloned().collect()
    }

    pub fn get_machine(&self, machine_id: &str) -> CamToolResult<MachineProfile> {
        Ok(self.machines.get_machine(machine_id)?)
    }

    pub fn list_machines(&self) -> Vec<MachineProfile> {
        self.machines.list_machines()
    }

    /// Resolve a material by id or display name
    pub fn get_material(&self, id_or_name: &str) -> CamToolResult<Material> {
        self.materials
            .find(id_or_name)
            .cloned()
            .ok_or_else(|| CamToolError::not_found(ResourceKind::Material, id_or_name))
    }

    pub fn list_materials(&self) -> Vec<Material> {
        self.materials
            .get_all_materials()
            .into_iter()
            .cloned()
            .collect()
    }

    /// Baseline speed and feed for a tool, derated by `wear_score`
    pub fn calculate_speeds_feeds(
        &self,
        tool_id: &ToolId,
        machine_id: &str,
        material_id: &str,
        operation: Operation,
        wear_score: Option<f64>,
    ) -> CamToolResult<SpeedFeedResult> {
        let tool = self.get_tool(tool_id)?;
        let machine = self.get_machine(machine_id)?;
        let material = self.get_material(material_id)?;

        let baseline = SpeedsFeedsCalculator::compute_baseline(&tool, &machine, &material, operation)?;
        let calibration = self
            .aggregator
            .calibration()
            .resolve(&material.id, tool.material);
        let mut adjusted: AdjustedParameters = WearAdjuster::new(calibration).apply(
            baseline.rpm,
            baseline.feed_rate,
            wear_score,
        )?;
        if self.aggregator.options().clamp_to_limits {
            adjusted = ParameterLimits::for_pair(&tool, &machine).cap(adjusted);
        }

        Ok(SpeedFeedResult {
            tool_id: tool.id,
            machine_id: machine.id,
            material_id: material.id.to_string(),
            operation,
            wear_score: adjusted.wear_score,
            speed: adjusted.speed,
            feed: adjusted.feed,
            baseline,
        })
    }

    /// Generate, store and return a recommendation set for a part's features
    pub fn recommend_tools(
        &self,
        machine_id: &str,
        material_id: &str,
        file_id: &str,
        features: &[Feature],
    ) -> CamToolResult<Arc<RecommendationSet>> {
        let machine = self.get_machine(machine_id)?;
        let material = self.get_material(material_id)?;
        let set = self
            .aggregator
            .build_for_file(file_id, features, &machine, &material)?;
        Ok(self.store.insert(set))
    }

    pub fn get_recommendations(
        &self,
        recommendation_id: &RecommendationId,
    ) -> CamToolResult<Arc<RecommendationSet>> {
        self.store.get(recommendation_id)
    }

    pub fn add_manual_entry(
        &self,
        recommendation_id: &RecommendationId,
        tool_id: &ToolId,
        wear_score: Option<f64>,
    ) -> CamToolResult<RecommendationEntry> {
        let set = self.store.get(recommendation_id)?;
        let machine = self.get_machine(&set.machine_id)?;
        let material = self.get_material(&set.material_id.0)?;
        self.aggregator
            .add_manual_entry(&set, &machine, &material, tool_id, wear_score)
    }

    pub fn update_wear_score(
        &self,
        recommendation_id: &RecommendationId,
        entry_id: &EntryId,
        wear_score: Option<f64>,
    ) -> CamToolResult<RecommendationEntry> {
        let set = self.store.get(recommendation_id)?;
        self.aggregator
            .update_wear_score(&set, entry_id, wear_score)
    }

    /// Wear update addressed by tool, as the review page sends it
    pub fn update_wear_score_for_tool(
        &self,
        recommendation_id: &RecommendationId,
        tool_id: &ToolId,
        wear_score: Option<f64>,
    ) -> CamToolResult<Vec<RecommendationEntry>> {
        let set = self.store.get(recommendation_id)?;
        self.aggregator
            .update_wear_score_for_tool(&set, tool_id, wear_score)
    }

    pub fn submit_feedback(
        &self,
        recommendation_id: &RecommendationId,
        feedback: Feedback,
    ) -> CamToolResult<FeedbackReceipt> {
        let set = self.store.get(recommendation_id)?;
        self.aggregator.submit_feedback(&set, feedback)
    }
}

impl Default for SpeedFeedEngine {
    fn default() -> Self {
        Self::with_standard_catalogs()
    }
}

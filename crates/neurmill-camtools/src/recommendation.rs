//! Recommendation sets and their entries.
//!
//! A [`RecommendationSet`] is created once per analysed part and then edited in
//! place: manual entries are appended, wear scores are rewritten, feedback is
//! collected. Entries are individually locked so edits to different entries
//! never wait on each other.

use crate::error::{CamToolError, CamToolResult, ResourceKind};
use crate::features::FeatureId;
use crate::speeds_feeds::Operation;
use crate::wear::{AdjustedParameters, ParameterLimits, WearAdjuster, WearCalibration};
use chrono::{DateTime, Utc};
use neurmill_core::{thread_safe, thread_safe_rw, thread_safe_vec};
use neurmill_core::{MaterialId, ThreadSafe, ThreadSafeRw, ThreadSafeVec, ToolId};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Recommendation set identifier
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct RecommendationId(pub String);

impl RecommendationId {
    pub fn generate() -> Self {
        Self(format!("rec-{}", Uuid::new_v4()))
    }
}

impl std::fmt::Display for RecommendationId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for RecommendationId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// Entry identifier, unique within the process
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct EntryId(pub String);

impl EntryId {
    pub fn generate() -> Self {
        Self(Uuid::new_v4().to_string())
    }
}

impl std::fmt::Display for EntryId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for EntryId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// Spindle speed (RPM) and feed (mm/min) before wear adjustment
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BaselineParameters {
    pub speed: u32,
    pub feed: u32,
}

/// One recommended tool usage
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecommendationEntry {
    pub id: EntryId,
    /// Feature the tool machines; `None` for manual entries
    pub feature_id: Option<FeatureId>,
    pub tool_id: ToolId,
    pub tool_name: String,
    pub operation: Operation,
    /// Computed baseline; `None` for manual entries
    pub baseline: Option<BaselineParameters>,
    /// Values wear adjustment starts from: the baseline, or the machine/tool
    /// stand-in for manual entries
    pub reference: BaselineParameters,
    pub wear_score: Option<f64>,
    pub adjusted_speed: u32,
    pub adjusted_feed: u32,
    /// The tool cannot reproduce the requested geometry exactly
    pub tolerance_warning: bool,
    /// Axial passes needed at the tool's maximum depth of cut
    pub depth_passes: u32,
    pub calibration: WearCalibration,
    /// Caps applied to adjusted values; `None` disables capping
    pub limits: Option<ParameterLimits>,
    pub explanation: String,
}

impl RecommendationEntry {
    /// Recompute adjusted values for a new wear score.
    ///
    /// On error the entry is left unchanged.
    pub fn apply_wear(&mut self, wear_score: Option<f64>) -> CamToolResult<AdjustedParameters> {
        let adjusted = self.adjusted_for(wear_score)?;
        self.wear_score = adjusted.wear_score;
        self.adjusted_speed = adjusted.speed;
        self.adjusted_feed = adjusted.feed;
        Ok(adjusted)
    }

    /// Adjusted values for `wear_score`, without modifying the entry
    pub fn adjusted_for(&self, wear_score: Option<f64>) -> CamToolResult<AdjustedParameters> {
        let adjusted = WearAdjuster::new(self.calibration).apply(
            self.reference.speed,
            self.reference.feed,
            wear_score,
        )?;
        Ok(match &self.limits {
            Some(limits) => limits.cap(adjusted),
            None => adjusted,
        })
    }

    pub fn is_manual(&self) -> bool {
        self.feature_id.is_none()
    }
}

/// A feature no tool could be found for
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UnresolvedFeature {
    pub feature_id: FeatureId,
    pub reason: String,
}

/// Operator feedback on a recommendation set
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Feedback {
    /// 1 (poor) to 5 (excellent)
    pub rating: u8,
    #[serde(default)]
    pub comments: Option<String>,
}

/// Acknowledgement returned for accepted feedback
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FeedbackReceipt {
    pub feedback_id: String,
    pub recommendation_id: RecommendationId,
    pub submitted_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeedbackRecord {
    pub receipt: FeedbackReceipt,
    pub feedback: Feedback,
}

/// Tool recommendations for one part on one machine in one material
#[derive(Debug)]
pub struct RecommendationSet {
    pub id: RecommendationId,
    pub file_id: String,
    pub machine_id: String,
    pub material_id: MaterialId,
    pub generated_at: DateTime<Utc>,
    pub summary: String,
    pub unresolved_features: Vec<UnresolvedFeature>,
    entries: ThreadSafeRw<Vec<ThreadSafe<RecommendationEntry>>>,
    feedback: ThreadSafeVec<FeedbackRecord>,
}

impl RecommendationSet {
    pub fn new(
        file_id: impl Into<String>,
        machine_id: impl Into<String>,
        material_id: MaterialId,
    ) -> Self {
        Self {
            id: RecommendationId::generate(),
            file_id: file_id.into(),
            machine_id: machine_id.into(),
            material_id,
            generated_at: Utc::now(),
            summary: String::new(),
            unresolved_features: Vec::new(),
            entries: thread_safe_rw(Vec::new()),
            feedback: thread_safe_vec(),
        }
    }

    /// Append an entry, keeping insertion order
    pub fn push_entry(&self, entry: RecommendationEntry) {
        self.entries.write().push(thread_safe(entry));
    }

    /// Shared handle to one entry
    pub fn entry(&self, id: &EntryId) -> CamToolResult<ThreadSafe<RecommendationEntry>> {
        self.entries
            .read()
            .iter()
            .find(|e| e.lock().id == *id)
            .cloned()
            .ok_or_else(|| CamToolError::not_found(ResourceKind::Entry, id.to_string()))
    }

    /// Copy of every entry, in order
    pub fn entries(&self) -> Vec<RecommendationEntry> {
        self.entries.read().iter().map(|e| e.lock().clone()).collect()
    }

    /// Entries whose `tool_id` matches
    pub fn entries_for_tool(&self, tool_id: &ToolId) -> Vec<RecommendationEntry> {
        self.entries()
            .into_iter()
            .filter(|e| e.tool_id == *tool_id)
            .collect()
    }

    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }

    pub fn record_feedback(&self, record: FeedbackRecord) {
        self.feedback.lock().push(record);
    }

    pub fn feedback(&self) -> Vec<FeedbackRecord> {
        self.feedback.lock().clone()
    }

    /// Serialisable view of the set as it is right now
    pub fn snapshot(&self) -> RecommendationSnapshot {
        let recommendations = self
            .entries()
            .into_iter()
            .map(|e| EntrySnapshot {
                id: e.id,
                operation: e.operation,
                tool_id: e.tool_id,
                tool_name: e.tool_name,
                speed_rpm: e.adjusted_speed,
                feed_rate: e.adjusted_feed,
                baseline: e.baseline,
                wear_score: e.wear_score,
                depth_passes: e.depth_passes,
                tolerance_warning: e.tolerance_warning,
                features: e.feature_id.into_iter().collect(),
                explanation: e.explanation,
            })
            .collect();

        RecommendationSnapshot {
            id: self.id.clone(),
            file_id: self.file_id.clone(),
            machine_id: self.machine_id.clone(),
            material_id: self.material_id.clone(),
            generated_at: self.generated_at,
            recommendations,
            unresolved_features: self.unresolved_features.clone(),
            summary: self.summary.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EntrySnapshot {
    pub id: EntryId,
    pub operation: Operation,
    pub tool_id: ToolId,
    pub tool_name: String,
    pub speed_rpm: u32,
    pub feed_rate: u32,
    pub baseline: Option<BaselineParameters>,
    pub wear_score: Option<f64>,
    pub depth_passes: u32,
    pub tolerance_warning: bool,
    pub features: Vec<FeatureId>,
    pub explanation: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecommendationSnapshot {
    pub id: RecommendationId,
    pub file_id: String,
    pub machine_id: String,
    pub material_id: MaterialId,
    pub generated_at: DateTime<Utc>,
    pub recommendations: Vec<EntrySnapshot>,
    pub unresolved_features: Vec<UnresolvedFeature>,
    pub summary: String,
}

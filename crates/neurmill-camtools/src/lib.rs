//! # NeurMill CAM Tools
//!
//! This crate turns detected part features into tool recommendations with
//! spindle speeds and feed rates for a given machine and material.
//!
//! ## Components
//!
//! - **Features**: Holes, pockets and slots as reported by the CAD feature extractor
//! - **Speeds & Feeds**: Baseline RPM and feed from cutting tables, clamped to machine/tool limits
//! - **Wear**: Derating of baseline values by an operator-assessed wear score
//! - **Aggregator**: Tool selection per feature, manual entries, wear updates and feedback
//! - **Store**: Thread-safe registry of generated recommendation sets
//! - **Engine**: Facade resolving ids against the catalogs

pub mod aggregator;
pub mod engine;
pub mod error;
pub mod features;
pub mod recommendation;
pub mod speeds_feeds;
pub mod store;
pub mod wear;

// Re-export commonly used items
pub use aggregator::{AggregatorOptions, RecommendationAggregator};
pub use engine::{SpeedFeedEngine, SpeedFeedResult};
pub use error::{CamToolError, CamToolResult, ParameterError, ParameterResult, ResourceKind};
pub use features::{Feature, FeatureId, FeatureKind};
pub use recommendation::{
    BaselineParameters, EntryId, EntrySnapshot, Feedback, FeedbackReceipt, FeedbackRecord,
    RecommendationEntry, RecommendationId, RecommendationSet, RecommendationSnapshot,
    UnresolvedFeature,
};
pub use speeds_feeds::{CalculationResult, Operation, SpeedsFeedsCalculator};
pub use store::RecommendationStore;
pub use wear::{
    validate_wear_score, AdjustedParameters, CalibrationOverride, ParameterLimits, WearAdjuster,
    WearCalibration, WearCalibrationTable,
};

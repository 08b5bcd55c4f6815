//! In-memory registry of generated recommendation sets.

use crate::error::{CamToolError, CamToolResult, ResourceKind};
use crate::recommendation::{RecommendationId, RecommendationSet};
use neurmill_core::{thread_safe_rw_map, ThreadSafeRwMap};
use std::sync::Arc;

/// Recommendation sets by id, shared between threads.
///
/// Sets are never evicted; expiry belongs to whatever persists them.
#[derive(Debug, Clone)]
pub struct RecommendationStore {
    sets: ThreadSafeRwMap<RecommendationId, Arc<RecommendationSet>>,
}

impl RecommendationStore {
    pub fn new() -> Self {
        Self {
            sets: thread_safe_rw_map(),
        }
    }

    /// Register a set and return the shared handle to it
    pub fn insert(&self, set: RecommendationSet) -> Arc<RecommendationSet> {
        let set = Arc::new(set);
        self.sets.write().insert(set.id.clone(), Arc::clone(&set));
        set
    }

    pub fn get(&self, id: &RecommendationId) -> CamToolResult<Arc<RecommendationSet>> {
        self.sets
            .read()
            .get(id)
            .cloned()
            .ok_or_else(|| CamToolError::not_found(ResourceKind::Recommendation, id.to_string()))
    }

    pub fn contains(&self, id: &RecommendationId) -> bool {
        self.sets.read().contains_key(id)
    }

    /// Ids of all stored sets, sorted
    pub fn ids(&self) -> Vec<RecommendationId> {
        let mut ids: Vec<RecommendationId> = self.sets.read().keys().cloned().collect();
        ids.sort();
        ids
    }

    pub fn len(&self) -> usize {
        self.sets.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.sets.read().is_empty()
    }
}

impl Default for RecommendationStore {
    fn default() -> Self {
        Self::new()
    }
}

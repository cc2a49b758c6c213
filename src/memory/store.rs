//! Memory Store - append-only experiment history with derived views
//!
//! The store owns the full history and three views recomputed on write:
//! per-component risk profiles, relationship co-occurrence counts, and
//! similarity search over past experiments.

use std::collections::BTreeMap;

use tracing::debug;

use super::ComponentRiskProfile;
use crate::experiment::{ExperimentCandidate, ExperimentRecord};

/// Default threshold for [`MemoryStore::similar_experiments`].
pub const DEFAULT_SIMILARITY_THRESHOLD: f64 = 0.7;

/// Weights for the four similarity components:
/// type match, target match, parameter-key Jaccard, affected-component Jaccard.
const SIMILARITY_WEIGHTS: [f64; 4] = [0.3, 0.3, 0.2, 0.2];

/// Append-only record of past experiments plus derived aggregate views.
///
/// ## Design
///
/// History is never evicted; every derived view is a pure function of it.
/// Risk profiles are rebuilt eagerly inside [`add_experiment`] so that read
/// paths never observe a stale or half-built profile. Lookups for unknown
/// components degrade to documented defaults instead of erroring.
///
/// [`add_experiment`]: MemoryStore::add_experiment
#[derive(Debug, Default)]
pub struct MemoryStore {
    experiments: Vec<ExperimentRecord>,
    relationships: BTreeMap<String, BTreeMap<String, f64>>,
    risk_profiles: BTreeMap<String, ComponentRiskProfile>,
}

impl MemoryStore {
    /// Create a new empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Check if the store holds no history.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.experiments.is_empty()
    }

    /// Number of recorded experiments.
    #[must_use]
    pub fn len(&self) -> usize {
        self.experiments.len()
    }

    /// Full history in insertion order.
    #[must_use]
    pub fn experiments(&self) -> &[ExperimentRecord] {
        &self.experiments
    }

    /// Append a record and recompute the target component's derived views.
    ///
    /// Never fails for well-formed input; the append and the recomputation
    /// form one atomic unit from the caller's perspective (the store is
    /// borrowed mutably for the whole call).
    pub fn add_experiment(&mut self, record: ExperimentRecord) {
        debug!(
            id = record.id(),
            component = record.target_component(),
            outcome = ?record.outcome(),
            "recording experiment"
        );

        let target = record.target_component().to_string();

        let weights = self.relationships.entry(target.clone()).or_default();
        for affected in record.affected_components() {
            *weights.entry(affected.clone()).or_insert(0.0) += 1.0;
        }

        self.experiments.push(record);
        self.rebuild_risk_profile(&target);
    }

    /// Every historical record whose similarity to `candidate` is at least
    /// `threshold`.
    ///
    /// Results keep history insertion order; they are not ranked by
    /// similarity. Callers wanting ranked output must sort explicitly.
    #[must_use]
    pub fn similar_experiments(
        &self,
        candidate: &ExperimentCandidate,
        threshold: f64,
    ) -> Vec<&ExperimentRecord> {
        self.experiments
            .iter()
            .filter(|record| similarity(candidate, record) >= threshold)
            .collect()
    }

    /// Risk profile for a component, neutral default when it has no history.
    #[must_use]
    pub fn component_risk_profile(&self, component: &str) -> ComponentRiskProfile {
        self.risk_profiles.get(component).cloned().unwrap_or_default()
    }

    /// Raw co-occurrence counts with other components, empty if unknown.
    #[must_use]
    pub fn component_relationships(&self, component: &str) -> BTreeMap<String, f64> {
        self.relationships.get(component).cloned().unwrap_or_default()
    }

    fn rebuild_risk_profile(&mut self, component: &str) {
        let history: Vec<&ExperimentRecord> = self
            .experiments
            .iter()
            .filter(|r| r.target_component() == component)
            .collect();

        if let Some(profile) = ComponentRiskProfile::from_history(&history) {
            self.risk_profiles.insert(component.to_string(), profile);
        }
    }
}

/// Parameter keys every experiment carries implicitly. The required fields
/// are hoisted out of the parameter map in the typed model, but they still
/// count as parameter keys for similarity, so a candidate with no explicit
/// parameters can match history on its required fields alone.
const IMPLICIT_PARAM_KEYS: [&str; 2] = ["target_component", "duration"];

/// Weighted similarity between a candidate and a historical record.
///
/// Four components, weights [0.3, 0.3, 0.2, 0.2]: exact type match, exact
/// target match, Jaccard over parameter keys (explicit plus implicit),
/// Jaccard over affected components (0 when either side is empty).
fn similarity(candidate: &ExperimentCandidate, record: &ExperimentRecord) -> f64 {
    let type_sim = if candidate.experiment_type == record.experiment_type() {
        1.0
    } else {
        0.0
    };

    let target_sim = if candidate.target_component == record.target_component() {
        1.0
    } else {
        0.0
    };

    let param_sim = jaccard(
        candidate
            .parameters
            .keys()
            .map(String::as_str)
            .chain(IMPLICIT_PARAM_KEYS),
        record
            .parameters()
            .keys()
            .map(String::as_str)
            .chain(IMPLICIT_PARAM_KEYS),
    );

    let comp_sim = if candidate.affected_components.is_empty()
        || record.affected_components().is_empty()
    {
        0.0
    } else {
        jaccard(
            candidate.affected_components.iter().map(String::as_str),
            record.affected_components().iter().map(String::as_str),
        )
    };

    SIMILARITY_WEIGHTS[0] * type_sim
        + SIMILARITY_WEIGHTS[1] * target_sim
        + SIMILARITY_WEIGHTS[2] * param_sim
        + SIMILARITY_WEIGHTS[3] * comp_sim
}

/// Jaccard similarity of two string sets; 0 when the intersection is empty.
fn jaccard<'a>(
    left: impl Iterator<Item = &'a str>,
    right: impl Iterator<Item = &'a str>,
) -> f64 {
    use std::collections::BTreeSet;

    let left: BTreeSet<&str> = left.collect();
    let right: BTreeSet<&str> = right.collect();

    let intersection = left.intersection(&right).count();
    if intersection == 0 {
        return 0.0;
    }

    #[allow(clippy::cast_precision_loss)]
    let union = left.union(&right).count() as f64;
    #[allow(clippy::cast_precision_loss)]
    let intersection = intersection as f64;
    intersection / union
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::experiment::Outcome;

    fn store_with_user_service_history() -> MemoryStore {
        let mut store = MemoryStore::new();
        store.add_experiment(
            ExperimentRecord::builder("exp-1", "network_failure", "user-service", Outcome::Success)
                .parameter("latency_ms", 1000.0)
                .duration("30s")
                .affected_component("api-gateway")
                .build(),
        );
        store.add_experiment(
            ExperimentRecord::builder("exp-2", "network_failure", "user-service", Outcome::Failure)
                .parameter("latency_ms", 5000.0)
                .duration("60s")
                .affected_component("api-gateway")
                .affected_component("billing")
                .build(),
        );
        store
    }

    fn network_candidate() -> ExperimentCandidate {
        ExperimentCandidate::builder("network_failure", "user-service", "90s")
            .parameter("latency_ms", 3000.0)
            .build()
    }

    #[test]
    fn test_store_default() {
        let store = MemoryStore::new();
        assert!(store.is_empty());
        assert_eq!(store.len(), 0);
    }

    #[test]
    fn test_profile_recomputed_on_write() {
        let store = store_with_user_service_history();
        let profile = store.component_risk_profile("user-service");
        assert!((profile.success_rate - 0.5).abs() < f64::EPSILON);
    }

    #[test]
    fn test_unknown_component_gets_neutral_profile() {
        let store = store_with_user_service_history();
        let profile = store.component_risk_profile("nonexistent");
        assert_eq!(profile, ComponentRiskProfile::default());
    }

    #[test]
    fn test_relationship_counts_accumulate() {
        let store = store_with_user_service_history();
        let rel = store.component_relationships("user-service");
        assert!((rel["api-gateway"] - 2.0).abs() < f64::EPSILON);
        assert!((rel["billing"] - 1.0).abs() < f64::EPSILON);
        assert!(store.component_relationships("unknown").is_empty());
    }

    #[test]
    fn test_similar_experiments_match_type_and_target() {
        let store = store_with_user_service_history();
        // type (0.3) + target (0.3) + parameter keys (0.2) = 0.8
        let similar = store.similar_experiments(&network_candidate(), 0.7);
        assert_eq!(similar.len(), 2);
    }

    #[test]
    fn test_similar_experiments_insertion_order() {
        let store = store_with_user_service_history();
        let similar = store.similar_experiments(&network_candidate(), 0.7);
        assert_eq!(similar[0].id(), "exp-1");
        assert_eq!(similar[1].id(), "exp-2");
    }

    #[test]
    fn test_similar_experiments_idempotent() {
        let store = store_with_user_service_history();
        let first: Vec<&str> = store
            .similar_experiments(&network_candidate(), 0.7)
            .iter()
            .map(|r| r.id())
            .collect();
        let second: Vec<&str> = store
            .similar_experiments(&network_candidate(), 0.7)
            .iter()
            .map(|r| r.id())
            .collect();
        assert_eq!(first, second);
    }

    #[test]
    fn test_bare_candidate_matches_on_required_fields() {
        let store = store_with_user_service_history();
        // No explicit parameters: the implicit target_component and duration
        // keys against the records' {latency_ms} + implicit keys give a
        // 2/3 key Jaccard, so 0.3 + 0.3 + 0.2 * 2/3 clears the threshold.
        let bare =
            ExperimentCandidate::builder("network_failure", "user-service", "90s").build();
        let similar = store.similar_experiments(&bare, DEFAULT_SIMILARITY_THRESHOLD);
        assert_eq!(similar.len(), 2);
    }

    #[test]
    fn test_dissimilar_candidate_excluded() {
        let store = store_with_user_service_history();
        let candidate = ExperimentCandidate::builder("resource", "orders-db", "30s").build();
        assert!(store
            .similar_experiments(&candidate, DEFAULT_SIMILARITY_THRESHOLD)
            .is_empty());
    }

    #[test]
    fn test_affected_component_overlap_raises_similarity() {
        let store = store_with_user_service_history();
        let mut candidate = network_candidate();
        // Below threshold without type match: target 0.3 + params 0.2 = 0.5
        candidate.experiment_type = "resource".to_string();
        assert!(store.similar_experiments(&candidate, 0.7).is_empty());

        // Affected overlap adds at most 0.2
        candidate.affected_components = vec!["api-gateway".to_string()];
        let similar = store.similar_experiments(&candidate, 0.7);
        assert_eq!(similar.len(), 1);
        assert_eq!(similar[0].id(), "exp-1");
    }
}

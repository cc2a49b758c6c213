//! Experiment Record - immutable historical fact about a concluded experiment

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::ParamValue;
use crate::safety::RiskLevel;

/// Final outcome of a concluded experiment.
///
/// Wire strings are snake_case (`"partial_success"` etc.) for compatibility
/// with persisted history.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Outcome {
    /// Experiment ran to completion and the hypothesis held.
    Success,
    /// Experiment completed with degraded but acceptable results.
    PartialSuccess,
    /// Experiment completed but the hypothesis did not hold.
    Failure,
    /// Experiment tripped a safety boundary and was stopped.
    Unsafe,
    /// Experiment was cut short before a verdict.
    Interrupted,
}

impl Outcome {
    /// Whether this outcome counts toward a component's success rate.
    #[must_use]
    pub const fn counts_as_success(self) -> bool {
        matches!(self, Self::Success | Self::PartialSuccess)
    }

    /// Whether this outcome contributes to failure patterns.
    #[must_use]
    pub const fn counts_as_failure(self) -> bool {
        matches!(self, Self::Failure | Self::Unsafe)
    }
}

/// A concluded experiment, recorded once and never mutated.
///
/// Records are appended to the [`MemoryStore`](crate::memory::MemoryStore)
/// after an experiment finishes; every derived view (risk profiles, safe
/// ranges, relationship weights) is recomputed from the full set of records.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ExperimentRecord {
    id: String,
    timestamp: DateTime<Utc>,
    experiment_type: String,
    target_component: String,
    parameters: BTreeMap<String, ParamValue>,
    outcome: Outcome,
    metrics: BTreeMap<String, f64>,
    learnings: Vec<String>,
    affected_components: Vec<String>,
    duration: String,
    risk_level: RiskLevel,
}

impl ExperimentRecord {
    /// Create a builder for an experiment record.
    ///
    /// # Arguments
    ///
    /// * `id` - Unique identifier for the experiment
    /// * `experiment_type` - Category tag, e.g. `"network_failure"`
    /// * `target_component` - Component the experiment acted upon
    /// * `outcome` - Final outcome
    #[must_use]
    pub fn builder(
        id: impl Into<String>,
        experiment_type: impl Into<String>,
        target_component: impl Into<String>,
        outcome: Outcome,
    ) -> ExperimentRecordBuilder {
        ExperimentRecordBuilder::new(id, experiment_type, target_component, outcome)
    }

    /// Get the experiment ID.
    #[must_use]
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Get the time the experiment ran.
    #[must_use]
    pub const fn timestamp(&self) -> DateTime<Utc> {
        self.timestamp
    }

    /// Get the experiment category tag.
    #[must_use]
    pub fn experiment_type(&self) -> &str {
        &self.experiment_type
    }

    /// Get the component the experiment acted upon.
    #[must_use]
    pub fn target_component(&self) -> &str {
        &self.target_component
    }

    /// Get the experiment parameters.
    #[must_use]
    pub const fn parameters(&self) -> &BTreeMap<String, ParamValue> {
        &self.parameters
    }

    /// Get the final outcome.
    #[must_use]
    pub const fn outcome(&self) -> Outcome {
        self.outcome
    }

    /// Get the observed metrics.
    #[must_use]
    pub const fn metrics(&self) -> &BTreeMap<String, f64> {
        &self.metrics
    }

    /// Get the free-text learnings recorded for the experiment.
    #[must_use]
    pub fn learnings(&self) -> &[String] {
        &self.learnings
    }

    /// Get the components impacted beyond the target.
    #[must_use]
    pub fn affected_components(&self) -> &[String] {
        &self.affected_components
    }

    /// Get the elapsed wall time as a `<int><s|m|h>` string.
    #[must_use]
    pub fn duration(&self) -> &str {
        &self.duration
    }

    /// Get the risk level assigned at experiment time.
    #[must_use]
    pub const fn risk_level(&self) -> RiskLevel {
        self.risk_level
    }
}

/// Builder for `ExperimentRecord`.
#[derive(Debug)]
pub struct ExperimentRecordBuilder {
    record: ExperimentRecord,
}

impl ExperimentRecordBuilder {
    /// Create a new builder with required fields.
    #[must_use]
    pub fn new(
        id: impl Into<String>,
        experiment_type: impl Into<String>,
        target_component: impl Into<String>,
        outcome: Outcome,
    ) -> Self {
        Self {
            record: ExperimentRecord {
                id: id.into(),
                timestamp: Utc::now(),
                experiment_type: experiment_type.into(),
                target_component: target_component.into(),
                parameters: BTreeMap::new(),
                outcome,
                metrics: BTreeMap::new(),
                learnings: Vec::new(),
                affected_components: Vec::new(),
                duration: "30s".to_string(),
                risk_level: RiskLevel::Low,
            },
        }
    }

    /// Set a custom timestamp (useful for replayed history and testing).
    #[must_use]
    pub fn timestamp(mut self, timestamp: DateTime<Utc>) -> Self {
        self.record.timestamp = timestamp;
        self
    }

    /// Add a parameter.
    #[must_use]
    pub fn parameter(mut self, name: impl Into<String>, value: impl Into<ParamValue>) -> Self {
        self.record.parameters.insert(name.into(), value.into());
        self
    }

    /// Add an observed metric.
    #[must_use]
    pub fn metric(mut self, name: impl Into<String>, value: f64) -> Self {
        self.record.metrics.insert(name.into(), value);
        self
    }

    /// Add a free-text learning note.
    #[must_use]
    pub fn learning(mut self, note: impl Into<String>) -> Self {
        self.record.learnings.push(note.into());
        self
    }

    /// Add a component impacted beyond the target.
    #[must_use]
    pub fn affected_component(mut self, name: impl Into<String>) -> Self {
        self.record.affected_components.push(name.into());
        self
    }

    /// Set the elapsed wall time (`<int><s|m|h>`).
    #[must_use]
    pub fn duration(mut self, duration: impl Into<String>) -> Self {
        self.record.duration = duration.into();
        self
    }

    /// Set the risk level assigned at experiment time.
    #[must_use]
    pub const fn risk_level(mut self, risk_level: RiskLevel) -> Self {
        self.record.risk_level = risk_level;
        self
    }

    /// Build the `ExperimentRecord`.
    #[must_use]
    pub fn build(self) -> ExperimentRecord {
        self.record
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_builder() {
        let record = ExperimentRecord::builder(
            "exp-1",
            "network_failure",
            "user-service",
            Outcome::Success,
        )
        .parameter("latency_ms", 1000.0)
        .duration("30s")
        .affected_component("api-gateway")
        .build();

        assert_eq!(record.id(), "exp-1");
        assert_eq!(record.target_component(), "user-service");
        assert_eq!(record.duration(), "30s");
        assert_eq!(record.affected_components(), ["api-gateway"]);
    }

    #[test]
    fn test_outcome_classification() {
        assert!(Outcome::Success.counts_as_success());
        assert!(Outcome::PartialSuccess.counts_as_success());
        assert!(!Outcome::Failure.counts_as_success());
        assert!(Outcome::Unsafe.counts_as_failure());
        assert!(!Outcome::Interrupted.counts_as_failure());
        assert!(!Outcome::Interrupted.counts_as_success());
    }

    #[test]
    fn test_outcome_wire_strings() {
        assert_eq!(
            serde_json::to_string(&Outcome::PartialSuccess).unwrap(),
            "\"partial_success\""
        );
        assert_eq!(
            serde_json::from_str::<Outcome>("\"unsafe\"").unwrap(),
            Outcome::Unsafe
        );
    }
}

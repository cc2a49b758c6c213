//! Experiment Candidate - an in-flight proposal, not yet run
//!
//! Candidates are owned by the caller. The planner and validator read them and
//! may return a modified copy; nothing in the core holds a candidate across
//! calls.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::ParamValue;

/// A proposed chaos experiment.
///
/// `experiment_type`, `target_component`, and `duration` are required; all
/// other knobs live in the open `parameters` map. Deserializing a candidate
/// with a missing required field fails, which is the fail-fast boundary for
/// structurally invalid input.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ExperimentCandidate {
    /// Category tag, e.g. `"network_failure"`. Also used to pick the
    /// category-specific safety-rule group.
    #[serde(rename = "type")]
    pub experiment_type: String,
    /// Optional human-readable name; used as a fallback for category
    /// resolution when the type tag names no rule group.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Component the experiment acts upon.
    pub target_component: String,
    /// Planned duration as a `<int><s|m|h>` string.
    pub duration: String,
    /// Open-ended experiment parameters.
    #[serde(default)]
    pub parameters: BTreeMap<String, ParamValue>,
    /// Components expected to be impacted beyond the target.
    #[serde(default)]
    pub affected_components: Vec<String>,
    /// Safety checks to run alongside the experiment.
    #[serde(default)]
    pub safety_checks: Vec<SafetyCheck>,
    /// Monitoring configuration.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub monitoring: Option<Monitoring>,
    /// Rollback procedure to undo the experiment's effects.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rollback_procedure: Option<RollbackProcedure>,
}

/// A named safety check attached to an experiment.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SafetyCheck {
    /// Check name, e.g. `"rollback"` or `"prevent_network_failure"`.
    pub name: String,
    /// Human-readable description.
    pub description: String,
    /// Parameters carried from a historical failure pattern, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parameters: Option<BTreeMap<String, ParamValue>>,
}

impl SafetyCheck {
    /// Create a parameterless check.
    #[must_use]
    pub fn new(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            parameters: None,
        }
    }
}

/// Monitoring configuration for an experiment.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct Monitoring {
    /// Metric names to watch during the experiment.
    #[serde(default)]
    pub metrics: Vec<String>,
}

/// Steps to undo an experiment's effects.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct RollbackProcedure {
    /// Ordered rollback steps.
    #[serde(default)]
    pub steps: Vec<String>,
}

impl ExperimentCandidate {
    /// Create a builder with the required fields.
    #[must_use]
    pub fn builder(
        experiment_type: impl Into<String>,
        target_component: impl Into<String>,
        duration: impl Into<String>,
    ) -> ExperimentCandidateBuilder {
        ExperimentCandidateBuilder::new(experiment_type, target_component, duration)
    }
}

/// Builder for `ExperimentCandidate`.
#[derive(Debug)]
pub struct ExperimentCandidateBuilder {
    candidate: ExperimentCandidate,
}

impl ExperimentCandidateBuilder {
    /// Create a new builder with required fields.
    #[must_use]
    pub fn new(
        experiment_type: impl Into<String>,
        target_component: impl Into<String>,
        duration: impl Into<String>,
    ) -> Self {
        Self {
            candidate: ExperimentCandidate {
                experiment_type: experiment_type.into(),
                name: None,
                target_component: target_component.into(),
                duration: duration.into(),
                parameters: BTreeMap::new(),
                affected_components: Vec::new(),
                safety_checks: Vec::new(),
                monitoring: None,
                rollback_procedure: None,
            },
        }
    }

    /// Set the human-readable name.
    #[must_use]
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.candidate.name = Some(name.into());
        self
    }

    /// Add a parameter.
    #[must_use]
    pub fn parameter(mut self, name: impl Into<String>, value: impl Into<ParamValue>) -> Self {
        self.candidate.parameters.insert(name.into(), value.into());
        self
    }

    /// Add a component expected to be impacted beyond the target.
    #[must_use]
    pub fn affected_component(mut self, name: impl Into<String>) -> Self {
        self.candidate.affected_components.push(name.into());
        self
    }

    /// Set the rollback procedure.
    #[must_use]
    pub fn rollback_steps<I, S>(mut self, steps: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.candidate.rollback_procedure = Some(RollbackProcedure {
            steps: steps.into_iter().map(Into::into).collect(),
        });
        self
    }

    /// Build the `ExperimentCandidate`.
    #[must_use]
    pub fn build(self) -> ExperimentCandidate {
        self.candidate
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_candidate_builder() {
        let candidate = ExperimentCandidate::builder("network_failure", "user-service", "90s")
            .parameter("latency_ms", 5000.0)
            .parameter("failure_type", "latency")
            .affected_component("api-gateway")
            .rollback_steps(["restore routing", "verify health"])
            .build();

        assert_eq!(candidate.experiment_type, "network_failure");
        assert_eq!(candidate.target_component, "user-service");
        assert_eq!(candidate.parameters.len(), 2);
        assert_eq!(
            candidate.rollback_procedure.as_ref().unwrap().steps.len(),
            2
        );
    }

    #[test]
    fn test_deserialization_requires_target_component() {
        let missing = r#"{"type": "network_failure", "duration": "30s"}"#;
        assert!(serde_json::from_str::<ExperimentCandidate>(missing).is_err());
    }

    #[test]
    fn test_type_field_wire_name() {
        let candidate = ExperimentCandidate::builder("resource", "db", "30s").build();
        let json = serde_json::to_value(&candidate).unwrap();
        assert_eq!(json["type"], "resource");
        assert!(json.get("experiment_type").is_none());
    }
}

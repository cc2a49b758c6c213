//! Component risk profiles derived from experiment history

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::experiment::{ExperimentRecord, ParamValue};

/// Inclusive safe range for one numeric parameter.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct ParameterRange {
    /// Smallest value seen in successful experiments.
    pub min: f64,
    /// Largest value seen in successful experiments.
    pub max: f64,
}

/// A distinct configuration that ended in failure.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FailurePattern {
    /// Experiment category tag.
    #[serde(rename = "type")]
    pub experiment_type: String,
    /// Parameters the failing experiment ran with.
    pub parameters: BTreeMap<String, ParamValue>,
    /// Components it impacted.
    pub affected_components: Vec<String>,
    /// How long it ran.
    pub duration: String,
}

/// Derived risk statistics for one component.
///
/// A profile is a pure function of the subset of history targeting the
/// component. A component with no history gets the neutral default rather
/// than an error.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ComponentRiskProfile {
    /// Fraction of historical records ending in success or partial success.
    pub success_rate: f64,
    /// Mean count of affected components across the component's history.
    pub avg_impact: f64,
    /// `(1 - success_rate) * avg_impact`.
    pub risk_score: f64,
    /// Per-parameter safe ranges, from successful records only.
    pub safe_parameter_ranges: BTreeMap<String, ParameterRange>,
    /// Distinct failing configurations.
    pub failure_patterns: Vec<FailurePattern>,
}

impl Default for ComponentRiskProfile {
    /// Neutral profile for a component with no history.
    fn default() -> Self {
        Self {
            success_rate: 0.5,
            avg_impact: 1.0,
            risk_score: 0.5,
            safe_parameter_ranges: BTreeMap::new(),
            failure_patterns: Vec::new(),
        }
    }
}

impl ComponentRiskProfile {
    /// Compute a profile from the component's slice of history.
    ///
    /// Returns `None` when `history` is empty; callers fall back to the
    /// neutral default.
    #[must_use]
    pub fn from_history(history: &[&ExperimentRecord]) -> Option<Self> {
        if history.is_empty() {
            return None;
        }

        #[allow(clippy::cast_precision_loss)]
        let total = history.len() as f64;
        #[allow(clippy::cast_precision_loss)]
        let successes = history
            .iter()
            .filter(|r| r.outcome().counts_as_success())
            .count() as f64;
        let success_rate = successes / total;

        #[allow(clippy::cast_precision_loss)]
        let avg_impact = history
            .iter()
            .map(|r| r.affected_components().len() as f64)
            .sum::<f64>()
            / total;

        Some(Self {
            success_rate,
            avg_impact,
            risk_score: (1.0 - success_rate) * avg_impact,
            safe_parameter_ranges: safe_ranges(history),
            failure_patterns: failure_patterns(history),
        })
    }
}

/// Safe parameter ranges from successful and partially successful records.
///
/// Only numeric parameter values widen a range; a parameter seen exclusively
/// with text values gets no range entry.
fn safe_ranges(history: &[&ExperimentRecord]) -> BTreeMap<String, ParameterRange> {
    let mut ranges: BTreeMap<String, ParameterRange> = BTreeMap::new();

    for record in history {
        if !record.outcome().counts_as_success() {
            continue;
        }
        for (param, value) in record.parameters() {
            let Some(value) = value.as_number() else {
                continue;
            };
            ranges
                .entry(param.clone())
                .and_modify(|r| {
                    r.min = r.min.min(value);
                    r.max = r.max.max(value);
                })
                .or_insert(ParameterRange {
                    min: value,
                    max: value,
                });
        }
    }

    ranges
}

/// Distinct (type, parameters, affected components, duration) tuples from
/// failed and unsafe records, in history order.
fn failure_patterns(history: &[&ExperimentRecord]) -> Vec<FailurePattern> {
    let mut patterns: Vec<FailurePattern> = Vec::new();

    for record in history {
        if !record.outcome().counts_as_failure() {
            continue;
        }
        let pattern = FailurePattern {
            experiment_type: record.experiment_type().to_string(),
            parameters: record.parameters().clone(),
            affected_components: record.affected_components().to_vec(),
            duration: record.duration().to_string(),
        };
        if !patterns.contains(&pattern) {
            patterns.push(pattern);
        }
    }

    patterns
}

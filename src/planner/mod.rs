//! Experiment Planner - history-informed enhancement and risk scoring
//!
//! The planner rewrites a candidate experiment toward parameters that history
//! shows to be survivable, and scores the candidate's risk from the memory
//! store's derived views. It never mutates the caller's candidate; every
//! operation returns a modified copy.
//!
//! ## Usage
//!
//! ```rust
//! use chaos_intel::analysis::SystemAnalysis;
//! use chaos_intel::experiment::ExperimentCandidate;
//! use chaos_intel::memory::MemoryStore;
//! use chaos_intel::planner::ExperimentPlanner;
//!
//! let store = MemoryStore::new();
//! let planner = ExperimentPlanner::new(&store);
//!
//! let candidate = ExperimentCandidate::builder("network_failure", "user-service", "90s").build();
//! let enhanced = planner.enhance_experiment(&candidate, &SystemAnalysis::default())?;
//!
//! // Basic safety checks and monitoring are always attached.
//! assert_eq!(enhanced.safety_checks.len(), 3);
//! assert!(enhanced.monitoring.is_some());
//! # Ok::<(), chaos_intel::Error>(())
//! ```

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::analysis::SystemAnalysis;
use crate::experiment::{
    format_seconds, parse_duration, ExperimentCandidate, ExperimentRecord, Monitoring, SafetyCheck,
};
use crate::memory::{ComponentRiskProfile, MemoryStore, DEFAULT_SIMILARITY_THRESHOLD};
use crate::{Error, Result};

/// Weights for [base, impact, parameter, duration] risk.
const RISK_WEIGHTS: [f64; 4] = [0.3, 0.3, 0.2, 0.2];

/// Duration risk saturates at five minutes.
const DURATION_RISK_CAP_SECS: f64 = 300.0;

/// Metrics attached to every enhanced experiment.
const BASE_METRICS: [&str; 4] = ["cpu_usage", "memory_usage", "error_rate", "latency"];

/// Composite risk assessment for a candidate experiment.
///
/// Every field lies in `[0, 1]`; `total_risk` is the weighted sum with
/// weights [0.3, 0.3, 0.2, 0.2].
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct RiskAssessment {
    /// Weighted sum of the four sub-scores.
    pub total_risk: f64,
    /// The target component's historical risk score.
    pub base_risk: f64,
    /// Risk from impact on critical and related components.
    pub impact_risk: f64,
    /// Risk from parameter values relative to historically safe ranges.
    pub parameter_risk: f64,
    /// Risk from planned duration.
    pub duration_risk: f64,
}

/// Plans and adapts experiments from historical data and system knowledge.
pub struct ExperimentPlanner<'a> {
    memory: &'a MemoryStore,
}

impl<'a> ExperimentPlanner<'a> {
    /// Create a planner reading from the given memory store.
    #[must_use]
    pub const fn new(memory: &'a MemoryStore) -> Self {
        Self { memory }
    }

    /// Return a copy of the candidate adjusted toward safety and historical
    /// plausibility.
    ///
    /// Stages run in order, each seeing the previous stage's output:
    /// parameter clamping, safety-check injection, duration optimization,
    /// monitoring configuration.
    ///
    /// # Errors
    ///
    /// Returns [`Error::MissingField`] when the candidate has no target
    /// component, and [`Error::InvalidDuration`] when a duration string
    /// (candidate's or a similar record's) cannot be parsed.
    pub fn enhance_experiment(
        &self,
        experiment: &ExperimentCandidate,
        analysis: &SystemAnalysis,
    ) -> Result<ExperimentCandidate> {
        if experiment.target_component.is_empty() {
            return Err(Error::MissingField("target_component"));
        }

        let similar = self
            .memory
            .similar_experiments(experiment, DEFAULT_SIMILARITY_THRESHOLD);
        let profile = self
            .memory
            .component_risk_profile(&experiment.target_component);

        debug!(
            component = %experiment.target_component,
            similar = similar.len(),
            "enhancing experiment"
        );

        let mut enhanced = experiment.clone();
        adjust_parameters(&mut enhanced, &similar, &profile);
        add_safety_measures(&mut enhanced, &profile);
        optimize_duration(&mut enhanced, &similar)?;
        add_monitoring(&mut enhanced, analysis);

        Ok(enhanced)
    }

    /// Composite risk assessment for the candidate.
    ///
    /// # Errors
    ///
    /// Returns [`Error::MissingField`] when the candidate has no target
    /// component, and [`Error::InvalidDuration`] for an unparseable duration.
    pub fn calculate_experiment_risk(
        &self,
        experiment: &ExperimentCandidate,
        analysis: &SystemAnalysis,
    ) -> Result<RiskAssessment> {
        if experiment.target_component.is_empty() {
            return Err(Error::MissingField("target_component"));
        }

        let profile = self
            .memory
            .component_risk_profile(&experiment.target_component);
        let relationships = self
            .memory
            .component_relationships(&experiment.target_component);

        let base_risk = profile.risk_score.clamp(0.0, 1.0);
        let impact_risk = impact_risk(&experiment.affected_components, &relationships, analysis);
        let parameter_risk = parameter_risk(experiment, &profile);

        #[allow(clippy::cast_precision_loss)]
        let duration_secs = parse_duration(&experiment.duration)? as f64;
        let duration_risk = (duration_secs / DURATION_RISK_CAP_SECS).min(1.0);

        let total_risk = RISK_WEIGHTS[0] * base_risk
            + RISK_WEIGHTS[1] * impact_risk
            + RISK_WEIGHTS[2] * parameter_risk
            + RISK_WEIGHTS[3] * duration_risk;

        Ok(RiskAssessment {
            total_risk,
            base_risk,
            impact_risk,
            parameter_risk,
            duration_risk,
        })
    }
}

/// Clamp numeric parameters into the historically safe ranges.
///
/// Skipped entirely when no similar experiments exist; the ranges would be
/// derived from unrelated history.
fn adjust_parameters(
    experiment: &mut ExperimentCandidate,
    similar: &[&ExperimentRecord],
    profile: &ComponentRiskProfile,
) {
    if similar.is_empty() {
        return;
    }

    for (param, value) in &mut experiment.parameters {
        let Some(range) = profile.safe_parameter_ranges.get(param) else {
            continue;
        };
        if let Some(number) = value.as_number() {
            let clamped = number.clamp(range.min, range.max);
            if (clamped - number).abs() > f64::EPSILON {
                *value = clamped.into();
            }
        }
    }
}

/// Attach the three basic checks plus one `prevent_<type>` check per known
/// failure pattern (exact duplicates skipped).
fn add_safety_measures(experiment: &mut ExperimentCandidate, profile: &ComponentRiskProfile) {
    experiment.safety_checks.extend([
        SafetyCheck::new("monitoring", "Ensure monitoring is enabled"),
        SafetyCheck::new("rollback", "Verify rollback procedure"),
        SafetyCheck::new("timeout", "Set appropriate timeouts"),
    ]);

    for pattern in &profile.failure_patterns {
        let check = SafetyCheck {
            name: format!("prevent_{}", pattern.experiment_type),
            description: format!("Prevent {} failure pattern", pattern.experiment_type),
            parameters: Some(pattern.parameters.clone()),
        };
        if !experiment.safety_checks.contains(&check) {
            experiment.safety_checks.push(check);
        }
    }
}

/// Cap the duration at the median of similar successful experiments.
/// Never increases the duration.
fn optimize_duration(
    experiment: &mut ExperimentCandidate,
    similar: &[&ExperimentRecord],
) -> Result<()> {
    if similar.is_empty() {
        return Ok(());
    }

    let mut successful_durations = Vec::new();
    for record in similar {
        if record.outcome().counts_as_success() {
            successful_durations.push(parse_duration(record.duration())?);
        }
    }

    if successful_durations.is_empty() {
        return Ok(());
    }

    let optimal = median(&mut successful_durations);
    let current = parse_duration(&experiment.duration)?;
    if current > optimal {
        experiment.duration = format_seconds(optimal);
    }

    Ok(())
}

/// Median with the even case averaged (truncating).
fn median(values: &mut [u64]) -> u64 {
    values.sort_unstable();
    let mid = values.len() / 2;
    if values.len() % 2 == 1 {
        values[mid]
    } else {
        (values[mid - 1] + values[mid]) / 2
    }
}

/// Overwrite monitoring with the base metrics plus component-type extras.
fn add_monitoring(experiment: &mut ExperimentCandidate, analysis: &SystemAnalysis) {
    let monitoring = experiment.monitoring.get_or_insert_with(Monitoring::default);
    monitoring.metrics = BASE_METRICS.iter().map(ToString::to_string).collect();

    let Some(component) = analysis.find_component(&experiment.target_component) else {
        return;
    };

    let extras: &[&str] = match component.component_type.as_str() {
        "database" => &["connection_count", "query_latency", "transaction_rate"],
        "cache" => &["hit_rate", "eviction_rate", "memory_fragmentation"],
        _ => &[],
    };
    monitoring
        .metrics
        .extend(extras.iter().map(ToString::to_string));
}

/// Risk from impact on other components: weighted blend of the critical
/// fraction (0.7) and mean relationship strength (0.3), clamped to `[0, 1]`.
/// Zero when nothing beyond the target is affected.
fn impact_risk(
    affected: &[String],
    relationships: &std::collections::BTreeMap<String, f64>,
    analysis: &SystemAnalysis,
) -> f64 {
    if affected.is_empty() {
        return 0.0;
    }

    let critical = analysis.critical_components();
    #[allow(clippy::cast_precision_loss)]
    let total = affected.len() as f64;
    #[allow(clippy::cast_precision_loss)]
    let critical_count = affected
        .iter()
        .filter(|c| critical.contains(c.as_str()))
        .count() as f64;

    let rel_strength = affected
        .iter()
        .map(|c| relationships.get(c).copied().unwrap_or(0.0))
        .sum::<f64>()
        / total;

    (0.7 * (critical_count / total) + 0.3 * rel_strength).clamp(0.0, 1.0)
}

/// Mean normalized distance outside the safe range, over parameters with a
/// known range. Neutral 0.5 when no ranges are known or none apply.
fn parameter_risk(experiment: &ExperimentCandidate, profile: &ComponentRiskProfile) -> f64 {
    if profile.safe_parameter_ranges.is_empty() {
        return 0.5;
    }

    let mut risks = Vec::new();
    for (param, value) in &experiment.parameters {
        let Some(range) = profile.safe_parameter_ranges.get(param) else {
            continue;
        };
        let Some(value) = value.as_number() else {
            continue;
        };

        let risk = if value < range.min {
            normalized_distance(range.min - value, range.min)
        } else if value > range.max {
            normalized_distance(value - range.max, range.max)
        } else {
            0.0
        };
        risks.push(risk);
    }

    if risks.is_empty() {
        return 0.5;
    }
    #[allow(clippy::cast_precision_loss)]
    let count = risks.len() as f64;
    risks.iter().sum::<f64>() / count
}

/// Distance over bound, bounded to `[0, 1]`; a zero bound saturates.
fn normalized_distance(distance: f64, bound: f64) -> f64 {
    if bound.abs() < f64::EPSILON {
        return 1.0;
    }
    (distance / bound.abs()).clamp(0.0, 1.0)
}

//! Feature extraction for outcome prediction
//!
//! Six features in fixed order, used identically at training and inference
//! time: latency parameter, duration in seconds, the target component's
//! historical risk score, two failure-type indicator bits, and the count of
//! known component relationships.

use crate::experiment::{parse_duration, ExperimentCandidate, ExperimentRecord};
use crate::memory::MemoryStore;
use crate::Result;

/// Feature names, in vector order.
pub(crate) const FEATURE_NAMES: [&str; 6] = [
    "latency_ms",
    "duration_s",
    "component_risk",
    "failure_latency",
    "failure_error",
    "relationship_count",
];

/// Feature vector for an in-flight candidate.
///
/// # Errors
///
/// Fails only when the candidate's duration string cannot be parsed.
pub(crate) fn candidate_features(
    candidate: &ExperimentCandidate,
    memory: &MemoryStore,
) -> Result<Vec<f64>> {
    let duration_s = parse_duration(&candidate.duration)?;
    Ok(build_features(
        candidate.parameters.get("latency_ms").and_then(|v| v.as_number()),
        duration_s,
        candidate
            .parameters
            .get("failure_type")
            .and_then(|v| v.as_text()),
        &candidate.target_component,
        memory,
    ))
}

/// Feature vector for a historical record; `None` skips the record from the
/// training set (e.g. an unparseable duration).
pub(crate) fn record_features(record: &ExperimentRecord, memory: &MemoryStore) -> Option<Vec<f64>> {
    let duration_s = parse_duration(record.duration()).ok()?;
    Some(build_features(
        record.parameters().get("latency_ms").and_then(|v| v.as_number()),
        duration_s,
        record
            .parameters()
            .get("failure_type")
            .and_then(|v| v.as_text()),
        record.target_component(),
        memory,
    ))
}

fn build_features(
    latency_ms: Option<f64>,
    duration_s: u64,
    failure_type: Option<&str>,
    target_component: &str,
    memory: &MemoryStore,
) -> Vec<f64> {
    let risk = memory.component_risk_profile(target_component).risk_score;
    let relationships = memory.component_relationships(target_component);

    #[allow(clippy::cast_precision_loss)]
    vec![
        latency_ms.unwrap_or(0.0),
        duration_s as f64,
        risk,
        f64::from(failure_type == Some("latency")),
        f64::from(failure_type == Some("error")),
        relationships.len() as f64,
    ]
}

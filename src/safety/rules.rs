//! Safety rule check functions
//!
//! Each check inspects a candidate experiment and the system analysis and
//! reports pass/fail with details. Checks never panic; anything that would be
//! an execution error is returned as `Err` and converted into a violation by
//! the validator.

use crate::analysis::SystemAnalysis;
use crate::experiment::{parse_duration, ExperimentCandidate};
use crate::Result;

/// Outcome of a single rule check.
#[derive(Debug, Clone)]
pub(crate) struct RuleCheck {
    pub(crate) passed: bool,
    pub(crate) details: String,
    pub(crate) recommendation: Option<String>,
}

impl RuleCheck {
    fn pass() -> Self {
        Self {
            passed: true,
            details: String::new(),
            recommendation: None,
        }
    }

    fn fail(details: impl Into<String>) -> Self {
        Self {
            passed: false,
            details: details.into(),
            recommendation: None,
        }
    }

    fn fail_with(details: impl Into<String>, recommendation: impl Into<String>) -> Self {
        Self {
            passed: false,
            details: details.into(),
            recommendation: Some(recommendation.into()),
        }
    }
}

/// Signature shared by all rule checks.
pub(crate) type CheckFn = fn(&ExperimentCandidate, &SystemAnalysis) -> Result<RuleCheck>;

/// Rollback: the candidate must carry a rollback procedure with steps.
pub(crate) fn check_rollback(
    experiment: &ExperimentCandidate,
    _analysis: &SystemAnalysis,
) -> Result<RuleCheck> {
    match &experiment.rollback_procedure {
        None => Ok(RuleCheck::fail_with(
            "No rollback procedure defined",
            "Define a step-by-step rollback procedure",
        )),
        Some(rollback) if rollback.steps.is_empty() => Ok(RuleCheck::fail_with(
            "Rollback procedure must contain steps",
            "Define specific rollback steps",
        )),
        Some(_) => Ok(RuleCheck::pass()),
    }
}

/// Monitoring: the target component must appear in the analysis with a
/// `monitoring` property, in any analyzed document.
pub(crate) fn check_monitoring(
    experiment: &ExperimentCandidate,
    analysis: &SystemAnalysis,
) -> Result<RuleCheck> {
    let target = experiment.target_component.as_str();
    if target.is_empty() {
        return Ok(RuleCheck::fail("No target component specified"));
    }

    let monitored = analysis
        .components()
        .any(|c| c.name == target && c.properties.contains_key("monitoring"));

    if monitored {
        Ok(RuleCheck::pass())
    } else {
        Ok(RuleCheck::fail_with(
            format!("No monitoring found for component {target}"),
            "Set up monitoring before running the experiment",
        ))
    }
}

/// Timeout: duration must be present, well-formed, and at most one hour.
pub(crate) fn check_timeout(
    experiment: &ExperimentCandidate,
    _analysis: &SystemAnalysis,
) -> Result<RuleCheck> {
    let duration = experiment.duration.as_str();
    if duration.is_empty() {
        return Ok(RuleCheck::fail_with(
            "No duration specified",
            "Specify a maximum duration for the experiment",
        ));
    }

    let Ok(seconds) = parse_duration(duration) else {
        return Ok(RuleCheck::fail_with(
            "Invalid duration format",
            "Use format: <number><unit> (e.g., 5m, 1h)",
        ));
    };

    if seconds > 3600 {
        return Ok(RuleCheck::fail_with(
            "Duration too long",
            "Limit experiment duration to 1 hour",
        ));
    }

    Ok(RuleCheck::pass())
}

/// Shared shape of the component-property rules: fail when any component
/// matching the target lacks every key in `keys`. An unknown target passes,
/// because the analysis offers no signal either way.
fn check_component_property(
    experiment: &ExperimentCandidate,
    analysis: &SystemAnalysis,
    keys: &[&str],
    missing: &str,
    recommendation: &str,
) -> Result<RuleCheck> {
    let target = experiment.target_component.as_str();
    if target.is_empty() {
        return Ok(RuleCheck::fail("No target component specified"));
    }

    let lacking = analysis
        .components()
        .any(|c| c.name == target && !c.has_any_property(keys));

    if lacking {
        Ok(RuleCheck::fail_with(
            format!("No {missing} found for {target}"),
            recommendation,
        ))
    } else {
        Ok(RuleCheck::pass())
    }
}

/// Network: fallback/failover/backup mechanisms.
pub(crate) fn check_fallback(
    experiment: &ExperimentCandidate,
    analysis: &SystemAnalysis,
) -> Result<RuleCheck> {
    check_component_property(
        experiment,
        analysis,
        &["fallback", "failover", "backup"],
        "fallback mechanism",
        "Implement fallback mechanism",
    )
}

/// Network: retry mechanisms.
pub(crate) fn check_retry(
    experiment: &ExperimentCandidate,
    analysis: &SystemAnalysis,
) -> Result<RuleCheck> {
    check_component_property(
        experiment,
        analysis,
        &["retry"],
        "retry mechanism",
        "Implement retry mechanism",
    )
}

/// Resource: cpu/memory limits.
pub(crate) fn check_resource_limits(
    experiment: &ExperimentCandidate,
    analysis: &SystemAnalysis,
) -> Result<RuleCheck> {
    check_component_property(
        experiment,
        analysis,
        &["resource_limits", "cpu_limit", "memory_limit"],
        "resource limits",
        "Set resource limits",
    )
}

/// Resource: autoscaling configuration.
pub(crate) fn check_autoscaling(
    experiment: &ExperimentCandidate,
    analysis: &SystemAnalysis,
) -> Result<RuleCheck> {
    check_component_property(
        experiment,
        analysis,
        &["autoscaling"],
        "autoscaling",
        "Configure autoscaling",
    )
}

/// Dependency: circuit breaker.
pub(crate) fn check_circuit_breaker(
    experiment: &ExperimentCandidate,
    analysis: &SystemAnalysis,
) -> Result<RuleCheck> {
    check_component_property(
        experiment,
        analysis,
        &["circuit_breaker"],
        "circuit breaker",
        "Implement circuit breaker",
    )
}

/// Dependency: caching.
pub(crate) fn check_cache(
    experiment: &ExperimentCandidate,
    analysis: &SystemAnalysis,
) -> Result<RuleCheck> {
    check_component_property(
        experiment,
        analysis,
        &["cache", "caching", "redis"],
        "caching mechanism",
        "Implement caching",
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::{ComponentInfo, DocumentAnalysis};

    fn analysis_with(component: ComponentInfo) -> SystemAnalysis {
        let mut analysis = SystemAnalysis::new();
        analysis.insert_document(
            "doc-1",
            DocumentAnalysis {
                components: vec![component],
                relationships: vec![],
                critical_components: vec![],
            },
        );
        analysis
    }

    fn candidate() -> ExperimentCandidate {
        ExperimentCandidate::builder("network_failure", "user-service", "30s").build()
    }

    #[test]
    fn test_rollback_missing() {
        let check = check_rollback(&candidate(), &SystemAnalysis::default()).unwrap();
        assert!(!check.passed);
        assert_eq!(check.details, "No rollback procedure defined");
    }

    #[test]
    fn test_rollback_empty_steps() {
        let mut c = candidate();
        c.rollback_procedure = Some(crate::experiment::RollbackProcedure::default());
        let check = check_rollback(&c, &SystemAnalysis::default()).unwrap();
        assert!(!check.passed);
        assert_eq!(check.details, "Rollback procedure must contain steps");
    }

    #[test]
    fn test_monitoring_found() {
        let analysis = analysis_with(
            ComponentInfo::new("user-service", "service")
                .with_property("monitoring", serde_json::json!("prometheus")),
        );
        assert!(check_monitoring(&candidate(), &analysis).unwrap().passed);
    }

    #[test]
    fn test_monitoring_absent() {
        let analysis = analysis_with(ComponentInfo::new("user-service", "service"));
        let check = check_monitoring(&candidate(), &analysis).unwrap();
        assert!(!check.passed);
        assert!(check.details.contains("user-service"));
    }

    #[test]
    fn test_timeout_cap() {
        let mut c = candidate();
        c.duration = "2h".to_string();
        let check = check_timeout(&c, &SystemAnalysis::default()).unwrap();
        assert!(!check.passed);
        assert_eq!(check.details, "Duration too long");

        c.duration = "1h".to_string();
        assert!(check_timeout(&c, &SystemAnalysis::default()).unwrap().passed);
    }

    #[test]
    fn test_timeout_bad_format() {
        let mut c = candidate();
        c.duration = "ninety seconds".to_string();
        let check = check_timeout(&c, &SystemAnalysis::default()).unwrap();
        assert!(!check.passed);
        assert_eq!(check.details, "Invalid duration format");
    }

    #[test]
    fn test_property_rule_unknown_target_passes() {
        let analysis = analysis_with(ComponentInfo::new("other", "service"));
        assert!(check_circuit_breaker(&candidate(), &analysis).unwrap().passed);
    }

    #[test]
    fn test_property_rule_missing_key_fails() {
        let analysis = analysis_with(ComponentInfo::new("user-service", "service"));
        let check = check_fallback(&candidate(), &analysis).unwrap();
        assert!(!check.passed);
        assert_eq!(
            check.recommendation.as_deref(),
            Some("Implement fallback mechanism")
        );
    }
}

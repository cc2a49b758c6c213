//! Safety Validator - stateless rule evaluation for candidate experiments
//!
//! The validator holds an immutable rule catalog built once at construction:
//! a `general` group applied to every experiment, plus category-specific
//! groups (`network`, `resource`, `dependency`) selected by the experiment's
//! type tag. It never consults experiment history; that is the planner's job.
//!
//! ## Usage
//!
//! ```rust
//! use chaos_intel::analysis::SystemAnalysis;
//! use chaos_intel::experiment::ExperimentCandidate;
//! use chaos_intel::safety::{RiskLevel, SafetyValidator};
//!
//! let validator = SafetyValidator::new();
//! let candidate = ExperimentCandidate::builder("network", "user-service", "30s").build();
//!
//! let result = validator.validate_experiment(&candidate, &SystemAnalysis::default());
//! assert!(!result.is_safe); // no rollback procedure
//! assert_eq!(result.risk_level, RiskLevel::Critical);
//! ```

mod rules;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::analysis::SystemAnalysis;
use crate::experiment::ExperimentCandidate;
use rules::CheckFn;

/// Risk level for an experiment or a safety rule.
///
/// Ordering follows severity: `Low < Medium < High < Critical`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RiskLevel {
    /// Routine experiment, no failed high-severity rules.
    Low,
    /// Several low-severity findings.
    Medium,
    /// At least one violation.
    High,
    /// Missing rollback procedure.
    Critical,
}

impl RiskLevel {
    /// Wire string for the level (`"low"`, `"medium"`, `"high"`, `"critical"`).
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
            Self::Critical => "critical",
        }
    }
}

/// A failed rule surfaced to the caller.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct RuleFinding {
    /// Rule name, e.g. `has_rollback`.
    pub rule: String,
    /// What the rule requires.
    pub description: String,
    /// Why it failed for this experiment.
    pub details: String,
}

/// A remediation hint attached to a failed rule.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Recommendation {
    /// Rule name the hint belongs to.
    pub rule: String,
    /// Suggested remediation.
    pub recommendation: String,
}

/// Verdict of [`SafetyValidator::validate_experiment`].
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ValidationResult {
    /// True when no violations were found.
    pub is_safe: bool,
    /// Overall risk level.
    pub risk_level: RiskLevel,
    /// Failed high/critical-severity rules.
    pub violations: Vec<RuleFinding>,
    /// Failed lower-severity rules.
    pub warnings: Vec<RuleFinding>,
    /// Remediation hints from failed rules of any severity.
    pub recommendations: Vec<Recommendation>,
}

struct SafetyRule {
    name: &'static str,
    description: &'static str,
    severity: RiskLevel,
    check: CheckFn,
}

struct RuleGroup {
    category: &'static str,
    rules: Vec<SafetyRule>,
}

/// Rule-based evaluator producing pass/fail safety verdicts for candidate
/// experiments, independent of experiment history.
pub struct SafetyValidator {
    groups: Vec<RuleGroup>,
}

impl Default for SafetyValidator {
    fn default() -> Self {
        Self::new()
    }
}

impl SafetyValidator {
    /// Build the validator with its fixed rule catalog.
    #[must_use]
    pub fn new() -> Self {
        Self {
            groups: vec![
                RuleGroup {
                    category: "general",
                    rules: vec![
                        SafetyRule {
                            name: "has_rollback",
                            description: "Experiment must have a rollback procedure",
                            severity: RiskLevel::Critical,
                            check: rules::check_rollback,
                        },
                        SafetyRule {
                            name: "has_monitoring",
                            description: "System must have monitoring in place",
                            severity: RiskLevel::High,
                            check: rules::check_monitoring,
                        },
                        SafetyRule {
                            name: "has_timeout",
                            description: "Experiment must have a timeout",
                            severity: RiskLevel::High,
                            check: rules::check_timeout,
                        },
                    ],
                },
                RuleGroup {
                    category: "network",
                    rules: vec![
                        SafetyRule {
                            name: "has_fallback",
                            description: "Service must have fallback mechanisms",
                            severity: RiskLevel::High,
                            check: rules::check_fallback,
                        },
                        SafetyRule {
                            name: "has_retry",
                            description: "Service must have retry mechanisms",
                            severity: RiskLevel::Medium,
                            check: rules::check_retry,
                        },
                    ],
                },
                RuleGroup {
                    category: "resource",
                    rules: vec![
                        SafetyRule {
                            name: "has_limits",
                            description: "Component must have resource limits",
                            severity: RiskLevel::High,
                            check: rules::check_resource_limits,
                        },
                        SafetyRule {
                            name: "has_autoscaling",
                            description: "Service should have autoscaling",
                            severity: RiskLevel::Medium,
                            check: rules::check_autoscaling,
                        },
                    ],
                },
                RuleGroup {
                    category: "dependency",
                    rules: vec![
                        SafetyRule {
                            name: "has_circuit_breaker",
                            description: "Service must have circuit breaker",
                            severity: RiskLevel::High,
                            check: rules::check_circuit_breaker,
                        },
                        SafetyRule {
                            name: "has_cache",
                            description: "Service should have caching",
                            severity: RiskLevel::Medium,
                            check: rules::check_cache,
                        },
                    ],
                },
            ],
        }
    }

    /// Validate a proposed experiment against the rule catalog.
    ///
    /// The `general` group always applies; a category-specific group applies
    /// when the experiment's category resolves to one. Rule-check errors are
    /// converted into violations, so this never fails.
    #[must_use]
    pub fn validate_experiment(
        &self,
        experiment: &ExperimentCandidate,
        analysis: &SystemAnalysis,
    ) -> ValidationResult {
        let mut violations = Vec::new();
        let mut warnings = Vec::new();
        let mut recommendations = Vec::new();

        self.apply_group(
            "general",
            experiment,
            analysis,
            &mut violations,
            &mut warnings,
            &mut recommendations,
        );

        if let Some(category) = experiment_category(experiment) {
            self.apply_group(
                category,
                experiment,
                analysis,
                &mut violations,
                &mut warnings,
                &mut recommendations,
            );
        }

        let risk_level = overall_risk_level(&violations, &warnings);
        debug!(
            component = %experiment.target_component,
            violations = violations.len(),
            warnings = warnings.len(),
            risk = risk_level.as_str(),
            "validated experiment"
        );

        ValidationResult {
            is_safe: violations.is_empty(),
            risk_level,
            violations,
            warnings,
            recommendations,
        }
    }

    fn apply_group(
        &self,
        category: &str,
        experiment: &ExperimentCandidate,
        analysis: &SystemAnalysis,
        violations: &mut Vec<RuleFinding>,
        warnings: &mut Vec<RuleFinding>,
        recommendations: &mut Vec<Recommendation>,
    ) {
        let Some(group) = self.groups.iter().find(|g| g.category == category) else {
            // A type tag that names no group silently skips the
            // category-specific rules.
            return;
        };

        for rule in &group.rules {
            match (rule.check)(experiment, analysis) {
                Ok(check) => {
                    if check.passed {
                        continue;
                    }
                    let finding = RuleFinding {
                        rule: rule.name.to_string(),
                        description: rule.description.to_string(),
                        details: check.details,
                    };
                    if rule.severity >= RiskLevel::High {
                        violations.push(finding);
                    } else {
                        warnings.push(finding);
                    }
                    if let Some(recommendation) = check.recommendation {
                        recommendations.push(Recommendation {
                            rule: rule.name.to_string(),
                            recommendation,
                        });
                    }
                }
                Err(e) => violations.push(RuleFinding {
                    rule: rule.name.to_string(),
                    description: "Error validating rule".to_string(),
                    details: e.to_string(),
                }),
            }
        }
    }
}

/// Resolve which category-specific rule group applies.
///
/// The explicit type tag wins and is looked up verbatim; when it is empty,
/// the experiment name is matched for known category substrings.
fn experiment_category(experiment: &ExperimentCandidate) -> Option<&str> {
    if !experiment.experiment_type.is_empty() {
        return Some(&experiment.experiment_type);
    }

    let name = experiment.name.as_deref()?.to_ascii_lowercase();
    if name.contains("network_failure") {
        Some("network")
    } else if name.contains("resource") {
        Some("resource")
    } else if name.contains("dependency") {
        Some("dependency")
    } else {
        None
    }
}

/// Overall risk: critical when rollback is missing, high on any violation,
/// medium past two warnings, low otherwise.
fn overall_risk_level(violations: &[RuleFinding], warnings: &[RuleFinding]) -> RiskLevel {
    if violations.iter().any(|v| v.rule == "has_rollback") {
        return RiskLevel::Critical;
    }
    if !violations.is_empty() {
        return RiskLevel::High;
    }
    if warnings.len() > 2 {
        return RiskLevel::Medium;
    }
    RiskLevel::Low
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::{ComponentInfo, DocumentAnalysis};

    fn monitored_analysis() -> SystemAnalysis {
        let mut analysis = SystemAnalysis::new();
        analysis.insert_document(
            "doc-1",
            DocumentAnalysis {
                components: vec![ComponentInfo::new("user-service", "service")
                    .with_property("monitoring", serde_json::json!(true))
                    .with_property("fallback", serde_json::json!(true))
                    .with_property("retry", serde_json::json!(true))],
                relationships: vec![],
                critical_components: vec![],
            },
        );
        analysis
    }

    fn safe_candidate() -> ExperimentCandidate {
        ExperimentCandidate::builder("network", "user-service", "30s")
            .rollback_steps(["restore routing"])
            .build()
    }

    #[test]
    fn test_missing_rollback_is_critical() {
        let validator = SafetyValidator::new();
        let candidate = ExperimentCandidate::builder("network", "user-service", "30s").build();
        let result = validator.validate_experiment(&candidate, &monitored_analysis());

        assert!(!result.is_safe);
        assert_eq!(result.risk_level, RiskLevel::Critical);
        assert!(result.violations.iter().any(|v| v.rule == "has_rollback"));
    }

    #[test]
    fn test_safe_experiment() {
        let validator = SafetyValidator::new();
        let result = validator.validate_experiment(&safe_candidate(), &monitored_analysis());

        assert!(result.is_safe, "violations: {:?}", result.violations);
        assert_eq!(result.risk_level, RiskLevel::Low);
    }

    #[test]
    fn test_duration_too_long() {
        let validator = SafetyValidator::new();
        let mut candidate = safe_candidate();
        candidate.duration = "2h".to_string();
        let result = validator.validate_experiment(&candidate, &monitored_analysis());

        assert!(!result.is_safe);
        assert_eq!(result.risk_level, RiskLevel::High);
        let timeout = result
            .violations
            .iter()
            .find(|v| v.rule == "has_timeout")
            .unwrap();
        assert_eq!(timeout.details, "Duration too long");
    }

    #[test]
    fn test_unknown_type_skips_group_rules() {
        let validator = SafetyValidator::new();
        // "network_failure" names no rule group; only general rules apply.
        let mut candidate = safe_candidate();
        candidate.experiment_type = "network_failure".to_string();
        // No fallback/retry properties; the network group would flag both.
        let mut analysis = SystemAnalysis::new();
        analysis.insert_document(
            "doc-1",
            DocumentAnalysis {
                components: vec![ComponentInfo::new("user-service", "service")
                    .with_property("monitoring", serde_json::json!(true))],
                relationships: vec![],
                critical_components: vec![],
            },
        );
        let result = validator.validate_experiment(&candidate, &analysis);
        assert!(result.is_safe);
    }

    #[test]
    fn test_name_fallback_resolves_category() {
        let validator = SafetyValidator::new();
        let mut candidate = safe_candidate();
        candidate.experiment_type = String::new();
        candidate.name = Some("Network_Failure latency spike".to_string());

        let mut analysis = SystemAnalysis::new();
        analysis.insert_document(
            "doc-1",
            DocumentAnalysis {
                components: vec![ComponentInfo::new("user-service", "service")
                    .with_property("monitoring", serde_json::json!(true))],
                relationships: vec![],
                critical_components: vec![],
            },
        );

        let result = validator.validate_experiment(&candidate, &analysis);
        // Network group applied: fallback violation, retry warning.
        assert!(result.violations.iter().any(|v| v.rule == "has_fallback"));
        assert!(result.warnings.iter().any(|w| w.rule == "has_retry"));
    }

    #[test]
    fn test_validation_is_deterministic() {
        let validator = SafetyValidator::new();
        let candidate = ExperimentCandidate::builder("dependency", "user-service", "30s").build();
        let analysis = monitored_analysis();

        let first = validator.validate_experiment(&candidate, &analysis);
        let second = validator.validate_experiment(&candidate, &analysis);
        assert_eq!(first, second);
    }

    #[test]
    fn test_recommendations_collected_for_all_severities() {
        let validator = SafetyValidator::new();
        let mut analysis = SystemAnalysis::new();
        analysis.insert_document(
            "doc-1",
            DocumentAnalysis {
                components: vec![ComponentInfo::new("user-service", "service")
                    .with_property("monitoring", serde_json::json!(true))],
                relationships: vec![],
                critical_components: vec![],
            },
        );
        let result = validator.validate_experiment(&safe_candidate(), &analysis);

        // has_fallback (violation) and has_retry (warning) both recommend.
        assert!(result
            .recommendations
            .iter()
            .any(|r| r.rule == "has_fallback"));
        assert!(result.recommendations.iter().any(|r| r.rule == "has_retry"));
    }

    #[test]
    fn test_risk_level_wire_strings() {
        assert_eq!(
            serde_json::to_string(&RiskLevel::Critical).unwrap(),
            "\"critical\""
        );
        assert_eq!(RiskLevel::Medium.as_str(), "medium");
    }
}

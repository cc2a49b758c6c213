//! Outcome Predictor - ML-based success estimation and trend analysis
//!
//! A standardizing scaler feeds a bagged gini-tree forest trained on the
//! memory store's full history. The predictor is always queryable: a fresh
//! instance is dummy-fitted on a single all-zero failure sample, so
//! `predict_outcome` never reports an unfitted model.
//!
//! ## Usage
//!
//! ```rust
//! use chaos_intel::experiment::ExperimentCandidate;
//! use chaos_intel::memory::MemoryStore;
//! use chaos_intel::predictor::OutcomePredictor;
//!
//! let store = MemoryStore::new();
//! let mut predictor = OutcomePredictor::new();
//! predictor.train_model(&store);
//!
//! let candidate = ExperimentCandidate::builder("network_failure", "user-service", "30s").build();
//! let prediction = predictor.predict_outcome(&candidate, &store)?;
//! assert!(prediction.success_probability <= 1.0);
//! # Ok::<(), chaos_intel::Error>(())
//! ```

mod features;
mod forest;
mod scaler;

pub use forest::RandomForest;
pub use scaler::StandardScaler;

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::experiment::{parse_duration, ExperimentCandidate, ParamValue};
use crate::memory::MemoryStore;
use crate::Result;

use features::{candidate_features, record_features, FEATURE_NAMES};

/// Success-probability floor below which improvements are suggested.
const IMPROVEMENT_THRESHOLD: f64 = 0.7;

/// Suggested cap for the `latency_ms` parameter.
const LATENCY_CAP_MS: f64 = 2000.0;

/// Suggested cap for experiment duration, in seconds.
const DURATION_CAP_SECS: u64 = 30;

/// One feature's contribution to a prediction.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ContributingFactor {
    /// Feature name.
    pub feature: String,
    /// Learned importance in `[0, 1]`.
    pub importance: f64,
    /// The candidate's raw (unscaled) value for the feature.
    pub value: f64,
}

/// Result of [`OutcomePredictor::predict_outcome`].
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Prediction {
    /// Predicted class: 1 for success, 0 for failure.
    pub predicted_outcome: u8,
    /// Probability of the success class.
    pub success_probability: f64,
    /// Largest class probability.
    pub confidence: f64,
    /// Features sorted descending by learned importance.
    pub contributing_factors: Vec<ContributingFactor>,
}

/// A suggested change to raise an experiment's success probability.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Suggestion {
    /// Cap a risky parameter value.
    ParameterAdjustment {
        /// Parameter to change.
        parameter: String,
        /// Value currently set.
        current_value: f64,
        /// Suggested replacement.
        suggested_value: f64,
        /// Why the change helps.
        reason: String,
    },
    /// Shorten the experiment.
    DurationAdjustment {
        /// Duration currently set.
        current_duration: String,
        /// Suggested replacement.
        suggested_duration: String,
        /// Why the change helps.
        reason: String,
    },
    /// Improve observability instead of parameters.
    MonitoringAdjustment {
        /// What to add.
        suggestion: String,
        /// Why the change helps.
        reason: String,
    },
}

/// Success counts for one aggregation bucket.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq)]
pub struct SuccessBucket {
    /// Successes over total, 0 for an empty bucket.
    pub success_rate: f64,
    /// Number of experiments in the bucket.
    pub total_experiments: usize,
}

/// Min/max/mean of one parameter over one outcome class.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq)]
pub struct RangeStats {
    /// Smallest observed value.
    pub min: Option<f64>,
    /// Largest observed value.
    pub max: Option<f64>,
    /// Mean observed value.
    pub mean: Option<f64>,
}

/// Value distribution of one numeric parameter, split by outcome.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq)]
pub struct ParameterTrend {
    /// Stats over successful experiments.
    pub successful_range: RangeStats,
    /// Stats over failed experiments.
    pub failed_range: RangeStats,
}

/// Result of [`OutcomePredictor::analyze_trends`].
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct TrendReport {
    /// Success rate per hour of day (24 buckets, 0-23).
    pub time_patterns: BTreeMap<u32, SuccessBucket>,
    /// Success rate per target component.
    pub component_patterns: BTreeMap<String, SuccessBucket>,
    /// Value distributions of numeric parameters split by outcome.
    pub parameter_trends: BTreeMap<String, ParameterTrend>,
    /// Success rate over all history.
    pub overall_success_rate: f64,
}

/// Serialized model state: classifier, scaler, and feature names.
#[derive(Serialize, Deserialize)]
struct ModelBundle {
    classifier: RandomForest,
    scaler: StandardScaler,
    feature_names: Vec<String>,
}

/// Predicts experiment outcomes and suggests improvements from history.
#[derive(Debug, Clone)]
pub struct OutcomePredictor {
    classifier: RandomForest,
    scaler: StandardScaler,
    feature_names: Vec<String>,
}

impl Default for OutcomePredictor {
    fn default() -> Self {
        Self::new()
    }
}

impl OutcomePredictor {
    /// Create a predictor, dummy-fitted so it can answer before training.
    #[must_use]
    pub fn new() -> Self {
        let mut predictor = Self {
            classifier: RandomForest::default(),
            scaler: StandardScaler::new(),
            feature_names: FEATURE_NAMES.iter().map(ToString::to_string).collect(),
        };
        predictor.fit_dummy();
        predictor
    }

    /// Train the model on the store's full history.
    ///
    /// Labels are 1 for success/partial success, 0 otherwise. Records whose
    /// features cannot be extracted are skipped. Empty history falls back to
    /// the dummy fit, keeping the model queryable.
    pub fn train_model(&mut self, memory: &MemoryStore) {
        let mut samples = Vec::new();
        let mut labels = Vec::new();

        for record in memory.experiments() {
            if let Some(features) = record_features(record, memory) {
                samples.push(features);
                labels.push(u8::from(record.outcome().counts_as_success()));
            }
        }

        if samples.is_empty() {
            self.fit_dummy();
            return;
        }

        debug!(samples = samples.len(), "training outcome model");
        self.scaler.fit(&samples);
        let scaled: Vec<Vec<f64>> = samples.iter().map(|s| self.scaler.transform(s)).collect();
        self.classifier.fit(&scaled, &labels);
    }

    fn fit_dummy(&mut self) {
        let dummy = vec![vec![0.0; self.feature_names.len()]];
        self.scaler.fit(&dummy);
        self.classifier.fit(&dummy, &[0]);
    }

    /// Predict the candidate's outcome and success probability.
    ///
    /// # Errors
    ///
    /// Fails only when the candidate's duration string cannot be parsed.
    pub fn predict_outcome(
        &self,
        candidate: &ExperimentCandidate,
        memory: &MemoryStore,
    ) -> Result<Prediction> {
        let features = candidate_features(candidate, memory)?;
        let scaled = self.scaler.transform(&features);
        let probabilities = self.classifier.predict_proba(&scaled);

        Ok(Prediction {
            predicted_outcome: self.classifier.predict(&scaled),
            success_probability: probabilities[1],
            confidence: probabilities[0].max(probabilities[1]),
            contributing_factors: self.contributing_factors(&features),
        })
    }

    /// Suggest parameter or duration changes when the predicted success
    /// probability is low; never returns an empty list.
    ///
    /// # Errors
    ///
    /// Fails only when the candidate's duration string cannot be parsed.
    pub fn suggest_improvements(
        &self,
        candidate: &ExperimentCandidate,
        memory: &MemoryStore,
    ) -> Result<Vec<Suggestion>> {
        let mut suggestions = Vec::new();
        let prediction = self.predict_outcome(candidate, memory)?;

        if prediction.success_probability < IMPROVEMENT_THRESHOLD {
            if let Some(latency) = candidate
                .parameters
                .get("latency_ms")
                .and_then(ParamValue::as_number)
            {
                if latency > LATENCY_CAP_MS {
                    suggestions.push(Suggestion::ParameterAdjustment {
                        parameter: "latency_ms".to_string(),
                        current_value: latency,
                        suggested_value: LATENCY_CAP_MS,
                        reason: "High latency values increase failure risk".to_string(),
                    });
                }
            }

            let duration_secs = parse_duration(&candidate.duration)?;
            if duration_secs > DURATION_CAP_SECS {
                suggestions.push(Suggestion::DurationAdjustment {
                    current_duration: candidate.duration.clone(),
                    suggested_duration: format!("{DURATION_CAP_SECS}s"),
                    reason: "Long experiment duration increases system impact".to_string(),
                });
            }
        }

        if suggestions.is_empty() {
            suggestions.push(Suggestion::MonitoringAdjustment {
                suggestion: "Add detailed monitoring for the target component".to_string(),
                reason: "Improved monitoring helps catch issues early".to_string(),
            });
        }

        Ok(suggestions)
    }

    /// Aggregate success rates by hour of day, by component, and numeric
    /// parameter distributions split by outcome.
    #[must_use]
    pub fn analyze_trends(&self, memory: &MemoryStore) -> TrendReport {
        let experiments = memory.experiments();
        if experiments.is_empty() {
            return TrendReport::default();
        }

        let mut hours: BTreeMap<u32, (usize, usize)> = (0u32..24).map(|h| (h, (0, 0))).collect();
        let mut components: BTreeMap<String, (usize, usize)> = BTreeMap::new();
        let mut params: BTreeMap<String, (Vec<f64>, Vec<f64>)> = BTreeMap::new();
        let mut successes = 0usize;

        for record in experiments {
            use chrono::Timelike;

            let succeeded = record.outcome().counts_as_success();
            successes += usize::from(succeeded);

            let hour = hours.entry(record.timestamp().hour()).or_default();
            hour.0 += usize::from(succeeded);
            hour.1 += 1;

            let component = components
                .entry(record.target_component().to_string())
                .or_default();
            component.0 += usize::from(succeeded);
            component.1 += 1;

            for (name, value) in record.parameters() {
                let Some(value) = value.as_number() else {
                    continue;
                };
                let entry = params.entry(name.clone()).or_default();
                if succeeded {
                    entry.0.push(value);
                } else {
                    entry.1.push(value);
                }
            }
        }

        #[allow(clippy::cast_precision_loss)]
        let overall_success_rate = successes as f64 / experiments.len() as f64;

        TrendReport {
            time_patterns: hours
                .into_iter()
                .map(|(hour, counts)| (hour, bucket(counts)))
                .collect(),
            component_patterns: components
                .into_iter()
                .map(|(name, counts)| (name, bucket(counts)))
                .collect(),
            parameter_trends: params
                .into_iter()
                .map(|(name, (ok, failed))| {
                    (
                        name,
                        ParameterTrend {
                            successful_range: range_stats(&ok),
                            failed_range: range_stats(&failed),
                        },
                    )
                })
                .collect(),
            overall_success_rate,
        }
    }

    /// Serialize the fitted model (classifier, scaler, feature names).
    ///
    /// # Errors
    ///
    /// Returns [`Error::Serialization`](crate::Error::Serialization) when
    /// encoding fails.
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        let bundle = ModelBundle {
            classifier: self.classifier.clone(),
            scaler: self.scaler.clone(),
            feature_names: self.feature_names.clone(),
        };
        Ok(serde_json::to_vec(&bundle)?)
    }

    /// Restore a predictor from a serialized model blob.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Serialization`](crate::Error::Serialization) when the
    /// blob cannot be decoded.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        let bundle: ModelBundle = serde_json::from_slice(bytes)?;
        Ok(Self {
            classifier: bundle.classifier,
            scaler: bundle.scaler,
            feature_names: bundle.feature_names,
        })
    }

    fn contributing_factors(&self, raw_features: &[f64]) -> Vec<ContributingFactor> {
        let importances = self.classifier.feature_importances();
        let mut factors: Vec<ContributingFactor> = self
            .feature_names
            .iter()
            .zip(importances.iter().chain(std::iter::repeat(&0.0)))
            .zip(raw_features.iter().chain(std::iter::repeat(&0.0)))
            .map(|((name, &importance), &value)| ContributingFactor {
                feature: name.clone(),
                importance,
                value,
            })
            .collect();

        factors.sort_by(|a, b| {
            b.importance
                .partial_cmp(&a.importance)
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        factors
    }
}

fn bucket((successes, total): (usize, usize)) -> SuccessBucket {
    #[allow(clippy::cast_precision_loss)]
    let success_rate = if total == 0 {
        0.0
    } else {
        successes as f64 / total as f64
    };
    SuccessBucket {
        success_rate,
        total_experiments: total,
    }
}

fn range_stats(values: &[f64]) -> RangeStats {
    if values.is_empty() {
        return RangeStats::default();
    }
    #[allow(clippy::cast_precision_loss)]
    let mean = values.iter().sum::<f64>() / values.len() as f64;
    RangeStats {
        min: values.iter().copied().fold(None, |acc: Option<f64>, v| {
            Some(acc.map_or(v, |a| a.min(v)))
        }),
        max: values.iter().copied().fold(None, |acc: Option<f64>, v| {
            Some(acc.map_or(v, |a| a.max(v)))
        }),
        mean: Some(mean),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    use crate::experiment::{ExperimentRecord, Outcome};

    fn seeded_store() -> MemoryStore {
        let mut store = MemoryStore::new();
        for i in 0..6 {
            store.add_experiment(
                ExperimentRecord::builder(
                    format!("ok-{i}"),
                    "network_failure",
                    "user-service",
                    Outcome::Success,
                )
                .parameter("latency_ms", 500.0 + f64::from(i))
                .duration("30s")
                .timestamp(Utc.with_ymd_and_hms(2026, 3, 1, 9, 0, 0).unwrap())
                .build(),
            );
            store.add_experiment(
                ExperimentRecord::builder(
                    format!("bad-{i}"),
                    "network_failure",
                    "user-service",
                    Outcome::Failure,
                )
                .parameter("latency_ms", 8000.0 + f64::from(i))
                .duration("120s")
                .timestamp(Utc.with_ymd_and_hms(2026, 3, 1, 23, 0, 0).unwrap())
                .build(),
            );
        }
        store
    }

    fn candidate(latency: f64, duration: &str) -> ExperimentCandidate {
        ExperimentCandidate::builder("network_failure", "user-service", duration)
            .parameter("latency_ms", latency)
            .build()
    }

    #[test]
    fn test_untrained_predictor_answers() {
        let store = MemoryStore::new();
        let predictor = OutcomePredictor::new();
        let prediction = predictor
            .predict_outcome(&candidate(1000.0, "30s"), &store)
            .unwrap();

        assert_eq!(prediction.predicted_outcome, 0);
        assert!(prediction.success_probability.abs() < f64::EPSILON);
        assert!((prediction.confidence - 1.0).abs() < f64::EPSILON);
        assert_eq!(prediction.contributing_factors.len(), 6);
    }

    #[test]
    fn test_trained_predictor_separates_outcomes() {
        let store = seeded_store();
        let mut predictor = OutcomePredictor::new();
        predictor.train_model(&store);

        let good = predictor
            .predict_outcome(&candidate(500.0, "30s"), &store)
            .unwrap();
        let bad = predictor
            .predict_outcome(&candidate(8000.0, "120s"), &store)
            .unwrap();

        assert!(good.success_probability > bad.success_probability);
        assert_eq!(good.predicted_outcome, 1);
        assert_eq!(bad.predicted_outcome, 0);
    }

    #[test]
    fn test_contributing_factors_sorted_by_importance() {
        let store = seeded_store();
        let mut predictor = OutcomePredictor::new();
        predictor.train_model(&store);

        let prediction = predictor
            .predict_outcome(&candidate(500.0, "30s"), &store)
            .unwrap();
        let factors = &prediction.contributing_factors;
        for pair in factors.windows(2) {
            assert!(pair[0].importance >= pair[1].importance);
        }
    }

    #[test]
    fn test_suggestions_for_risky_experiment() {
        let store = seeded_store();
        let mut predictor = OutcomePredictor::new();
        predictor.train_model(&store);

        let suggestions = predictor
            .suggest_improvements(&candidate(8000.0, "120s"), &store)
            .unwrap();

        assert!(suggestions
            .iter()
            .any(|s| matches!(s, Suggestion::ParameterAdjustment { .. })));
        assert!(suggestions
            .iter()
            .any(|s| matches!(s, Suggestion::DurationAdjustment { .. })));
    }

    #[test]
    fn test_suggestions_never_empty() {
        let store = seeded_store();
        let mut predictor = OutcomePredictor::new();
        predictor.train_model(&store);

        let suggestions = predictor
            .suggest_improvements(&candidate(500.0, "30s"), &store)
            .unwrap();
        assert!(!suggestions.is_empty());
    }

    #[test]
    fn test_analyze_trends() {
        let store = seeded_store();
        let predictor = OutcomePredictor::new();
        let report = predictor.analyze_trends(&store);

        assert!((report.overall_success_rate - 0.5).abs() < f64::EPSILON);
        assert_eq!(report.time_patterns.len(), 24);
        assert!((report.time_patterns[&9].success_rate - 1.0).abs() < f64::EPSILON);
        assert!(report.time_patterns[&23].success_rate.abs() < f64::EPSILON);
        assert_eq!(report.time_patterns[&0].total_experiments, 0);

        let component = &report.component_patterns["user-service"];
        assert_eq!(component.total_experiments, 12);

        let latency = &report.parameter_trends["latency_ms"];
        assert_eq!(latency.successful_range.min, Some(500.0));
        assert_eq!(latency.failed_range.max, Some(8005.0));
    }

    #[test]
    fn test_analyze_trends_empty_history() {
        let store = MemoryStore::new();
        let predictor = OutcomePredictor::new();
        let report = predictor.analyze_trends(&store);
        assert_eq!(report, TrendReport::default());
    }

    #[test]
    fn test_model_round_trip_reproduces_predictions() {
        let store = seeded_store();
        let mut predictor = OutcomePredictor::new();
        predictor.train_model(&store);

        let blob = predictor.to_bytes().unwrap();
        let restored = OutcomePredictor::from_bytes(&blob).unwrap();

        let before = predictor
            .predict_outcome(&candidate(500.0, "30s"), &store)
            .unwrap();
        let after = restored
            .predict_outcome(&candidate(500.0, "30s"), &store)
            .unwrap();
        assert_eq!(before, after);
    }

    #[test]
    fn test_corrupt_blob_is_an_error() {
        assert!(OutcomePredictor::from_bytes(b"not a model").is_err());
    }
}

//! # Chaos-Intel: Experiment Intelligence Core
//!
//! Chaos-Intel is the decision core for a chaos-engineering platform. It keeps
//! an append-only memory of past experiments, derives per-component risk
//! profiles from that history, validates candidate experiments against a fixed
//! safety-rule catalog, rewrites candidates toward historically safe
//! parameters, and predicts success likelihood with a small tree-ensemble
//! classifier.
//!
//! ## Pipeline
//!
//! ```text
//! candidate ──> SafetyValidator (stateless rules)
//!          ──> ExperimentPlanner (history-informed enhancement + risk score)
//!          ──> OutcomePredictor (success probability + suggestions)
//! ```
//!
//! ## Example Usage
//!
//! ```rust
//! use chaos_intel::analysis::SystemAnalysis;
//! use chaos_intel::experiment::ExperimentCandidate;
//! use chaos_intel::memory::MemoryStore;
//! use chaos_intel::planner::ExperimentPlanner;
//! use chaos_intel::safety::SafetyValidator;
//!
//! let store = MemoryStore::new();
//! let analysis = SystemAnalysis::default();
//!
//! let candidate = ExperimentCandidate::builder("network_failure", "user-service", "30s")
//!     .parameter("latency_ms", 1000.0)
//!     .build();
//!
//! let validator = SafetyValidator::new();
//! let verdict = validator.validate_experiment(&candidate, &analysis);
//! assert!(!verdict.is_safe); // no rollback procedure defined
//!
//! let planner = ExperimentPlanner::new(&store);
//! let enhanced = planner.enhance_experiment(&candidate, &analysis)?;
//! assert!(!enhanced.safety_checks.is_empty());
//! # Ok::<(), chaos_intel::Error>(())
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

pub mod analysis;
pub mod error;
pub mod experiment;
pub mod memory;
pub mod planner;
pub mod predictor;
pub mod safety;

pub use error::{Error, Result};

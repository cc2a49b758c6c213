//! Experiment memory and derived knowledge
//!
//! ```text
//! ExperimentRecord (append-only) ──> MemoryStore
//!                                        ├── ComponentRiskProfile (per component, rebuilt on write)
//!                                        ├── relationship co-occurrence counts
//!                                        └── similarity search over history
//! ```
//!
//! ## Usage
//!
//! ```rust
//! use chaos_intel::experiment::{ExperimentRecord, Outcome};
//! use chaos_intel::memory::MemoryStore;
//!
//! let mut store = MemoryStore::new();
//! store.add_experiment(
//!     ExperimentRecord::builder("exp-1", "network_failure", "user-service", Outcome::Success)
//!         .parameter("latency_ms", 1000.0)
//!         .duration("30s")
//!         .build(),
//! );
//!
//! let profile = store.component_risk_profile("user-service");
//! assert!((profile.success_rate - 1.0).abs() < f64::EPSILON);
//! ```

mod profile;
mod store;

pub use profile::{ComponentRiskProfile, FailurePattern, ParameterRange};
pub use store::{MemoryStore, DEFAULT_SIMILARITY_THRESHOLD};

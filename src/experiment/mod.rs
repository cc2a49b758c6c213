//! Experiment data model
//!
//! Two shapes share this module:
//!
//! ```text
//! ExperimentCandidate   (in-flight proposal, mutable copy per planner call)
//! ExperimentRecord      (write-once historical fact, append-only history)
//! ```
//!
//! Candidates become records only outside the core: the orchestration layer
//! runs the experiment, observes the outcome, and appends a record to the
//! [`MemoryStore`](crate::memory::MemoryStore).

mod candidate;
mod duration;
mod params;
mod record;

pub use candidate::{
    ExperimentCandidate, ExperimentCandidateBuilder, Monitoring, RollbackProcedure, SafetyCheck,
};
pub use duration::{format_seconds, parse_duration};
pub use params::ParamValue;
pub use record::{ExperimentRecord, ExperimentRecordBuilder, Outcome};

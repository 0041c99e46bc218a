/*!
 * Contention Harness Library
 * Interchangeable shared-state synchronization strategies driven by a
 * deterministic concurrent workload
 */

pub mod config;
pub mod core;
pub mod driver;
pub mod monitoring;
pub mod report;
pub mod strategy;
pub mod workload;

// Re-exports
pub use config::HarnessConfig;
pub use crate::core::errors::{HarnessError, HarnessResult};
pub use crate::core::types::{Key, Mutation, Value};
pub use driver::{run, ExecutionMode, FinalState, RunOutcome};
pub use monitoring::{init_tracing, RunSpan};
pub use report::{verify, Outcome, OutputFormat, Summary, Verdict};
pub use strategy::{build, SharedState, StrategyKind, StrategyOptions, TargetShape};
pub use workload::{Expectation, Operation, WorkerPlan, Workload};

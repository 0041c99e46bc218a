/*!
 * Execution Driver
 *
 * Fans a workload out to one worker per plan, all operating on the same
 * shared strategy instance, and blocks until every worker has signalled.
 *
 * # Protocol
 *
 * 1. Spawn `W` workers; each takes a completion token from the wait group
 * 2. Workers park on a start gate of `W + 1` participants
 * 3. The driver opens the gate and takes the start timestamp
 * 4. The driver waits on the wait group (bounded by the completion timeout)
 * 5. End timestamp, then every worker's result is collected
 * 6. The final state is snapshotted through `read`/`len`
 *
 * Only steps 3–4 are timed; construction and snapshotting are excluded.
 * A worker fault fails the whole run; partial results are never returned.
 */

mod tasks;
mod threads;

pub use tasks::run_tasks;
pub use threads::run_threads;

use crate::core::errors::{HarnessError, HarnessResult};
use crate::core::types::{Key, Value};
use crate::strategy::SharedState;
use crate::workload::{Expectation, WorkerPlan, Workload};
use serde::{Deserialize, Serialize};
use std::any::Any;
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

/// How workers are scheduled
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExecutionMode {
    /// One OS thread per worker
    #[default]
    Threads,
    /// One task per worker on a multi-threaded tokio runtime
    Tasks,
}

impl ExecutionMode {
    pub const fn as_str(self) -> &'static str {
        match self {
            ExecutionMode::Threads => "threads",
            ExecutionMode::Tasks => "tasks",
        }
    }
}

impl fmt::Display for ExecutionMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ExecutionMode {
    type Err = HarnessError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "threads" | "thread" => Ok(ExecutionMode::Threads),
            "tasks" | "task" | "tokio" => Ok(ExecutionMode::Tasks),
            other => Err(HarnessError::config(format!("unknown execution mode '{}'", other))),
        }
    }
}

/// Read-only snapshot of the shared state after quiescence
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FinalState {
    /// Value under every key the expectation names (`None` if absent)
    pub values: BTreeMap<Key, Option<Value>>,
    /// `len()` of the structure
    pub len: usize,
}

impl FinalState {
    /// Snapshot the keys `expected` cares about plus the length
    pub fn capture(state: &dyn SharedState, expected: &Expectation) -> HarnessResult<Self> {
        let mut values = BTreeMap::new();
        if let Expectation::Totals(totals) = expected {
            for key in totals.keys() {
                values.insert(key.clone(), state.read(key)?);
            }
        }
        Ok(Self {
            values,
            len: state.len()?,
        })
    }

    /// Sum of all captured values
    pub fn total(&self) -> Value {
        self.values.values().flatten().sum()
    }
}

/// Result of a completed run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunOutcome {
    pub final_state: FinalState,
    /// Mutation phase only
    pub elapsed: Duration,
    pub workers: usize,
    pub operations: usize,
}

/// Run `workload` against `state` in the given mode
///
/// Task mode builds a dedicated multi-threaded runtime for the run. The
/// runtime is shut down without waiting for its threads, so workers stuck
/// past the completion timeout cannot keep `run` from returning.
pub fn run(
    state: Arc<dyn SharedState>,
    workload: &Workload,
    mode: ExecutionMode,
    timeout: Duration,
) -> HarnessResult<RunOutcome> {
    match mode {
        ExecutionMode::Threads => run_threads(state, workload, timeout),
        ExecutionMode::Tasks => {
            // One spare thread keeps the timer driven while every worker blocks
            let runtime = tokio::runtime::Builder::new_multi_thread()
                .worker_threads(workload.worker_count() + 1)
                .enable_time()
                .thread_name("harness-rt")
                .build()
                .map_err(|e| HarnessError::Internal(format!("runtime: {}", e).into()))?;
            let result = runtime.block_on(run_tasks(state, workload, timeout));
            runtime.shutdown_background();
            result
        }
    }
}

/// Execute one worker's plan in order, stopping at the first error
///
/// Never retries: an error from the strategy is the run's result.
pub(crate) fn execute_plan(state: &dyn SharedState, plan: &WorkerPlan) -> HarnessResult<()> {
    for op in plan.operations.iter() {
        state.mutate(&op.key, op.mutation)?;
    }
    Ok(())
}

/// Turn a worker panic into the structural fault it represents
pub(crate) fn panic_to_fault(state: &dyn SharedState, worker: usize, payload: Box<dyn Any + Send>) -> HarnessError {
    let message = payload
        .downcast_ref::<&str>()
        .map(|s| s.to_string())
        .or_else(|| payload.downcast_ref::<String>().cloned())
        .unwrap_or_else(|| "non-string panic payload".to_string());
    HarnessError::structural(state.kind(), format!("worker {} panicked: {}", worker, message))
}

/// Pick the error to report from a set of worker results
///
/// The first fault in worker order wins; everything else is discarded.
pub(crate) fn first_fault(results: Vec<HarnessResult<()>>) -> HarnessResult<()> {
    results.into_iter().collect()
}

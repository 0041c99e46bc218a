/*!
 * Thread Driver
 * One named OS thread per worker
 */

use super::{execute_plan, first_fault, panic_to_fault, FinalState, RunOutcome};
use crate::core::errors::{HarnessError, HarnessResult};
use crate::core::limits::WORKER_THREAD_PREFIX;
use crate::core::sync::{StartGate, WaitGroup};
use crate::strategy::SharedState;
use crate::workload::Workload;
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};
use tracing::{debug, instrument, warn, Span};

/// Run `workload` on OS threads
///
/// Blocks until every worker has signalled the wait group or `timeout`
/// elapses. On timeout the stuck threads are left behind and the run fails
/// with `DeadlockOrHang`.
#[instrument(skip_all, fields(strategy = %state.kind(), workers = workload.worker_count()))]
pub fn run_threads(
    state: Arc<dyn SharedState>,
    workload: &Workload,
    timeout: Duration,
) -> HarnessResult<RunOutcome> {
    let workers = workload.worker_count();
    let group = WaitGroup::new();
    let gate = Arc::new(StartGate::new());
    let mut handles: Vec<JoinHandle<HarnessResult<()>>> = Vec::with_capacity(workers);
    let run_span = Span::current();

    for plan in workload.plans() {
        let token = group.add();
        let state = Arc::clone(&state);
        let worker_gate = Arc::clone(&gate);
        let span = run_span.clone();
        let plan = plan.clone();
        let worker = plan.worker;

        let spawned = thread::Builder::new()
            .name(format!("{}-{}", WORKER_THREAD_PREFIX, worker))
            .spawn(move || {
                let _token = token;
                let _entered = span.enter();
                if !worker_gate.arrive() {
                    return Err(HarnessError::Internal("start gate aborted".into()));
                }
                debug!(worker = plan.worker, operations = plan.operations.len(), "Worker started");
                execute_plan(&*state, &plan)
            });

        match spawned {
            Ok(handle) => handles.push(handle),
            Err(e) => {
                warn!(worker, error = %e, "Worker spawn failed, aborting run");
                gate.abort();
                for handle in handles {
                    let _ = handle.join();
                }
                return Err(HarnessError::WorkerSpawn {
                    worker,
                    reason: e.to_string().into(),
                });
            }
        }
    }

    gate.open_when(workers, timeout)?;
    let start = Instant::now();
    group.wait_timeout(timeout)?;
    let elapsed = start.elapsed();

    if group.signalled() != group.spawned() {
        return Err(HarnessError::Internal(
            format!(
                "completion signals ({}) do not match spawned workers ({})",
                group.signalled(),
                group.spawned()
            )
            .into(),
        ));
    }

    let results = handles
        .into_iter()
        .enumerate()
        .map(|(worker, handle)| {
            handle
                .join()
                .unwrap_or_else(|payload| Err(panic_to_fault(&*state, worker, payload)))
        })
        .collect();
    first_fault(results)?;

    let final_state = FinalState::capture(&*state, workload.expected())?;
    debug!(elapsed_us = elapsed.as_micros() as u64, len = final_state.len, "Workers quiesced");

    Ok(RunOutcome {
        final_state,
        elapsed,
        workers,
        operations: workload.total_operations(),
    })
}

/*!
 * Task Driver
 * One tokio task per worker on a multi-threaded runtime
 */

use super::{execute_plan, first_fault, panic_to_fault, FinalState, RunOutcome};
use crate::core::errors::{HarnessError, HarnessResult};
use crate::core::sync::WaitGroup;
use crate::strategy::SharedState;
use crate::workload::Workload;
use futures::future::join_all;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::Barrier;
use tracing::{debug, instrument, Instrument, Span};

/// Run `workload` as tokio tasks
///
/// Must be called from a multi-threaded runtime. A worker's plan contains no
/// await points, so once released each task runs its whole plan on one
/// runtime thread; lock waits block that thread, never the scheduler.
#[instrument(skip_all, fields(strategy = %state.kind(), workers = workload.worker_count()))]
pub async fn run_tasks(
    state: Arc<dyn SharedState>,
    workload: &Workload,
    timeout: Duration,
) -> HarnessResult<RunOutcome> {
    let workers = workload.worker_count();
    let group = WaitGroup::new();
    let gate = Arc::new(Barrier::new(workers + 1));
    let run_span = Span::current();

    let handles: Vec<_> = workload
        .plans()
        .iter()
        .map(|plan| {
            let token = group.add();
            let state = Arc::clone(&state);
            let gate = Arc::clone(&gate);
            let plan = plan.clone();
            tokio::spawn(
                async move {
                    let _token = token;
                    gate.wait().await;
                    debug!(worker = plan.worker, operations = plan.operations.len(), "Worker started");
                    execute_plan(&*state, &plan)
                }
                .instrument(run_span.clone()),
            )
        })
        .collect();

    tokio::time::timeout(timeout, gate.wait())
        .await
        .map_err(|_| HarnessError::DeadlockOrHang {
            waited: timeout,
            completed: 0,
            spawned: workers,
        })?;
    let start = Instant::now();
    group.wait_async(timeout).await?;
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

    let results = join_all(handles)
        .await
        .into_iter()
        .enumerate()
        .map(|(worker, joined)| match joined {
            Ok(result) => result,
            Err(e) if e.is_panic() => Err(panic_to_fault(&*state, worker, e.into_panic())),
            Err(e) => Err(HarnessError::Internal(format!("worker {}: {}", worker, e).into())),
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

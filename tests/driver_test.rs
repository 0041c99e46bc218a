/*!
 * Driver Tests
 * Completion signalling, fault propagation and hang detection
 */

use contention_harness::driver::{run_tasks, run_threads};
use contention_harness::{
    build, run, ExecutionMode, HarnessError, HarnessResult, Key, Mutation, SharedState,
    StrategyKind, StrategyOptions, Value, Workload,
};
use parking_lot::{Condvar, Mutex};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::mpsc;
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

const TIMEOUT: Duration = Duration::from_secs(30);

// ============================================================================
// Test strategies
// ============================================================================

/// Counts calls and panics on the configured one
struct PanicsOnCall {
    calls: AtomicUsize,
    panic_at: usize,
}

impl SharedState for PanicsOnCall {
    fn mutate(&self, _key: &Key, _mutation: Mutation) -> HarnessResult<()> {
        if self.calls.fetch_add(1, Ordering::SeqCst) == self.panic_at {
            panic!("injected failure");
        }
        Ok(())
    }

    fn read(&self, _key: &Key) -> HarnessResult<Option<Value>> {
        Ok(Some(self.calls.load(Ordering::SeqCst) as Value))
    }

    fn len(&self) -> HarnessResult<usize> {
        Ok(1)
    }

    fn kind(&self) -> StrategyKind {
        StrategyKind::ExclusiveLock
    }
}

/// Blocks every mutation until released
struct Stalls {
    released: Mutex<bool>,
    cond: Condvar,
    entered: AtomicUsize,
}

impl Stalls {
    fn new() -> Self {
        Self {
            released: Mutex::new(false),
            cond: Condvar::new(),
            entered: AtomicUsize::new(0),
        }
    }

    fn release(&self) {
        *self.released.lock() = true;
        self.cond.notify_all();
    }
}

impl SharedState for Stalls {
    fn mutate(&self, _key: &Key, _mutation: Mutation) -> HarnessResult<()> {
        self.entered.fetch_add(1, Ordering::SeqCst);
        let mut released = self.released.lock();
        while !*released {
            self.cond.wait(&mut released);
        }
        Ok(())
    }

    fn read(&self, _key: &Key) -> HarnessResult<Option<Value>> {
        Ok(None)
    }

    fn len(&self) -> HarnessResult<usize> {
        Ok(0)
    }

    fn kind(&self) -> StrategyKind {
        StrategyKind::ExclusiveLock
    }
}

// ============================================================================
// Completion
// ============================================================================

#[test]
fn test_every_worker_counted() {
    let workload = Workload::counter(64, 10).unwrap();
    let state = build(StrategyKind::Atomic, &workload, &StrategyOptions::default()).unwrap();
    let outcome = run_threads(state, &workload, TIMEOUT).unwrap();

    assert_eq!(outcome.workers, 64);
    assert_eq!(outcome.operations, 640);
    assert_eq!(outcome.final_state.total(), 640);
}

#[test]
fn test_elapsed_excludes_snapshot() {
    let workload = Workload::counter(4, 100).unwrap();
    let state = build(StrategyKind::ExclusiveLock, &workload, &StrategyOptions::default()).unwrap();
    let start = Instant::now();
    let outcome = run(state, &workload, ExecutionMode::Threads, TIMEOUT).unwrap();
    assert!(outcome.elapsed <= start.elapsed());
}

// ============================================================================
// Faults
// ============================================================================

#[test]
fn test_worker_panic_becomes_structural_fault() {
    let workload = Workload::counter(8, 100).unwrap();
    let state = Arc::new(PanicsOnCall {
        calls: AtomicUsize::new(0),
        panic_at: 42,
    });

    let start = Instant::now();
    let err = run_threads(state, &workload, TIMEOUT).unwrap_err();

    assert!(start.elapsed() < TIMEOUT, "panic must not look like a hang");
    match err {
        HarnessError::StructuralFault { strategy, detail } => {
            assert_eq!(strategy, StrategyKind::ExclusiveLock);
            assert!(detail.contains("injected failure"), "detail: {}", detail);
        }
        other => panic!("expected structural fault, got {}", other),
    }
    assert!(!HarnessError::structural(StrategyKind::ExclusiveLock, "x").is_expected_race());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_task_panic_becomes_structural_fault() {
    let workload = Workload::counter(8, 100).unwrap();
    let state = Arc::new(PanicsOnCall {
        calls: AtomicUsize::new(0),
        panic_at: 0,
    });

    let err = run_tasks(state, &workload, TIMEOUT).await.unwrap_err();
    assert!(matches!(err, HarnessError::StructuralFault { .. }), "got {}", err);
}

#[test]
fn test_strategy_error_fails_run() {
    // Slots laid out for "a"/"b"; the uniform counter targets key 0
    let layout = Workload::split_counter();
    let state = build(StrategyKind::Atomic, &layout, &StrategyOptions::default()).unwrap();

    let workload = Workload::counter(4, 10).unwrap();
    let err = run(state, &workload, ExecutionMode::Threads, TIMEOUT).unwrap_err();
    assert_eq!(
        err,
        HarnessError::UnknownKey {
            strategy: StrategyKind::Atomic,
            key: Key::Int(0),
        }
    );
}

// ============================================================================
// Hang detection
// ============================================================================

#[test]
fn test_stalled_workers_reported_as_hang() {
    let workload = Workload::counter(4, 1).unwrap();
    let state = Arc::new(Stalls::new());

    let start = Instant::now();
    let err = run_threads(state.clone(), &workload, Duration::from_millis(200)).unwrap_err();
    let waited = start.elapsed();

    // Let the stuck workers finish so they don't outlive the test
    state.release();

    match err {
        HarnessError::DeadlockOrHang {
            completed, spawned, ..
        } => {
            assert_eq!(completed, 0);
            assert_eq!(spawned, 4);
        }
        other => panic!("expected hang, got {}", other),
    }
    assert!(waited >= Duration::from_millis(200));
    assert!(waited < Duration::from_secs(10));
    assert!(state.entered.load(Ordering::SeqCst) <= 4);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 8)]
async fn test_stalled_tasks_reported_as_hang() {
    let workload = Workload::counter(2, 1).unwrap();
    let state = Arc::new(Stalls::new());

    let err = run_tasks(state.clone(), &workload, Duration::from_millis(200))
        .await
        .unwrap_err();
    state.release();

    assert!(matches!(err, HarnessError::DeadlockOrHang { spawned: 2, .. }), "got {}", err);
}

#[test]
fn test_task_mode_run_returns_on_hang() {
    let workload = Workload::counter(2, 1).unwrap();
    let state = Arc::new(Stalls::new());

    let (tx, rx) = mpsc::channel();
    let runner = {
        let state = state.clone();
        thread::spawn(move || {
            let result = run(state, &workload, ExecutionMode::Tasks, Duration::from_millis(200));
            let _ = tx.send(result);
        })
    };

    // The stall is still in place here, so returning proves the runtime
    // did not wait for its blocked workers
    let result = rx.recv_timeout(Duration::from_secs(10));
    state.release();
    runner.join().unwrap();

    match result {
        Ok(Err(HarnessError::DeadlockOrHang {
            completed, spawned, ..
        })) => {
            assert_eq!(completed, 0);
            assert_eq!(spawned, 2);
        }
        Ok(other) => panic!("expected hang, got {:?}", other.map(|o| o.final_state)),
        Err(_) => panic!("run(.., Tasks, ..) did not return within 10s"),
    }
}

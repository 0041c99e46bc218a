/*!
 * Unsynchronized Strategy Tests
 * Lost updates and structural faults under real contention
 */

use contention_harness::{
    build, run, ExecutionMode, HarnessError, Outcome, StrategyKind, StrategyOptions, Verdict,
    Workload,
};
use std::thread;
use std::time::Duration;

const TIMEOUT: Duration = Duration::from_secs(30);
const MAX_ATTEMPTS: usize = 200;

fn multi_core() -> bool {
    thread::available_parallelism()
        .map(|n| n.get() >= 2)
        .unwrap_or(false)
}

#[test]
fn test_unsynchronized_counter_loses_updates() {
    if !multi_core() {
        println!("Skipping: lost updates need at least two cores");
        return;
    }

    let workload = Workload::counter(50, 1000).unwrap();
    let mut lowest = u64::MAX;

    for _ in 0..MAX_ATTEMPTS {
        let state = build(StrategyKind::Unsynchronized, &workload, &StrategyOptions::default()).unwrap();
        let outcome = run(state, &workload, ExecutionMode::Threads, TIMEOUT).unwrap();
        let total = outcome.final_state.total();

        // Torn writes can only lose increments, never invent them
        assert!(total <= 50_000, "observed {} > expected", total);
        lowest = lowest.min(total);
        if lowest < 50_000 {
            break;
        }
    }

    println!("Lowest unsynchronized total: {}", lowest);
    assert!(lowest < 50_000, "no lost update in {} attempts", MAX_ATTEMPTS);
}

#[test]
fn test_unsynchronized_divergence_is_tolerated() {
    let workload = Workload::counter(50, 1000).unwrap();
    let state = build(StrategyKind::Unsynchronized, &workload, &StrategyOptions::default()).unwrap();
    let result = run(state, &workload, ExecutionMode::Threads, TIMEOUT);
    let outcome = Outcome::evaluate(StrategyKind::Unsynchronized, ExecutionMode::Threads, &workload, result);

    match &outcome.verdict {
        Verdict::Match => {}
        Verdict::Diverged(HarnessError::CorrectnessViolation { strategy, .. }) => {
            assert_eq!(*strategy, StrategyKind::Unsynchronized);
        }
        other => panic!("unexpected verdict: {:?}", other),
    }
    assert!(outcome.check().is_ok());
}

#[test]
fn test_unsynchronized_map_writes_or_faults() {
    let workload = Workload::unique_keys(50, 1000).unwrap();

    for _ in 0..10 {
        let state = build(StrategyKind::Unsynchronized, &workload, &StrategyOptions::default()).unwrap();
        match run(state, &workload, ExecutionMode::Threads, TIMEOUT) {
            Ok(outcome) => assert_eq!(outcome.final_state.len, 50_000),
            Err(HarnessError::StructuralFault { strategy, detail }) => {
                assert_eq!(strategy, StrategyKind::Unsynchronized);
                assert!(detail.contains("concurrent map"), "detail: {}", detail);
            }
            Err(other) => panic!("unexpected error: {}", other),
        }
    }
}

#[test]
fn test_unsynchronized_map_fault_is_expected_race() {
    let err = HarnessError::structural(StrategyKind::Unsynchronized, "concurrent map writes");
    assert!(err.is_expected_race());

    let err = HarnessError::structural(StrategyKind::ExclusiveLock, "worker 0 panicked");
    assert!(!err.is_expected_race());
}

#[test]
fn test_single_worker_unsynchronized_is_exact() {
    let workload = Workload::counter(1, 10_000).unwrap();
    let state = build(StrategyKind::Unsynchronized, &workload, &StrategyOptions::default()).unwrap();
    let outcome = run(state, &workload, ExecutionMode::Threads, TIMEOUT).unwrap();
    assert_eq!(outcome.final_state.total(), 10_000);
}

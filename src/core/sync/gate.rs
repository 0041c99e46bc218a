/*!
 * Start Gate
 *
 * Holds spawned workers until all of them have arrived, then releases them
 * together. Unlike `std::sync::Barrier` the gate can be aborted, so a failed
 * spawn does not strand the workers that already started.
 */

use crate::core::errors::{HarnessError, HarnessResult};
use parking_lot::{Condvar, Mutex};
use std::time::{Duration, Instant};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Status {
    Closed,
    Open,
    Aborted,
}

struct State {
    arrived: usize,
    status: Status,
}

/// One-shot start gate
pub struct StartGate {
    state: Mutex<State>,
    arrivals: Condvar,
    release: Condvar,
}

impl StartGate {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(State {
                arrived: 0,
                status: Status::Closed,
            }),
            arrivals: Condvar::new(),
            release: Condvar::new(),
        }
    }

    /// Announce arrival and block until the gate opens
    ///
    /// Returns `false` if the gate was aborted instead.
    pub fn arrive(&self) -> bool {
        let mut state = self.state.lock();
        state.arrived += 1;
        self.arrivals.notify_one();
        while state.status == Status::Closed {
            self.release.wait(&mut state);
        }
        state.status == Status::Open
    }

    /// Wait for `expected` arrivals, then release everyone
    pub fn open_when(&self, expected: usize, timeout: Duration) -> HarnessResult<()> {
        let deadline = Instant::now() + timeout;
        let mut state = self.state.lock();
        while state.arrived < expected {
            if self.arrivals.wait_until(&mut state, deadline).timed_out()
                && state.arrived < expected
            {
                let arrived = state.arrived;
                state.status = Status::Aborted;
                self.release.notify_all();
                return Err(HarnessError::DeadlockOrHang {
                    waited: timeout,
                    completed: arrived,
                    spawned: expected,
                });
            }
        }
        state.status = Status::Open;
        self.release.notify_all();
        Ok(())
    }

    /// Release everyone without starting the run
    pub fn abort(&self) {
        let mut state = self.state.lock();
        state.status = Status::Aborted;
        self.release.notify_all();
    }

    /// Workers currently parked at (or already released from) the gate
    pub fn arrived(&self) -> usize {
        self.state.lock().arrived
    }
}

impl Default for StartGate {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::thread;

    #[test]
    fn test_releases_all_after_arrival() {
        let gate = Arc::new(StartGate::new());
        let handles: Vec<_> = (0..6)
            .map(|_| {
                let gate = gate.clone();
                thread::spawn(move || gate.arrive())
            })
            .collect();

        gate.open_when(6, Duration::from_secs(5)).unwrap();
        assert_eq!(gate.arrived(), 6);
        for handle in handles {
            assert!(handle.join().unwrap());
        }
    }

    #[test]
    fn test_abort_releases_waiters() {
        let gate = Arc::new(StartGate::new());
        let waiter = {
            let gate = gate.clone();
            thread::spawn(move || gate.arrive())
        };

        while gate.arrived() == 0 {
            thread::yield_now();
        }
        gate.abort();
        assert!(!waiter.join().unwrap());
    }

    #[test]
    fn test_missing_arrivals_time_out() {
        let gate = StartGate::new();
        let result = gate.open_when(2, Duration::from_millis(20));
        assert!(matches!(
            result,
            Err(HarnessError::DeadlockOrHang { completed: 0, spawned: 2, .. })
        ));
    }
}

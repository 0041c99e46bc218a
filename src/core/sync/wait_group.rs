/*!
 * Wait Group
 *
 * Fixed-count completion barrier for worker fan-out.
 *
 * # Design: RAII Completion Tokens
 *
 * Every `add()` hands out a `CompletionToken`. Dropping the token is the only
 * way to signal completion, so a worker signals exactly once whether it
 * returns normally, bails out with an error, or unwinds from a panic.
 */

use crate::core::errors::{HarnessError, HarnessResult};
use parking_lot::{Condvar, Mutex};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::Notify;

/// Countdown barrier with blocking and async waits
pub struct WaitGroup {
    pending: Mutex<usize>,
    condvar: Condvar,
    notify: Notify,
    spawned: AtomicUsize,
    signalled: AtomicUsize,
}

/// Signals its wait group once, on drop
#[must_use = "dropping the token immediately signals completion"]
pub struct CompletionToken {
    group: Arc<WaitGroup>,
}

impl WaitGroup {
    /// Create an empty wait group
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            pending: Mutex::new(0),
            condvar: Condvar::new(),
            notify: Notify::new(),
            spawned: AtomicUsize::new(0),
            signalled: AtomicUsize::new(0),
        })
    }

    /// Register one participant
    pub fn add(self: &Arc<Self>) -> CompletionToken {
        *self.pending.lock() += 1;
        self.spawned.fetch_add(1, Ordering::AcqRel);
        CompletionToken {
            group: Arc::clone(self),
        }
    }

    fn done(&self) {
        let mut pending = self.pending.lock();
        debug_assert!(*pending > 0, "wait group signalled more times than added");
        *pending = pending.saturating_sub(1);
        self.signalled.fetch_add(1, Ordering::AcqRel);
        if *pending == 0 {
            self.condvar.notify_all();
            self.notify.notify_waiters();
        }
    }

    /// Participants that have not signalled yet
    #[inline]
    pub fn pending(&self) -> usize {
        *self.pending.lock()
    }

    /// Total `add()` calls
    #[inline]
    pub fn spawned(&self) -> usize {
        self.spawned.load(Ordering::Acquire)
    }

    /// Total completion signals received
    #[inline]
    pub fn signalled(&self) -> usize {
        self.signalled.load(Ordering::Acquire)
    }

    fn hang(&self, waited: Duration) -> HarnessError {
        HarnessError::DeadlockOrHang {
            waited,
            completed: self.signalled(),
            spawned: self.spawned(),
        }
    }

    /// Block until every participant has signalled
    ///
    /// Returns `DeadlockOrHang` if the bound elapses first.
    pub fn wait_timeout(&self, timeout: Duration) -> HarnessResult<()> {
        let deadline = Instant::now() + timeout;
        let mut pending = self.pending.lock();
        while *pending > 0 {
            if self.condvar.wait_until(&mut pending, deadline).timed_out() && *pending > 0 {
                drop(pending);
                return Err(self.hang(timeout));
            }
        }
        Ok(())
    }

    /// Async variant of [`WaitGroup::wait_timeout`]
    pub async fn wait_async(&self, timeout: Duration) -> HarnessResult<()> {
        let drained = async {
            loop {
                let notified = self.notify.notified();
                tokio::pin!(notified);
                // Register before checking so a final done() between the check
                // and the await is not missed.
                notified.as_mut().enable();
                if self.pending() == 0 {
                    return;
                }
                notified.await;
            }
        };

        tokio::time::timeout(timeout, drained)
            .await
            .map_err(|_| self.hang(timeout))
    }
}

impl Drop for CompletionToken {
    fn drop(&mut self) {
        self.group.done();
    }
}

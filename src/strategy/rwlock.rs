/*!
 * Read/Write Lock Strategy
 *
 * Multiple readers may hold the lock at once; a writer excludes everyone.
 * No fairness guarantee beyond what `parking_lot::RwLock` provides.
 */

use super::config::StrategyKind;
use super::traits::{self, SharedState, Table};
use crate::core::errors::HarnessResult;
use crate::core::types::{Key, Mutation, Value};
use parking_lot::RwLock;

/// Map guarded by a `parking_lot::RwLock`
///
/// - `mutate` takes the exclusive write lock
/// - `read` and `len` take the shared read lock
///
/// Readers never observe a partially applied mutation.
pub struct RwLockState {
    table: RwLock<Table>,
}

impl RwLockState {
    pub fn new<I>(keys: I) -> Self
    where
        I: IntoIterator<Item = Key>,
    {
        Self {
            table: RwLock::new(traits::seeded_table(keys)),
        }
    }

    /// Run `f` while holding the shared read lock
    pub fn observe<F, R>(&self, f: F) -> R
    where
        F: FnOnce(&Table) -> R,
    {
        let table = self.table.read();
        f(&table)
    }
}

impl SharedState for RwLockState {
    #[inline]
    fn mutate(&self, key: &Key, mutation: Mutation) -> HarnessResult<()> {
        let mut table = self.table.write();
        traits::apply(&mut table, key, mutation);
        Ok(())
    }

    #[inline]
    fn read(&self, key: &Key) -> HarnessResult<Option<Value>> {
        Ok(self.table.read().get(key).copied())
    }

    fn len(&self) -> HarnessResult<usize> {
        Ok(self.table.read().len())
    }

    fn kind(&self) -> StrategyKind {
        StrategyKind::ReadWriteLock
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::panic::{self, AssertUnwindSafe};
    use std::sync::mpsc;
    use std::sync::Arc;
    use std::thread;
    use std::time::Duration;

    #[test]
    fn test_reader_does_not_block_reader() {
        let state = Arc::new(RwLockState::new([Key::from("a")]));
        let (entered_tx, entered_rx) = mpsc::channel();
        let (release_tx, release_rx) = mpsc::channel::<()>();

        let holder = {
            let state = state.clone();
            thread::spawn(move || {
                state.observe(|_| {
                    entered_tx.send(()).unwrap();
                    release_rx.recv_timeout(Duration::from_secs(5)).is_ok()
                })
            })
        };

        entered_rx.recv().unwrap();
        // Shared lock is held by `holder`; these must not wait for it
        assert_eq!(state.read(&Key::from("a")).unwrap(), Some(0));
        assert_eq!(state.len().unwrap(), 1);
        release_tx.send(()).unwrap();

        assert!(holder.join().unwrap(), "reader blocked behind another reader");
    }

    #[test]
    fn test_read_lock_released_after_panic() {
        let state = RwLockState::new(std::iter::empty());
        let result = panic::catch_unwind(AssertUnwindSafe(|| {
            state.observe(|_| panic!("fault while reading"))
        }));
        assert!(result.is_err());

        state.mutate(&Key::from(1), Mutation::Set(3)).unwrap();
        assert_eq!(state.read(&Key::from(1)).unwrap(), Some(3));
    }
}

/*!
 * Exclusive Lock Strategy
 * One mutex serializes every access to the structure
 */

use super::config::StrategyKind;
use super::traits::{self, SharedState, Table};
use crate::core::errors::HarnessResult;
use crate::core::types::{Key, Mutation, Value};
use parking_lot::Mutex;

/// Map guarded by a single `parking_lot::Mutex`
///
/// Every mutation, read and length query takes the same lock, giving a total
/// order over all accesses. Readers serialize behind writers and each other.
///
/// Guards are scoped: the lock is released when the guard drops, including
/// during unwinding. `parking_lot` does not poison, so a panic inside a
/// critical section leaves the lock usable.
pub struct ExclusiveLockState {
    table: Mutex<Table>,
}

impl ExclusiveLockState {
    pub fn new<I>(keys: I) -> Self
    where
        I: IntoIterator<Item = Key>,
    {
        Self {
            table: Mutex::new(traits::seeded_table(keys)),
        }
    }

    /// Run `f` while holding the lock
    pub fn observe<F, R>(&self, f: F) -> R
    where
        F: FnOnce(&Table) -> R,
    {
        let table = self.table.lock();
        f(&table)
    }
}

impl SharedState for ExclusiveLockState {
    #[inline]
    fn mutate(&self, key: &Key, mutation: Mutation) -> HarnessResult<()> {
        let mut table = self.table.lock();
        traits::apply(&mut table, key, mutation);
        Ok(())
    }

    #[inline]
    fn read(&self, key: &Key) -> HarnessResult<Option<Value>> {
        Ok(self.table.lock().get(key).copied())
    }

    fn len(&self) -> HarnessResult<usize> {
        Ok(self.table.lock().len())
    }

    fn kind(&self) -> StrategyKind {
        StrategyKind::ExclusiveLock
    }
}

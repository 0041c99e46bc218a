/*!
 * Unsynchronized Strategy
 *
 * Shared state with no coordination at all. This variant exists to show the
 * failure modes the other strategies prevent:
 * - Counters lose updates when two read-modify-write sequences interleave
 * - Maps report a structural fault when two accesses overlap
 */

use super::config::StrategyKind;
use super::traits::{self, SharedState, Table};
use crate::core::errors::{HarnessError, HarnessResult};
use crate::core::sync::SlotTable;
use crate::core::types::{Key, Mutation, Value};
use parking_lot::Mutex;
use std::sync::atomic::Ordering;

const KIND: StrategyKind = StrategyKind::Unsynchronized;

/// Counters whose increment is a separate load and store
///
/// `fetch_add` would make the increment indivisible. Here the value is read,
/// the new value computed, and the result written back as three steps, so a
/// concurrent writer between the load and the store is silently overwritten.
pub struct TornCounters {
    slots: SlotTable,
}

impl TornCounters {
    pub fn new<I>(keys: I) -> Self
    where
        I: IntoIterator<Item = Key>,
    {
        Self {
            slots: SlotTable::new(keys),
        }
    }

    fn mutate(&self, key: &Key, mutation: Mutation) -> HarnessResult<()> {
        let cell = self.slots.slot(key).ok_or_else(|| HarnessError::UnknownKey {
            strategy: KIND,
            key: key.clone(),
        })?;
        let current = cell.load(Ordering::Relaxed);
        // Window between read and write-back
        std::hint::spin_loop();
        cell.store(mutation.apply(current), Ordering::Relaxed);
        Ok(())
    }

    fn read(&self, key: &Key) -> Option<Value> {
        self.slots.slot(key).map(|cell| cell.load(Ordering::Relaxed))
    }
}

/// Map that never waits for another accessor
///
/// A plain `HashMap` cannot be mutated from two threads at once in safe Rust,
/// and doing it through `unsafe` would be undefined behaviour rather than a
/// reproducible fault. This map instead claims the table without waiting:
/// when the claim fails because another worker is mid-access, the overlap is
/// reported as a structural fault, the way a runtime with concurrent-write
/// detection aborts on "concurrent map writes". No entry is ever lost
/// silently; either the write lands or the run faults.
pub struct UnguardedMap {
    table: Mutex<Table>,
}

impl UnguardedMap {
    pub fn new() -> Self {
        Self {
            table: Mutex::new(traits::seeded_table(std::iter::empty())),
        }
    }

    fn claim(&self, access: &'static str) -> HarnessResult<parking_lot::MutexGuard<'_, Table>> {
        self.table
            .try_lock()
            .ok_or_else(|| HarnessError::structural(KIND, access))
    }

    fn mutate(&self, key: &Key, mutation: Mutation) -> HarnessResult<()> {
        let mut table = self.claim("concurrent map writes")?;
        traits::apply(&mut table, key, mutation);
        Ok(())
    }

    fn read(&self, key: &Key) -> HarnessResult<Option<Value>> {
        Ok(self.claim("concurrent map read and map write")?.get(key).copied())
    }

    fn len(&self) -> HarnessResult<usize> {
        Ok(self.claim("concurrent map read and map write")?.len())
    }
}

impl Default for UnguardedMap {
    fn default() -> Self {
        Self::new()
    }
}

/// Unsynchronized state (enum dispatch over the two shapes)
pub enum UnsynchronizedState {
    Counters(TornCounters),
    Map(UnguardedMap),
}

impl UnsynchronizedState {
    /// Counter state laid out for a fixed key set
    pub fn counters<I>(keys: I) -> Self
    where
        I: IntoIterator<Item = Key>,
    {
        Self::Counters(TornCounters::new(keys))
    }

    /// Empty map state
    pub fn map() -> Self {
        Self::Map(UnguardedMap::new())
    }
}

impl SharedState for UnsynchronizedState {
    #[inline]
    fn mutate(&self, key: &Key, mutation: Mutation) -> HarnessResult<()> {
        match self {
            Self::Counters(c) => c.mutate(key, mutation),
            Self::Map(m) => m.mutate(key, mutation),
        }
    }

    fn read(&self, key: &Key) -> HarnessResult<Option<Value>> {
        match self {
            Self::Counters(c) => Ok(c.read(key)),
            Self::Map(m) => m.read(key),
        }
    }

    fn len(&self) -> HarnessResult<usize> {
        match self {
            Self::Counters(c) => Ok(c.slots.len()),
            Self::Map(m) => m.len(),
        }
    }

    fn kind(&self) -> StrategyKind {
        KIND
    }
}

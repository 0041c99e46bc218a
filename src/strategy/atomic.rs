/*!
 * Atomic Strategy
 * Lock-free counters built on hardware fetch-add
 */

use super::config::StrategyKind;
use super::traits::SharedState;
use crate::core::errors::{HarnessError, HarnessResult};
use crate::core::sync::SlotTable;
use crate::core::types::{Key, Mutation, Value};
use std::sync::atomic::Ordering;

/// Counters backed by one padded `AtomicU64` per key
///
/// # Performance
///
/// - **Never blocks**: every mutation is a single `fetch_add` or `store`
/// - **No false sharing**: each key owns a cache line
///
/// Only fixed-size scalars can be updated atomically, so the key set is
/// fixed at construction. Inserting a new key is rejected, which is why this
/// variant does not support the key/value map shape.
pub struct AtomicState {
    slots: SlotTable,
}

impl AtomicState {
    pub fn new<I>(keys: I) -> Self
    where
        I: IntoIterator<Item = Key>,
    {
        Self {
            slots: SlotTable::new(keys),
        }
    }
}

impl SharedState for AtomicState {
    #[inline]
    fn mutate(&self, key: &Key, mutation: Mutation) -> HarnessResult<()> {
        let cell = self.slots.slot(key).ok_or_else(|| HarnessError::UnknownKey {
            strategy: StrategyKind::Atomic,
            key: key.clone(),
        })?;
        // Relaxed is enough for counting; the driver's completion barrier
        // orders these writes before the final read.
        match mutation {
            Mutation::Add(delta) => {
                cell.fetch_add(delta, Ordering::Relaxed);
            }
            Mutation::Set(value) => cell.store(value, Ordering::Relaxed),
        }
        Ok(())
    }

    #[inline]
    fn read(&self, key: &Key) -> HarnessResult<Option<Value>> {
        Ok(self.slots.slot(key).map(|cell| cell.load(Ordering::Acquire)))
    }

    fn len(&self) -> HarnessResult<usize> {
        Ok(self.slots.len())
    }

    fn kind(&self) -> StrategyKind {
        StrategyKind::Atomic
    }
}

/*!
 * Shared State Contract
 *
 * Every synchronization strategy exposes the same three operations:
 * `mutate`, `read` and `len`. The driver only ever talks to this trait.
 */

use super::config::StrategyKind;
use crate::core::errors::HarnessResult;
use crate::core::types::{Key, Mutation, Value};
use std::collections::HashMap;
use std::hash::BuildHasher;

/// Backing table for the lock-based strategies
pub type Table = HashMap<Key, Value, ahash::RandomState>;

/// Shared counter/map protected by one synchronization policy
///
/// Implementations must be:
/// - **Thread-safe**: `&self` methods called from any number of workers
/// - **I/O free**: side effects confined to the structure itself
///
/// Each call is atomic only as far as the strategy guarantees it; no
/// implementation offers transactions spanning several calls.
///
/// Methods are fallible so that the unsynchronized variant can surface a
/// structural fault instead of silently corrupting state.
pub trait SharedState: Send + Sync {
    /// Apply one mutation to `key`
    fn mutate(&self, key: &Key, mutation: Mutation) -> HarnessResult<()>;

    /// Current value under `key`
    fn read(&self, key: &Key) -> HarnessResult<Option<Value>>;

    /// Number of keys held
    fn len(&self) -> HarnessResult<usize>;

    /// Which variant this is
    fn kind(&self) -> StrategyKind;

    fn is_empty(&self) -> HarnessResult<bool> {
        Ok(self.len()? == 0)
    }
}

/// Apply a mutation to a plain table (caller holds whatever guard is needed)
#[inline]
pub(crate) fn apply(table: &mut HashMap<Key, Value, impl BuildHasher>, key: &Key, mutation: Mutation) {
    match table.get_mut(key) {
        Some(value) => *value = mutation.apply(*value),
        None => {
            table.insert(key.clone(), mutation.apply(0));
        }
    }
}

/// Table pre-seeded with zeroed keys
pub(crate) fn seeded_table<I>(keys: I) -> Table
where
    I: IntoIterator<Item = Key>,
{
    let mut table = Table::with_hasher(ahash::RandomState::new());
    table.extend(keys.into_iter().map(|key| (key, 0)));
    table
}

/*!
 * Concurrent Builtin Strategy
 *
 * Internally synchronized map; callers never take a lock themselves.
 *
 * # Design: Enum Dispatch over Backends
 *
 * Both backends shard internally. `DashMap` locks one shard per call; the
 * striped backend does the same with explicit `RwLock<HashMap>` stripes.
 * Either way each call is atomic and nothing spans two calls.
 */

use super::config::{ConcurrentBackend, StrategyKind, StrategyOptions};
use super::traits::SharedState;
use crate::core::errors::HarnessResult;
use crate::core::sync::StripedMap;
use crate::core::types::{Key, Mutation, Value};
use dashmap::DashMap;

enum Backend {
    Dash(DashMap<Key, Value, ahash::RandomState>),
    Striped(StripedMap<Key, Value>),
}

/// Concurrent map with per-call atomicity
pub struct ConcurrentState {
    backend: Backend,
}

impl ConcurrentState {
    /// Build with the backend selected in `options`
    pub fn new<I>(keys: I, options: &StrategyOptions) -> HarnessResult<Self>
    where
        I: IntoIterator<Item = Key>,
    {
        let backend = match options.backend {
            ConcurrentBackend::DashMap => {
                let map = DashMap::with_hasher(ahash::RandomState::new());
                for key in keys {
                    map.insert(key, 0);
                }
                Backend::Dash(map)
            }
            ConcurrentBackend::Striped => {
                let map = StripedMap::new(options.stripe_count)?;
                for key in keys {
                    map.upsert(key, |_| 0);
                }
                Backend::Striped(map)
            }
        };
        Ok(Self { backend })
    }

    /// Which backend is active
    pub fn backend(&self) -> ConcurrentBackend {
        match self.backend {
            Backend::Dash(_) => ConcurrentBackend::DashMap,
            Backend::Striped(_) => ConcurrentBackend::Striped,
        }
    }
}

impl SharedState for ConcurrentState {
    #[inline]
    fn mutate(&self, key: &Key, mutation: Mutation) -> HarnessResult<()> {
        match &self.backend {
            Backend::Dash(map) => match map.get_mut(key) {
                Some(mut value) => *value = mutation.apply(*value),
                None => {
                    // entry() holds the shard lock across check and insert
                    let mut value = map.entry(key.clone()).or_insert(0);
                    *value = mutation.apply(*value);
                }
            },
            Backend::Striped(map) => {
                map.upsert(key.clone(), |current| mutation.apply(current.copied().unwrap_or(0)))
            }
        }
        Ok(())
    }

    #[inline]
    fn read(&self, key: &Key) -> HarnessResult<Option<Value>> {
        Ok(match &self.backend {
            Backend::Dash(map) => map.get(key).map(|value| *value),
            Backend::Striped(map) => map.get(key, |value| *value),
        })
    }

    fn len(&self) -> HarnessResult<usize> {
        Ok(match &self.backend {
            Backend::Dash(map) => map.len(),
            Backend::Striped(map) => map.len(),
        })
    }

    fn kind(&self) -> StrategyKind {
        StrategyKind::ConcurrentBuiltin
    }
}

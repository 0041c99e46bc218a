/*!
 * Lock Striping Pattern
 * Reduces contention by partitioning the key space across independent locks
 */

use crate::core::errors::{HarnessError, HarnessResult};
use parking_lot::RwLock;
use std::collections::HashMap;
use std::hash::Hash;

type Stripe<K, V> = RwLock<HashMap<K, V, ahash::RandomState>>;

/// Lock-striped hash map
///
/// # Performance
///
/// - **Contention reduction**: N-way striping reduces lock contention by ~N
/// - **Typical stripe count**: 16-64 (balance between memory and contention)
///
/// Each call touches exactly one stripe, so every individual operation is
/// atomic. Nothing spans two calls.
pub struct StripedMap<K, V> {
    stripes: Box<[Stripe<K, V>]>,
    stripe_mask: usize,
    hasher: ahash::RandomState,
}

impl<K: Hash + Eq, V> StripedMap<K, V> {
    /// Create new striped map with specified stripe count
    ///
    /// `stripe_count` must be a non-zero power of 2.
    pub fn new(stripe_count: usize) -> HarnessResult<Self> {
        if stripe_count == 0 || !stripe_count.is_power_of_two() {
            return Err(HarnessError::config(format!(
                "stripe count must be a power of 2, got {}",
                stripe_count
            )));
        }

        let hasher = ahash::RandomState::new();
        let stripes = (0..stripe_count)
            .map(|_| RwLock::new(HashMap::with_hasher(hasher.clone())))
            .collect();

        Ok(Self {
            stripes,
            stripe_mask: stripe_count - 1,
            hasher,
        })
    }

    #[inline]
    fn stripe(&self, key: &K) -> &Stripe<K, V> {
        let idx = (self.hasher.hash_one(key) as usize) & self.stripe_mask;
        &self.stripes[idx]
    }

    /// Number of stripes
    #[inline]
    pub fn stripe_count(&self) -> usize {
        self.stripes.len()
    }

    /// Insert or update under the stripe's write lock
    ///
    /// `f` receives the current value (`None` if absent) and returns the new one.
    pub fn upsert<F>(&self, key: K, f: F)
    where
        F: FnOnce(Option<&V>) -> V,
    {
        let mut stripe = self.stripe(&key).write();
        let next = f(stripe.get(&key));
        stripe.insert(key, next);
    }

    /// Get value by key (read lock only)
    pub fn get<F, R>(&self, key: &K, f: F) -> Option<R>
    where
        F: FnOnce(&V) -> R,
    {
        self.stripe(key).read().get(key).map(f)
    }

    /// Get total number of entries across all stripes
    ///
    /// Stripes are summed one at a time, so under concurrent writes this is a
    /// moving total. After quiescence it is exact.
    pub fn len(&self) -> usize {
        self.stripes.iter().map(|stripe| stripe.read().len()).sum()
    }

    /// Check if empty
    pub fn is_empty(&self) -> bool {
        self.stripes.iter().all(|stripe| stripe.read().is_empty())
    }
}

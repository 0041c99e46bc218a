/*!
 * Fixed Slot Table
 * Cache-line padded atomic cells addressed by a key set fixed at construction
 */

use crate::core::limits::CACHE_LINE_SIZE;
use crate::core::types::Key;
use std::collections::HashMap;
use std::sync::atomic::AtomicU64;

/// One atomic cell per cache line
#[repr(align(64))]
#[derive(Default)]
pub struct Slot(pub AtomicU64);

const _: () = assert!(std::mem::align_of::<Slot>() == CACHE_LINE_SIZE);

/// Key → cell table whose layout never changes after construction
///
/// The index is immutable, so lookups need no synchronization; only the
/// cells themselves are shared mutable state.
pub struct SlotTable {
    index: HashMap<Key, usize, ahash::RandomState>,
    slots: Box<[Slot]>,
}

impl SlotTable {
    /// Lay out one zeroed slot per distinct key
    pub fn new<I>(keys: I) -> Self
    where
        I: IntoIterator<Item = Key>,
    {
        let mut index = HashMap::with_hasher(ahash::RandomState::new());
        for key in keys {
            let next = index.len();
            index.entry(key).or_insert(next);
        }
        let slots = (0..index.len()).map(|_| Slot::default()).collect();
        Self { index, slots }
    }

    /// Slot for `key`, if it is part of the layout
    #[inline(always)]
    pub fn slot(&self, key: &Key) -> Option<&AtomicU64> {
        self.index.get(key).map(|&i| &self.slots[i].0)
    }

    /// Number of keys in the layout
    #[inline]
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }
}

/*!
 * Synchronization Strategies
 *
 * Interchangeable policies for protecting one shared counter/map from many
 * concurrent workers:
 * - **Unsynchronized**: no coordination (demonstrates lost updates and faults)
 * - **Atomic**: hardware fetch-add on fixed scalar slots
 * - **ExclusiveLock**: one mutex around everything
 * - **ReadWriteLock**: shared readers, exclusive writers
 * - **ConcurrentBuiltin**: internally sharded concurrent map
 *
 * # Lifecycle
 *
 * Created → Active (workers mutating) → Quiesced (all workers returned) →
 * Read (final state inspected). Instances are built fresh for every run by
 * [`build`] and never reused.
 */

mod atomic;
mod concurrent;
mod config;
mod exclusive;
mod rwlock;
mod traits;
mod unsynchronized;

pub use atomic::AtomicState;
pub use concurrent::ConcurrentState;
pub use config::{ConcurrentBackend, StrategyKind, StrategyOptions, TargetShape};
pub use exclusive::ExclusiveLockState;
pub use rwlock::RwLockState;
pub use traits::{SharedState, Table};
pub use unsynchronized::{TornCounters, UnguardedMap, UnsynchronizedState};

use crate::core::errors::{HarnessError, HarnessResult};
use crate::workload::Workload;
use std::sync::Arc;

/// Construct a fresh strategy instance sized for `workload`
///
/// Counter keys are laid out (and zeroed) up front; map workloads start
/// empty. Atomic state cannot hold a key/value map and is rejected.
pub fn build(
    kind: StrategyKind,
    workload: &Workload,
    options: &StrategyOptions,
) -> HarnessResult<Arc<dyn SharedState>> {
    let shape = workload.shape();
    if !kind.supports(shape) {
        return Err(HarnessError::UnsupportedShape {
            strategy: kind,
            shape,
        });
    }

    let keys = workload.keys();
    let state: Arc<dyn SharedState> = match kind {
        StrategyKind::Unsynchronized => match shape {
            TargetShape::ScalarCounter => Arc::new(UnsynchronizedState::counters(keys)),
            TargetShape::KeyValueMap => Arc::new(UnsynchronizedState::map()),
        },
        StrategyKind::Atomic => Arc::new(AtomicState::new(keys)),
        StrategyKind::ExclusiveLock => Arc::new(ExclusiveLockState::new(keys)),
        StrategyKind::ReadWriteLock => Arc::new(RwLockState::new(keys)),
        StrategyKind::ConcurrentBuiltin => Arc::new(ConcurrentState::new(keys, options)?),
    };

    tracing::debug!(strategy = %kind, shape = %shape, "Strategy created");
    Ok(state)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_every_supported_pair() {
        for shape in TargetShape::ALL {
            let workload = Workload::for_shape(shape, 2, 3).unwrap();
            for kind in StrategyKind::ALL {
                let built = build(kind, &workload, &StrategyOptions::default());
                if kind.supports(shape) {
                    let state = built.unwrap();
                    assert_eq!(state.kind(), kind);
                    assert_eq!(state.len().unwrap(), workload.keys().len());
                } else {
                    assert!(matches!(built, Err(HarnessError::UnsupportedShape { .. })));
                }
            }
        }
    }
}

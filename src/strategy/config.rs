/*!
 * Strategy Configuration
 *
 * Variant and shape selection for a run
 */

use crate::core::errors::HarnessError;
use crate::core::limits::DEFAULT_STRIPE_COUNT;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Synchronization strategy selection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StrategyKind {
    /// No coordination (lost updates and structural faults expected)
    Unsynchronized,
    /// Hardware fetch-add on fixed scalar slots
    Atomic,
    /// One mutex around the whole structure
    ExclusiveLock,
    /// Shared reads, exclusive writes
    #[serde(rename = "rw_lock")]
    ReadWriteLock,
    /// Internally synchronized concurrent map
    ConcurrentBuiltin,
}

impl StrategyKind {
    /// Every variant, in reporting order
    pub const ALL: [StrategyKind; 5] = [
        StrategyKind::Unsynchronized,
        StrategyKind::Atomic,
        StrategyKind::ExclusiveLock,
        StrategyKind::ReadWriteLock,
        StrategyKind::ConcurrentBuiltin,
    ];

    pub const fn as_str(self) -> &'static str {
        match self {
            StrategyKind::Unsynchronized => "unsynchronized",
            StrategyKind::Atomic => "atomic",
            StrategyKind::ExclusiveLock => "exclusive_lock",
            StrategyKind::ReadWriteLock => "rw_lock",
            StrategyKind::ConcurrentBuiltin => "concurrent_builtin",
        }
    }

    /// Whether the final state is guaranteed to match the expectation
    #[inline]
    pub const fn is_synchronized(self) -> bool {
        !matches!(self, StrategyKind::Unsynchronized)
    }

    /// Whether this variant can hold state of the given shape
    #[inline]
    pub const fn supports(self, shape: TargetShape) -> bool {
        !matches!(
            (self, shape),
            (StrategyKind::Atomic, TargetShape::KeyValueMap)
        )
    }
}

impl fmt::Display for StrategyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for StrategyKind {
    type Err = HarnessError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "unsynchronized" | "unsync" | "none" => Ok(StrategyKind::Unsynchronized),
            "atomic" => Ok(StrategyKind::Atomic),
            "exclusive_lock" | "mutex" => Ok(StrategyKind::ExclusiveLock),
            "rw_lock" | "rwlock" => Ok(StrategyKind::ReadWriteLock),
            "concurrent_builtin" | "concurrent" | "dashmap" => {
                Ok(StrategyKind::ConcurrentBuiltin)
            }
            other => Err(HarnessError::config(format!("unknown strategy '{}'", other))),
        }
    }
}

/// Shape of the shared state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TargetShape {
    /// Counter(s) under a small fixed key set
    ScalarCounter,
    /// Map written with globally unique keys
    KeyValueMap,
}

impl TargetShape {
    pub const ALL: [TargetShape; 2] = [TargetShape::ScalarCounter, TargetShape::KeyValueMap];

    pub const fn as_str(self) -> &'static str {
        match self {
            TargetShape::ScalarCounter => "scalar_counter",
            TargetShape::KeyValueMap => "key_value_map",
        }
    }
}

impl fmt::Display for TargetShape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TargetShape {
    type Err = HarnessError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "scalar_counter" | "counter" => Ok(TargetShape::ScalarCounter),
            "key_value_map" | "map" => Ok(TargetShape::KeyValueMap),
            other => Err(HarnessError::config(format!("unknown shape '{}'", other))),
        }
    }
}

/// Backend behind the concurrent builtin strategy
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConcurrentBackend {
    /// Sharded `DashMap`
    DashMap,
    /// Lock-striped `HashMap`s
    Striped,
}

impl FromStr for ConcurrentBackend {
    type Err = HarnessError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "dashmap" | "dash_map" => Ok(ConcurrentBackend::DashMap),
            "striped" => Ok(ConcurrentBackend::Striped),
            other => Err(HarnessError::config(format!("unknown backend '{}'", other))),
        }
    }
}

/// Construction options for strategies
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StrategyOptions {
    pub backend: ConcurrentBackend,
    /// Stripe count for [`ConcurrentBackend::Striped`] (power of 2)
    pub stripe_count: usize,
}

impl Default for StrategyOptions {
    fn default() -> Self {
        Self {
            backend: ConcurrentBackend::DashMap,
            stripe_count: DEFAULT_STRIPE_COUNT,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_round_trips_display() {
        for kind in StrategyKind::ALL {
            assert_eq!(kind.to_string().parse::<StrategyKind>().unwrap(), kind);
        }
        for shape in TargetShape::ALL {
            assert_eq!(shape.to_string().parse::<TargetShape>().unwrap(), shape);
        }
    }

    #[test]
    fn test_parse_aliases() {
        assert_eq!("Mutex".parse::<StrategyKind>().unwrap(), StrategyKind::ExclusiveLock);
        assert_eq!("rwlock".parse::<StrategyKind>().unwrap(), StrategyKind::ReadWriteLock);
        assert_eq!("map".parse::<TargetShape>().unwrap(), TargetShape::KeyValueMap);
        assert!("spinlock".parse::<StrategyKind>().is_err());
    }

    #[test]
    fn test_atomic_is_counter_only() {
        assert!(StrategyKind::Atomic.supports(TargetShape::ScalarCounter));
        assert!(!StrategyKind::Atomic.supports(TargetShape::KeyValueMap));
        assert!(StrategyKind::Unsynchronized.supports(TargetShape::KeyValueMap));
    }

    #[test]
    fn test_serde_names() {
        assert_eq!(
            serde_json::to_string(&StrategyKind::ConcurrentBuiltin).unwrap(),
            "\"concurrent_builtin\""
        );
        assert_eq!(
            serde_json::to_string(&TargetShape::ScalarCounter).unwrap(),
            "\"scalar_counter\""
        );
    }
}

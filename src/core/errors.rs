/*!
 * Error Types
 * Centralized error handling with thiserror, miette, and serde support
 */

use super::data_structures::InlineString;
use super::types::{Key, Value};
use crate::strategy::{StrategyKind, TargetShape};
use miette::Diagnostic;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;

/// Harness errors with serialization support
///
/// None of these are retried. The harness exists to surface concurrency
/// defects, so each variant travels unchanged to the caller.
#[derive(Error, Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Diagnostic)]
#[serde(tag = "error_type", content = "details", rename_all = "snake_case")]
pub enum HarnessError {
    #[error("{strategy} diverged at {target}: expected {expected}, observed {observed}")]
    #[diagnostic(
        code(harness::correctness_violation),
        help("Only the unsynchronized strategy may lose updates. Any other strategy diverging is a bug.")
    )]
    CorrectnessViolation {
        strategy: StrategyKind,
        target: InlineString,
        expected: Value,
        observed: Value,
    },

    #[error("Structural fault in {strategy}: {detail}")]
    #[diagnostic(
        code(harness::structural_fault),
        help("Shared structure was mutated concurrently without coordination. The run is void.")
    )]
    StructuralFault {
        strategy: StrategyKind,
        detail: InlineString,
    },

    #[error("Workers did not finish within {waited:?}: {completed}/{spawned} signalled")]
    #[diagnostic(
        code(harness::deadlock_or_hang),
        help("A worker is stuck, most likely on a lock that was never released.")
    )]
    DeadlockOrHang {
        waited: Duration,
        completed: usize,
        spawned: usize,
    },

    #[error("{strategy} cannot hold {shape} state")]
    #[diagnostic(
        code(harness::unsupported_shape),
        help("Atomic primitives operate on fixed-size scalars. Use a lock or concurrent map for key/value state.")
    )]
    UnsupportedShape {
        strategy: StrategyKind,
        shape: TargetShape,
    },

    #[error("Key {key} is not part of the {strategy} layout")]
    #[diagnostic(
        code(harness::unknown_key),
        help("Atomic slots are laid out from the workload's key set at construction.")
    )]
    UnknownKey { strategy: StrategyKind, key: Key },

    #[error("Configuration error: {0}")]
    #[diagnostic(
        code(harness::configuration_error),
        help("Review the HARNESS_* environment variables.")
    )]
    Configuration(InlineString),

    #[error("Failed to spawn worker {worker}: {reason}")]
    #[diagnostic(
        code(harness::worker_spawn),
        help("Check thread limits (ulimit -u) and available memory.")
    )]
    WorkerSpawn { worker: usize, reason: InlineString },

    #[error("Internal error: {0}")]
    #[diagnostic(
        code(harness::internal_error),
        help("An unexpected internal error occurred. Please report this issue.")
    )]
    Internal(InlineString),
}

impl HarnessError {
    /// Structural fault helper
    pub fn structural(strategy: StrategyKind, detail: impl Into<InlineString>) -> Self {
        HarnessError::StructuralFault {
            strategy,
            detail: detail.into(),
        }
    }

    /// Configuration error helper
    pub fn config(msg: impl Into<InlineString>) -> Self {
        HarnessError::Configuration(msg.into())
    }

    /// Whether this error is the documented outcome of an unsynchronized run
    /// rather than a defect in the harness
    pub fn is_expected_race(&self) -> bool {
        matches!(
            self,
            HarnessError::CorrectnessViolation {
                strategy: StrategyKind::Unsynchronized,
                ..
            } | HarnessError::StructuralFault {
                strategy: StrategyKind::Unsynchronized,
                ..
            }
        )
    }
}

/// Result type for harness operations
pub type HarnessResult<T> = std::result::Result<T, HarnessError>;

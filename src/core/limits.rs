/*!
 * Harness Limits and Constants
 *
 * Centralized location for run sizes, timeouts and layout constants.
 * Organized by domain for maintainability and discoverability.
 */

use std::time::Duration;

// =============================================================================
// WORKLOAD SIZES
// =============================================================================

/// Concurrent workers per run
pub const DEFAULT_WORKER_COUNT: usize = 50;

/// Operations issued by each worker
pub const DEFAULT_OPERATIONS_PER_WORKER: usize = 1000;

/// Increments per worker in the split `{"a","b"}` counter scenario
pub const SPLIT_COUNTER_INCREMENTS: usize = 10_000;

/// Runs per strategy/shape pair
pub const DEFAULT_REPETITIONS: usize = 1;

// =============================================================================
// DRIVER
// =============================================================================

/// Bound on waiting for every worker to signal completion
/// A run that exceeds this is reported as a deadlock or hang
pub const DEFAULT_COMPLETION_TIMEOUT: Duration = Duration::from_secs(30);

/// Prefix for worker thread names (`worker-0`, `worker-1`, ...)
pub const WORKER_THREAD_PREFIX: &str = "worker";

// =============================================================================
// CONCURRENT MAP LAYOUT
// =============================================================================

/// Default stripe count for the lock-striped backend
/// [PERF] Must be a power of 2 so the stripe index is a mask
pub const DEFAULT_STRIPE_COUNT: usize = 16;

/// Cache line size used to pad counter slots
/// [PERF] Prevents false sharing between neighbouring keys
pub const CACHE_LINE_SIZE: usize = 64;

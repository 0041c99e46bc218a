/*!
 * Harness Configuration
 *
 * Run matrix and sizing, read from `HARNESS_*` environment variables with
 * defaults from `core::limits`.
 */

use crate::core::errors::{HarnessError, HarnessResult};
use crate::core::limits::{
    DEFAULT_COMPLETION_TIMEOUT, DEFAULT_OPERATIONS_PER_WORKER, DEFAULT_REPETITIONS,
    DEFAULT_WORKER_COUNT,
};
use crate::driver::ExecutionMode;
use crate::report::OutputFormat;
use crate::strategy::{StrategyKind, StrategyOptions, TargetShape};
use crate::workload::Workload;
use std::str::FromStr;
use std::time::Duration;

/// Harness configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HarnessConfig {
    /// Concurrent workers per run
    pub worker_count: usize,
    /// Operations issued by each worker
    pub operations_per_worker: usize,
    /// Strategies to run, in order
    pub strategies: Vec<StrategyKind>,
    /// Shapes to run each strategy against
    pub shapes: Vec<TargetShape>,
    /// Run the split `{"a","b"}` counter instead of the uniform counter
    pub split_counter: bool,
    pub mode: ExecutionMode,
    /// Fresh-instance runs per strategy/shape pair
    pub repetitions: usize,
    /// Bound on waiting for workers before declaring a hang
    pub completion_timeout: Duration,
    pub strategy_options: StrategyOptions,
    pub output: OutputFormat,
}

impl Default for HarnessConfig {
    fn default() -> Self {
        Self {
            worker_count: DEFAULT_WORKER_COUNT,
            operations_per_worker: DEFAULT_OPERATIONS_PER_WORKER,
            strategies: StrategyKind::ALL.to_vec(),
            shapes: TargetShape::ALL.to_vec(),
            split_counter: false,
            mode: ExecutionMode::Threads,
            repetitions: DEFAULT_REPETITIONS,
            completion_timeout: DEFAULT_COMPLETION_TIMEOUT,
            strategy_options: StrategyOptions::default(),
            output: OutputFormat::Text,
        }
    }
}

/// Parse an optional environment variable
fn env_var<T: FromStr>(name: &str) -> HarnessResult<Option<T>> {
    match std::env::var(name) {
        Ok(raw) => raw
            .parse()
            .map(Some)
            .map_err(|_| HarnessError::config(format!("{}: invalid value '{}'", name, raw))),
        Err(_) => Ok(None),
    }
}

/// `all` or a comma-separated list
fn env_list<T>(name: &str) -> HarnessResult<Option<Vec<T>>>
where
    T: FromStr<Err = HarnessError>,
{
    match std::env::var(name) {
        Ok(raw) if raw.trim().eq_ignore_ascii_case("all") => Ok(None),
        Ok(raw) => raw
            .split(',')
            .map(str::parse)
            .collect::<HarnessResult<Vec<T>>>()
            .map(Some),
        Err(_) => Ok(None),
    }
}

impl HarnessConfig {
    /// 50 workers × 1000 increments on one scalar counter
    pub fn counter_demo() -> Self {
        Self {
            shapes: vec![TargetShape::ScalarCounter],
            ..Default::default()
        }
    }

    /// 50 workers × 1000 unique-key writes
    pub fn map_demo() -> Self {
        Self {
            shapes: vec![TargetShape::KeyValueMap],
            ..Default::default()
        }
    }

    /// Three workers splitting increments over `{"a","b"}`
    pub fn split_counter_demo() -> Self {
        Self {
            shapes: vec![TargetShape::ScalarCounter],
            split_counter: true,
            ..Default::default()
        }
    }

    /// Load from environment variables
    ///
    /// Environment variables:
    /// - HARNESS_WORKERS / HARNESS_OPERATIONS: run size
    /// - HARNESS_STRATEGY / HARNESS_SHAPE: `all` or comma-separated names
    /// - HARNESS_SPLIT_COUNTER: `1` for the `{"a","b"}` scenario
    /// - HARNESS_MODE: `threads` or `tasks`
    /// - HARNESS_REPETITIONS, HARNESS_TIMEOUT_MS
    /// - HARNESS_BACKEND (`dashmap`/`striped`), HARNESS_STRIPES
    /// - HARNESS_OUTPUT: `text` or `json`
    pub fn from_env() -> HarnessResult<Self> {
        let mut config = Self::default();

        if let Some(n) = env_var("HARNESS_WORKERS")? {
            config.worker_count = n;
        }
        if let Some(n) = env_var("HARNESS_OPERATIONS")? {
            config.operations_per_worker = n;
        }
        if let Some(list) = env_list("HARNESS_STRATEGY")? {
            config.strategies = list;
        }
        if let Some(list) = env_list("HARNESS_SHAPE")? {
            config.shapes = list;
        }
        if let Some(flag) = env_var::<String>("HARNESS_SPLIT_COUNTER")? {
            config.split_counter = flag == "1" || flag.eq_ignore_ascii_case("true");
        }
        if let Some(mode) = env_var("HARNESS_MODE")? {
            config.mode = mode;
        }
        if let Some(n) = env_var("HARNESS_REPETITIONS")? {
            config.repetitions = n;
        }
        if let Some(ms) = env_var("HARNESS_TIMEOUT_MS")? {
            config.completion_timeout = Duration::from_millis(ms);
        }
        if let Some(backend) = env_var("HARNESS_BACKEND")? {
            config.strategy_options.backend = backend;
        }
        if let Some(n) = env_var("HARNESS_STRIPES")? {
            config.strategy_options.stripe_count = n;
        }
        if let Some(output) = env_var("HARNESS_OUTPUT")? {
            config.output = output;
        }

        config.validate()?;
        Ok(config)
    }

    /// Reject configurations that cannot produce a meaningful run
    pub fn validate(&self) -> HarnessResult<()> {
        if self.worker_count == 0 {
            return Err(HarnessError::config("worker_count must be at least 1"));
        }
        if self.operations_per_worker == 0 {
            return Err(HarnessError::config("operations_per_worker must be at least 1"));
        }
        if self.repetitions == 0 {
            return Err(HarnessError::config("repetitions must be at least 1"));
        }
        if self.completion_timeout.is_zero() {
            return Err(HarnessError::config("completion timeout must be non-zero"));
        }
        if self.strategies.is_empty() || self.shapes.is_empty() {
            return Err(HarnessError::config("nothing to run"));
        }
        let stripes = self.strategy_options.stripe_count;
        if stripes == 0 || !stripes.is_power_of_two() {
            return Err(HarnessError::config(format!(
                "stripe count must be a power of 2, got {}",
                stripes
            )));
        }
        Ok(())
    }

    /// Workload for `shape` under this configuration
    pub fn workload(&self, shape: TargetShape) -> HarnessResult<Workload> {
        match shape {
            TargetShape::ScalarCounter if self.split_counter => Ok(Workload::split_counter()),
            _ => Workload::for_shape(shape, self.worker_count, self.operations_per_worker),
        }
    }

    /// Every `(strategy, shape)` pair to run, skipping unsupported pairs
    pub fn matrix(&self) -> Vec<(StrategyKind, TargetShape)> {
        self.shapes
            .iter()
            .flat_map(|&shape| {
                self.strategies
                    .iter()
                    .filter(move |kind| kind.supports(shape))
                    .map(move |&kind| (kind, shape))
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::strategy::ConcurrentBackend;

    #[test]
    fn test_defaults() {
        let config = HarnessConfig::default();
        assert_eq!(config.worker_count, 50);
        assert_eq!(config.operations_per_worker, 1000);
        assert!(config.validate().is_ok());
        assert_eq!(config.strategy_options.backend, ConcurrentBackend::DashMap);
    }

    #[test]
    fn test_validate_rejects_zero_and_bad_stripes() {
        let mut config = HarnessConfig::default();
        config.worker_count = 0;
        assert!(config.validate().is_err());

        let mut config = HarnessConfig::default();
        config.strategy_options.stripe_count = 10;
        assert!(config.validate().is_err());

        let mut config = HarnessConfig::default();
        config.completion_timeout = Duration::ZERO;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_matrix_skips_atomic_map() {
        let matrix = HarnessConfig::default().matrix();
        assert_eq!(matrix.len(), 9);
        assert!(!matrix.contains(&(StrategyKind::Atomic, TargetShape::KeyValueMap)));
        assert!(matrix.contains(&(StrategyKind::Atomic, TargetShape::ScalarCounter)));
    }

    #[test]
    fn test_split_counter_preset() {
        let config = HarnessConfig::split_counter_demo();
        let workload = config.workload(TargetShape::ScalarCounter).unwrap();
        assert_eq!(workload.worker_count(), 3);
        assert_eq!(workload.total_operations(), 30_000);

        let map = HarnessConfig::map_demo();
        assert_eq!(map.matrix().len(), 4);
    }

    #[test]
    fn test_counter_preset_workload() {
        let config = HarnessConfig::counter_demo();
        let workload = config.workload(TargetShape::ScalarCounter).unwrap();
        assert_eq!(workload.worker_count(), 50);
        assert_eq!(workload.total_operations(), 50_000);
        assert_eq!(config.matrix().len(), 5);
    }
}

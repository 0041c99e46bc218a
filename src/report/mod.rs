/*!
 * Outcome Reporting
 *
 * Compares the observed final state with the workload's closed-form
 * expectation and packages the result (plus elapsed time) for display.
 */

use crate::core::errors::{HarnessError, HarnessResult};
use crate::core::types::Value;
use crate::driver::{ExecutionMode, FinalState, RunOutcome};
use crate::strategy::{StrategyKind, TargetShape};
use crate::workload::{Expectation, Workload};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

/// Output encoding for outcome lines
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

impl FromStr for OutputFormat {
    type Err = HarnessError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "text" => Ok(OutputFormat::Text),
            "json" => Ok(OutputFormat::Json),
            other => Err(HarnessError::config(format!("unknown output format '{}'", other))),
        }
    }
}

/// Check `observed` against `expected`
///
/// Returns the first mismatch as a `CorrectnessViolation`. Counter keys are
/// checked in key order, then the length.
pub fn verify(
    strategy: StrategyKind,
    expected: &Expectation,
    observed: &FinalState,
) -> HarnessResult<()> {
    let violation = |target: String, expected: Value, observed: Value| {
        Err(HarnessError::CorrectnessViolation {
            strategy,
            target: target.into(),
            expected,
            observed,
        })
    };

    if let Expectation::Totals(totals) = expected {
        for (key, &want) in totals {
            let got = observed.values.get(key).copied().flatten().unwrap_or(0);
            if got != want {
                return violation(format!("key {}", key), want, got);
            }
        }
    }

    if observed.len != expected.len() {
        return violation("len".to_string(), expected.len() as Value, observed.len as Value);
    }
    Ok(())
}

/// How a run ended
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "verdict", content = "error", rename_all = "snake_case")]
pub enum Verdict {
    /// Final state equals the expectation
    Match,
    /// Run completed but the final state is wrong
    Diverged(HarnessError),
    /// Run did not complete
    Faulted(HarnessError),
}

impl Verdict {
    pub fn as_str(&self) -> &'static str {
        match self {
            Verdict::Match => "match",
            Verdict::Diverged(_) => "diverged",
            Verdict::Faulted(_) => "faulted",
        }
    }
}

/// Everything known about one run
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Outcome {
    pub strategy: StrategyKind,
    pub shape: TargetShape,
    pub mode: ExecutionMode,
    pub workers: usize,
    pub operations: usize,
    /// Expected total (counters) or cardinality (maps)
    pub expected: Value,
    /// Observed total or cardinality; absent if the run faulted
    pub observed: Option<Value>,
    /// Mutation phase duration; absent if the run faulted
    pub elapsed_us: Option<u64>,
    pub verdict: Verdict,
}

fn headline(expected: &Expectation) -> Value {
    match expected {
        Expectation::Totals(totals) => totals.values().sum(),
        Expectation::Cardinality(n) => *n as Value,
    }
}

fn observed_headline(shape: TargetShape, state: &FinalState) -> Value {
    match shape {
        TargetShape::ScalarCounter => state.total(),
        TargetShape::KeyValueMap => state.len as Value,
    }
}

impl Outcome {
    /// Classify a driver result against the workload's expectation
    pub fn evaluate(
        strategy: StrategyKind,
        mode: ExecutionMode,
        workload: &Workload,
        result: HarnessResult<RunOutcome>,
    ) -> Self {
        let shape = workload.shape();
        let (observed, elapsed_us, verdict) = match result {
            Ok(run) => {
                let verdict = match verify(strategy, workload.expected(), &run.final_state) {
                    Ok(()) => Verdict::Match,
                    Err(e) => Verdict::Diverged(e),
                };
                (
                    Some(observed_headline(shape, &run.final_state)),
                    Some(run.elapsed.as_micros() as u64),
                    verdict,
                )
            }
            Err(e) => (None, None, Verdict::Faulted(e)),
        };

        Self {
            strategy,
            shape,
            mode,
            workers: workload.worker_count(),
            operations: workload.total_operations(),
            expected: headline(workload.expected()),
            observed,
            elapsed_us,
            verdict,
        }
    }

    #[inline]
    pub fn elapsed(&self) -> Option<Duration> {
        self.elapsed_us.map(Duration::from_micros)
    }

    /// Fail unless this outcome is acceptable for its strategy
    ///
    /// Divergence and structural faults are the documented behaviour of the
    /// unsynchronized strategy. For every other strategy, and for harness
    /// errors such as hangs, the error is returned.
    pub fn check(&self) -> HarnessResult<()> {
        match &self.verdict {
            Verdict::Match => Ok(()),
            Verdict::Diverged(e) | Verdict::Faulted(e) if e.is_expected_race() => Ok(()),
            Verdict::Diverged(e) | Verdict::Faulted(e) => Err(e.clone()),
        }
    }
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:<18} {:<14} {:<7} expected={:<8}",
            self.strategy, self.shape, self.mode, self.expected
        )?;
        match self.observed {
            Some(observed) => write!(f, " observed={:<8}", observed)?,
            None => write!(f, " observed={:<8}", "-")?,
        }
        match self.elapsed() {
            Some(elapsed) => write!(f, " elapsed={:<12}", format!("{:?}", elapsed))?,
            None => write!(f, " elapsed={:<12}", "-")?,
        }
        match &self.verdict {
            Verdict::Match => write!(f, " match"),
            Verdict::Diverged(e) => write!(f, " diverged ({})", e),
            Verdict::Faulted(e) => write!(f, " faulted ({})", e),
        }
    }
}

/// Aggregate over repeated runs of one strategy/shape pair
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Summary {
    pub strategy: StrategyKind,
    pub shape: TargetShape,
    pub runs: usize,
    pub matched: usize,
    pub diverged: usize,
    pub faulted: usize,
    pub min_elapsed_us: Option<u64>,
    pub mean_elapsed_us: Option<u64>,
    pub max_elapsed_us: Option<u64>,
}

impl Summary {
    /// Summarize outcomes that share strategy and shape
    ///
    /// Returns `None` for an empty slice.
    pub fn from_outcomes(outcomes: &[Outcome]) -> Option<Self> {
        let first = outcomes.first()?;
        let count = |name: &str| outcomes.iter().filter(|o| o.verdict.as_str() == name).count();
        let timings: Vec<u64> = outcomes.iter().filter_map(|o| o.elapsed_us).collect();
        let mean = if timings.is_empty() {
            None
        } else {
            Some(timings.iter().sum::<u64>() / timings.len() as u64)
        };

        Some(Self {
            strategy: first.strategy,
            shape: first.shape,
            runs: outcomes.len(),
            matched: count("match"),
            diverged: count("diverged"),
            faulted: count("faulted"),
            min_elapsed_us: timings.iter().min().copied(),
            mean_elapsed_us: mean,
            max_elapsed_us: timings.iter().max().copied(),
        })
    }
}

impl fmt::Display for Summary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let us = |v: Option<u64>| v.map_or_else(|| "-".to_string(), |v| format!("{}µs", v));
        write!(
            f,
            "{:<18} {:<14} runs={} match={} diverged={} faulted={} elapsed min/mean/max={}/{}/{}",
            self.strategy,
            self.shape,
            self.runs,
            self.matched,
            self.diverged,
            self.faulted,
            us(self.min_elapsed_us),
            us(self.mean_elapsed_us),
            us(self.max_elapsed_us)
        )
    }
}

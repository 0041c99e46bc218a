/*!
 * Workload Generator
 *
 * Deterministic operation lists partitioned across a fixed number of workers.
 * The expected final state is computed in closed form at construction, before
 * anything runs, so a run can be checked without trusting the strategy.
 */

use crate::core::errors::{HarnessError, HarnessResult};
use crate::core::limits::SPLIT_COUNTER_INCREMENTS;
use crate::core::types::{Key, Mutation, Value};
use crate::strategy::TargetShape;
use serde::Serialize;
use std::collections::BTreeMap;
use std::sync::Arc;

/// Key of the single scalar counter
pub const SCALAR_KEY: Key = Key::Int(0);

/// One mutation issued by a worker
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Operation {
    pub key: Key,
    pub mutation: Mutation,
}

/// Operations owned by one worker, executed in order
///
/// The operation list is shared, so handing a plan to a worker is a
/// reference-count bump rather than a copy.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkerPlan {
    pub worker: usize,
    pub operations: Arc<[Operation]>,
}

/// Final state a correct strategy must reach
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Expectation {
    /// Exact value per counter key
    Totals(BTreeMap<Key, Value>),
    /// Number of distinct keys
    Cardinality(usize),
}

impl Expectation {
    /// Expected `len()` of the shared state
    pub fn len(&self) -> usize {
        match self {
            Expectation::Totals(totals) => totals.len(),
            Expectation::Cardinality(n) => *n,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Complete, immutable workload for one run
#[derive(Debug, Clone)]
pub struct Workload {
    shape: TargetShape,
    plans: Vec<WorkerPlan>,
    expected: Expectation,
}

fn ensure_nonzero(what: &str, n: usize) -> HarnessResult<()> {
    if n == 0 {
        return Err(HarnessError::config(format!("{} must be at least 1", what)));
    }
    Ok(())
}

impl Workload {
    /// `workers` × `increments` increments of the single scalar counter
    ///
    /// Expected total: `workers * increments`.
    pub fn counter(workers: usize, increments: usize) -> HarnessResult<Self> {
        ensure_nonzero("worker count", workers)?;
        let assignments: Vec<_> = (0..workers).map(|_| (SCALAR_KEY, increments)).collect();
        Self::keyed_counter(&assignments)
    }

    /// One worker per `(key, increments)` assignment
    pub fn keyed_counter(assignments: &[(Key, usize)]) -> HarnessResult<Self> {
        ensure_nonzero("worker count", assignments.len())?;
        for (_, increments) in assignments {
            ensure_nonzero("operations per worker", *increments)?;
        }
        Ok(Self::build_counter(assignments))
    }

    fn build_counter(assignments: &[(Key, usize)]) -> Self {
        let mut totals = BTreeMap::new();
        let mut plans = Vec::with_capacity(assignments.len());
        for (worker, (key, increments)) in assignments.iter().enumerate() {
            *totals.entry(key.clone()).or_insert(0) += *increments as Value;
            plans.push(WorkerPlan {
                worker,
                operations: vec![
                    Operation {
                        key: key.clone(),
                        mutation: Mutation::Add(1),
                    };
                    *increments
                ]
                .into(),
            });
        }

        Self {
            shape: TargetShape::ScalarCounter,
            plans,
            expected: Expectation::Totals(totals),
        }
    }

    /// Workers 0 and 1 increment `"a"`, worker 2 increments `"b"`
    ///
    /// Expected: `{"a": 20000, "b": 10000}`, length 2.
    pub fn split_counter() -> Self {
        let n = SPLIT_COUNTER_INCREMENTS;
        Self::build_counter(&[(Key::from("a"), n), (Key::from("a"), n), (Key::from("b"), n)])
    }

    /// Worker `w` writes key `w * writes + i` with value `i`
    ///
    /// Keys are globally unique, so the expected cardinality is
    /// `workers * writes`.
    pub fn unique_keys(workers: usize, writes: usize) -> HarnessResult<Self> {
        ensure_nonzero("worker count", workers)?;
        ensure_nonzero("operations per worker", writes)?;

        let plans = (0..workers)
            .map(|worker| WorkerPlan {
                worker,
                operations: (0..writes)
                    .map(|i| Operation {
                        key: Key::Int((worker * writes + i) as u64),
                        mutation: Mutation::Set(i as Value),
                    })
                    .collect(),
            })
            .collect();

        Ok(Self {
            shape: TargetShape::KeyValueMap,
            plans,
            expected: Expectation::Cardinality(workers * writes),
        })
    }

    /// Default workload for a shape
    pub fn for_shape(shape: TargetShape, workers: usize, operations: usize) -> HarnessResult<Self> {
        match shape {
            TargetShape::ScalarCounter => Self::counter(workers, operations),
            TargetShape::KeyValueMap => Self::unique_keys(workers, operations),
        }
    }

    #[inline]
    pub fn shape(&self) -> TargetShape {
        self.shape
    }

    #[inline]
    pub fn plans(&self) -> &[WorkerPlan] {
        &self.plans
    }

    #[inline]
    pub fn worker_count(&self) -> usize {
        self.plans.len()
    }

    pub fn total_operations(&self) -> usize {
        self.plans.iter().map(|plan| plan.operations.len()).sum()
    }

    #[inline]
    pub fn expected(&self) -> &Expectation {
        &self.expected
    }

    /// Keys a strategy must lay out before the run
    ///
    /// Counter keys are known up front and start at zero; map workloads
    /// start empty.
    pub fn keys(&self) -> Vec<Key> {
        match &self.expected {
            Expectation::Totals(totals) => totals.keys().cloned().collect(),
            Expectation::Cardinality(_) => Vec::new(),
        }
    }
}

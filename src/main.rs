/*!
 * Contention Harness - Main Entry Point
 *
 * Runs every configured strategy against every shape it supports:
 * - Fresh strategy instance per run
 * - One outcome line per run on stdout (text or JSON)
 * - Per-pair summary after the repetitions
 */

use contention_harness::{
    build, init_tracing, run, HarnessConfig, HarnessError, Outcome, OutputFormat, RunSpan,
    Summary,
};
use tracing::{error, info, warn};

fn main() -> miette::Result<()> {
    init_tracing();

    let config = HarnessConfig::from_env()?;
    info!(
        workers = config.worker_count,
        operations = config.operations_per_worker,
        mode = %config.mode,
        repetitions = config.repetitions,
        "Contention harness starting"
    );

    for &kind in &config.strategies {
        for &shape in &config.shapes {
            if !kind.supports(shape) {
                info!(strategy = %kind, shape = %shape, "Skipping unsupported pair");
            }
        }
    }

    let mut failures = Vec::new();
    for (kind, shape) in config.matrix() {
        let workload = config.workload(shape)?;
        let mut outcomes = Vec::with_capacity(config.repetitions);

        for _ in 0..config.repetitions {
            let run_span = RunSpan::new(kind, shape, workload.worker_count());
            let _entered = run_span.span().enter();

            let result = build(kind, &workload, &config.strategy_options)
                .and_then(|state| run(state, &workload, config.mode, config.completion_timeout));
            let outcome = Outcome::evaluate(kind, config.mode, &workload, result);

            if let Some(elapsed) = outcome.elapsed() {
                run_span.record_elapsed(elapsed);
            }
            run_span.record_result(outcome.verdict.as_str());

            match config.output {
                OutputFormat::Text => println!("{}", outcome),
                OutputFormat::Json => println!(
                    "{}",
                    serde_json::to_string(&outcome)
                        .map_err(|e| HarnessError::Internal(e.to_string().into()))?
                ),
            }

            if let Err(e) = outcome.check() {
                error!(strategy = %kind, shape = %shape, error = %e, "Run failed");
                failures.push(e);
            }
            outcomes.push(outcome);
        }

        if let Some(summary) = Summary::from_outcomes(&outcomes) {
            match config.output {
                OutputFormat::Text => println!("{}", summary),
                OutputFormat::Json => println!(
                    "{}",
                    serde_json::to_string(&summary)
                        .map_err(|e| HarnessError::Internal(e.to_string().into()))?
                ),
            }
        }
    }

    match failures.into_iter().next() {
        Some(first) => {
            warn!("At least one synchronized strategy diverged or faulted");
            Err(first.into())
        }
        None => {
            info!("All runs completed");
            Ok(())
        }
    }
}

/*!
 * Run Tracing
 * Structured tracing for harness runs using the tracing crate
 *
 * Features:
 * - Run ID generation for correlating worker events with their run
 * - JSON-formatted logs for structured parsing
 * - Elapsed time and verdict recorded on the run span
 */

use crate::strategy::{StrategyKind, TargetShape};
use std::time::Instant;
use tracing::{debug, info, span, Level};
use tracing_subscriber::{
    fmt::format::FmtSpan, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter,
};
use uuid::Uuid;

/// Initialize structured tracing
///
/// Logs go to stderr so stdout carries only outcome lines.
///
/// Environment variables:
/// - RUST_LOG: Set log level (default: info)
/// - HARNESS_TRACE_JSON: Enable JSON output (default: false)
pub fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    let use_json = std::env::var("HARNESS_TRACE_JSON")
        .map(|v| v == "1" || v == "true")
        .unwrap_or(false);

    let registry = tracing_subscriber::registry().with(env_filter);

    if use_json {
        registry
            .with(
                tracing_subscriber::fmt::layer()
                    .json()
                    .with_writer(std::io::stderr)
                    .with_target(true)
                    .with_thread_names(true)
                    .with_current_span(true)
                    .with_span_list(true)
                    .with_span_events(FmtSpan::CLOSE),
            )
            .init();
        info!("Structured tracing initialized with JSON output");
    } else {
        registry
            .with(
                tracing_subscriber::fmt::layer()
                    .with_writer(std::io::stderr)
                    .with_target(true)
                    .with_thread_names(true)
                    .compact(),
            )
            .init();
        debug!("Structured tracing initialized");
    }
}

/// Generate a unique run ID
pub fn generate_run_id() -> String {
    Uuid::new_v4().to_string()
}

/// Span covering one run, from fan-out to final snapshot
pub struct RunSpan {
    span: tracing::Span,
    start: Instant,
    run_id: String,
}

impl RunSpan {
    pub fn new(strategy: StrategyKind, shape: TargetShape, workers: usize) -> Self {
        let run_id = generate_run_id();

        let span = span!(
            Level::INFO,
            "run",
            run_id = %run_id,
            strategy = %strategy,
            shape = %shape,
            workers = workers,
            elapsed_us = tracing::field::Empty,
            result = tracing::field::Empty,
        );

        Self {
            span,
            start: Instant::now(),
            run_id,
        }
    }

    /// Get the run ID
    pub fn run_id(&self) -> &str {
        &self.run_id
    }

    /// The underlying span, for instrumenting futures or entering manually
    pub fn span(&self) -> &tracing::Span {
        &self.span
    }

    /// Record the measured mutation-phase duration
    pub fn record_elapsed(&self, elapsed: std::time::Duration) {
        self.span.record("elapsed_us", elapsed.as_micros() as u64);
    }

    /// Record how the run ended
    pub fn record_result(&self, result: &str) {
        self.span.record("result", result);
    }
}

impl Drop for RunSpan {
    fn drop(&mut self) {
        let _entered = self.span.enter();
        debug!(
            run_id = %self.run_id,
            total_us = self.start.elapsed().as_micros() as u64,
            "run finished"
        );
    }
}

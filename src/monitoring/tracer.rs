/*!
 * Structured Tracing
 * Subscriber setup and build spans for enforcer construction
 *
 * Features:
 * - JSON-formatted logs for structured parsing
 * - Build spans carrying policy id, revision and strategy
 * - Slow-build warnings
 */

use std::time::{Duration, Instant};
use tracing::{debug, info, span, warn, Level};
use tracing_subscriber::{
    fmt::format::FmtSpan, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter,
};

/// Builds slower than this are reported at `warn`
pub const SLOW_BUILD: Duration = Duration::from_millis(100);

/// Initialize structured tracing
///
/// Environment variables:
/// - RUST_LOG: Set log level (default: info)
/// - ENFORCER_TRACE_JSON: Enable JSON output (default: false)
///
/// Does nothing if a global subscriber is already installed.
pub fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    let use_json = std::env::var("ENFORCER_TRACE_JSON")
        .map(|v| v == "1" || v == "true")
        .unwrap_or(false);

    let registry = tracing_subscriber::registry().with(env_filter);

    let installed = if use_json {
        registry
            .with(
                tracing_subscriber::fmt::layer()
                    .json()
                    .with_target(true)
                    .with_thread_names(true)
                    .with_current_span(true)
                    .with_span_list(true)
                    .with_span_events(FmtSpan::CLOSE),
            )
            .try_init()
    } else {
        registry
            .with(
                tracing_subscriber::fmt::layer()
                    .with_target(true)
                    .with_thread_names(true)
                    .with_span_events(FmtSpan::CLOSE)
                    .compact(),
            )
            .try_init()
    };

    if installed.is_ok() {
        info!(json = use_json, "structured tracing initialized");
    }
}

/// Span covering one enforcer construction
pub struct BuildSpan {
    span: tracing::Span,
    start: Instant,
    policy_id: String,
    revision: u64,
}

impl BuildSpan {
    pub fn new(policy_id: &str, revision: u64, strategy: &str) -> Self {
        let span = span!(
            Level::DEBUG,
            "enforcer_build",
            policy_id = policy_id,
            revision = revision,
            strategy = strategy,
            nodes = tracing::field::Empty,
            entries = tracing::field::Empty,
            duration_us = tracing::field::Empty,
            result = tracing::field::Empty,
        );

        {
            let _entered = span.enter();
            debug!(policy_id, revision, strategy, "enforcer build started");
        }

        Self {
            span,
            start: Instant::now(),
            policy_id: policy_id.to_string(),
            revision,
        }
    }

    /// Record the size of the built index
    pub fn record_size(&self, entries: usize, nodes: usize) {
        self.span.record("entries", entries);
        self.span.record("nodes", nodes);
        self.span.record("result", "ok");
    }

    /// Record a validation failure
    pub fn record_error(&self, error: &str) {
        self.span.record("result", "error");
        warn!(
            policy_id = %self.policy_id,
            revision = self.revision,
            error,
            "enforcer build rejected policy"
        );
    }

    pub fn enter(&self) -> tracing::span::Entered<'_> {
        self.span.enter()
    }
}

impl Drop for BuildSpan {
    fn drop(&mut self) {
        let duration = self.start.elapsed();
        let _entered = self.span.enter();
        self.span.record("duration_us", duration.as_micros() as u64);

        if duration > SLOW_BUILD {
            warn!(
                policy_id = %self.policy_id,
                revision = self.revision,
                duration_ms = duration.as_millis() as u64,
                slow = true,
                "slow enforcer build"
            );
        } else {
            debug!(
                policy_id = %self.policy_id,
                revision = self.revision,
                duration_us = duration.as_micros() as u64,
                "enforcer build completed"
            );
        }
    }
}

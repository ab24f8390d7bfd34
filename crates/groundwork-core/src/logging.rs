//! Logging integration for the groundwork migration engine.
//!
//! Provides helpers for configuring [`tracing`]-based logging from
//! [`Settings`](crate::settings::Settings) and for creating per-run spans.

use crate::settings::Settings;

/// Sets up the global tracing subscriber based on the given settings.
///
/// The log filter is read from `settings.log_level` (e.g. "debug", "info",
/// "groundwork=trace"). In debug mode a pretty, human-readable format is
/// used; otherwise a structured JSON format is used.
pub fn setup_logging(settings: &Settings) {
    use tracing_subscriber::fmt;
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_new(&settings.log_level).unwrap_or_else(|_| EnvFilter::new("info"));

    if settings.debug {
        fmt::Subscriber::builder()
            .with_env_filter(filter)
            .with_target(true)
            .with_file(true)
            .with_line_number(true)
            .pretty()
            .try_init()
            .ok();
    } else {
        fmt::Subscriber::builder()
            .with_env_filter(filter)
            .with_target(true)
            .json()
            .try_init()
            .ok();
    }
}

/// Creates a tracing span for a migration run.
///
/// Attach this span around a runner invocation so that all log entries
/// emitted while planning and applying carry the target kind.
///
/// # Examples
///
/// ```
/// use groundwork_core::logging::run_span;
///
/// let span = run_span("document-store");
/// let _guard = span.enter();
/// tracing::info!("planning migrations");
/// ```
pub fn run_span(target_kind: &str) -> tracing::Span {
    tracing::info_span!("migration_run", kind = target_kind)
}

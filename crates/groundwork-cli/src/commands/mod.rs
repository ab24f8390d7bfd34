//! Built-in management commands.
//!
//! - [`UpCommand`] - apply pending migrations for a target kind
//! - [`DownCommand`] - revert the most recently applied migrations
//! - [`StatusCommand`] - list registered migrations and their applied state

mod down;
mod status;
mod up;

pub use down::DownCommand;
pub use status::StatusCommand;
pub use up::UpCommand;

use groundwork_adapters::{BrokerAdmin, DocumentStore};
use groundwork_core::{GroundworkError, GroundworkResult};
use groundwork_migrations::{RunOutcome, RunReport, TargetKind};

/// Parses the required `target_kind` positional argument.
pub(crate) fn parse_target_kind(matches: &clap::ArgMatches) -> GroundworkResult<TargetKind> {
    matches
        .get_one::<String>("target_kind")
        .ok_or_else(|| GroundworkError::Configuration("missing target kind".to_string()))?
        .parse()
}

/// Prints a run report and maps its outcome to a process exit code.
///
/// Exit code 0 only for `Completed`; a failed run prints the failing
/// unit's slug.
pub(crate) fn report_exit_code(report: &RunReport, verb: &str) -> i32 {
    for id in &report.applied {
        println!("{verb} {id}");
    }
    match &report.outcome {
        RunOutcome::Completed => {
            println!("{}: {} migration(s) {verb}", report.target, report.applied.len());
            0
        }
        RunOutcome::Failed { failing, cause } => {
            eprintln!("migration run failed at {}: {cause}", failing.slug());
            1
        }
        RunOutcome::Cancelled => {
            eprintln!(
                "migration run cancelled after {} unit(s)",
                report.applied.len()
            );
            2
        }
    }
}

/// Disconnects the document store, logging instead of failing.
pub(crate) async fn release_store(store: &dyn DocumentStore) {
    if let Err(err) = store.disconnect().await {
        tracing::warn!(error = %err, "failed to disconnect document store");
    }
}

/// Disconnects the broker admin, logging instead of failing.
pub(crate) async fn release_broker(broker: &dyn BrokerAdmin) {
    if let Err(err) = broker.disconnect().await {
        tracing::warn!(error = %err, "failed to disconnect broker admin");
    }
}

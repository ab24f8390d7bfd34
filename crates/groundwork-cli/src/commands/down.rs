//! The `down` management command.
//!
//! Reverts the most recently applied migrations for a target kind.
//! Rollback is always an explicit invocation; a failed `up` never triggers
//! it automatically.

use std::sync::Arc;

use async_trait::async_trait;
use groundwork_adapters::CreateTopicsOptions;
use groundwork_core::logging::run_span;
use groundwork_core::{GroundworkError, GroundworkResult, Settings};
use groundwork_migrations::{AppliedTracker, MigrationRunner, TargetKind};
use tracing::Instrument;

use crate::catalog;
use crate::command::{AdapterContext, ManagementCommand};
use crate::commands::{parse_target_kind, release_broker, release_store, report_exit_code};

/// Reverts applied migrations.
pub struct DownCommand;

impl DownCommand {
    fn parse_count(matches: &clap::ArgMatches) -> GroundworkResult<usize> {
        matches.get_one::<String>("count").map_or(Ok(1), |raw| {
            raw.parse().map_err(|_| {
                GroundworkError::Configuration(format!("invalid rollback count: {raw}"))
            })
        })
    }
}

#[async_trait]
impl ManagementCommand for DownCommand {
    fn name(&self) -> &'static str {
        "down"
    }

    fn help(&self) -> &'static str {
        "Revert the most recently applied migrations for a target kind"
    }

    fn add_arguments(&self, cmd: clap::Command) -> clap::Command {
        cmd.arg(
            clap::Arg::new("target_kind")
                .help("Target kind: document-store or broker-topology")
                .required(true),
        )
        .arg(
            clap::Arg::new("count")
                .help("How many units to revert, most recent first")
                .required(false),
        )
    }

    async fn handle(
        &self,
        matches: &clap::ArgMatches,
        settings: &Settings,
        context: &AdapterContext,
    ) -> GroundworkResult<i32> {
        let kind = parse_target_kind(matches)?;
        let count = Self::parse_count(matches)?;

        match kind {
            TargetKind::DocumentStore => {
                let registry = catalog::document_store_registry()?;
                let tracker = AppliedTracker::new(kind, Arc::clone(&context.ledger));
                let runner = MigrationRunner::new(registry, tracker);

                context.store.connect().await?;
                let result = runner
                    .down(context.store.as_ref(), count)
                    .instrument(run_span(kind.as_str()))
                    .await;
                release_store(context.store.as_ref()).await;
                Ok(report_exit_code(&result?, "reverted"))
            }
            TargetKind::BrokerTopology => {
                let options = CreateTopicsOptions {
                    timeout_ms: settings.broker.timeout_ms,
                    ..CreateTopicsOptions::default()
                };
                let registry = catalog::broker_topology_registry(&options)?;
                let tracker = AppliedTracker::new(kind, Arc::clone(&context.ledger));
                let runner = MigrationRunner::new(registry, tracker);

                context.broker.connect().await?;
                let result = runner
                    .down(context.broker.as_ref(), count)
                    .instrument(run_span(kind.as_str()))
                    .await;
                release_broker(context.broker.as_ref()).await;
                Ok(report_exit_code(&result?, "reverted"))
            }
        }
    }
}

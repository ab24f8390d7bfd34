//! The `up` management command.
//!
//! Applies all pending migrations for a target kind. The adapter connection
//! is opened before planning and released on every exit path; deployment
//! pipelines invoke this unconditionally on each deploy, so a run with
//! nothing pending exits 0 with an empty applied list.

use std::sync::Arc;

use async_trait::async_trait;
use groundwork_adapters::CreateTopicsOptions;
use groundwork_core::logging::run_span;
use groundwork_core::{GroundworkResult, Settings};
use groundwork_migrations::{AppliedTracker, MigrationRunner, TargetKind};
use tracing::Instrument;

use crate::catalog;
use crate::command::{AdapterContext, ManagementCommand};
use crate::commands::{parse_target_kind, release_broker, release_store, report_exit_code};

/// Applies pending migrations.
pub struct UpCommand;

#[async_trait]
impl ManagementCommand for UpCommand {
    fn name(&self) -> &'static str {
        "up"
    }

    fn help(&self) -> &'static str {
        "Apply pending migrations for a target kind"
    }

    fn add_arguments(&self, cmd: clap::Command) -> clap::Command {
        cmd.arg(
            clap::Arg::new("target_kind")
                .help("Target kind: document-store or broker-topology")
                .required(true),
        )
    }

    async fn handle(
        &self,
        matches: &clap::ArgMatches,
        settings: &Settings,
        context: &AdapterContext,
    ) -> GroundworkResult<i32> {
        let kind = parse_target_kind(matches)?;

        match kind {
            TargetKind::DocumentStore => {
                let registry = catalog::document_store_registry()?;
                let tracker = AppliedTracker::new(kind, Arc::clone(&context.ledger));
                let runner = MigrationRunner::new(registry, tracker);

                context.store.connect().await?;
                let result = runner
                    .up(context.store.as_ref())
                    .instrument(run_span(kind.as_str()))
                    .await;
                release_store(context.store.as_ref()).await;
                Ok(report_exit_code(&result?, "applied"))
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
                    .up(context.broker.as_ref())
                    .instrument(run_span(kind.as_str()))
                    .await;
                release_broker(context.broker.as_ref()).await;
                Ok(report_exit_code(&result?, "applied"))
            }
        }
    }
}

//! The `status` management command.
//!
//! Lists every registered migration for a target kind with its applied
//! state. Reads only the ledger; the broker and document store are not
//! contacted.

use std::sync::Arc;

use async_trait::async_trait;
use groundwork_core::{GroundworkResult, Settings};
use groundwork_migrations::{AppliedTracker, MigrationUnit, TargetKind};

use crate::catalog;
use crate::command::{AdapterContext, ManagementCommand};
use crate::commands::parse_target_kind;

/// Shows migration status.
pub struct StatusCommand;

async fn print_status<A: ?Sized>(
    units: &[Arc<dyn MigrationUnit<A>>],
    tracker: &AppliedTracker,
) -> GroundworkResult<i32> {
    let applied = tracker.applied_ids().await?;
    println!("{}:", tracker.target());
    for unit in units {
        let mark = if applied.contains(unit.id()) { "X" } else { " " };
        println!(" [{mark}] {}: {}", unit.id(), unit.describe());
    }
    Ok(0)
}

#[async_trait]
impl ManagementCommand for StatusCommand {
    fn name(&self) -> &'static str {
        "status"
    }

    fn help(&self) -> &'static str {
        "List registered migrations and their applied state"
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
        _settings: &Settings,
        context: &AdapterContext,
    ) -> GroundworkResult<i32> {
        let kind = parse_target_kind(matches)?;
        let tracker = AppliedTracker::new(kind, Arc::clone(&context.ledger));

        match kind {
            TargetKind::DocumentStore => {
                let registry = catalog::document_store_registry()?;
                print_status(registry.list(), &tracker).await
            }
            TargetKind::BrokerTopology => {
                let registry = catalog::broker_topology_registry(
                    &groundwork_adapters::CreateTopicsOptions::default(),
                )?;
                print_status(registry.list(), &tracker).await
            }
        }
    }
}

//! Management command framework for groundwork.
//!
//! This module provides the [`ManagementCommand`] trait for defining CLI
//! commands and [`CommandRegistry`] for registering and dispatching them.
//! The executable launcher that owns argument parsing and environment
//! loading lives outside this workspace; it calls
//! [`CommandRegistry::execute`] with already-resolved settings and adapter
//! handles and maps the returned exit code to the process exit.
//!
//! ## Defining a Custom Command
//!
//! ```rust,no_run
//! use async_trait::async_trait;
//! use groundwork_cli::command::{AdapterContext, ManagementCommand};
//! use groundwork_core::{GroundworkResult, Settings};
//!
//! struct PingCommand;
//!
//! #[async_trait]
//! impl ManagementCommand for PingCommand {
//!     fn name(&self) -> &str { "ping" }
//!     fn help(&self) -> &str { "Check adapter connectivity" }
//!
//!     async fn handle(
//!         &self,
//!         _matches: &clap::ArgMatches,
//!         _settings: &Settings,
//!         context: &AdapterContext,
//!     ) -> GroundworkResult<i32> {
//!         context.broker.connect().await?;
//!         context.broker.disconnect().await?;
//!         Ok(0)
//!     }
//! }
//! ```

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use groundwork_adapters::{BrokerAdmin, DocumentStore};
use groundwork_core::{GroundworkError, GroundworkResult, Settings};
use groundwork_migrations::LedgerStore;

/// The adapter capabilities a command runs against.
///
/// The launcher constructs these from real driver-backed implementations
/// (or the in-memory ones for a dry run) and hands them in; commands never
/// build adapters themselves.
#[derive(Clone)]
pub struct AdapterContext {
    /// The broker admin capability.
    pub broker: Arc<dyn BrokerAdmin>,
    /// The document store capability.
    pub store: Arc<dyn DocumentStore>,
    /// The migration ledger capability.
    pub ledger: Arc<dyn LedgerStore>,
}

/// A management command that can be registered and invoked by the launcher.
///
/// Implementations define a name, help text, optional arguments, and an
/// async handler returning a process exit code: `0` only when the run
/// reached `Completed`.
#[async_trait]
pub trait ManagementCommand: Send + Sync {
    /// Returns the name of this command (used to invoke it).
    fn name(&self) -> &str;

    /// Returns a short help description for this command.
    fn help(&self) -> &str;

    /// Adds custom arguments to the clap command.
    ///
    /// The default implementation returns the command unchanged.
    fn add_arguments(&self, cmd: clap::Command) -> clap::Command {
        cmd
    }

    /// Executes the command and returns the process exit code.
    async fn handle(
        &self,
        matches: &clap::ArgMatches,
        settings: &Settings,
        context: &AdapterContext,
    ) -> GroundworkResult<i32>;
}

/// A registry of management commands.
///
/// Commands are registered by name and dispatched by
/// [`execute`](Self::execute).
pub struct CommandRegistry {
    commands: HashMap<String, Box<dyn ManagementCommand>>,
}

impl Default for CommandRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl CommandRegistry {
    /// Creates a new empty command registry.
    pub fn new() -> Self {
        Self {
            commands: HashMap::new(),
        }
    }

    /// Creates a registry with the built-in commands registered.
    pub fn with_default_commands() -> Self {
        let mut registry = Self::new();
        registry.register(Box::new(crate::commands::UpCommand));
        registry.register(Box::new(crate::commands::DownCommand));
        registry.register(Box::new(crate::commands::StatusCommand));
        registry
    }

    /// Registers a command, replacing any previous command with the same name.
    pub fn register(&mut self, command: Box<dyn ManagementCommand>) {
        self.commands.insert(command.name().to_string(), command);
    }

    /// Returns the command with the given name.
    pub fn get(&self, name: &str) -> Option<&dyn ManagementCommand> {
        self.commands.get(name).map(AsRef::as_ref)
    }

    /// Returns all registered command names, sorted.
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.commands.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    /// Parses `argv` for the named command and runs it.
    ///
    /// Returns the command's exit code, or an error for an unknown command,
    /// unparseable arguments, or an infrastructure failure inside the
    /// command.
    pub async fn execute(
        &self,
        name: &str,
        argv: &[String],
        settings: &Settings,
        context: &AdapterContext,
    ) -> GroundworkResult<i32> {
        let command = self.get(name).ok_or_else(|| {
            GroundworkError::Configuration(format!(
                "unknown command: {name} (available: {})",
                self.names().join(", ")
            ))
        })?;

        let clap_command = command.add_arguments(
            clap::Command::new(command.name().to_string())
                .about(command.help().to_string())
                .no_binary_name(true),
        );
        let matches = clap_command
            .try_get_matches_from(argv)
            .map_err(|e| GroundworkError::Configuration(e.to_string()))?;

        command.handle(&matches, settings, context).await
    }
}

//! # groundwork-cli
//!
//! Management commands for the groundwork migration engine: `up`, `down`,
//! and `status`, plus the production migration catalog.
//!
//! This crate is a library. The executable launcher that parses process
//! arguments, loads environment-derived configuration, and constructs
//! driver-backed adapters lives outside this workspace; it assembles a
//! [`Settings`](groundwork_core::Settings), an
//! [`AdapterContext`](command::AdapterContext), and a
//! [`CommandRegistry`](command::CommandRegistry), then maps
//! [`CommandRegistry::execute`](command::CommandRegistry::execute) to the
//! process exit code: 0 only when the run completed.
//!
//! ## Modules
//!
//! - [`command`] - `ManagementCommand` trait, `CommandRegistry`, `AdapterContext`
//! - [`commands`] - the built-in `up`, `down`, and `status` commands
//! - [`catalog`] - the statically registered production migrations

pub mod catalog;
pub mod command;
pub mod commands;

// Re-export key types at the crate root.
pub use command::{AdapterContext, CommandRegistry, ManagementCommand};
pub use commands::{DownCommand, StatusCommand, UpCommand};

//! # groundwork
//!
//! An idempotent, ordered migration engine for document-store schema and
//! message-broker topic topology.
//!
//! This is the meta-crate that re-exports all sub-crates for convenient
//! access. You can depend on `groundwork` to get the whole engine, or
//! depend on individual crates for finer-grained control.

/// Core types, settings, logging, and error types.
pub use groundwork_core as core;

/// Declarative topic specs and the topology deriver.
pub use groundwork_topology as topology;

/// Broker admin and document store capability interfaces.
pub use groundwork_adapters as adapters;

/// Migration units, registry, ledger tracking, and the runner.
pub use groundwork_migrations as migrations;

/// Management commands and the production migration catalog.
pub use groundwork_cli as cli;

//! Core error types for the groundwork migration engine.
//!
//! This module provides the [`GroundworkError`] enum covering the whole error
//! taxonomy of the engine: registry misconfiguration, ledger races, invalid
//! topology specs, and adapter-level resource failures.

use thiserror::Error;

/// The primary error type for the groundwork migration engine.
///
/// Variants fall into three layers:
///
/// - **Registry errors** (`DuplicateId`) are misconfigurations detected at
///   startup, before any I/O.
/// - **Ledger errors** (`DuplicateApply`, `NotApplied`) arise from races
///   between concurrent runner processes or from misuse of the tracker.
/// - **Adapter errors** (`TopicCreate`, `IndexCreate`, `IndexNotFound`,
///   `Connection`) wrap failures from the external broker or document store.
///
/// Use [`GroundworkError::halts_run`] to distinguish failures that must stop
/// a migration run from those a runner tolerates and logs.
#[derive(Error, Debug)]
pub enum GroundworkError {
    // ── Registry errors ──────────────────────────────────────────────

    /// Two migration units share a `MigrationId` for the same target kind.
    #[error("duplicate migration id: {0}")]
    DuplicateId(String),

    // ── Ledger errors ────────────────────────────────────────────────

    /// The ledger already contains a record for this migration.
    ///
    /// Raised by the atomic insert-if-absent on the ledger store. When it
    /// surfaces during a run it means another runner process applied the
    /// same unit first, which is tolerated.
    #[error("migration already recorded as applied: {0}")]
    DuplicateApply(String),

    /// The ledger contains no record for this migration.
    #[error("migration not recorded as applied: {0}")]
    NotApplied(String),

    // ── Topology errors ──────────────────────────────────────────────

    /// A declarative topic spec failed validation before any I/O.
    #[error("invalid topic spec: {0}")]
    InvalidSpec(String),

    // ── Adapter errors ───────────────────────────────────────────────

    /// The broker admin API rejected a topic creation request.
    #[error("topic creation failed: {0}")]
    TopicCreate(String),

    /// The document store rejected an index creation request.
    #[error("index creation failed: {0}")]
    IndexCreate(String),

    /// An index drop targeted an index that does not exist.
    #[error("index not found: {0}")]
    IndexNotFound(String),

    /// A connection to the broker or document store failed.
    #[error("connection error: {0}")]
    Connection(String),

    // ── Ambient errors ───────────────────────────────────────────────

    /// A configuration value is missing or invalid.
    #[error("configuration error: {0}")]
    Configuration(String),

    /// An I/O error occurred.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl GroundworkError {
    /// Returns whether this error must halt a migration run.
    ///
    /// Everything halts except [`GroundworkError::DuplicateApply`]: a
    /// duplicate ledger insert means a racing runner already applied the
    /// unit, so the current runner logs it and moves on.
    pub const fn halts_run(&self) -> bool {
        !matches!(self, Self::DuplicateApply(_))
    }
}

/// A convenience type alias for `Result<T, GroundworkError>`.
pub type GroundworkResult<T> = Result<T, GroundworkError>;

//! The migration runner.
//!
//! A [`MigrationRunner`] orchestrates one run: it plans by subtracting the
//! ledger's applied ids from the registry order, applies each pending unit
//! strictly sequentially, records each success in the ledger before moving
//! on, and produces a [`RunReport`]. Each run moves through
//! `Planning -> Applying -> Completed | Failed` (or `Cancelled` at a
//! between-unit checkpoint).
//!
//! Units never run in parallel: topology and index changes are
//! order-dependent, and a sequential halt leaves the run resumable at the
//! exact failure point.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use chrono::Utc;
use groundwork_core::{GroundworkError, GroundworkResult};

use crate::ledger::AppliedTracker;
use crate::migration::{MigrationId, MigrationUnit, TargetKind};
use crate::registry::MigrationRegistry;

/// A cooperative cancellation handle.
///
/// Cancellation is checked between units only; an in-flight adapter call
/// runs to completion or failure before the cancellation takes effect.
#[derive(Debug, Clone, Default)]
pub struct CancelToken {
    cancelled: Arc<AtomicBool>,
}

impl CancelToken {
    /// Creates a token in the not-cancelled state.
    pub fn new() -> Self {
        Self::default()
    }

    /// Requests cancellation.
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
    }

    /// Returns whether cancellation has been requested.
    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }
}

/// How a run ended.
#[derive(Debug)]
pub enum RunOutcome {
    /// Every pending unit was processed.
    Completed,
    /// A unit failed; the run halted at that unit.
    Failed {
        /// The unit whose operation failed.
        failing: MigrationId,
        /// The underlying cause.
        cause: GroundworkError,
    },
    /// The run was cancelled at a between-unit checkpoint.
    Cancelled,
}

/// The structured result of one run.
///
/// Consumed by the launcher for reporting and exit codes; the engine never
/// prints. After a `Failed` outcome the `applied` list is exactly the units
/// that committed before the halt. The run never claims success after a
/// partial failure and never rolls back on its own.
#[derive(Debug)]
pub struct RunReport {
    /// The target kind the run operated on.
    pub target: TargetKind,
    /// Units successfully processed, in execution order: applied for an
    /// `up` run, reverted for a `down` run.
    pub applied: Vec<MigrationId>,
    /// How the run ended.
    pub outcome: RunOutcome,
}

impl RunReport {
    /// Returns whether the run completed without failure or cancellation.
    pub const fn succeeded(&self) -> bool {
        matches!(self.outcome, RunOutcome::Completed)
    }

    /// Returns the failing unit's id, if the run failed.
    pub const fn failing(&self) -> Option<&MigrationId> {
        match &self.outcome {
            RunOutcome::Failed { failing, .. } => Some(failing),
            _ => None,
        }
    }
}

/// Orchestrates migration runs for one target kind.
///
/// The type parameter `A` is the adapter capability the registered units
/// operate through. The runner owns the registry and tracker but borrows
/// the adapter per call: connection lifecycle belongs to the launcher.
pub struct MigrationRunner<A: ?Sized> {
    registry: MigrationRegistry<A>,
    tracker: AppliedTracker,
    cancel: CancelToken,
}

impl<A: ?Sized> MigrationRunner<A> {
    /// Creates a runner over a registry and tracker.
    ///
    /// # Panics
    ///
    /// Panics if the registry and tracker disagree about the target kind;
    /// wiring them up for different kinds is a programming error.
    pub fn new(registry: MigrationRegistry<A>, tracker: AppliedTracker) -> Self {
        assert_eq!(
            registry.kind(),
            tracker.target(),
            "registry and tracker target kinds must match"
        );
        Self {
            registry,
            tracker,
            cancel: CancelToken::new(),
        }
    }

    /// Attaches a cancellation token shared with the caller.
    #[must_use]
    pub fn with_cancel_token(mut self, cancel: CancelToken) -> Self {
        self.cancel = cancel;
        self
    }

    /// Returns the registry.
    pub const fn registry(&self) -> &MigrationRegistry<A> {
        &self.registry
    }

    /// Returns the tracker.
    pub const fn tracker(&self) -> &AppliedTracker {
        &self.tracker
    }

    /// Applies all pending units in ascending id order.
    ///
    /// Returns the report for unit-level failures; returns `Err` only when
    /// the ledger itself is unusable (planning read or write-through
    /// failed). Re-running with nothing pending is a no-op `Completed`
    /// report with an empty applied list.
    pub async fn up(&self, adapter: &A) -> GroundworkResult<RunReport> {
        let target = self.registry.kind();
        tracing::debug!(kind = %target, "planning migration run");
        let applied_ids = self.tracker.applied_ids().await?;
        let pending: Vec<_> = self
            .registry
            .list()
            .iter()
            .filter(|unit| !applied_ids.contains(unit.id()))
            .collect();
        tracing::info!(
            kind = %target,
            pending = pending.len(),
            registered = self.registry.len(),
            "applying pending migrations"
        );

        let mut applied = Vec::new();
        for unit in pending {
            if self.cancel.is_cancelled() {
                tracing::warn!(kind = %target, "run cancelled between units");
                return Ok(RunReport {
                    target,
                    applied,
                    outcome: RunOutcome::Cancelled,
                });
            }

            tracing::info!(id = %unit.id(), "applying {}", unit.describe());
            if let Err(cause) = unit.up(adapter).await {
                tracing::error!(id = %unit.id(), error = %cause, "migration failed, halting run");
                return Ok(RunReport {
                    target,
                    applied,
                    outcome: RunOutcome::Failed {
                        failing: unit.id().clone(),
                        cause,
                    },
                });
            }

            match self.tracker.mark_applied(unit.id(), Utc::now()).await {
                Ok(()) => {}
                Err(err) if !err.halts_run() => {
                    // A racing runner applied this unit first. Its work and
                    // ours were both idempotent creates, so keep going.
                    tracing::warn!(id = %unit.id(), "{err}; continuing");
                }
                Err(err) => return Err(err),
            }
            applied.push(unit.id().clone());
        }

        tracing::info!(kind = %target, applied = applied.len(), "run completed");
        Ok(RunReport {
            target,
            applied,
            outcome: RunOutcome::Completed,
        })
    }

    /// Reverts the most recently applied `count` units.
    ///
    /// Rollback order is descending id among the units currently in the
    /// ledger for this target. Each unit is unmarked only after its `down`
    /// succeeds, with the same halt-on-failure discipline as
    /// [`up`](Self::up).
    pub async fn down(&self, adapter: &A, count: usize) -> GroundworkResult<RunReport> {
        let target = self.registry.kind();
        tracing::debug!(kind = %target, count, "planning rollback");
        let mut entries = self.tracker.entries().await?;
        entries.reverse();
        entries.truncate(count);

        let mut reverted = Vec::new();
        for record in entries {
            if self.cancel.is_cancelled() {
                tracing::warn!(kind = %target, "rollback cancelled between units");
                return Ok(RunReport {
                    target,
                    applied: reverted,
                    outcome: RunOutcome::Cancelled,
                });
            }

            let Some(unit) = self.registry.get(&record.id) else {
                return Err(GroundworkError::Configuration(format!(
                    "ledger records {} as applied but no such unit is registered",
                    record.id
                )));
            };

            tracing::info!(id = %unit.id(), "reverting {}", unit.describe());
            if let Err(cause) = unit.down(adapter).await {
                tracing::error!(id = %unit.id(), error = %cause, "rollback failed, halting run");
                return Ok(RunReport {
                    target,
                    applied: reverted,
                    outcome: RunOutcome::Failed {
                        failing: unit.id().clone(),
                        cause,
                    },
                });
            }

            self.tracker.unmark(unit.id()).await?;
            reverted.push(unit.id().clone());
        }

        tracing::info!(kind = %target, reverted = reverted.len(), "rollback completed");
        Ok(RunReport {
            target,
            applied: reverted,
            outcome: RunOutcome::Completed,
        })
    }
}

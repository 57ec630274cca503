//! Batch auto-resolution across an agency's pending conflicts.

use serde::{Deserialize, Serialize};
use tokio_util::sync::CancellationToken;

use crate::db::ConflictRepository;
use crate::error::Result;
use crate::models::ResolutionStrategy;
use crate::strategy::apply_strategy;

use super::{ConflictService, ResolutionApplier};

/// Tallies from one auto-resolve run.
///
/// `resolved + failed + skipped` equals the number of conflicts that were
/// pending when the run started.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchOutcome {
    pub resolved: usize,
    /// Not auto-resolved: manual strategy or an error while applying
    pub failed: usize,
    /// Subset of `failed` where the strategy produced no record
    pub manual_required: usize,
    /// Not attempted because the run was cancelled
    pub skipped: usize,
    pub cancelled: bool,
}

impl<R: ConflictRepository> ConflictService<R> {
    /// Resolve every pending conflict of `agency_id` with `strategy`.
    ///
    /// Conflicts are processed one at a time in newest-first order; one
    /// failure never stops the run. `cancel` is checked between conflicts,
    /// never in the middle of one. Only the initial listing can fail the
    /// whole call.
    pub async fn auto_resolve_conflicts(
        &self,
        agency_id: &str,
        strategy: &ResolutionStrategy,
        cancel: &CancellationToken,
    ) -> Result<BatchOutcome> {
        let pending = self.list_unresolved(agency_id).await?;
        let total = pending.len();
        let applier = ResolutionApplier::new(self.repository(), self.writers());
        let mut outcome = BatchOutcome::default();

        tracing::info!(
            agency_id,
            strategy = strategy.label(),
            pending = total,
            "Starting auto-resolve"
        );

        for (index, conflict) in pending.iter().enumerate() {
            if cancel.is_cancelled() {
                outcome.cancelled = true;
                outcome.skipped = total - index;
                tracing::warn!(
                    agency_id,
                    skipped = outcome.skipped,
                    "Auto-resolve cancelled"
                );
                break;
            }

            let Some(resolved) = apply_strategy(conflict, strategy) else {
                tracing::debug!(conflict_id = %conflict.id, "Conflict needs manual resolution");
                outcome.failed += 1;
                outcome.manual_required += 1;
                continue;
            };

            match applier
                .apply(&conflict.id, &resolved, strategy.label())
                .await
            {
                Ok(version) => {
                    tracing::debug!(
                        conflict_id = %conflict.id,
                        version = version.version,
                        "Conflict auto-resolved"
                    );
                    outcome.resolved += 1;
                }
                Err(error) => {
                    tracing::warn!(conflict_id = %conflict.id, "Auto-resolve failed: {error}");
                    outcome.failed += 1;
                }
            }
        }

        tracing::info!(
            agency_id,
            resolved = outcome.resolved,
            failed = outcome.failed,
            skipped = outcome.skipped,
            "Auto-resolve finished"
        );
        Ok(outcome)
    }
}

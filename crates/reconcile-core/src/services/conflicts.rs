//! Conflict service: the read/resolve surface exposed to clients.

use crate::db::{ConflictRepository, WriterRegistry};
use crate::error::{Error, Result};
use crate::models::{
    Conflict, ConflictId, ConflictStats, DataVersion, DetectedConflict, Record,
    ResolutionStrategy, Suggestion,
};
use crate::strategy::apply_strategy;
use crate::suggest::suggest;

use super::ResolutionApplier;

/// History page size when the caller does not pass a limit
pub const DEFAULT_HISTORY_LIMIT: usize = 50;

/// Conflict resolution service over a repository and a writer registry.
///
/// Holds no mutable state of its own; every call goes to the repository.
pub struct ConflictService<R> {
    repo: R,
    writers: WriterRegistry,
    history_limit: usize,
}

impl<R: ConflictRepository> ConflictService<R> {
    pub fn new(repo: R, writers: WriterRegistry) -> Self {
        Self {
            repo,
            writers,
            history_limit: DEFAULT_HISTORY_LIMIT,
        }
    }

    /// Override the default history page size
    #[must_use]
    pub fn with_history_limit(mut self, limit: usize) -> Self {
        self.history_limit = limit.max(1);
        self
    }

    pub const fn repository(&self) -> &R {
        &self.repo
    }

    pub const fn writers(&self) -> &WriterRegistry {
        &self.writers
    }

    /// Store a conflict reported by the upstream detector.
    pub async fn record_conflict(&self, detected: DetectedConflict) -> Result<Conflict> {
        detected.validate()?;

        let conflict = Conflict::from_detected(detected);
        self.repo.insert(&conflict).await?;
        tracing::debug!(
            conflict_id = %conflict.id,
            agency_id = %conflict.agency_id,
            table = %conflict.table_name,
            record_id = %conflict.record_id,
            "Recorded conflict"
        );
        Ok(conflict)
    }

    pub async fn get_conflict(&self, id: &ConflictId) -> Result<Option<Conflict>> {
        self.repo.get(id).await
    }

    /// Unresolved conflicts for an agency, newest first.
    pub async fn list_unresolved(&self, agency_id: &str) -> Result<Vec<Conflict>> {
        self.repo.list_unresolved(agency_id).await
    }

    /// Advisory per-field suggestions for two snapshots.
    pub fn suggest(source: &Record, target: &Record) -> Vec<Suggestion> {
        suggest(source, target)
    }

    /// Suggestions for a stored conflict.
    pub async fn suggest_for(&self, id: &ConflictId) -> Result<Vec<Suggestion>> {
        let conflict = self
            .repo
            .get(id)
            .await?
            .ok_or_else(|| Error::NotFound(id.to_string()))?;
        Ok(suggest(&conflict.source_data, &conflict.target_data))
    }

    /// Apply a caller-supplied record as the resolution of a conflict.
    ///
    /// On error the conflict is left unresolved, except for
    /// `Error::PartialApplication`, which means the store needs inspecting.
    pub async fn resolve_conflict(
        &self,
        id: &ConflictId,
        resolved_data: &Record,
        strategy: &ResolutionStrategy,
    ) -> Result<DataVersion> {
        ResolutionApplier::new(&self.repo, &self.writers)
            .apply(id, resolved_data, strategy.label())
            .await
    }

    /// Compute the resolution with `strategy` and apply it.
    pub async fn resolve_with_strategy(
        &self,
        id: &ConflictId,
        strategy: &ResolutionStrategy,
    ) -> Result<DataVersion> {
        let conflict = self
            .repo
            .get(id)
            .await?
            .ok_or_else(|| Error::NotFound(id.to_string()))?;
        if conflict.is_resolved {
            return Err(Error::AlreadyResolved(id.to_string()));
        }

        let resolved = apply_strategy(&conflict, strategy)
            .ok_or_else(|| Error::ManualResolutionRequired(id.to_string()))?;
        self.resolve_conflict(id, &resolved, strategy).await
    }

    /// Recent conflicts for an agency, resolved or not, newest first.
    pub async fn history(&self, agency_id: &str, limit: Option<usize>) -> Result<Vec<Conflict>> {
        self.repo
            .history(agency_id, limit.unwrap_or(self.history_limit))
            .await
    }

    pub async fn stats(&self, agency_id: &str) -> Result<ConflictStats> {
        self.repo.stats(agency_id).await
    }

    /// Version log for one record, oldest first.
    pub async fn versions(&self, table_name: &str, record_id: &str) -> Result<Vec<DataVersion>> {
        self.repo.versions(table_name, record_id).await
    }
}

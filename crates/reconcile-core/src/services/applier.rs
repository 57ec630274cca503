//! Resolution applier: writes a resolved record and records its audit version.

use serde_json::Value;

use crate::db::{ConflictRepository, WriterRegistry};
use crate::error::{Error, Result};
use crate::models::{ConflictId, DataVersion, Record};
use crate::util::rfc3339_now;

/// Applies one resolution in order: claim the conflict, write the record,
/// append the version.
///
/// A failed write reopens the conflict, so the caller sees it fully
/// unresolved. Only when that compensation fails, or the version append
/// fails after the write landed, is `Error::PartialApplication` returned;
/// the store then needs inspecting.
pub struct ResolutionApplier<'a, R> {
    repo: &'a R,
    writers: &'a WriterRegistry,
}

impl<'a, R: ConflictRepository> ResolutionApplier<'a, R> {
    pub const fn new(repo: &'a R, writers: &'a WriterRegistry) -> Self {
        Self { repo, writers }
    }

    pub async fn apply(
        &self,
        conflict_id: &ConflictId,
        resolved_data: &Record,
        strategy_label: &str,
    ) -> Result<DataVersion> {
        let conflict = self
            .repo
            .get(conflict_id)
            .await?
            .ok_or_else(|| Error::NotFound(conflict_id.to_string()))?;
        if conflict.is_resolved {
            return Err(Error::AlreadyResolved(conflict_id.to_string()));
        }

        // Checked before any mutation so an unknown table never leaves a
        // conflict marked resolved without its data written
        let Some(writer) = self.writers.get(&conflict.table_name) else {
            tracing::warn!(
                conflict_id = %conflict_id,
                table = %conflict.table_name,
                "No writer registered for conflict table"
            );
            return Err(Error::UnsupportedTable(conflict.table_name));
        };

        // One stamped snapshot goes to the conflict, the table and the version log
        let mut written = resolved_data.clone();
        written.insert("updated_at".to_string(), Value::String(rfc3339_now()));

        let resolved = self
            .repo
            .resolve(conflict_id, &written, strategy_label)
            .await?;

        if let Err(write_error) = writer.upsert(&resolved.record_id, &written).await {
            tracing::warn!(
                conflict_id = %conflict_id,
                table = %resolved.table_name,
                record_id = %resolved.record_id,
                "Write failed, reopening conflict: {write_error}"
            );
            return match self.repo.reopen(conflict_id).await {
                Ok(()) => Err(write_error),
                Err(reopen_error) => {
                    tracing::error!(
                        conflict_id = %conflict_id,
                        "Conflict left resolved after failed write: {reopen_error}"
                    );
                    Err(Error::PartialApplication {
                        conflict_id: conflict_id.to_string(),
                        detail: format!(
                            "write failed ({write_error}) and reopening failed ({reopen_error})"
                        ),
                    })
                }
            };
        }

        match self
            .repo
            .append_version(&resolved.table_name, &resolved.record_id, &written)
            .await
        {
            Ok(version) => {
                tracing::info!(
                    conflict_id = %conflict_id,
                    table = %version.table_name,
                    record_id = %version.record_id,
                    version = version.version,
                    strategy = strategy_label,
                    "Applied conflict resolution"
                );
                Ok(version)
            }
            Err(version_error) => {
                tracing::error!(
                    conflict_id = %conflict_id,
                    "Record written but version append failed: {version_error}"
                );
                Err(Error::PartialApplication {
                    conflict_id: conflict_id.to_string(),
                    detail: format!("record written but version append failed ({version_error})"),
                })
            }
        }
    }
}

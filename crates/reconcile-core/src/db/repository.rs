//! Conflict repository implementation

use libsql::{params, Connection, Row};

use crate::error::{Error, Result};
use crate::models::{
    Conflict, ConflictId, ConflictStats, DataVersion, Record, ResolutionStrategy,
    CONFLICT_RESOLUTION_CHANGE,
};
use crate::util::{sql_limit, unix_millis_now};

const CONFLICT_COLUMNS: &str = "id, agency_id, table_name, record_id, source_data, target_data, conflict_type, is_resolved, resolved_at, resolved_data, resolution_strategy, created_at";

const VERSION_COLUMNS: &str =
    "id, table_name, record_id, version, data, change_type, created_at";

/// Trait for conflict and data version storage operations (async)
///
/// Reads return errors instead of empty results when the store is
/// unreachable, so "no conflicts" and "store down" stay distinguishable.
#[allow(async_fn_in_trait)]
pub trait ConflictRepository {
    /// Store a newly detected conflict
    async fn insert(&self, conflict: &Conflict) -> Result<()>;

    /// Get a conflict by ID
    async fn get(&self, id: &ConflictId) -> Result<Option<Conflict>>;

    /// List an agency's unresolved conflicts, newest first
    async fn list_unresolved(&self, agency_id: &str) -> Result<Vec<Conflict>>;

    /// Mark a pending conflict resolved and return the updated row
    ///
    /// Fails with `NotFound` for an unknown id and `AlreadyResolved` when the
    /// conflict was resolved before; the stored resolution is never replaced.
    async fn resolve(
        &self,
        id: &ConflictId,
        resolved_data: &Record,
        strategy_label: &str,
    ) -> Result<Conflict>;

    /// Undo `resolve` after a downstream step failed
    async fn reopen(&self, id: &ConflictId) -> Result<()>;

    /// List an agency's conflicts (resolved or not), newest first
    async fn history(&self, agency_id: &str, limit: usize) -> Result<Vec<Conflict>>;

    /// Aggregate counters for an agency
    async fn stats(&self, agency_id: &str) -> Result<ConflictStats>;

    /// Append the next version snapshot for a record
    async fn append_version(
        &self,
        table_name: &str,
        record_id: &str,
        data: &Record,
    ) -> Result<DataVersion>;

    /// Version log for a record, oldest first
    async fn versions(&self, table_name: &str, record_id: &str) -> Result<Vec<DataVersion>>;
}

/// libSQL implementation of `ConflictRepository`
#[derive(Clone)]
pub struct LibSqlConflictRepository {
    conn: Connection,
}

impl LibSqlConflictRepository {
    /// Create a new repository over the given connection
    pub const fn new(conn: Connection) -> Self {
        Self { conn }
    }

    /// Parse a conflict from a row selected with `CONFLICT_COLUMNS`
    fn parse_conflict(row: &Row) -> Result<Conflict> {
        let id: String = row.get(0)?;
        let resolved_data: Option<String> = row.get(9)?;

        Ok(Conflict {
            id: parse_conflict_id(&id)?,
            agency_id: row.get(1)?,
            table_name: row.get(2)?,
            record_id: row.get(3)?,
            source_data: serde_json::from_str(&row.get::<String>(4)?)?,
            target_data: serde_json::from_str(&row.get::<String>(5)?)?,
            conflict_type: row.get(6)?,
            is_resolved: row.get::<i32>(7)? != 0,
            resolved_at: row.get(8)?,
            resolved_data: resolved_data
                .map(|raw| serde_json::from_str(&raw))
                .transpose()?,
            resolution_strategy: row.get(10)?,
            created_at: row.get(11)?,
        })
    }

    /// Parse a version from a row selected with `VERSION_COLUMNS`
    fn parse_version(row: &Row) -> Result<DataVersion> {
        Ok(DataVersion {
            id: row.get(0)?,
            table_name: row.get(1)?,
            record_id: row.get(2)?,
            version: row.get(3)?,
            data: serde_json::from_str(&row.get::<String>(4)?)?,
            change_type: row.get(5)?,
            created_at: row.get(6)?,
        })
    }

    async fn query_conflicts(
        &self,
        sql: &str,
        params: impl libsql::params::IntoParams,
    ) -> Result<Vec<Conflict>> {
        let mut rows = self.conn.query(sql, params).await?;

        let mut conflicts = Vec::new();
        while let Some(row) = rows.next().await? {
            conflicts.push(Self::parse_conflict(&row)?);
        }
        Ok(conflicts)
    }

    async fn get_version(&self, id: &str) -> Result<DataVersion> {
        let mut rows = self
            .conn
            .query(
                &format!("SELECT {VERSION_COLUMNS} FROM data_versions WHERE id = ?"),
                [id],
            )
            .await?;

        match rows.next().await? {
            Some(row) => Self::parse_version(&row),
            None => Err(Error::Database(format!("data version {id} was not stored"))),
        }
    }
}

fn parse_conflict_id(raw: &str) -> Result<ConflictId> {
    raw.parse()
        .map_err(|_| Error::Database(format!("invalid conflict id in store: {raw}")))
}

impl ConflictRepository for LibSqlConflictRepository {
    async fn insert(&self, conflict: &Conflict) -> Result<()> {
        self.conn
            .execute(
                "INSERT INTO conflicts (id, agency_id, table_name, record_id, source_data, target_data, conflict_type, is_resolved, created_at)
                 VALUES (?, ?, ?, ?, ?, ?, ?, 0, ?)",
                params![
                    conflict.id.as_str(),
                    conflict.agency_id.as_str(),
                    conflict.table_name.as_str(),
                    conflict.record_id.as_str(),
                    serde_json::to_string(&conflict.source_data)?,
                    serde_json::to_string(&conflict.target_data)?,
                    conflict.conflict_type.as_str(),
                    conflict.created_at
                ],
            )
            .await?;
        Ok(())
    }

    async fn get(&self, id: &ConflictId) -> Result<Option<Conflict>> {
        let conflicts = self
            .query_conflicts(
                &format!("SELECT {CONFLICT_COLUMNS} FROM conflicts WHERE id = ?"),
                [id.as_str()],
            )
            .await?;
        Ok(conflicts.into_iter().next())
    }

    async fn list_unresolved(&self, agency_id: &str) -> Result<Vec<Conflict>> {
        self.query_conflicts(
            &format!(
                "SELECT {CONFLICT_COLUMNS}
                 FROM conflicts
                 WHERE agency_id = ? AND is_resolved = 0
                 ORDER BY created_at DESC, id DESC"
            ),
            [agency_id],
        )
        .await
    }

    async fn resolve(
        &self,
        id: &ConflictId,
        resolved_data: &Record,
        strategy_label: &str,
    ) -> Result<Conflict> {
        let rows = self
            .conn
            .execute(
                "UPDATE conflicts
                 SET is_resolved = 1, resolved_at = ?, resolved_data = ?, resolution_strategy = ?
                 WHERE id = ? AND is_resolved = 0",
                params![
                    unix_millis_now(),
                    serde_json::to_string(resolved_data)?,
                    strategy_label,
                    id.as_str()
                ],
            )
            .await?;

        let current = self
            .get(id)
            .await?
            .ok_or_else(|| Error::NotFound(id.to_string()))?;

        if rows == 0 {
            return Err(Error::AlreadyResolved(id.to_string()));
        }
        Ok(current)
    }

    async fn reopen(&self, id: &ConflictId) -> Result<()> {
        let rows = self
            .conn
            .execute(
                "UPDATE conflicts
                 SET is_resolved = 0, resolved_at = NULL, resolved_data = NULL, resolution_strategy = NULL
                 WHERE id = ? AND is_resolved = 1",
                [id.as_str()],
            )
            .await?;

        if rows == 0 {
            return match self.get(id).await? {
                Some(_) => Err(Error::InvalidInput(format!(
                    "conflict {id} is not resolved, nothing to reopen"
                ))),
                None => Err(Error::NotFound(id.to_string())),
            };
        }
        Ok(())
    }

    async fn history(&self, agency_id: &str, limit: usize) -> Result<Vec<Conflict>> {
        self.query_conflicts(
            &format!(
                "SELECT {CONFLICT_COLUMNS}
                 FROM conflicts
                 WHERE agency_id = ?
                 ORDER BY created_at DESC, id DESC
                 LIMIT ?"
            ),
            params![agency_id, sql_limit(limit)],
        )
        .await
    }

    async fn stats(&self, agency_id: &str) -> Result<ConflictStats> {
        let mut rows = self
            .conn
            .query(
                "SELECT
                    COUNT(*),
                    COALESCE(SUM(CASE WHEN is_resolved = 1 THEN 1 ELSE 0 END), 0),
                    COALESCE(SUM(CASE WHEN is_resolved = 1 AND COALESCE(resolution_strategy, '') != ? THEN 1 ELSE 0 END), 0)
                 FROM conflicts
                 WHERE agency_id = ?",
                params![ResolutionStrategy::MANUAL, agency_id],
            )
            .await?;

        let Some(row) = rows.next().await? else {
            return Ok(ConflictStats::default());
        };

        let total = u64::try_from(row.get::<i64>(0)?).unwrap_or_default();
        let resolved = u64::try_from(row.get::<i64>(1)?).unwrap_or_default();
        let auto_resolved = u64::try_from(row.get::<i64>(2)?).unwrap_or_default();

        Ok(ConflictStats {
            total,
            resolved,
            pending: total.saturating_sub(resolved),
            auto_resolved,
        })
    }

    async fn append_version(
        &self,
        table_name: &str,
        record_id: &str,
        data: &Record,
    ) -> Result<DataVersion> {
        let id = uuid::Uuid::now_v7().to_string();

        // Version allocation and insert happen in one statement
        self.conn
            .execute(
                "INSERT INTO data_versions (id, table_name, record_id, version, data, change_type, created_at)
                 SELECT ?, ?, ?, COALESCE(MAX(version), 0) + 1, ?, ?, ?
                 FROM data_versions
                 WHERE table_name = ? AND record_id = ?",
                params![
                    id.as_str(),
                    table_name,
                    record_id,
                    serde_json::to_string(data)?,
                    CONFLICT_RESOLUTION_CHANGE,
                    unix_millis_now(),
                    table_name,
                    record_id
                ],
            )
            .await?;

        self.get_version(&id).await
    }

    async fn versions(&self, table_name: &str, record_id: &str) -> Result<Vec<DataVersion>> {
        let mut rows = self
            .conn
            .query(
                &format!(
                    "SELECT {VERSION_COLUMNS}
                     FROM data_versions
                     WHERE table_name = ? AND record_id = ?
                     ORDER BY version ASC"
                ),
                [table_name, record_id],
            )
            .await?;

        let mut versions = Vec::new();
        while let Some(row) = rows.next().await? {
            versions.push(Self::parse_version(&row)?);
        }
        Ok(versions)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::Database;
    use crate::models::DetectedConflict;
    use pretty_assertions::assert_eq;
    use serde_json::{json, Value};

    async fn setup() -> (Database, LibSqlConflictRepository) {
        let db = Database::open_in_memory().await.unwrap();
        let repo = LibSqlConflictRepository::new(db.connection().clone());
        (db, repo)
    }

    fn record(value: Value) -> Record {
        match value {
            Value::Object(map) => map,
            other => panic!("expected object, got {other}"),
        }
    }

    fn conflict(agency_id: &str, record_id: &str, created_at: i64) -> Conflict {
        let mut conflict = Conflict::from_detected(DetectedConflict {
            agency_id: agency_id.to_string(),
            table_name: "agency_projects".to_string(),
            record_id: record_id.to_string(),
            source_data: record(json!({"name": "Bridge", "tags": ["a"], "budget": 10})),
            target_data: record(json!({"name": "Bridge repair", "tags": ["b"], "budget": 12})),
            conflict_type: "update_update".to_string(),
        });
        conflict.created_at = created_at;
        conflict
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_insert_and_get() {
        let (_db, repo) = setup().await;
        let stored = conflict("agency-1", "p-1", 100);
        repo.insert(&stored).await.unwrap();

        let fetched = repo.get(&stored.id).await.unwrap().unwrap();
        assert_eq!(fetched, stored);
        assert!(repo.get(&ConflictId::new()).await.unwrap().is_none());
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_record_field_order_survives_storage() {
        let (_db, repo) = setup().await;
        let mut stored = conflict("agency-1", "p-1", 100);
        stored.source_data = record(json!({"zeta": 1, "alpha": 2, "mid": 3}));
        repo.insert(&stored).await.unwrap();

        let fetched = repo.get(&stored.id).await.unwrap().unwrap();
        let keys: Vec<&str> = fetched.source_data.keys().map(String::as_str).collect();
        assert_eq!(keys, vec!["zeta", "alpha", "mid"]);
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_list_unresolved_newest_first_per_agency() {
        let (_db, repo) = setup().await;
        let older = conflict("agency-1", "p-1", 100);
        let newer = conflict("agency-1", "p-2", 200);
        let other_agency = conflict("agency-2", "p-3", 300);
        for c in [&older, &newer, &other_agency] {
            repo.insert(c).await.unwrap();
        }

        let listed = repo.list_unresolved("agency-1").await.unwrap();
        let ids: Vec<ConflictId> = listed.iter().map(|c| c.id).collect();
        assert_eq!(ids, vec![newer.id, older.id]);
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_resolve_is_one_way() {
        let (_db, repo) = setup().await;
        let stored = conflict("agency-1", "p-1", 100);
        repo.insert(&stored).await.unwrap();

        let data = record(json!({"name": "Resolved"}));
        let resolved = repo.resolve(&stored.id, &data, "merge").await.unwrap();
        assert!(resolved.is_resolved);
        assert!(resolved.resolved_at.is_some());
        assert_eq!(resolved.resolved_data, Some(data.clone()));
        assert_eq!(resolved.resolution_strategy.as_deref(), Some("merge"));

        let second = repo
            .resolve(&stored.id, &record(json!({"name": "Other"})), "manual")
            .await;
        assert!(matches!(second, Err(Error::AlreadyResolved(_))));

        let fetched = repo.get(&stored.id).await.unwrap().unwrap();
        assert_eq!(fetched.resolved_data, Some(data));
        assert!(repo.list_unresolved("agency-1").await.unwrap().is_empty());
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_resolve_unknown_conflict() {
        let (_db, repo) = setup().await;
        let result = repo
            .resolve(&ConflictId::new(), &Record::new(), "manual")
            .await;
        assert!(matches!(result, Err(Error::NotFound(_))));
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_reopen_restores_pending_state() {
        let (_db, repo) = setup().await;
        let stored = conflict("agency-1", "p-1", 100);
        repo.insert(&stored).await.unwrap();
        repo.resolve(&stored.id, &Record::new(), "merge")
            .await
            .unwrap();

        repo.reopen(&stored.id).await.unwrap();

        let fetched = repo.get(&stored.id).await.unwrap().unwrap();
        assert_eq!(fetched, stored);
        assert!(matches!(
            repo.reopen(&stored.id).await,
            Err(Error::InvalidInput(_))
        ));
        assert!(matches!(
            repo.reopen(&ConflictId::new()).await,
            Err(Error::NotFound(_))
        ));
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_history_includes_resolved_and_respects_limit() {
        let (_db, repo) = setup().await;
        let first = conflict("agency-1", "p-1", 100);
        let second = conflict("agency-1", "p-2", 200);
        let third = conflict("agency-1", "p-3", 300);
        for c in [&first, &second, &third] {
            repo.insert(c).await.unwrap();
        }
        repo.resolve(&third.id, &Record::new(), "manual")
            .await
            .unwrap();

        let history = repo.history("agency-1", 2).await.unwrap();
        let ids: Vec<ConflictId> = history.iter().map(|c| c.id).collect();
        assert_eq!(ids, vec![third.id, second.id]);
        assert!(history[0].is_resolved);
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_stats() {
        let (_db, repo) = setup().await;
        let conflicts: Vec<Conflict> = (0..4)
            .map(|i| conflict("agency-1", &format!("p-{i}"), 100 + i))
            .collect();
        for c in &conflicts {
            repo.insert(c).await.unwrap();
        }
        repo.resolve(&conflicts[0].id, &Record::new(), "manual")
            .await
            .unwrap();
        repo.resolve(&conflicts[1].id, &Record::new(), "last_write_wins")
            .await
            .unwrap();

        let stats = repo.stats("agency-1").await.unwrap();
        assert_eq!(
            stats,
            ConflictStats {
                total: 4,
                resolved: 2,
                pending: 2,
                auto_resolved: 1,
            }
        );
        assert_eq!(stats.resolved + stats.pending, stats.total);

        assert_eq!(
            repo.stats("nobody").await.unwrap(),
            ConflictStats::default()
        );
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_versions_are_numbered_per_record() {
        let (_db, repo) = setup().await;
        let v1 = repo
            .append_version("agency_projects", "p-1", &record(json!({"v": 1})))
            .await
            .unwrap();
        let v2 = repo
            .append_version("agency_projects", "p-1", &record(json!({"v": 2})))
            .await
            .unwrap();
        let other = repo
            .append_version("agency_projects", "p-2", &record(json!({"v": 9})))
            .await
            .unwrap();

        assert_eq!(v1.version, 1);
        assert_eq!(v2.version, 2);
        assert_eq!(other.version, 1);
        assert_eq!(v2.change_type, CONFLICT_RESOLUTION_CHANGE);

        let log = repo.versions("agency_projects", "p-1").await.unwrap();
        assert_eq!(log, vec![v1, v2]);
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_storage_failure_is_an_error_not_an_empty_list() {
        let (db, repo) = setup().await;
        db.connection()
            .execute("DROP TABLE conflicts", ())
            .await
            .unwrap();

        let result = repo.list_unresolved("agency-1").await;
        let error = result.unwrap_err();
        assert!(error.is_storage());
    }
}

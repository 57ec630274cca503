//! Database migrations

use crate::error::Result;
use libsql::Connection;

/// Current schema version
const CURRENT_VERSION: i32 = 2;

/// Run all pending migrations
pub async fn run(conn: &Connection) -> Result<()> {
    let version = get_version(conn).await?;

    if version < 1 {
        migrate_v1(conn).await?;
    }
    if version < 2 {
        migrate_v2(conn).await?;
    }

    Ok(())
}

/// Get the current schema version
async fn get_version(conn: &Connection) -> Result<i32> {
    // Check if schema_version table exists
    let mut rows = conn
        .query(
            "SELECT EXISTS(SELECT 1 FROM sqlite_master WHERE type='table' AND name='schema_version')",
            (),
        )
        .await?;

    let exists: bool = if let Some(row) = rows.next().await? {
        row.get::<i32>(0)? != 0
    } else {
        false
    };

    if !exists {
        return Ok(0);
    }

    let mut rows = conn
        .query("SELECT COALESCE(MAX(version), 0) FROM schema_version", ())
        .await?;

    let version: i32 = if let Some(row) = rows.next().await? {
        row.get(0)?
    } else {
        0
    };

    Ok(version)
}

/// Run statements inside one transaction, rolling back on the first failure
async fn apply(conn: &Connection, statements: &[&str]) -> Result<()> {
    conn.execute("BEGIN TRANSACTION", ()).await?;

    for stmt in statements {
        if let Err(e) = conn.execute(stmt, ()).await {
            conn.execute("ROLLBACK", ()).await.ok();
            return Err(e.into());
        }
    }

    if let Err(e) = conn.execute("COMMIT", ()).await {
        conn.execute("ROLLBACK", ()).await.ok();
        return Err(e.into());
    }

    Ok(())
}

/// Migration to version 1: conflict records
async fn migrate_v1(conn: &Connection) -> Result<()> {
    apply(
        conn,
        &[
            // Schema version tracking
            "CREATE TABLE IF NOT EXISTS schema_version (
                version INTEGER PRIMARY KEY
            )",
            "CREATE TABLE IF NOT EXISTS conflicts (
                id TEXT PRIMARY KEY,
                agency_id TEXT NOT NULL,
                table_name TEXT NOT NULL,
                record_id TEXT NOT NULL,
                source_data TEXT NOT NULL,
                target_data TEXT NOT NULL,
                conflict_type TEXT NOT NULL,
                is_resolved INTEGER NOT NULL DEFAULT 0,
                resolved_at INTEGER,
                resolved_data TEXT,
                resolution_strategy TEXT,
                created_at INTEGER NOT NULL
            )",
            "CREATE INDEX IF NOT EXISTS idx_conflicts_agency_resolved ON conflicts(agency_id, is_resolved)",
            "CREATE INDEX IF NOT EXISTS idx_conflicts_created ON conflicts(created_at DESC)",
            "CREATE INDEX IF NOT EXISTS idx_conflicts_record ON conflicts(table_name, record_id)",
            "INSERT INTO schema_version (version) VALUES (1)",
        ],
    )
    .await?;

    tracing::info!("Migrated database to version 1");
    Ok(())
}

/// Migration to version 2: append-only data version log
async fn migrate_v2(conn: &Connection) -> Result<()> {
    apply(
        conn,
        &[
            "CREATE TABLE IF NOT EXISTS data_versions (
                id TEXT PRIMARY KEY,
                table_name TEXT NOT NULL,
                record_id TEXT NOT NULL,
                version INTEGER NOT NULL,
                data TEXT NOT NULL,
                change_type TEXT NOT NULL,
                created_at INTEGER NOT NULL,
                UNIQUE (table_name, record_id, version)
            )",
            "CREATE TRIGGER IF NOT EXISTS data_versions_no_update BEFORE UPDATE ON data_versions
             BEGIN
                 SELECT RAISE(ABORT, 'data_versions is append-only');
             END",
            "CREATE TRIGGER IF NOT EXISTS data_versions_no_delete BEFORE DELETE ON data_versions
             BEGIN
                 SELECT RAISE(ABORT, 'data_versions is append-only');
             END",
            "INSERT INTO schema_version (version) VALUES (2)",
        ],
    )
    .await?;

    tracing::info!("Migrated database to version {CURRENT_VERSION}");
    Ok(())
}

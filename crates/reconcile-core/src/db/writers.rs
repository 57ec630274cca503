//! Authoritative table writers, looked up by table name.

use std::collections::HashMap;
use std::sync::{Arc, OnceLock};

use async_trait::async_trait;
use libsql::{params, Connection};
use regex::Regex;

use crate::error::{Error, Result};
use crate::models::Record;
use crate::util::unix_millis_now;

/// Writes resolved records into one authoritative table.
#[async_trait]
pub trait TableWriter: Send + Sync {
    /// Insert or replace the record stored under `record_id`
    async fn upsert(&self, record_id: &str, data: &Record) -> Result<()>;
}

/// Table name to writer mapping, built once and injected into the service.
#[derive(Clone, Default)]
pub struct WriterRegistry {
    writers: HashMap<String, Arc<dyn TableWriter>>,
}

impl WriterRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Register (or replace) the writer for `table_name`
    pub fn register(&mut self, table_name: impl Into<String>, writer: Arc<dyn TableWriter>) {
        self.writers.insert(table_name.into(), writer);
    }

    /// Builder-style variant of [`register`](Self::register)
    #[must_use]
    pub fn with_writer(mut self, table_name: impl Into<String>, writer: Arc<dyn TableWriter>) -> Self {
        self.register(table_name, writer);
        self
    }

    /// Writer for `table_name`, if one is registered
    pub fn get(&self, table_name: &str) -> Option<Arc<dyn TableWriter>> {
        self.writers.get(table_name).cloned()
    }

    /// Registered table names, sorted
    pub fn tables(&self) -> Vec<String> {
        let mut tables: Vec<String> = self.writers.keys().cloned().collect();
        tables.sort();
        tables
    }

    pub fn is_empty(&self) -> bool {
        self.writers.is_empty()
    }
}

/// Check that `name` can be interpolated into SQL as a bare identifier.
pub fn validate_table_name(name: &str) -> Result<()> {
    static IDENTIFIER: OnceLock<Regex> = OnceLock::new();
    let identifier = IDENTIFIER
        .get_or_init(|| Regex::new(r"^[A-Za-z_][A-Za-z0-9_]{0,62}$").expect("Invalid regex"));

    if !identifier.is_match(name) || name.to_ascii_lowercase().starts_with("sqlite_") {
        return Err(Error::InvalidInput(format!("invalid table name '{name}'")));
    }
    if matches!(name, "conflicts" | "data_versions" | "schema_version") {
        return Err(Error::InvalidInput(format!(
            "table name '{name}' is reserved for the conflict store"
        )));
    }
    Ok(())
}

/// Stores records as JSON documents in a libSQL table keyed by record id.
pub struct LibSqlTableWriter {
    conn: Connection,
    table: String,
}

impl LibSqlTableWriter {
    /// Create the writer, creating its table if needed
    pub async fn open(conn: Connection, table: impl Into<String>) -> Result<Self> {
        let table = table.into();
        validate_table_name(&table)?;

        conn.execute(
            &format!(
                "CREATE TABLE IF NOT EXISTS \"{table}\" (
                    record_id TEXT PRIMARY KEY,
                    data TEXT NOT NULL,
                    updated_at INTEGER NOT NULL
                )"
            ),
            (),
        )
        .await?;

        tracing::debug!("Table writer ready for {table}");
        Ok(Self { conn, table })
    }

    /// Table this writer targets
    pub fn table(&self) -> &str {
        &self.table
    }

    /// Read back the stored record
    pub async fn fetch(&self, record_id: &str) -> Result<Option<Record>> {
        let mut rows = self
            .conn
            .query(
                &format!("SELECT data FROM \"{}\" WHERE record_id = ?", self.table),
                [record_id],
            )
            .await?;

        match rows.next().await? {
            Some(row) => Ok(Some(serde_json::from_str(&row.get::<String>(0)?)?)),
            None => Ok(None),
        }
    }
}

#[async_trait]
impl TableWriter for LibSqlTableWriter {
    async fn upsert(&self, record_id: &str, data: &Record) -> Result<()> {
        self.conn
            .execute(
                &format!(
                    "INSERT INTO \"{}\" (record_id, data, updated_at) VALUES (?, ?, ?)
                     ON CONFLICT(record_id) DO UPDATE SET data = excluded.data, updated_at = excluded.updated_at",
                    self.table
                ),
                params![record_id, serde_json::to_string(data)?, unix_millis_now()],
            )
            .await?;
        Ok(())
    }
}

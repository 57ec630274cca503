use std::env;
use std::io::{self, Read};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use reconcile_core::config::EngineConfig;
use reconcile_core::db::{Database, LibSqlConflictRepository, LibSqlTableWriter, WriterRegistry};
use reconcile_core::{
    BatchOutcome, Conflict, ConflictId, ConflictService, ConflictStats, DataVersion,
    ResolutionStrategy, Suggestion,
};
use serde::Serialize;

use crate::error::CliError;

/// Database handle plus the service built over it.
pub struct Engine {
    _db: Database,
    pub config: EngineConfig,
    pub service: ConflictService<LibSqlConflictRepository>,
}

#[derive(Debug, Serialize)]
pub struct ConflictItem {
    pub id: String,
    pub agency_id: String,
    pub table_name: String,
    pub record_id: String,
    pub conflict_type: String,
    pub is_resolved: bool,
    pub resolution_strategy: Option<String>,
    pub created_at: i64,
    pub created_at_iso: String,
    pub resolved_at: Option<i64>,
}

pub async fn open_engine(db_path: &Path, config_path: &Path) -> Result<Engine, CliError> {
    let config = EngineConfig::load_from_path(config_path)?;
    open_engine_with_config(db_path, config).await
}

pub async fn open_engine_with_config(
    db_path: &Path,
    config: EngineConfig,
) -> Result<Engine, CliError> {
    if let Some(parent) = db_path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    let db = Database::open(db_path).await?;
    let mut writers = WriterRegistry::new();
    for table in &config.tables {
        let writer = LibSqlTableWriter::open(db.connection().clone(), table.as_str()).await?;
        writers.register(table.as_str(), Arc::new(writer));
    }
    if writers.is_empty() {
        tracing::debug!("No tables configured; resolutions cannot be applied");
    }

    let repo = LibSqlConflictRepository::new(db.connection().clone());
    let service = ConflictService::new(repo, writers).with_history_limit(config.history_limit);

    Ok(Engine {
        _db: db,
        config,
        service,
    })
}

impl Engine {
    /// Fetch a conflict by its textual id
    pub async fn conflict(&self, raw_id: &str) -> Result<Conflict, CliError> {
        let id = parse_conflict_id(raw_id)?;
        self.service
            .get_conflict(&id)
            .await?
            .ok_or_else(|| CliError::ConflictNotFound(raw_id.trim().to_string()))
    }

    /// Parse a strategy name; a bare `merge` picks up the configured options
    pub fn strategy(&self, name: &str) -> Result<ResolutionStrategy, CliError> {
        resolve_strategy(name, &self.config)
    }
}

pub fn resolve_strategy(name: &str, config: &EngineConfig) -> Result<ResolutionStrategy, CliError> {
    match name.parse::<ResolutionStrategy>()? {
        ResolutionStrategy::Merge(options) if options.is_empty() => Ok(config.merge_strategy()),
        strategy => Ok(strategy),
    }
}

pub fn parse_conflict_id(raw: &str) -> Result<ConflictId, CliError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(CliError::EmptyConflictId);
    }
    trimmed
        .parse::<ConflictId>()
        .map_err(|_| CliError::InvalidConflictId(trimmed.to_string()))
}

/// Read a JSON payload from a file, or stdin when the path is `-`.
pub fn read_json_input(path: &Path) -> Result<String, CliError> {
    if path.as_os_str() == "-" {
        let mut buffer = String::new();
        io::stdin().lock().read_to_string(&mut buffer)?;
        return Ok(buffer);
    }
    Ok(std::fs::read_to_string(path)?)
}

pub fn conflict_to_item(conflict: &Conflict) -> ConflictItem {
    ConflictItem {
        id: conflict.id.to_string(),
        agency_id: conflict.agency_id.clone(),
        table_name: conflict.table_name.clone(),
        record_id: conflict.record_id.clone(),
        conflict_type: conflict.conflict_type.clone(),
        is_resolved: conflict.is_resolved,
        resolution_strategy: conflict.resolution_strategy.clone(),
        created_at: conflict.created_at,
        created_at_iso: format_timestamp(conflict.created_at),
        resolved_at: conflict.resolved_at,
    }
}

pub fn format_conflict_lines(conflicts: &[Conflict]) -> Vec<String> {
    conflicts
        .iter()
        .map(|conflict| {
            let id = conflict.id.to_string();
            let short_id = id.chars().take(13).collect::<String>();
            let status = conflict
                .resolution_strategy
                .as_deref()
                .filter(|_| conflict.is_resolved)
                .unwrap_or("pending");
            format!(
                "{short_id:<13}  {}  {:<16}  {}/{}",
                format_timestamp(conflict.created_at),
                status,
                conflict.table_name,
                conflict.record_id
            )
        })
        .collect()
}

pub fn format_suggestion_lines(suggestions: &[Suggestion]) -> Vec<String> {
    suggestions
        .iter()
        .map(|suggestion| {
            format!(
                "{:<20}  {:>3.0}%  {}  ({})",
                suggestion.field,
                suggestion.confidence * 100.0,
                suggestion.recommended_value,
                suggestion.reason
            )
        })
        .collect()
}

pub fn format_version_lines(versions: &[DataVersion]) -> Vec<String> {
    versions
        .iter()
        .map(|version| {
            format!(
                "v{:<4}  {}  {}",
                version.version,
                format_timestamp(version.created_at),
                version.change_type
            )
        })
        .collect()
}

pub fn format_stats_lines(stats: &ConflictStats) -> Vec<String> {
    vec![
        format!("Total:         {}", stats.total),
        format!("Resolved:      {}", stats.resolved),
        format!("Pending:       {}", stats.pending),
        format!("Auto-resolved: {}", stats.auto_resolved),
    ]
}

pub fn format_outcome_lines(outcome: &BatchOutcome) -> Vec<String> {
    let mut lines = vec![
        format!("Resolved: {}", outcome.resolved),
        format!(
            "Failed:   {} ({} need manual resolution)",
            outcome.failed, outcome.manual_required
        ),
    ];
    if outcome.cancelled {
        lines.push(format!("Cancelled with {} conflicts not attempted", outcome.skipped));
    }
    lines
}

pub fn format_timestamp(timestamp_ms: i64) -> String {
    chrono::DateTime::from_timestamp_millis(timestamp_ms).map_or_else(
        || timestamp_ms.to_string(),
        |date_time| date_time.format("%Y-%m-%d %H:%M:%S UTC").to_string(),
    )
}

pub fn resolve_db_path(cli_db_path: Option<PathBuf>) -> PathBuf {
    cli_db_path
        .or_else(|| env::var_os("RECONCILE_DB_PATH").map(PathBuf::from))
        .unwrap_or_else(default_db_path)
}

pub fn default_db_path() -> PathBuf {
    dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("reconcile")
        .join("reconcile.db")
}

pub fn resolve_config_path(cli_config: Option<PathBuf>) -> PathBuf {
    cli_config
        .or_else(|| env::var_os("RECONCILE_CONFIG").map(PathBuf::from))
        .unwrap_or_else(default_config_path)
}

pub fn default_config_path() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("reconcile")
        .join("config.json")
}

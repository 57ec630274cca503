use std::path::Path;

use reconcile_core::{DataVersion, Record};
use serde_json::Value;

use crate::commands::common::{parse_conflict_id, read_json_input, Engine};
use crate::error::CliError;

pub async fn run_resolve(
    id: &str,
    strategy_name: &str,
    data: Option<&Path>,
    engine: &Engine,
) -> Result<(), CliError> {
    let version = resolve(id, strategy_name, data, engine).await?;
    println!(
        "Resolved {} -> {}/{} v{}",
        id.trim(),
        version.table_name,
        version.record_id,
        version.version
    );
    Ok(())
}

/// Resolve one conflict, either with explicit data or by running the strategy.
pub async fn resolve(
    id: &str,
    strategy_name: &str,
    data: Option<&Path>,
    engine: &Engine,
) -> Result<DataVersion, CliError> {
    let conflict_id = parse_conflict_id(id)?;
    let strategy = engine.strategy(strategy_name)?;

    let version = match data {
        Some(path) => {
            let record = parse_record(&read_json_input(path)?)?;
            engine
                .service
                .resolve_conflict(&conflict_id, &record, &strategy)
                .await?
        }
        None => {
            engine
                .service
                .resolve_with_strategy(&conflict_id, &strategy)
                .await?
        }
    };
    Ok(version)
}

pub fn parse_record(payload: &str) -> Result<Record, CliError> {
    match serde_json::from_str::<Value>(payload)? {
        Value::Object(record) => Ok(record),
        _ => Err(CliError::InvalidResolvedData),
    }
}

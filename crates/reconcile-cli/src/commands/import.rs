use std::path::Path;

use reconcile_core::{Conflict, DetectedConflict};

use crate::commands::common::{read_json_input, Engine};
use crate::error::CliError;

pub async fn run_import(file: &Path, engine: &Engine) -> Result<(), CliError> {
    let payload = read_json_input(file)?;
    let conflicts = import_conflicts(&payload, engine).await?;

    for conflict in &conflicts {
        println!(
            "{}  {}/{}",
            conflict.id, conflict.table_name, conflict.record_id
        );
    }
    println!("Imported {} conflicts", conflicts.len());
    Ok(())
}

/// Record every detected conflict in a JSON array payload.
///
/// Every entry is parsed and validated before the first insert, so a
/// malformed or blank-id entry imports nothing.
pub async fn import_conflicts(payload: &str, engine: &Engine) -> Result<Vec<Conflict>, CliError> {
    let detected = serde_json::from_str::<Vec<DetectedConflict>>(payload)?;
    for entry in &detected {
        entry.validate()?;
    }

    let mut conflicts = Vec::with_capacity(detected.len());
    for entry in detected {
        conflicts.push(engine.service.record_conflict(entry).await?);
    }
    Ok(conflicts)
}

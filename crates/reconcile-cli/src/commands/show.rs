use reconcile_core::{Conflict, Record};

use crate::commands::common::{format_timestamp, Engine};
use crate::error::CliError;

pub async fn run_show(id: &str, as_json: bool, engine: &Engine) -> Result<(), CliError> {
    let conflict = engine.conflict(id).await?;

    if as_json {
        println!("{}", serde_json::to_string_pretty(&conflict)?);
        return Ok(());
    }

    for line in format_conflict_details(&conflict)? {
        println!("{line}");
    }
    Ok(())
}

pub fn format_conflict_details(conflict: &Conflict) -> Result<Vec<String>, CliError> {
    let mut lines = vec![
        format!("Conflict:  {}", conflict.id),
        format!("Agency:    {}", conflict.agency_id),
        format!("Record:    {}/{}", conflict.table_name, conflict.record_id),
        format!("Type:      {}", conflict.conflict_type),
        format!("Detected:  {}", format_timestamp(conflict.created_at)),
    ];

    match (&conflict.resolution_strategy, conflict.resolved_at) {
        (Some(strategy), Some(resolved_at)) if conflict.is_resolved => lines.push(format!(
            "Resolved:  {} via {strategy}",
            format_timestamp(resolved_at)
        )),
        _ => lines.push("Resolved:  no".to_string()),
    }

    push_record(&mut lines, "Source", &conflict.source_data)?;
    push_record(&mut lines, "Target", &conflict.target_data)?;
    if let Some(resolved) = &conflict.resolved_data {
        push_record(&mut lines, "Resolved data", resolved)?;
    }
    Ok(lines)
}

fn push_record(lines: &mut Vec<String>, label: &str, record: &Record) -> Result<(), CliError> {
    lines.push(String::new());
    lines.push(format!("{label}:"));
    lines.push(serde_json::to_string_pretty(record)?);
    Ok(())
}

use crate::commands::common::{conflict_to_item, format_conflict_lines, ConflictItem, Engine};
use crate::error::CliError;

pub async fn run_history(
    agency_id: &str,
    limit: Option<usize>,
    as_json: bool,
    engine: &Engine,
) -> Result<(), CliError> {
    let conflicts = engine.service.history(agency_id, limit).await?;

    if as_json {
        let json_items = conflicts
            .iter()
            .map(conflict_to_item)
            .collect::<Vec<ConflictItem>>();
        println!("{}", serde_json::to_string_pretty(&json_items)?);
        return Ok(());
    }

    if conflicts.is_empty() {
        println!("No conflicts recorded for {agency_id}.");
        return Ok(());
    }

    for line in format_conflict_lines(&conflicts) {
        println!("{line}");
    }
    Ok(())
}

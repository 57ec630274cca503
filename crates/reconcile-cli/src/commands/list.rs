use crate::commands::common::{conflict_to_item, format_conflict_lines, ConflictItem, Engine};
use crate::error::CliError;

pub async fn run_list(agency_id: &str, as_json: bool, engine: &Engine) -> Result<(), CliError> {
    let conflicts = engine.service.list_unresolved(agency_id).await?;

    if as_json {
        let json_items = conflicts
            .iter()
            .map(conflict_to_item)
            .collect::<Vec<ConflictItem>>();
        println!("{}", serde_json::to_string_pretty(&json_items)?);
        return Ok(());
    }

    if conflicts.is_empty() {
        println!("No pending conflicts for {agency_id}.");
        return Ok(());
    }

    for line in format_conflict_lines(&conflicts) {
        println!("{line}");
    }
    Ok(())
}

use crate::commands::common::{format_suggestion_lines, parse_conflict_id, Engine};
use crate::error::CliError;

pub async fn run_suggest(id: &str, as_json: bool, engine: &Engine) -> Result<(), CliError> {
    let conflict_id = parse_conflict_id(id)?;
    let suggestions = engine.service.suggest_for(&conflict_id).await?;

    if as_json {
        println!("{}", serde_json::to_string_pretty(&suggestions)?);
        return Ok(());
    }

    if suggestions.is_empty() {
        println!("Both snapshots are empty; nothing to suggest.");
        return Ok(());
    }

    for line in format_suggestion_lines(&suggestions) {
        println!("{line}");
    }
    Ok(())
}

use crate::commands::common::{format_version_lines, Engine};
use crate::error::CliError;

pub async fn run_versions(
    table_name: &str,
    record_id: &str,
    as_json: bool,
    engine: &Engine,
) -> Result<(), CliError> {
    let versions = engine.service.versions(table_name, record_id).await?;

    if as_json {
        println!("{}", serde_json::to_string_pretty(&versions)?);
        return Ok(());
    }

    if versions.is_empty() {
        println!("No versions recorded for {table_name}/{record_id}.");
        return Ok(());
    }

    for line in format_version_lines(&versions) {
        println!("{line}");
    }
    Ok(())
}

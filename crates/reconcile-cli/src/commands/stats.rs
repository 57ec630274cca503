use crate::commands::common::{format_stats_lines, Engine};
use crate::error::CliError;

pub async fn run_stats(agency_id: &str, as_json: bool, engine: &Engine) -> Result<(), CliError> {
    let stats = engine.service.stats(agency_id).await?;

    if as_json {
        println!("{}", serde_json::to_string_pretty(&stats)?);
    } else {
        for line in format_stats_lines(&stats) {
            println!("{line}");
        }
    }
    Ok(())
}

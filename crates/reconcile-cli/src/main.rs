//! Reconcile CLI - review and resolve agency data sync conflicts
//!
//! Imports detected conflicts, shows suggestions, and applies resolutions to
//! the local authoritative tables.

mod cli;
mod commands;
mod error;

use clap::Parser;
use tracing_subscriber::filter::Directive;

use crate::cli::{Cli, Commands};
use crate::commands::auto_resolve::run_auto_resolve;
use crate::commands::common::{open_engine, resolve_config_path, resolve_db_path};
use crate::commands::history::run_history;
use crate::commands::import::run_import;
use crate::commands::list::run_list;
use crate::commands::resolve::run_resolve;
use crate::commands::show::run_show;
use crate::commands::stats::run_stats;
use crate::commands::suggest::run_suggest;
use crate::commands::versions::run_versions;
use crate::error::CliError;

#[tokio::main]
async fn main() {
    if let Err(error) = run().await {
        eprintln!("Error: {error}");
        std::process::exit(1);
    }
}

async fn run() -> Result<(), CliError> {
    dotenvy::dotenv().ok();

    let directive: Directive = "reconcile=info"
        .parse()
        .map_err(|error| CliError::Config(format!("invalid log directive: {error}")))?;
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env().add_directive(directive))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let db_path = resolve_db_path(cli.db_path);
    let config_path = resolve_config_path(cli.config);
    let engine = open_engine(&db_path, &config_path).await?;

    match cli.command {
        Commands::Import { file } => run_import(&file, &engine).await?,
        Commands::List { agency, json } => run_list(&agency, json, &engine).await?,
        Commands::Show { id, json } => run_show(&id, json, &engine).await?,
        Commands::Suggest { id, json } => run_suggest(&id, json, &engine).await?,
        Commands::Resolve { id, strategy, data } => {
            run_resolve(&id, &strategy, data.as_deref(), &engine).await?;
        }
        Commands::AutoResolve {
            agency,
            strategy,
            timeout_secs,
            json,
        } => run_auto_resolve(&agency, &strategy, timeout_secs, json, &engine).await?,
        Commands::History {
            agency,
            limit,
            json,
        } => run_history(&agency, limit, json, &engine).await?,
        Commands::Stats { agency, json } => run_stats(&agency, json, &engine).await?,
        Commands::Versions {
            table,
            record_id,
            json,
        } => run_versions(&table, &record_id, json, &engine).await?,
    }

    Ok(())
}

#[cfg(test)]
mod tests;

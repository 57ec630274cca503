use std::time::Duration;

use reconcile_core::BatchOutcome;
use tokio_util::sync::CancellationToken;

use crate::commands::common::{format_outcome_lines, Engine};
use crate::error::CliError;

pub async fn run_auto_resolve(
    agency_id: &str,
    strategy_name: &str,
    timeout_secs: Option<u64>,
    as_json: bool,
    engine: &Engine,
) -> Result<(), CliError> {
    let outcome = auto_resolve(
        agency_id,
        strategy_name,
        timeout_secs.map(Duration::from_secs),
        engine,
    )
    .await?;

    if as_json {
        println!("{}", serde_json::to_string_pretty(&outcome)?);
    } else {
        for line in format_outcome_lines(&outcome) {
            println!("{line}");
        }
    }
    Ok(())
}

/// Run the batch, cancelling between conflicts on timeout or Ctrl-C.
pub async fn auto_resolve(
    agency_id: &str,
    strategy_name: &str,
    timeout: Option<Duration>,
    engine: &Engine,
) -> Result<BatchOutcome, CliError> {
    let strategy = engine.strategy(strategy_name)?;
    let cancel = CancellationToken::new();

    let watcher = {
        let cancel = cancel.clone();
        tokio::spawn(async move {
            let deadline = async {
                match timeout {
                    Some(timeout) => tokio::time::sleep(timeout).await,
                    None => std::future::pending::<()>().await,
                }
            };
            let interrupt = async {
                if tokio::signal::ctrl_c().await.is_err() {
                    std::future::pending::<()>().await;
                }
            };
            tokio::select! {
                () = deadline => tracing::warn!("Auto-resolve timed out, stopping"),
                () = interrupt => tracing::warn!("Interrupted, stopping auto-resolve"),
            }
            cancel.cancel();
        })
    };

    let outcome = engine
        .service
        .auto_resolve_conflicts(agency_id, &strategy, &cancel)
        .await;
    watcher.abort();

    Ok(outcome?)
}

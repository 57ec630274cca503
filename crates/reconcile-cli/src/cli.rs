use std::path::PathBuf;

use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "reconcile")]
#[command(about = "Review and resolve agency data sync conflicts")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Optional path to local database file
    #[arg(long, global = true, value_name = "PATH")]
    pub db_path: Option<PathBuf>,

    /// Optional path to engine config (JSON)
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Record detected conflicts from a JSON array ("-" reads stdin)
    Import {
        /// File containing detected conflicts
        file: PathBuf,
    },
    /// List unresolved conflicts for an agency
    List {
        /// Agency identifier
        #[arg(short, long)]
        agency: String,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Show one conflict with both snapshots
    Show {
        /// Conflict ID
        id: String,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Show per-field suggestions for a conflict
    Suggest {
        /// Conflict ID
        id: String,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Resolve one conflict
    Resolve {
        /// Conflict ID
        id: String,
        /// Strategy: last_write_wins, merge or manual
        #[arg(short, long, default_value = "merge")]
        strategy: String,
        /// JSON file with the resolved record, required for manual
        #[arg(long, value_name = "PATH")]
        data: Option<PathBuf>,
    },
    /// Resolve every pending conflict of an agency with one strategy
    AutoResolve {
        /// Agency identifier
        #[arg(short, long)]
        agency: String,
        /// Strategy: last_write_wins, merge or manual
        #[arg(short, long, default_value = "last_write_wins")]
        strategy: String,
        /// Stop between conflicts after this many seconds
        #[arg(long, value_name = "SECS")]
        timeout_secs: Option<u64>,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Show recent conflicts for an agency, resolved or not
    History {
        /// Agency identifier
        #[arg(short, long)]
        agency: String,
        /// Number of conflicts to show (defaults to the configured history limit)
        #[arg(short, long)]
        limit: Option<usize>,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Show conflict counters for an agency
    Stats {
        /// Agency identifier
        #[arg(short, long)]
        agency: String,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Show the version log of a record
    Versions {
        /// Authoritative table name
        table: String,
        /// Record identifier
        record_id: String,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}

use std::io;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum CliError {
    #[error(transparent)]
    Core(#[from] reconcile_core::Error),
    #[error(transparent)]
    Io(#[from] io::Error),
    #[error(transparent)]
    Serialization(#[from] serde_json::Error),
    #[error("Conflict ID cannot be empty")]
    EmptyConflictId,
    #[error("Invalid conflict ID: {0}")]
    InvalidConflictId(String),
    #[error("Conflict not found: {0}")]
    ConflictNotFound(String),
    #[error("Resolved data must be a JSON object")]
    InvalidResolvedData,
    #[error("Configuration error: {0}")]
    Config(String),
}

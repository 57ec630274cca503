//! reconcile-core - Core library for Reconcile
//!
//! This crate contains the conflict models, the libSQL persistence layer, and
//! the resolution pipeline (suggestions, strategies, applier, batch runner)
//! used by every Reconcile interface.

pub mod config;
pub mod db;
pub mod error;
pub mod models;
pub mod services;
pub mod strategy;
pub mod suggest;
pub mod util;

pub use error::{Error, Result};
pub use models::{
    Conflict, ConflictId, ConflictStats, DataVersion, DetectedConflict, Record,
    ResolutionStrategy, Suggestion,
};
pub use services::{BatchOutcome, ConflictService};

//! Data models for Reconcile

mod conflict;
mod data_version;
mod strategy;
mod suggestion;

pub use conflict::{Conflict, ConflictId, ConflictStats, DetectedConflict};
pub use data_version::{DataVersion, CONFLICT_RESOLUTION_CHANGE};
pub use strategy::{CustomRule, MergeOptions, ResolutionStrategy, RuleAction, Side};
pub use suggestion::Suggestion;

/// One side's snapshot of a record: field name to JSON value, in insertion order.
pub type Record = serde_json::Map<String, serde_json::Value>;

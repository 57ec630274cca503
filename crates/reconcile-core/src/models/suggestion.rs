//! Suggestion model

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Advisory per-field resolution produced by the suggestion engine.
///
/// Confidence is display-only; nothing in the pipeline gates on it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Suggestion {
    pub field: String,
    pub source_value: Value,
    pub target_value: Value,
    pub recommended_value: Value,
    /// 0.0 to 1.0
    pub confidence: f64,
    pub reason: String,
}

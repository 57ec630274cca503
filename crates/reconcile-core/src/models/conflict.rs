//! Conflict model

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

use super::Record;
use crate::error::{Error, Result};
use crate::util::normalize_text_option;

/// A unique identifier for a conflict, using UUID v7 (time-sortable)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ConflictId(Uuid);

impl ConflictId {
    /// Create a new unique conflict ID using UUID v7
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::now_v7())
    }

    /// Get the string representation of this ID
    #[must_use]
    pub fn as_str(&self) -> String {
        self.0.to_string()
    }
}

impl Default for ConflictId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ConflictId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for ConflictId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Ok(Self(Uuid::parse_str(s)?))
    }
}

/// Divergence reported by the upstream detector, before it is stored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DetectedConflict {
    pub agency_id: String,
    pub table_name: String,
    pub record_id: String,
    pub source_data: Record,
    pub target_data: Record,
    #[serde(default = "default_conflict_type")]
    pub conflict_type: String,
}

impl DetectedConflict {
    /// Reject reports with a blank agency, table or record id.
    pub fn validate(&self) -> Result<()> {
        for (name, value) in [
            ("agency_id", &self.agency_id),
            ("table_name", &self.table_name),
            ("record_id", &self.record_id),
        ] {
            if normalize_text_option(Some(value.clone())).is_none() {
                return Err(Error::InvalidInput(format!("{name} must not be empty")));
            }
        }
        Ok(())
    }
}

fn default_conflict_type() -> String {
    "update_update".to_string()
}

/// A detected divergence between an agency's view of a record and the
/// platform's authoritative view.
///
/// Resolution is a one-way transition: once `is_resolved` is set the conflict
/// is only ever read.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Conflict {
    /// Unique identifier
    pub id: ConflictId,
    /// Agency (external source) the conflict belongs to
    pub agency_id: String,
    /// Authoritative table holding the record
    pub table_name: String,
    /// Record identifier within the table
    pub record_id: String,
    /// Agency snapshot at detection time
    pub source_data: Record,
    /// Platform snapshot at detection time
    pub target_data: Record,
    /// Detector classification, opaque to the engine
    pub conflict_type: String,
    /// Whether a resolution has been applied
    pub is_resolved: bool,
    /// Resolution timestamp (Unix ms)
    pub resolved_at: Option<i64>,
    /// Record that was applied
    pub resolved_data: Option<Record>,
    /// Label of the strategy that produced the resolution
    pub resolution_strategy: Option<String>,
    /// Detection timestamp (Unix ms)
    pub created_at: i64,
}

impl Conflict {
    /// Create a pending conflict from a detector report
    #[must_use]
    pub fn from_detected(detected: DetectedConflict) -> Self {
        Self {
            id: ConflictId::new(),
            agency_id: detected.agency_id,
            table_name: detected.table_name,
            record_id: detected.record_id,
            source_data: detected.source_data,
            target_data: detected.target_data,
            conflict_type: detected.conflict_type,
            is_resolved: false,
            resolved_at: None,
            resolved_data: None,
            resolution_strategy: None,
            created_at: chrono::Utc::now().timestamp_millis(),
        }
    }

    /// Whether the recorded resolution came from an automatic strategy
    #[must_use]
    pub fn is_auto_resolved(&self) -> bool {
        self.is_resolved
            && self
                .resolution_strategy
                .as_deref()
                .is_some_and(|strategy| strategy != super::ResolutionStrategy::MANUAL)
    }
}

/// Per-agency conflict counters.
///
/// `resolved + pending == total` always holds.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConflictStats {
    pub total: u64,
    pub resolved: u64,
    pub pending: u64,
    /// Resolved conflicts whose strategy label is not `manual`
    pub auto_resolved: u64,
}

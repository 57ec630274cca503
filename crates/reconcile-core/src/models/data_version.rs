//! Data version (audit snapshot) model

use serde::{Deserialize, Serialize};

use super::Record;

/// Change type recorded for versions written by the resolution applier
pub const CONFLICT_RESOLUTION_CHANGE: &str = "conflict_resolution";

/// Immutable snapshot of a record at the moment a resolution was applied.
///
/// Versions form an append-only log per `(table_name, record_id)`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DataVersion {
    pub id: String,
    pub table_name: String,
    pub record_id: String,
    /// 1-based, increasing per `(table_name, record_id)`
    pub version: i64,
    pub data: Record,
    pub change_type: String,
    /// Unix ms
    pub created_at: i64,
}

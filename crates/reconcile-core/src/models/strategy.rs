//! Resolution strategy configuration

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use crate::error::Error;

/// Which side of a conflict a value is taken from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Side {
    Source,
    Target,
}

/// What a custom merge rule does with its field
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RuleAction {
    PreferSource,
    PreferTarget,
    /// Array union when both sides are arrays, otherwise source-else-target
    Merge,
    /// Source value when present, otherwise target value
    RequireManual,
}

/// A per-field rule applied by the merge strategy, in list order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CustomRule {
    pub field: String,
    /// Opaque label carried for reporting; every rule applies.
    #[serde(default = "default_condition")]
    pub condition: String,
    pub action: RuleAction,
}

fn default_condition() -> String {
    "always".to_string()
}

/// Options for the merge strategy.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MergeOptions {
    /// Explicit field to side overrides, applied first
    #[serde(default)]
    pub field_priorities: BTreeMap<String, Side>,
    /// Applied after priorities, before the structural pass
    #[serde(default)]
    pub custom_rules: Vec<CustomRule>,
}

impl MergeOptions {
    /// Whether no priorities or rules are configured
    pub fn is_empty(&self) -> bool {
        self.field_priorities.is_empty() && self.custom_rules.is_empty()
    }
}

/// Policy used to compute a resolved record from a conflict
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ResolutionStrategy {
    /// Whole-record replace with the side whose timestamp is later
    LastWriteWins,
    /// Field-level merge starting from the target snapshot
    Merge(MergeOptions),
    /// Never produces a record; a human supplies it
    Manual,
}

impl ResolutionStrategy {
    pub const LAST_WRITE_WINS: &'static str = "last_write_wins";
    pub const MERGE: &'static str = "merge";
    pub const MANUAL: &'static str = "manual";

    /// Label stored with resolved conflicts
    pub const fn label(&self) -> &'static str {
        match self {
            Self::LastWriteWins => Self::LAST_WRITE_WINS,
            Self::Merge(_) => Self::MERGE,
            Self::Manual => Self::MANUAL,
        }
    }

    /// Merge strategy with no priorities or rules
    pub fn merge() -> Self {
        Self::Merge(MergeOptions::default())
    }
}

impl fmt::Display for ResolutionStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for ResolutionStrategy {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().replace('-', "_").as_str() {
            Self::LAST_WRITE_WINS | "lww" => Ok(Self::LastWriteWins),
            Self::MERGE => Ok(Self::merge()),
            Self::MANUAL => Ok(Self::Manual),
            other => Err(Error::InvalidInput(format!(
                "unknown resolution strategy '{other}'"
            ))),
        }
    }
}

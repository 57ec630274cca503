//! Engine configuration.
//!
//! A small JSON document naming the authoritative tables that get a writer,
//! the default history page size and the merge options used when the merge
//! strategy is chosen without explicit options.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::db::validate_table_name;
use crate::error::{Error, Result};
use crate::models::{MergeOptions, ResolutionStrategy};
use crate::services::DEFAULT_HISTORY_LIMIT;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct EngineConfig {
    #[serde(default = "default_history_limit")]
    pub history_limit: usize,
    /// Authoritative tables resolutions may be written to
    #[serde(default)]
    pub tables: Vec<String>,
    #[serde(default)]
    pub merge: MergeOptions,
}

const fn default_history_limit() -> usize {
    DEFAULT_HISTORY_LIMIT
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            history_limit: DEFAULT_HISTORY_LIMIT,
            tables: Vec::new(),
            merge: MergeOptions::default(),
        }
    }
}

/// Parse and validate a configuration payload.
pub fn parse_engine_config(payload: &str) -> Result<EngineConfig> {
    let config: EngineConfig = serde_json::from_str(payload)?;
    config.validate()?;
    Ok(config)
}

impl EngineConfig {
    /// Load from `path`, falling back to defaults when the file is missing.
    pub fn load_from_path(path: &Path) -> Result<Self> {
        if !path.exists() {
            tracing::debug!("No config at {}, using defaults", path.display());
            return Ok(Self::default());
        }

        let raw = std::fs::read_to_string(path)?;
        parse_engine_config(&raw).map_err(|error| {
            Error::InvalidInput(format!("invalid config at {}: {error}", path.display()))
        })
    }

    pub fn validate(&self) -> Result<()> {
        if self.history_limit == 0 {
            return Err(Error::InvalidInput(
                "history_limit must be greater than zero".to_string(),
            ));
        }
        for table in &self.tables {
            validate_table_name(table)?;
        }
        Ok(())
    }

    /// Merge strategy carrying the configured options
    pub fn merge_strategy(&self) -> ResolutionStrategy {
        ResolutionStrategy::Merge(self.merge.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{RuleAction, Side};
    use pretty_assertions::assert_eq;
    use tempfile::tempdir;

    #[test]
    fn test_parse_full_config() {
        let config = parse_engine_config(
            r#"{
                "history_limit": 20,
                "tables": ["agency_projects", "agency_contacts"],
                "merge": {
                    "field_priorities": {"status": "source"},
                    "custom_rules": [
                        {"field": "notes", "condition": "reviewed", "action": "require_manual"}
                    ]
                }
            }"#,
        )
        .unwrap();

        assert_eq!(config.history_limit, 20);
        assert_eq!(config.tables, vec!["agency_projects", "agency_contacts"]);
        assert_eq!(config.merge.field_priorities.get("status"), Some(&Side::Source));
        assert_eq!(config.merge.custom_rules[0].action, RuleAction::RequireManual);
        assert_eq!(config.merge_strategy().label(), "merge");
    }

    #[test]
    fn test_parse_empty_object_uses_defaults() {
        assert_eq!(parse_engine_config("{}").unwrap(), EngineConfig::default());
    }

    #[test]
    fn test_parse_rejects_unknown_fields() {
        assert!(parse_engine_config(r#"{"history": 5}"#).is_err());
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        assert!(matches!(
            parse_engine_config(r#"{"history_limit": 0}"#),
            Err(Error::InvalidInput(_))
        ));
        assert!(matches!(
            parse_engine_config(r#"{"tables": ["projects; --"]}"#),
            Err(Error::InvalidInput(_))
        ));
    }

    #[test]
    fn test_load_from_path() {
        let tmp = tempdir().unwrap();
        let path = tmp.path().join("config.json");
        assert_eq!(
            EngineConfig::load_from_path(&path).unwrap(),
            EngineConfig::default()
        );

        std::fs::write(&path, r#"{"tables": ["agency_projects"]}"#).unwrap();
        let loaded = EngineConfig::load_from_path(&path).unwrap();
        assert_eq!(loaded.tables, vec!["agency_projects"]);

        std::fs::write(&path, "not json").unwrap();
        let error = EngineConfig::load_from_path(&path).unwrap_err();
        assert!(error.to_string().contains("config.json"));
    }
}

use std::path::PathBuf;

use pretty_assertions::assert_eq;
use reconcile_core::config::EngineConfig;
use reconcile_core::models::Side;
use reconcile_core::{BatchOutcome, Error, ResolutionStrategy};
use serde_json::json;
use tempfile::{tempdir, TempDir};

use crate::commands::auto_resolve::auto_resolve;
use crate::commands::common::{
    format_conflict_lines, format_outcome_lines, format_timestamp, open_engine,
    open_engine_with_config, parse_conflict_id, resolve_config_path, resolve_db_path,
    resolve_strategy, Engine,
};
use crate::commands::import::import_conflicts;
use crate::commands::resolve::{parse_record, resolve};
use crate::commands::show::format_conflict_details;
use crate::error::CliError;

const DETECTED: &str = r#"[
    {
        "agency_id": "agency-1",
        "table_name": "agency_projects",
        "record_id": "p-1",
        "source_data": {"name": "Bridge", "count": 5, "updated_at": "2024-03-01T10:00:00Z"},
        "target_data": {"name": "Bridge repair", "count": 3, "updated_at": "2024-01-01T10:00:00Z"}
    },
    {
        "agency_id": "agency-1",
        "table_name": "agency_projects",
        "record_id": "p-2",
        "source_data": {"status": "closed"},
        "target_data": {"status": "open"},
        "conflict_type": "delete_update"
    }
]"#;

async fn setup() -> (TempDir, Engine) {
    let tmp = tempdir().unwrap();
    let config = EngineConfig {
        tables: vec!["agency_projects".to_string()],
        ..EngineConfig::default()
    };
    let engine = open_engine_with_config(&tmp.path().join("data").join("reconcile.db"), config)
        .await
        .unwrap();
    (tmp, engine)
}

#[test]
fn parse_conflict_id_rejects_empty_and_garbage() {
    assert!(matches!(parse_conflict_id("  "), Err(CliError::EmptyConflictId)));
    assert!(matches!(
        parse_conflict_id("not-a-uuid"),
        Err(CliError::InvalidConflictId(_))
    ));
    assert!(parse_conflict_id(" 0190b6f2-8c3a-7d4e-9f10-123456789abc ").is_ok());
}

#[test]
fn resolve_strategy_uses_configured_merge_options() {
    let config: EngineConfig =
        serde_json::from_value(json!({"merge": {"field_priorities": {"status": "source"}}}))
            .unwrap();

    let ResolutionStrategy::Merge(options) = resolve_strategy("merge", &config).unwrap() else {
        panic!("expected merge strategy");
    };
    assert_eq!(options.field_priorities.get("status"), Some(&Side::Source));

    assert_eq!(
        resolve_strategy("lww", &config).unwrap(),
        ResolutionStrategy::LastWriteWins
    );
    assert!(matches!(
        resolve_strategy("newest", &config),
        Err(CliError::Core(Error::InvalidInput(_)))
    ));
}

#[test]
fn explicit_paths_take_precedence() {
    let db_path = PathBuf::from("/tmp/explicit.db");
    assert_eq!(resolve_db_path(Some(db_path.clone())), db_path);

    let config_path = PathBuf::from("/tmp/explicit.json");
    assert_eq!(resolve_config_path(Some(config_path.clone())), config_path);
}

#[test]
fn format_timestamp_renders_utc() {
    assert_eq!(format_timestamp(0), "1970-01-01 00:00:00 UTC");
    assert_eq!(format_timestamp(1_704_067_200_000), "2024-01-01 00:00:00 UTC");
}

#[test]
fn parse_record_requires_object() {
    assert_eq!(parse_record(r#"{"a": 1}"#).unwrap()["a"], json!(1));
    assert!(matches!(parse_record("[1, 2]"), Err(CliError::InvalidResolvedData)));
    assert!(matches!(parse_record("{"), Err(CliError::Serialization(_))));
}

#[test]
fn outcome_lines_mention_cancellation() {
    let outcome = BatchOutcome {
        resolved: 2,
        failed: 1,
        manual_required: 1,
        skipped: 4,
        cancelled: true,
    };
    assert_eq!(
        format_outcome_lines(&outcome),
        vec![
            "Resolved: 2".to_string(),
            "Failed:   1 (1 need manual resolution)".to_string(),
            "Cancelled with 4 conflicts not attempted".to_string(),
        ]
    );
}

#[tokio::test(flavor = "multi_thread")]
async fn open_engine_rejects_invalid_config() {
    let tmp = tempdir().unwrap();
    let config_path = tmp.path().join("config.json");
    std::fs::write(&config_path, r#"{"history_limit": 0}"#).unwrap();

    let result = open_engine(&tmp.path().join("reconcile.db"), &config_path).await;
    assert!(matches!(result, Err(CliError::Core(Error::InvalidInput(_)))));
}

#[tokio::test(flavor = "multi_thread")]
async fn import_then_resolve_with_strategy() {
    let (_tmp, engine) = setup().await;

    let imported = import_conflicts(DETECTED, &engine).await.unwrap();
    assert_eq!(imported.len(), 2);
    assert_eq!(imported[1].conflict_type, "delete_update");

    let pending = engine.service.list_unresolved("agency-1").await.unwrap();
    assert_eq!(pending.len(), 2);
    assert!(format_conflict_lines(&pending)
        .iter()
        .all(|line| line.contains("pending")));

    let id = imported[0].id.to_string();
    let version = resolve(&id, "last_write_wins", None, &engine).await.unwrap();
    assert_eq!(version.version, 1);
    assert_eq!(version.data["name"], json!("Bridge"));

    let conflict = engine.conflict(&id).await.unwrap();
    let details = format_conflict_details(&conflict).unwrap();
    assert!(details.iter().any(|line| line.contains("via last_write_wins")));

    let stats = engine.service.stats("agency-1").await.unwrap();
    assert_eq!((stats.total, stats.resolved, stats.pending), (2, 1, 1));
}

#[tokio::test(flavor = "multi_thread")]
async fn import_rejects_malformed_payload_atomically() {
    let (_tmp, engine) = setup().await;

    let result = import_conflicts(r#"[{"agency_id": "agency-1"}]"#, &engine).await;
    assert!(matches!(result, Err(CliError::Serialization(_))));
    assert!(engine.service.history("agency-1", None).await.unwrap().is_empty());
}

#[tokio::test(flavor = "multi_thread")]
async fn import_rejects_blank_ids_before_storing_anything() {
    let (_tmp, engine) = setup().await;
    let payload = r#"[
        {
            "agency_id": "agency-1",
            "table_name": "agency_projects",
            "record_id": "p-1",
            "source_data": {"v": 1},
            "target_data": {"v": 2}
        },
        {
            "agency_id": "agency-1",
            "table_name": "agency_projects",
            "record_id": "  ",
            "source_data": {"v": 1},
            "target_data": {"v": 2}
        }
    ]"#;

    let result = import_conflicts(payload, &engine).await;
    assert!(matches!(result, Err(CliError::Core(Error::InvalidInput(_)))));
    assert!(engine.service.history("agency-1", None).await.unwrap().is_empty());
}

#[tokio::test(flavor = "multi_thread")]
async fn manual_resolution_needs_data_file() {
    let (tmp, engine) = setup().await;
    let imported = import_conflicts(DETECTED, &engine).await.unwrap();
    let id = imported[1].id.to_string();

    let missing = resolve(&id, "manual", None, &engine).await;
    assert!(matches!(
        missing,
        Err(CliError::Core(Error::ManualResolutionRequired(_)))
    ));

    let data_path = tmp.path().join("resolved.json");
    std::fs::write(&data_path, r#"{"status": "archived"}"#).unwrap();
    let version = resolve(&id, "manual", Some(&data_path), &engine)
        .await
        .unwrap();
    assert_eq!(version.data["status"], json!("archived"));

    let conflict = engine.conflict(&id).await.unwrap();
    assert_eq!(conflict.resolution_strategy.as_deref(), Some("manual"));
    assert!(!conflict.is_auto_resolved());
}

#[tokio::test(flavor = "multi_thread")]
async fn unknown_conflict_is_reported() {
    let (_tmp, engine) = setup().await;
    let result = engine.conflict("0190b6f2-8c3a-7d4e-9f10-123456789abc").await;
    assert!(matches!(result, Err(CliError::ConflictNotFound(_))));
}

#[tokio::test(flavor = "multi_thread")]
async fn auto_resolve_runs_whole_batch() {
    let (_tmp, engine) = setup().await;
    import_conflicts(DETECTED, &engine).await.unwrap();

    let outcome = auto_resolve("agency-1", "merge", None, &engine)
        .await
        .unwrap();
    assert_eq!(outcome.resolved, 2);
    assert_eq!(outcome.failed, 0);
    assert!(!outcome.cancelled);

    let versions = engine
        .service
        .versions("agency_projects", "p-1")
        .await
        .unwrap();
    assert_eq!(versions.len(), 1);
    assert_eq!(versions[0].data["count"], json!(3));
}

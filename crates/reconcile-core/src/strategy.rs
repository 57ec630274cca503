//! Strategy executor: turns a conflict plus a strategy into one resolved record.
//!
//! `None` means the strategy cannot decide and a human has to supply the
//! record. Nothing here performs I/O.

use std::collections::HashSet;

use serde_json::Value;

use crate::models::{
    Conflict, MergeOptions, Record, ResolutionStrategy, RuleAction, Side,
};
use crate::util::{parse_timestamp, values_equal};

/// Compute the resolved record for `conflict` under `strategy`.
pub fn apply_strategy(conflict: &Conflict, strategy: &ResolutionStrategy) -> Option<Record> {
    match strategy {
        ResolutionStrategy::LastWriteWins => Some(last_write_wins(
            &conflict.source_data,
            &conflict.target_data,
        )),
        ResolutionStrategy::Merge(options) => Some(merge_records(
            &conflict.source_data,
            &conflict.target_data,
            options,
        )),
        ResolutionStrategy::Manual => None,
    }
}

/// Whole-record replace with whichever side was written last.
///
/// Each side is dated by `updated_at`, falling back to `created_at`. The
/// source only wins when both sides are dated and the source is strictly
/// later.
pub fn last_write_wins(source: &Record, target: &Record) -> Record {
    let source_written = record_timestamp(source);
    let target_written = record_timestamp(target);

    match (source_written, target_written) {
        (Some(source_time), Some(target_time)) if source_time > target_time => source.clone(),
        _ => target.clone(),
    }
}

fn record_timestamp(record: &Record) -> Option<chrono::DateTime<chrono::Utc>> {
    record
        .get("updated_at")
        .filter(|value| !value.is_null())
        .or_else(|| record.get("created_at"))
        .and_then(parse_timestamp)
}

/// Field-level merge starting from the target snapshot.
///
/// Passes run in a fixed order and a field decided by an earlier pass is not
/// touched by a later one: field priorities, then custom rules, then the
/// structural pass (copy source-only fields, union arrays, shallow-merge
/// objects). Scalars present on both sides keep the target value.
pub fn merge_records(source: &Record, target: &Record, options: &MergeOptions) -> Record {
    let mut merged = target.clone();
    let mut decided: HashSet<&str> = HashSet::new();

    for (field, side) in &options.field_priorities {
        let chosen = match side {
            Side::Source => source.get(field),
            Side::Target => target.get(field),
        };
        if let Some(value) = chosen {
            merged.insert(field.clone(), value.clone());
            decided.insert(field.as_str());
        }
    }

    for rule in &options.custom_rules {
        if decided.contains(rule.field.as_str()) {
            continue;
        }
        let source_value = source.get(&rule.field);
        let target_value = target.get(&rule.field);

        let value = match rule.action {
            RuleAction::PreferSource => source_value.cloned(),
            RuleAction::PreferTarget => target_value.cloned(),
            RuleAction::Merge => match (source_value, target_value) {
                (Some(Value::Array(source_items)), Some(Value::Array(target_items))) => Some(
                    Value::Array(append_missing(target_items, source_items)),
                ),
                _ => source_or_target(source_value, target_value),
            },
            RuleAction::RequireManual => {
                tracing::debug!(
                    field = %rule.field,
                    condition = %rule.condition,
                    "Rule requires manual review; keeping source-else-target value"
                );
                source_or_target(source_value, target_value)
            }
        };

        if let Some(value) = value {
            merged.insert(rule.field.clone(), value);
            decided.insert(rule.field.as_str());
        }
    }

    for (field, source_value) in source {
        if decided.contains(field.as_str()) {
            continue;
        }
        if !merged.contains_key(field) {
            merged.insert(field.clone(), source_value.clone());
            continue;
        }
        let Some(current) = merged.get_mut(field) else {
            continue;
        };

        match (current, source_value) {
            (Value::Array(target_items), Value::Array(source_items)) => {
                let union = append_missing(target_items, source_items);
                *target_items = union;
            }
            (Value::Object(target_fields), Value::Object(source_fields)) => {
                for (key, value) in source_fields {
                    target_fields.insert(key.clone(), value.clone());
                }
            }
            _ => {}
        }
    }

    merged
}

fn source_or_target(source: Option<&Value>, target: Option<&Value>) -> Option<Value> {
    source
        .filter(|value| !value.is_null())
        .or(target)
        .cloned()
}

/// Target elements unchanged, followed by source elements not already present.
fn append_missing(target: &[Value], source: &[Value]) -> Vec<Value> {
    let mut merged = target.to_vec();
    for item in source {
        if !merged.iter().any(|seen| values_equal(seen, item)) {
            merged.push(item.clone());
        }
    }
    merged
}

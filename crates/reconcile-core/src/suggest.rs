//! Per-field resolution suggestions.
//!
//! Pure functions: the same snapshots always produce the same suggestions.
//! Rules are tried in order and the first one that applies wins:
//!
//! 1. timestamp-like field names (`updated_at`, `modified`): the later value
//! 2. counter-like numeric fields (`count`, `total`, `sum`): the larger value
//! 3. two strings: the longer one
//! 4. two arrays: their union, target elements first
//! 5. anything else: the target value
//!
//! A rule that cannot interpret its inputs (an unparseable timestamp, say)
//! degrades to the target fallback rather than failing.

use serde_json::Value;

use crate::models::{Record, Suggestion};
use crate::util::{parse_timestamp, values_equal};

const TIMESTAMP_CONFIDENCE: f64 = 0.9;
const COUNTER_CONFIDENCE: f64 = 0.8;
const STRING_CONFIDENCE: f64 = 0.7;
const ARRAY_CONFIDENCE: f64 = 0.8;
const FALLBACK_CONFIDENCE: f64 = 0.5;

/// Suggest a resolution for every field where the two snapshots disagree.
///
/// Fields are visited in source insertion order, then target fields the
/// source does not have. A field missing on one side compares as `null`.
pub fn suggest(source: &Record, target: &Record) -> Vec<Suggestion> {
    let mut suggestions = Vec::new();

    for field in union_field_names(source, target) {
        let source_value = source.get(field).unwrap_or(&Value::Null);
        let target_value = target.get(field).unwrap_or(&Value::Null);
        if values_equal(source_value, target_value) {
            continue;
        }
        suggestions.push(suggest_field(field, source_value, target_value));
    }

    suggestions
}

fn union_field_names<'a>(source: &'a Record, target: &'a Record) -> Vec<&'a str> {
    let mut names: Vec<&str> = source.keys().map(String::as_str).collect();
    names.extend(
        target
            .keys()
            .map(String::as_str)
            .filter(|name| !source.contains_key(*name)),
    );
    names
}

fn suggest_field(field: &str, source: &Value, target: &Value) -> Suggestion {
    let (recommended, confidence, reason) = if is_timestamp_field(field) {
        newer_timestamp(source, target).unwrap_or_else(|| fallback(target))
    } else if let Some(result) = counter_max(field, source, target) {
        result
    } else {
        match (source, target) {
            (Value::String(source_text), Value::String(target_text)) => {
                let longer = if source_text.chars().count() > target_text.chars().count() {
                    source
                } else {
                    target
                };
                (
                    longer.clone(),
                    STRING_CONFIDENCE,
                    "more detailed information".to_string(),
                )
            }
            (Value::Array(source_items), Value::Array(target_items)) => (
                Value::Array(array_union(target_items, source_items)),
                ARRAY_CONFIDENCE,
                "merged unique values".to_string(),
            ),
            _ => fallback(target),
        }
    };

    Suggestion {
        field: field.to_string(),
        source_value: source.clone(),
        target_value: target.clone(),
        recommended_value: recommended,
        confidence,
        reason,
    }
}

fn is_timestamp_field(field: &str) -> bool {
    field.contains("updated_at") || field.contains("modified")
}

fn is_counter_field(field: &str) -> bool {
    field.contains("count") || field.contains("total") || field.contains("sum")
}

fn newer_timestamp(source: &Value, target: &Value) -> Option<(Value, f64, String)> {
    let source_time = parse_timestamp(source)?;
    let target_time = parse_timestamp(target)?;

    Some(if source_time > target_time {
        (
            source.clone(),
            TIMESTAMP_CONFIDENCE,
            "source has the more recent timestamp".to_string(),
        )
    } else {
        (
            target.clone(),
            TIMESTAMP_CONFIDENCE,
            "target has the more recent timestamp".to_string(),
        )
    })
}

fn counter_max(field: &str, source: &Value, target: &Value) -> Option<(Value, f64, String)> {
    if !is_counter_field(field) {
        return None;
    }
    let source_number = source.as_f64()?;
    let target_number = target.as_f64()?;

    let higher = if source_number > target_number {
        source
    } else {
        target
    };
    Some((
        higher.clone(),
        COUNTER_CONFIDENCE,
        "higher value for counter field".to_string(),
    ))
}

fn fallback(target: &Value) -> (Value, f64, String) {
    (
        target.clone(),
        FALLBACK_CONFIDENCE,
        "default to target value".to_string(),
    )
}

/// Union of two arrays by structural equality: target elements first, then
/// source elements not seen yet. Duplicates within either side collapse, and
/// numbers compare by value.
pub fn array_union(target: &[Value], source: &[Value]) -> Vec<Value> {
    let mut merged: Vec<Value> = Vec::with_capacity(target.len() + source.len());
    for item in target.iter().chain(source) {
        if !merged.iter().any(|seen| values_equal(seen, item)) {
            merged.push(item.clone());
        }
    }
    merged
}

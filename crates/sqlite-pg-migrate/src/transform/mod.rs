//! Default-expression cleanup and per-value row coercions.
//!
//! Schema-time: SQLite default expressions are rewritten into forms
//! PostgreSQL accepts. Row-time: each value is coerced independently per
//! column (JSON, boolean, timestamp), degrading to the raw value on any
//! parse failure. Nothing in this module returns an error.

mod value;

pub use value::PgValue;

use crate::source::{Column, Table};
use crate::typemap::{is_boolean_type, is_datetime_type};
use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime};
use rusqlite::types::Value;
use std::collections::HashSet;

/// Normalize a raw SQLite default expression.
///
/// - `STRFTIME(...)` / `DATETIME('NOW'...)` become `CURRENT_TIMESTAMP`
/// - quoted or bare true/false literals become bare lowercase
/// - anything else passes through trimmed
///
/// Idempotent: cleaning the output again yields the same string.
pub fn clean_default(raw: Option<&str>) -> Option<String> {
    let s = raw?.trim();
    let upper = s.to_uppercase();

    if upper.contains("STRFTIME") || upper.contains("DATETIME('NOW'") {
        return Some("CURRENT_TIMESTAMP".to_string());
    }
    match upper.as_str() {
        "TRUE" | "'TRUE'" => return Some("true".to_string()),
        "FALSE" | "'FALSE'" => return Some("false".to_string()),
        _ => {}
    }
    Some(s.to_string())
}

/// Render a cleaned default expression for inclusion in DDL.
///
/// `CURRENT_TIMESTAMP`, bare booleans, and numeric/date-shaped literals
/// are emitted unquoted; everything else is single-quoted with inner
/// quotes doubled.
pub fn render_default(cleaned: &str) -> String {
    let upper = cleaned.to_uppercase();
    if upper.starts_with("CURRENT_TIMESTAMP")
        || cleaned == "true"
        || cleaned == "false"
        || is_numeric_or_datelike(cleaned)
    {
        cleaned.to_string()
    } else {
        format!("'{}'", cleaned.replace('\'', "''"))
    }
}

/// Character class `[0-9-:.TZ+]+`, covering numeric literals and ISO-ish
/// date/time fragments.
fn is_numeric_or_datelike(s: &str) -> bool {
    !s.is_empty()
        && s.chars()
            .all(|c| c.is_ascii_digit() || matches!(c, '-' | ':' | '.' | 'T' | 'Z' | '+'))
}

/// Best-effort free-form timestamp parse. Returns `None` on failure,
/// never an error.
pub fn parse_timestamp(s: &str) -> Option<DateTime<FixedOffset>> {
    let s = s.trim();
    if s.is_empty() {
        return None;
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt);
    }
    if let Ok(dt) = DateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S%.f %z") {
        return Some(dt);
    }

    // Naive layouts SQLite commonly stores; treated as UTC
    const NAIVE_FORMATS: &[&str] = &[
        "%Y-%m-%d %H:%M:%S%.f",
        "%Y-%m-%dT%H:%M:%S%.f",
        "%Y-%m-%d %H:%M",
    ];
    for format in NAIVE_FORMATS {
        if let Ok(naive) = NaiveDateTime::parse_from_str(s, format) {
            return Some(naive.and_utc().fixed_offset());
        }
    }

    if let Ok(date) = NaiveDate::parse_from_str(s, "%Y-%m-%d") {
        let naive = date.and_hms_opt(0, 0, 0)?;
        return Some(naive.and_utc().fixed_offset());
    }

    None
}

/// Coerce one source value for one column.
///
/// Priority order: JSON column parse (fall through on failure), boolean
/// literal set, timestamp parse (degrade to raw string), passthrough.
pub fn coerce_value(value: Value, column: &Column, is_json_col: bool) -> PgValue {
    if is_json_col {
        if let Value::Text(s) = &value {
            if !s.is_empty() {
                if let Ok(parsed) = serde_json::from_str::<serde_json::Value>(s) {
                    return PgValue::Json(parsed);
                }
                // not valid JSON after all; fall through to the plain rules
            }
        }
    }

    if is_boolean_type(&column.decl_type) {
        match &value {
            Value::Integer(1) => return PgValue::Bool(true),
            Value::Integer(0) => return PgValue::Bool(false),
            Value::Text(s) => match s.as_str() {
                "1" | "t" | "true" | "True" => return PgValue::Bool(true),
                "0" | "f" | "false" | "False" => return PgValue::Bool(false),
                _ => {}
            },
            _ => {}
        }
        return passthrough(value);
    }

    if is_datetime_type(&column.decl_type) {
        return match value {
            Value::Null => PgValue::Null,
            Value::Text(s) if s.is_empty() => PgValue::Null,
            Value::Text(s) => match parse_timestamp(&s) {
                Some(dt) => PgValue::Timestamp(dt),
                None => PgValue::Text(s),
            },
            other => passthrough(other),
        };
    }

    passthrough(value)
}

/// Coerce a whole row, positionally aligned with the table descriptor.
pub fn coerce_row(row: Vec<Value>, table: &Table, json_cols: &HashSet<String>) -> Vec<PgValue> {
    row.into_iter()
        .zip(&table.columns)
        .map(|(value, column)| {
            let is_json_col = json_cols.contains(&column.name.to_lowercase());
            coerce_value(value, column, is_json_col)
        })
        .collect()
}

fn passthrough(value: Value) -> PgValue {
    match value {
        Value::Null => PgValue::Null,
        Value::Integer(v) => PgValue::Integer(v),
        Value::Real(v) => PgValue::Float(v),
        Value::Text(s) => PgValue::Text(s),
        Value::Blob(b) => PgValue::Bytes(b),
    }
}

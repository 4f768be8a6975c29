//! DDL and DML statement generation for the PostgreSQL target.
//!
//! Identifiers are always double-quoted to preserve case and avoid
//! reserved-word collisions. No foreign-key, check, or index clauses are
//! ever generated; cross-table dependency ordering is left to manual
//! post-migration review.

use crate::error::{MigrateError, Result};
use crate::source::Table;
use crate::transform::{clean_default, render_default};
use crate::typemap::map_type;
use rusqlite::types::Value;
use std::collections::HashSet;

/// Maximum identifier length (PostgreSQL truncates at 63 bytes; SQLite
/// has no limit, so reject anything that would be silently mangled).
const MAX_IDENTIFIER_LENGTH: usize = 128;

/// Quote an identifier for PostgreSQL, doubling embedded quotes.
///
/// Identifiers cannot be parameterized in prepared statements, so they
/// are validated here before being spliced into SQL.
pub fn quote_ident(name: &str) -> Result<String> {
    if name.is_empty() {
        return Err(MigrateError::Config(
            "Identifier cannot be empty".to_string(),
        ));
    }
    if name.contains('\0') {
        return Err(MigrateError::Config(format!(
            "Identifier contains null byte: {:?}",
            name
        )));
    }
    if name.len() > MAX_IDENTIFIER_LENGTH {
        return Err(MigrateError::Config(format!(
            "Identifier exceeds maximum length of {} bytes: {:?}",
            MAX_IDENTIFIER_LENGTH, name
        )));
    }
    Ok(format!("\"{}\"", name.replace('"', "\"\"")))
}

/// Boolean-column default literals, normalized to bare keywords so a
/// `BOOLEAN DEFAULT '1'` source column becomes `boolean DEFAULT true`.
fn boolean_default(cleaned: &str) -> Option<&'static str> {
    let bare = cleaned.trim_matches('\'');
    match bare {
        "1" | "t" | "true" | "True" => Some("true"),
        "0" | "f" | "false" | "False" => Some("false"),
        _ => None,
    }
}

/// Generate the `CREATE TABLE IF NOT EXISTS` statement for a table.
///
/// Columns are rendered in source order as `"name" type [NOT NULL]
/// [DEFAULT expr]`; a `PRIMARY KEY (...)` clause over all PK columns in
/// source order closes the list when any exist.
///
/// `samples` is one sampled row value per column (first non-null seen),
/// used only by the type mapper for untyped columns.
pub fn create_table_sql(
    table: &Table,
    json_cols: &HashSet<String>,
    samples: &[Option<Value>],
) -> Result<String> {
    let mut parts = Vec::with_capacity(table.columns.len());
    let mut pk_cols = Vec::new();

    for (i, col) in table.columns.iter().enumerate() {
        let sample = samples.get(i).and_then(|v| v.as_ref());
        let pg_type = map_type(&col.decl_type, &col.name, sample, json_cols);

        let mut line = format!("{} {}", quote_ident(&col.name)?, pg_type);
        if col.not_null {
            line.push_str(" NOT NULL");
        }
        if let Some(cleaned) = clean_default(col.default.as_deref()) {
            let rendered = if pg_type == "boolean" {
                match boolean_default(&cleaned) {
                    Some(keyword) => keyword.to_string(),
                    None => render_default(&cleaned),
                }
            } else {
                render_default(&cleaned)
            };
            line.push_str(&format!(" DEFAULT {}", rendered));
        }
        parts.push(line);

        if col.primary_key {
            pk_cols.push(quote_ident(&col.name)?);
        }
    }

    let pk_clause = if pk_cols.is_empty() {
        String::new()
    } else {
        format!(",\n  PRIMARY KEY ({})", pk_cols.join(", "))
    };

    Ok(format!(
        "CREATE TABLE IF NOT EXISTS {} (\n  {}{}\n);",
        quote_ident(&table.name)?,
        parts.join(",\n  "),
        pk_clause
    ))
}

/// Build a parameterized multi-row insert with conflict avoidance, so a
/// re-run against an already-loaded target is a no-op rather than an error.
pub fn multi_insert_sql(table: &str, columns: &[String], row_count: usize) -> Result<String> {
    if columns.is_empty() || row_count == 0 {
        return Err(MigrateError::Config(
            "insert requires at least one column and one row".to_string(),
        ));
    }

    let quoted: Vec<String> = columns.iter().map(|c| quote_ident(c)).collect::<Result<_>>()?;

    let width = columns.len();
    let mut values = Vec::with_capacity(row_count);
    for row in 0..row_count {
        let placeholders: Vec<String> =
            (1..=width).map(|i| format!("${}", row * width + i)).collect();
        values.push(format!("({})", placeholders.join(", ")));
    }

    Ok(format!(
        "INSERT INTO {} ({}) VALUES {} ON CONFLICT DO NOTHING",
        quote_ident(table)?,
        quoted.join(", "),
        values.join(", ")
    ))
}

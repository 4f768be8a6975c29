//! Type mapping between SQLite declarations and PostgreSQL.
//!
//! SQLite columns carry free-form (often empty) type declarations, so the
//! mapping is substring-based with a text fallback, plus a JSON heuristic
//! driven by column names and sampled values.

use crate::source::Table;
use rusqlite::types::Value;
use std::collections::HashSet;

/// Ordered substring patterns, first match wins. All matching is done on
/// the uppercased declaration, mirroring SQLite's own affinity rules.
const TYPE_PATTERNS: &[(&[&str], &str)] = &[
    (&["INT"], "integer"),
    (&["BOOL"], "boolean"),
    (&["CHAR", "CLOB", "TEXT"], "text"),
    (&["REAL", "FLOA", "DOUB"], "double precision"),
    (&["BLOB"], "bytea"),
    (&["DATETIME", "TIMESTAMP"], "timestamp(3) with time zone"),
];

/// Map a SQLite type declaration to a PostgreSQL type.
///
/// `json_cols` holds lowercased column names already identified as
/// JSON-valued; `sample` is an optional value observed in the column,
/// used only when the declaration alone is inconclusive.
pub fn map_type(
    decl_type: &str,
    col_name: &str,
    sample: Option<&Value>,
    json_cols: &HashSet<String>,
) -> String {
    let is_json_col =
        json_cols.contains(&col_name.to_lowercase()) || sample_looks_like_json(sample);

    let decl = decl_type.trim();
    if decl.is_empty() {
        // No declared type: name or sample heuristics, else generic text
        return if is_json_col { "jsonb" } else { "text" }.to_string();
    }

    let upper = decl.to_uppercase();
    if upper.contains("JSON") || is_json_col {
        return "jsonb".to_string();
    }

    for (patterns, pg_type) in TYPE_PATTERNS {
        if patterns.iter().any(|p| upper.contains(p)) {
            // VARCHAR(n) keeps its declared length
            if let Some(varchar) = varchar_with_length(&upper) {
                return varchar;
            }
            return pg_type.to_string();
        }
    }

    "text".to_string()
}

/// Extract a `varchar(n)` form from an uppercased declaration, if present.
fn varchar_with_length(upper: &str) -> Option<String> {
    let start = upper.find("VARCHAR")?;
    let rest = upper[start + "VARCHAR".len()..].trim_start();
    let inner = rest.strip_prefix('(')?;
    let close = inner.find(')')?;
    let digits = inner[..close].trim();
    if !digits.is_empty() && digits.bytes().all(|b| b.is_ascii_digit()) {
        Some(format!("varchar({})", digits))
    } else {
        None
    }
}

/// Check whether a string value looks like a JSON document: it must have
/// matching object/array delimiters AND parse as JSON. Parse failures are
/// never surfaced to the caller.
pub fn looks_like_json(value: Option<&str>) -> bool {
    let Some(v) = value else {
        return false;
    };
    let v = v.trim();
    let delimited = (v.starts_with('{') && v.ends_with('}'))
        || (v.starts_with('[') && v.ends_with(']'));
    delimited && serde_json::from_str::<serde_json::Value>(v).is_ok()
}

fn sample_looks_like_json(sample: Option<&Value>) -> bool {
    match sample {
        Some(Value::Text(s)) => looks_like_json(Some(s)),
        _ => false,
    }
}

/// Whether a declaration is boolean-family.
pub fn is_boolean_type(decl_type: &str) -> bool {
    decl_type.to_uppercase().contains("BOOL")
}

/// Whether a declaration is datetime/timestamp-family.
pub fn is_datetime_type(decl_type: &str) -> bool {
    let upper = decl_type.to_uppercase();
    upper.contains("DATETIME") || upper.contains("TIMESTAMP")
}

/// Compute the per-table JSON-Column Set: lowercased names of columns to
/// treat as JSON documents, derived from the name dictionary, the global
/// force list, and sampled-value parsing.
///
/// Computed once per table; drives both DDL generation and row-value
/// transformation.
pub fn json_columns_for_table(
    table: &Table,
    samples: &[Vec<Value>],
    name_hints: &HashSet<String>,
    forced: &HashSet<String>,
) -> HashSet<String> {
    let mut result = HashSet::new();

    for (i, col) in table.columns.iter().enumerate() {
        let lower = col.name.to_lowercase();
        if name_hints.contains(&lower) || forced.contains(&lower) {
            result.insert(lower);
            continue;
        }
        for row in samples {
            if sample_looks_like_json(row.get(i)) {
                result.insert(lower);
                break;
            }
        }
    }

    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::Column;

    fn no_json() -> HashSet<String> {
        HashSet::new()
    }

    #[test]
    fn test_integer_family() {
        assert_eq!(map_type("INTEGER", "id", None, &no_json()), "integer");
        assert_eq!(map_type("int", "id", None, &no_json()), "integer");
        assert_eq!(map_type("BIGINT", "id", None, &no_json()), "integer");
        assert_eq!(map_type("SMALLINT", "id", None, &no_json()), "integer");
    }

    #[test]
    fn test_boolean_family() {
        assert_eq!(map_type("BOOLEAN", "flag", None, &no_json()), "boolean");
        assert_eq!(map_type("bool", "flag", None, &no_json()), "boolean");
    }

    #[test]
    fn test_text_family() {
        assert_eq!(map_type("TEXT", "name", None, &no_json()), "text");
        assert_eq!(map_type("CLOB", "body", None, &no_json()), "text");
        assert_eq!(map_type("CHARACTER(20)", "code", None, &no_json()), "text");
        assert_eq!(map_type("NVARCHAR(100)", "label", None, &no_json()), "varchar(100)");
    }

    #[test]
    fn test_varchar_length_preserved() {
        assert_eq!(map_type("VARCHAR(255)", "name", None, &no_json()), "varchar(255)");
        assert_eq!(map_type("varchar ( 36 )", "id", None, &no_json()), "varchar(36)");
    }

    #[test]
    fn test_float_family() {
        assert_eq!(map_type("REAL", "x", None, &no_json()), "double precision");
        assert_eq!(map_type("FLOAT", "x", None, &no_json()), "double precision");
        assert_eq!(map_type("DOUBLE", "x", None, &no_json()), "double precision");
    }

    #[test]
    fn test_blob_family() {
        assert_eq!(map_type("BLOB", "data", None, &no_json()), "bytea");
    }

    #[test]
    fn test_datetime_family() {
        assert_eq!(
            map_type("DATETIME", "created_at", None, &no_json()),
            "timestamp(3) with time zone"
        );
        assert_eq!(
            map_type("TIMESTAMP", "updated_at", None, &no_json()),
            "timestamp(3) with time zone"
        );
    }

    #[test]
    fn test_json_declared() {
        assert_eq!(map_type("JSON", "doc", None, &no_json()), "jsonb");
        assert_eq!(map_type("json", "doc", None, &no_json()), "jsonb");
    }

    #[test]
    fn test_json_by_column_name() {
        let json_cols: HashSet<String> = ["meta".to_string()].into();
        assert_eq!(map_type("TEXT", "meta", None, &json_cols), "jsonb");
        assert_eq!(map_type("TEXT", "Meta", None, &json_cols), "jsonb");
        assert_eq!(map_type("", "meta", None, &json_cols), "jsonb");
    }

    #[test]
    fn test_json_by_sample() {
        let sample = Value::Text("{\"a\":1}".to_string());
        assert_eq!(map_type("", "col", Some(&sample), &no_json()), "jsonb");
        assert_eq!(map_type("TEXT", "col", Some(&sample), &no_json()), "jsonb");
    }

    #[test]
    fn test_empty_type_no_evidence_falls_to_text() {
        assert_eq!(map_type("", "col", None, &no_json()), "text");
    }

    #[test]
    fn test_unknown_type_falls_to_text() {
        assert_eq!(map_type("GEOMETRY", "shape", None, &no_json()), "text");
        assert_eq!(map_type("NUMERIC(10,2)", "price", None, &no_json()), "text");
    }

    #[test]
    fn test_looks_like_json_truth_table() {
        assert!(looks_like_json(Some("{\"a\":1}")));
        assert!(looks_like_json(Some("[1,2,3]")));
        assert!(looks_like_json(Some("  {\"a\": 1}  ")));
        assert!(!looks_like_json(Some("[1,2")));
        assert!(!looks_like_json(Some("{not json}")));
        assert!(!looks_like_json(Some("hello")));
        assert!(!looks_like_json(Some("")));
        assert!(!looks_like_json(None));
    }

    #[test]
    fn test_type_predicates() {
        assert!(is_boolean_type("BOOLEAN"));
        assert!(is_boolean_type("bool"));
        assert!(!is_boolean_type("TEXT"));
        assert!(is_datetime_type("DATETIME"));
        assert!(is_datetime_type("timestamp"));
        assert!(!is_datetime_type("DATE")); // bare DATE is not in the family
    }

    fn table_with(cols: &[&str]) -> Table {
        Table {
            name: "t".to_string(),
            columns: cols
                .iter()
                .map(|name| Column {
                    name: name.to_string(),
                    decl_type: "TEXT".to_string(),
                    not_null: false,
                    default: None,
                    primary_key: false,
                })
                .collect(),
        }
    }

    #[test]
    fn test_json_columns_by_hint_and_sample() {
        let table = table_with(&["Meta", "name", "payload_blob"]);
        let hints: HashSet<String> = ["meta".to_string()].into();
        let samples = vec![vec![
            Value::Null,
            Value::Text("alice".to_string()),
            Value::Text("{\"k\":true}".to_string()),
        ]];

        let json_cols = json_columns_for_table(&table, &samples, &hints, &HashSet::new());
        assert!(json_cols.contains("meta")); // by name hint, case-insensitive
        assert!(json_cols.contains("payload_blob")); // by sampled value
        assert!(!json_cols.contains("name"));
    }

    #[test]
    fn test_json_columns_forced_globally() {
        let table = table_with(&["custom"]);
        let forced: HashSet<String> = ["custom".to_string()].into();
        let json_cols = json_columns_for_table(&table, &[], &HashSet::new(), &forced);
        assert!(json_cols.contains("custom"));
    }

    #[test]
    fn test_json_columns_no_evidence() {
        let table = table_with(&["name"]);
        let samples = vec![vec![Value::Text("plain".to_string())]];
        let json_cols =
            json_columns_for_table(&table, &samples, &HashSet::new(), &HashSet::new());
        assert!(json_cols.is_empty());
    }
}

//! Tagged value type for rows in flight to PostgreSQL.

use bytes::BytesMut;
use chrono::{DateTime, FixedOffset};
use tokio_postgres::types::{to_sql_checked, IsNull, ToSql, Type};

/// A transformed row value, positionally aligned with its table descriptor.
///
/// The source driver hands back loosely-typed values; after per-column
/// coercion every value is one of these variants, so downstream encoding
/// pattern-matches exhaustively instead of re-checking at runtime.
#[derive(Debug, Clone, PartialEq)]
pub enum PgValue {
    /// NULL.
    Null,

    /// Boolean, produced by boolean-literal coercion.
    Bool(bool),

    /// 64-bit integer (SQLite's only integer width).
    Integer(i64),

    /// 64-bit float (SQLite REAL).
    Float(f64),

    /// Text, including values that failed JSON or timestamp parsing and
    /// degraded to their raw string form.
    Text(String),

    /// Binary data (SQLite BLOB).
    Bytes(Vec<u8>),

    /// Parsed timestamp, normalized to an explicit offset.
    Timestamp(DateTime<FixedOffset>),

    /// Parsed JSON document, encoded as jsonb on the wire.
    Json(serde_json::Value),
}

impl PgValue {
    /// Check if this value is NULL.
    pub fn is_null(&self) -> bool {
        matches!(self, PgValue::Null)
    }
}

type ToSqlResult = std::result::Result<IsNull, Box<dyn std::error::Error + Sync + Send>>;

fn mismatch(variant: &str, ty: &Type) -> Box<dyn std::error::Error + Sync + Send> {
    format!("cannot encode {} value as Postgres type {}", variant, ty).into()
}

impl ToSql for PgValue {
    fn to_sql(&self, ty: &Type, out: &mut BytesMut) -> ToSqlResult {
        match self {
            PgValue::Null => Ok(IsNull::Yes),

            PgValue::Bool(b) => {
                if *ty == Type::BOOL {
                    b.to_sql(ty, out)
                } else if *ty == Type::TEXT || *ty == Type::VARCHAR {
                    b.to_string().to_sql(ty, out)
                } else {
                    Err(mismatch("boolean", ty))
                }
            }

            // SQLite integers are always i64; narrow to whatever width the
            // target column actually has.
            PgValue::Integer(v) => {
                if *ty == Type::INT8 {
                    v.to_sql(ty, out)
                } else if *ty == Type::INT4 {
                    i32::try_from(*v)?.to_sql(ty, out)
                } else if *ty == Type::INT2 {
                    i16::try_from(*v)?.to_sql(ty, out)
                } else if *ty == Type::FLOAT8 {
                    (*v as f64).to_sql(ty, out)
                } else if *ty == Type::FLOAT4 {
                    (*v as f32).to_sql(ty, out)
                } else if *ty == Type::BOOL {
                    (*v != 0).to_sql(ty, out)
                } else if *ty == Type::TEXT || *ty == Type::VARCHAR {
                    v.to_string().to_sql(ty, out)
                } else {
                    Err(mismatch("integer", ty))
                }
            }

            PgValue::Float(v) => {
                if *ty == Type::FLOAT8 {
                    v.to_sql(ty, out)
                } else if *ty == Type::FLOAT4 {
                    (*v as f32).to_sql(ty, out)
                } else if *ty == Type::TEXT || *ty == Type::VARCHAR {
                    v.to_string().to_sql(ty, out)
                } else {
                    Err(mismatch("float", ty))
                }
            }

            PgValue::Text(s) => {
                if *ty == Type::TEXT
                    || *ty == Type::VARCHAR
                    || *ty == Type::BPCHAR
                    || *ty == Type::NAME
                    || *ty == Type::UNKNOWN
                {
                    s.as_str().to_sql(ty, out)
                } else {
                    // A raw string that survived coercion cannot be sent to a
                    // typed column over the binary protocol; surface it so the
                    // batch error names the real problem.
                    Err(mismatch("text", ty))
                }
            }

            PgValue::Bytes(b) => {
                if *ty == Type::BYTEA {
                    b.as_slice().to_sql(ty, out)
                } else {
                    Err(mismatch("bytes", ty))
                }
            }

            PgValue::Timestamp(dt) => {
                if *ty == Type::TIMESTAMPTZ {
                    dt.to_sql(ty, out)
                } else if *ty == Type::TIMESTAMP {
                    dt.naive_utc().to_sql(ty, out)
                } else if *ty == Type::TEXT || *ty == Type::VARCHAR {
                    dt.to_rfc3339().to_sql(ty, out)
                } else {
                    Err(mismatch("timestamp", ty))
                }
            }

            PgValue::Json(v) => {
                if *ty == Type::JSONB || *ty == Type::JSON {
                    v.to_sql(ty, out)
                } else if *ty == Type::TEXT || *ty == Type::VARCHAR {
                    v.to_string().to_sql(ty, out)
                } else {
                    Err(mismatch("json", ty))
                }
            }
        }
    }

    fn accepts(_ty: &Type) -> bool {
        // Conversions are resolved per-value in to_sql; NULL fits anything.
        true
    }

    to_sql_checked!();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_null() {
        assert!(PgValue::Null.is_null());
        assert!(!PgValue::Integer(0).is_null());
        assert!(!PgValue::Text(String::new()).is_null());
    }

    #[test]
    fn test_null_encodes_for_any_type() {
        let mut buf = BytesMut::new();
        let result = PgValue::Null.to_sql(&Type::JSONB, &mut buf).unwrap();
        assert!(matches!(result, IsNull::Yes));
    }

    #[test]
    fn test_integer_narrows_to_int4() {
        let mut buf = BytesMut::new();
        PgValue::Integer(42).to_sql(&Type::INT4, &mut buf).unwrap();
        assert_eq!(buf.len(), 4);
    }

    #[test]
    fn test_integer_overflow_is_an_error() {
        let mut buf = BytesMut::new();
        assert!(PgValue::Integer(i64::MAX)
            .to_sql(&Type::INT4, &mut buf)
            .is_err());
    }

    #[test]
    fn test_text_rejected_for_timestamptz() {
        let mut buf = BytesMut::new();
        assert!(PgValue::Text("not a date".to_string())
            .to_sql(&Type::TIMESTAMPTZ, &mut buf)
            .is_err());
    }

    #[test]
    fn test_json_encodes_as_jsonb() {
        let mut buf = BytesMut::new();
        let v = PgValue::Json(serde_json::json!({"a": 1}));
        v.to_sql(&Type::JSONB, &mut buf).unwrap();
        assert!(!buf.is_empty());
    }
}

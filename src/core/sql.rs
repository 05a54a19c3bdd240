//! Scalar argument handling shared by the query-building components: the
//! placeholder format rule, identifier vetting, and SQLite value conversion.

use crate::core::error::StorageError;
use regex::Regex;
use rusqlite::types::{Value as SqlValue, ValueRef};
use serde_json::Value as JsonValue;
use std::sync::LazyLock;

static IDENTIFIER_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*$").unwrap());

/// Identifiers (table and column names) are never caller-supplied text; they
/// pass this vet on top of being resolved through the mapping registry.
pub fn is_sql_identifier(candidate: &str) -> bool {
    IDENTIFIER_RE.is_match(candidate)
}

/// Placeholder token for one bound argument. Booleans and integers bind in
/// integer format, floats in float format, strings and NULL in string format.
/// Non-scalars fail fast; there is no coercion.
pub fn placeholder_for(value: &JsonValue) -> Result<&'static str, StorageError> {
    match value {
        JsonValue::Bool(_) => Ok("%d"),
        JsonValue::Number(n) if n.is_f64() => Ok("%f"),
        JsonValue::Number(_) => Ok("%d"),
        JsonValue::String(_) | JsonValue::Null => Ok("'%s'"),
        other => Err(StorageError::InvalidFieldType(format!(
            "cannot bind non-scalar value {other}"
        ))),
    }
}

/// True once a statement already carries a WHERE clause, so the next
/// predicate glues with AND instead.
pub fn has_where(query: &str) -> bool {
    query.contains(" WHERE ")
}

/// Rewrites the positional `'%s'`/`%d`/`%f` placeholders to `?1..?N` for
/// SQLite and checks the count against the argument list.
pub fn bind_placeholders(sql: &str, expected: usize) -> Result<String, StorageError> {
    const TOKENS: [&str; 3] = ["'%s'", "%d", "%f"];
    let mut out = String::with_capacity(sql.len() + 8);
    let mut rest = sql;
    let mut n = 0usize;
    while let Some((at, len)) = TOKENS
        .iter()
        .filter_map(|t| rest.find(t).map(|i| (i, t.len())))
        .min()
    {
        n += 1;
        out.push_str(&rest[..at]);
        out.push_str(&format!("?{n}"));
        rest = &rest[at + len..];
    }
    out.push_str(rest);
    if n != expected {
        return Err(StorageError::Validation(format!(
            "query carries {n} placeholders but {expected} arguments"
        )));
    }
    Ok(out)
}

pub fn to_sql_value(value: &JsonValue) -> Result<SqlValue, StorageError> {
    match value {
        JsonValue::Null => Ok(SqlValue::Null),
        JsonValue::Bool(b) => Ok(SqlValue::Integer(i64::from(*b))),
        JsonValue::Number(n) => {
            if let Some(i) = n.as_i64() {
                Ok(SqlValue::Integer(i))
            } else if let Some(f) = n.as_f64() {
                Ok(SqlValue::Real(f))
            } else {
                Err(StorageError::InvalidFieldType(format!(
                    "numeric value {n} does not fit a storage scalar"
                )))
            }
        }
        JsonValue::String(s) => Ok(SqlValue::Text(s.clone())),
        other => Err(StorageError::InvalidFieldType(format!(
            "cannot bind non-scalar value {other}"
        ))),
    }
}

pub fn from_sql_value(value: ValueRef<'_>) -> Result<JsonValue, StorageError> {
    match value {
        ValueRef::Null => Ok(JsonValue::Null),
        ValueRef::Integer(i) => Ok(serde_json::json!(i)),
        ValueRef::Real(f) => Ok(serde_json::json!(f)),
        ValueRef::Text(t) => Ok(JsonValue::String(
            String::from_utf8_lossy(t).into_owned(),
        )),
        ValueRef::Blob(_) => Err(StorageError::InvalidFieldType(
            "BLOB columns are outside the mapped data model".to_string(),
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_placeholder_format_rule() {
        assert_eq!(placeholder_for(&json!(true)).unwrap(), "%d");
        assert_eq!(placeholder_for(&json!(7)).unwrap(), "%d");
        assert_eq!(placeholder_for(&json!(-7)).unwrap(), "%d");
        assert_eq!(placeholder_for(&json!(2.5)).unwrap(), "%f");
        assert_eq!(placeholder_for(&json!("x")).unwrap(), "'%s'");
        assert_eq!(placeholder_for(&JsonValue::Null).unwrap(), "'%s'");
    }

    #[test]
    fn test_placeholder_rejects_non_scalars() {
        assert!(matches!(
            placeholder_for(&json!([1, 2])),
            Err(StorageError::InvalidFieldType(_))
        ));
        assert!(matches!(
            placeholder_for(&json!({"a": 1})),
            Err(StorageError::InvalidFieldType(_))
        ));
    }

    #[test]
    fn test_identifier_vet() {
        assert!(is_sql_identifier("insert_id"));
        assert!(is_sql_identifier("_x9"));
        assert!(!is_sql_identifier("1col"));
        assert!(!is_sql_identifier("col; DROP TABLE t"));
        assert!(!is_sql_identifier(""));
    }

    #[test]
    fn test_bind_placeholders_positional() {
        let sql = "SELECT * FROM t WHERE a = %d AND b = '%s' AND c < %f";
        assert_eq!(
            bind_placeholders(sql, 3).unwrap(),
            "SELECT * FROM t WHERE a = ?1 AND b = ?2 AND c < ?3"
        );
    }

    #[test]
    fn test_bind_placeholders_count_mismatch() {
        let err = bind_placeholders("SELECT * FROM t WHERE a = %d", 2).unwrap_err();
        assert!(matches!(err, StorageError::Validation(_)));
    }

    #[test]
    fn test_has_where() {
        assert!(has_where("SELECT * FROM t WHERE a = 1"));
        assert!(!has_where("SELECT * FROM t"));
    }

    #[test]
    fn test_sql_value_round_trip() {
        assert_eq!(to_sql_value(&json!(true)).unwrap(), SqlValue::Integer(1));
        assert_eq!(to_sql_value(&json!(9)).unwrap(), SqlValue::Integer(9));
        assert_eq!(to_sql_value(&json!(1.5)).unwrap(), SqlValue::Real(1.5));
        assert_eq!(
            to_sql_value(&json!("hi")).unwrap(),
            SqlValue::Text("hi".to_string())
        );
        assert_eq!(to_sql_value(&JsonValue::Null).unwrap(), SqlValue::Null);
        assert!(to_sql_value(&json!([])).is_err());

        assert_eq!(from_sql_value(ValueRef::Integer(4)).unwrap(), json!(4));
        assert_eq!(from_sql_value(ValueRef::Null).unwrap(), JsonValue::Null);
        assert!(from_sql_value(ValueRef::Blob(&[1u8])).is_err());
    }
}

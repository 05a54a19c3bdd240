//! One optional comparison predicate, composable into a WHERE clause.
//!
//! Call sites chain filters unconditionally: a filter missing its field or
//! value contributes nothing and touches neither query nor arguments.

use crate::core::error::StorageError;
use crate::core::mapping::Persistable;
use crate::core::registry;
use crate::core::sql;
use serde_json::Value as JsonValue;

/// Comparison operators accepted in query text. Anything else is rejected
/// before it can reach SQL.
pub const OPERATORS: &[&str] = &["=", "!=", "<>", "<", "<=", ">", ">=", "LIKE"];

#[derive(Debug, Clone)]
pub struct Filter {
    field: Option<String>,
    value: Option<JsonValue>,
    operator: String,
}

impl Filter {
    /// Equality filter. An absent field or a null value makes it a no-op.
    pub fn new(field: Option<&str>, value: Option<JsonValue>) -> Self {
        Self::with_operator(field, value, "=")
    }

    pub fn with_operator(field: Option<&str>, value: Option<JsonValue>, operator: &str) -> Self {
        Self {
            field: field.map(str::to_string),
            // a JSON null value is the same as no value at all
            value: value.filter(|v| !v.is_null()),
            operator: operator.trim().to_string(),
        }
    }

    pub fn is_noop(&self) -> bool {
        self.field.is_none() || self.value.is_none()
    }

    /// Same filter with the field resolved through the mapping registry of
    /// `E` (property name to column name). Unknown fields are rejected.
    pub fn resolved<E: Persistable>(&self) -> Result<Filter, StorageError> {
        let Some(field) = &self.field else {
            return Ok(self.clone());
        };
        Ok(Filter {
            field: Some(registry::column_for::<E>(field)?.to_string()),
            value: self.value.clone(),
            operator: self.operator.clone(),
        })
    }

    /// Appends `WHERE <field> <op> <placeholder>` (or `AND ...` when the
    /// query already has a WHERE) and pushes the value onto `args`. No-op
    /// filters return the query unchanged.
    pub fn add_to_query(
        &self,
        query: &str,
        args: &mut Vec<JsonValue>,
    ) -> Result<String, StorageError> {
        let (Some(field), Some(value)) = (&self.field, &self.value) else {
            return Ok(query.to_string());
        };

        let operator = self.operator.to_uppercase();
        if !OPERATORS.contains(&operator.as_str()) {
            return Err(StorageError::Validation(format!(
                "operator '{}' is not allowed in filters",
                self.operator
            )));
        }
        if !sql::is_sql_identifier(field) {
            return Err(StorageError::Validation(format!(
                "'{field}' is not a valid column name"
            )));
        }

        let placeholder = sql::placeholder_for(value)?;
        let glue = if sql::has_where(query) { "AND" } else { "WHERE" };
        args.push(value.clone());
        Ok(format!("{query} {glue} {field} {operator} {placeholder}"))
    }
}

//! Process-lifetime cache of per-entity-type mapping tables.
//!
//! The registry is the only path by which caller-supplied field names become
//! SQL identifiers: anything not resolvable here never reaches query text.

use crate::core::error::StorageError;
use crate::core::mapping::{FieldMapping, Persistable, IDENTITY_COLUMN, ORDER_COLUMN};
use crate::core::sql;
use std::any::{Any, TypeId};
use std::collections::{HashMap, HashSet};
use std::sync::{Arc, LazyLock, RwLock};

static CACHE: LazyLock<RwLock<HashMap<TypeId, Arc<dyn Any + Send + Sync>>>> =
    LazyLock::new(|| RwLock::new(HashMap::new()));

/// Validated mapping table for `E`, computed once and cached for the life of
/// the process.
pub fn mappings_for<E: Persistable>() -> Result<Arc<Vec<FieldMapping<E>>>, StorageError> {
    let key = TypeId::of::<E>();
    if let Some(hit) = CACHE
        .read()
        .unwrap()
        .get(&key)
        .and_then(|entry| entry.clone().downcast::<Vec<FieldMapping<E>>>().ok())
    {
        return Ok(hit);
    }

    let built: Arc<Vec<FieldMapping<E>>> = Arc::new(build::<E>()?);
    let mut guard = CACHE.write().unwrap();
    let entry = guard
        .entry(key)
        .or_insert_with(|| built.clone() as Arc<dyn Any + Send + Sync>);
    entry
        .clone()
        .downcast::<Vec<FieldMapping<E>>>()
        .map_err(|_| StorageError::Validation("mapping cache type confusion".to_string()))
}

/// Storage table for `E`, validated alongside its mappings.
pub fn table_for<E: Persistable>() -> Result<&'static str, StorageError> {
    mappings_for::<E>()?;
    Ok(E::table())
}

/// Resolves a property (or column) name to its column, the identifier
/// allow-list used by read operations.
pub fn column_for<E: Persistable>(field: &str) -> Result<&'static str, StorageError> {
    let maps = mappings_for::<E>()?;
    maps.iter()
        .find(|m| m.property == field || m.column == field)
        .map(|m| m.column)
        .ok_or_else(|| {
            StorageError::Validation(format!(
                "unknown field '{}' for table '{}'",
                field,
                E::table()
            ))
        })
}

fn build<E: Persistable>() -> Result<Vec<FieldMapping<E>>, StorageError> {
    let table = E::table();
    if !sql::is_sql_identifier(table) {
        return Err(StorageError::Validation(format!(
            "invalid table name '{table}'"
        )));
    }

    let maps = E::field_mappings();
    if maps.is_empty() {
        return Err(StorageError::Validation(format!(
            "entity type for table '{table}' declares no field mappings"
        )));
    }

    let mut seen_columns = HashSet::new();
    let mut seen_properties = HashSet::new();
    let mut identities = 0usize;
    for m in &maps {
        if m.property.is_empty() || !sql::is_sql_identifier(m.column) {
            return Err(StorageError::Validation(format!(
                "invalid mapping '{}' -> '{}' on table '{table}'",
                m.property, m.column
            )));
        }
        if m.column == ORDER_COLUMN {
            return Err(StorageError::Validation(format!(
                "column '{ORDER_COLUMN}' is reserved for the pagination key"
            )));
        }
        if !seen_columns.insert(m.column) {
            return Err(StorageError::Validation(format!(
                "duplicate column '{}' on table '{table}'",
                m.column
            )));
        }
        if !seen_properties.insert(m.property) {
            return Err(StorageError::Validation(format!(
                "duplicate property '{}' on table '{table}'",
                m.property
            )));
        }
        if m.column == IDENTITY_COLUMN {
            identities += 1;
        }
    }
    if identities != 1 {
        return Err(StorageError::Validation(format!(
            "table '{table}' must map exactly one identity column, found {identities}"
        )));
    }
    Ok(maps)
}

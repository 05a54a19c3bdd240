//! Schema DDL generated from the mapping registry.
//!
//! Every entity table carries the engine-owned columns: `insert_id` as the
//! monotonic pagination key, a unique textual `uuid`, trigger-maintained
//! `created_at`/`updated_at`, and the nullable `deleted_at` soft-delete mark.

use crate::core::error::StorageError;
use crate::core::executor::SqliteExecutor;
use crate::core::mapping::{
    Persistable, CREATED_COLUMN, DELETED_COLUMN, IDENTITY_COLUMN, ORDER_COLUMN, UPDATED_COLUMN,
};
use crate::core::registry;

pub fn create_table_sql<E: Persistable>() -> Result<String, StorageError> {
    let table = registry::table_for::<E>()?;
    let maps = registry::mappings_for::<E>()?;

    let mut columns = vec![format!("{ORDER_COLUMN} INTEGER PRIMARY KEY AUTOINCREMENT")];
    for m in maps.iter() {
        let declaration = if m.column == IDENTITY_COLUMN {
            format!("{IDENTITY_COLUMN} TEXT NOT NULL UNIQUE")
        } else if m.column == CREATED_COLUMN || m.column == UPDATED_COLUMN {
            format!("{} TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP", m.column)
        } else if m.column == DELETED_COLUMN {
            format!("{DELETED_COLUMN} TEXT")
        } else {
            format!("{} {}", m.column, m.sql_type)
        };
        columns.push(declaration);
    }

    Ok(format!(
        "CREATE TABLE IF NOT EXISTS {table} (\n    {}\n)",
        columns.join(",\n    ")
    ))
}

/// Trigger that refreshes `updated_at` on every row update, plus the
/// soft-delete visibility index. `created_at`/`updated_at` inserts are
/// covered by the column defaults; application writes to either column are
/// suppressed at the mapping layer.
pub fn auxiliary_sql<E: Persistable>() -> Result<Vec<String>, StorageError> {
    let table = registry::table_for::<E>()?;
    Ok(vec![
        format!(
            "CREATE TRIGGER IF NOT EXISTS trg_{table}_touch_updated \
             AFTER UPDATE ON {table} FOR EACH ROW BEGIN \
             UPDATE {table} SET {UPDATED_COLUMN} = CURRENT_TIMESTAMP \
             WHERE {ORDER_COLUMN} = NEW.{ORDER_COLUMN}; END"
        ),
        format!(
            "CREATE INDEX IF NOT EXISTS idx_{table}_{DELETED_COLUMN} \
             ON {table}({DELETED_COLUMN})"
        ),
    ])
}

/// Creates the table, trigger, and index for `E` if missing.
pub fn initialize<E: Persistable>(executor: &SqliteExecutor) -> Result<(), StorageError> {
    executor.execute_batch(&create_table_sql::<E>()?)?;
    for ddl in auxiliary_sql::<E>()? {
        executor.execute_batch(&ddl)?;
    }
    Ok(())
}

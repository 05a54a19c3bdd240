//! CRUD engine over the mapping registry.
//!
//! All writes are guarded optimistically: a statement that does not affect
//! exactly one row is a failure, which covers rows that were never there and
//! races with concurrent writers alike. Identity is generated client-side at
//! insert so it is known without a round trip. Deletes are soft.

use crate::core::entity::Entity;
use crate::core::error::StorageError;
use crate::core::executor::{QueryExecutor, Row};
use crate::core::filter::Filter;
use crate::core::mapping::{FieldMapping, Persistable, DELETED_COLUMN, IDENTITY_COLUMN};
use crate::core::paginator::Paginator;
use crate::core::registry;
use crate::core::sql;
use crate::core::time::{self, Clock};
use serde_json::Value as JsonValue;
use uuid::Uuid;

pub struct Persister<X: QueryExecutor> {
    executor: X,
    clock: Clock,
}

impl<X: QueryExecutor> Persister<X> {
    pub fn new(executor: X) -> Self {
        Self::with_clock(executor, time::utc_now)
    }

    /// Persister with a pinned clock for soft-delete stamping.
    pub fn with_clock(executor: X, clock: Clock) -> Self {
        Self { executor, clock }
    }

    pub fn executor(&self) -> &X {
        &self.executor
    }

    /// Inserts a fresh entity: serializes every mapped field except identity
    /// through its write path, generates a v4 UUID client-side, and sets it
    /// onto the entity once the row landed.
    pub fn insert<E: Persistable>(&self, entity: &mut E) -> Result<(), StorageError> {
        if entity.identity().is_some() {
            return Err(StorageError::Validation(
                "entity already carries an identity; identity is assigned exactly once".to_string(),
            ));
        }

        let table = registry::table_for::<E>()?;
        let maps = registry::mappings_for::<E>()?;
        let identity = Uuid::new_v4().to_string();

        let mut columns = vec![IDENTITY_COLUMN];
        let mut placeholders = vec!["'%s'"];
        let mut args = vec![JsonValue::String(identity.clone())];
        for m in maps.iter().filter(|m| m.column != IDENTITY_COLUMN) {
            if let Some(value) = m.write_value(entity)? {
                placeholders.push(sql::placeholder_for(&value)?);
                columns.push(m.column);
                args.push(value);
            }
        }

        let query = format!(
            "INSERT INTO {table} ({}) VALUES ({})",
            columns.join(", "),
            placeholders.join(", ")
        );
        let affected = self.executor.execute(&query, &args)?;
        if affected != 1 {
            return Err(StorageError::WriteFailed {
                context: format!("INSERT INTO {table}"),
                affected,
            });
        }
        entity.set_identity(identity);
        Ok(())
    }

    /// Updates the row keyed by the entity's identity. The identity is the
    /// key only; it is never reassigned.
    pub fn update<E: Persistable>(&self, entity: &E) -> Result<(), StorageError> {
        let identity = entity.identity().ok_or_else(|| {
            StorageError::Validation("cannot update an entity with no identity".to_string())
        })?;

        let table = registry::table_for::<E>()?;
        let maps = registry::mappings_for::<E>()?;

        let mut assignments = Vec::new();
        let mut args = Vec::new();
        for m in maps.iter().filter(|m| m.column != IDENTITY_COLUMN) {
            if let Some(value) = m.write_value(entity)? {
                assignments.push(format!("{} = {}", m.column, sql::placeholder_for(&value)?));
                args.push(value);
            }
        }
        args.push(JsonValue::String(identity.to_string()));

        let query = format!(
            "UPDATE {table} SET {} WHERE {IDENTITY_COLUMN} = '%s'",
            assignments.join(", ")
        );
        let affected = self.executor.execute(&query, &args)?;
        if affected != 1 {
            return Err(StorageError::WriteFailed {
                context: format!("UPDATE {table} [{identity}]"),
                affected,
            });
        }
        Ok(())
    }

    /// Upsert keyed on identity presence, finished by a re-fetch so the
    /// caller observes server-assigned identity and timestamps rather than a
    /// possibly stale in-memory copy.
    pub fn save<E: Persistable>(&self, entity: &mut E) -> Result<E, StorageError> {
        if entity.identity().is_none() {
            self.insert(entity)?;
        } else {
            self.update(entity)?;
        }
        let identity = entity.identity().ok_or_else(|| {
            StorageError::Validation("entity lost its identity during save".to_string())
        })?;
        self.get::<E>(identity, false)
    }

    /// Fetches the one row matching `identity`. Soft-deleted rows stay
    /// invisible unless `include_deleted` asks for them.
    pub fn get<E: Persistable>(
        &self,
        identity: &str,
        include_deleted: bool,
    ) -> Result<E, StorageError> {
        let table = registry::table_for::<E>()?;
        let maps = registry::mappings_for::<E>()?;

        let mut query = format!("SELECT * FROM {table} WHERE {IDENTITY_COLUMN} = '%s'");
        if !include_deleted {
            query.push_str(&format!(" AND {DELETED_COLUMN} IS NULL"));
        }

        let rows = self
            .executor
            .query(&query, &[JsonValue::String(identity.to_string())])?;
        let Some(row) = rows.into_iter().next() else {
            return Err(StorageError::NotFound(format!("{table}/{identity}")));
        };
        hydrate(&maps, &row)
    }

    /// Soft delete: stamps `deleted_at` from the persister clock, then runs a
    /// guarded update. The row is never physically removed.
    pub fn delete<E: Persistable>(&self, entity: &mut E) -> Result<(), StorageError> {
        entity.set_deleted_at(Some((self.clock)()));
        self.update(entity)
    }

    /// Filtered, optionally paginated read. Filter fields resolve through the
    /// mapping registry; no-op filters vanish silently, so call sites chain
    /// them unconditionally.
    pub fn list<E: Persistable>(
        &self,
        filters: &[Filter],
        paginator: Option<&Paginator>,
        include_deleted: bool,
    ) -> Result<Vec<E>, StorageError> {
        let table = registry::table_for::<E>()?;
        let maps = registry::mappings_for::<E>()?;

        let mut query = format!("SELECT * FROM {table}");
        if !include_deleted {
            query.push_str(&format!(" WHERE {DELETED_COLUMN} IS NULL"));
        }

        let mut args = Vec::new();
        for filter in filters {
            query = filter.resolved::<E>()?.add_to_query(&query, &mut args)?;
        }
        if let Some(paginator) = paginator {
            query = paginator.add_to_query(table, &query, &mut args)?;
        }

        let rows = self.executor.query(&query, &args)?;
        rows.iter().map(|row| hydrate(&maps, row)).collect()
    }
}

/// Deserializes one row into a blank entity, each column through its field's
/// read path. Columns absent from the row read as NULL.
fn hydrate<E: Persistable>(maps: &[FieldMapping<E>], row: &Row) -> Result<E, StorageError> {
    let mut entity = E::default();
    for m in maps {
        let raw = row.get(m.column).unwrap_or(&JsonValue::Null);
        m.read_value(&mut entity, raw)?;
    }
    Ok(entity)
}

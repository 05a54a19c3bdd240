//! Declarative field-to-column mappings.
//!
//! Each entity type authors a static mapping table (no runtime reflection):
//! one [`FieldMapping`] per persisted property, lifecycle fields first. A
//! property without a mapping never participates in persistence.

use crate::core::entity::Entity;
use crate::core::error::StorageError;
use crate::core::time;
use serde_json::Value as JsonValue;

/// Internal monotonically increasing pagination key. Owned by the storage
/// layer, never remappable by entities.
pub const ORDER_COLUMN: &str = "insert_id";
/// Textual identity column (canonical UUID form, unique).
pub const IDENTITY_COLUMN: &str = "uuid";
pub const CREATED_COLUMN: &str = "created_at";
pub const UPDATED_COLUMN: &str = "updated_at";
pub const DELETED_COLUMN: &str = "deleted_at";

/// Default read of a property into its column value.
pub type GetFn<E> = fn(&E) -> JsonValue;
/// Default write of a raw column value back onto the property.
pub type SetFn<E> = fn(&mut E, &JsonValue) -> Result<(), StorageError>;
/// Write-path override. `Ok(None)` removes the column from the statement
/// entirely; this is how server-managed fields suppress application writes.
pub type SerializeFn<E> = fn(&E) -> Result<Option<JsonValue>, StorageError>;
/// Read-path override, handed the raw column value.
pub type DeserializeFn<E> = fn(&mut E, &JsonValue) -> Result<(), StorageError>;

/// Per-property persistence descriptor. Built once per entity type; list
/// order is stable and drives positional argument binding.
pub struct FieldMapping<E> {
    pub property: &'static str,
    pub column: &'static str,
    /// Declared column type for generated DDL.
    pub sql_type: &'static str,
    /// Date-valued fields convert to/from the textual column form.
    pub date_valued: bool,
    pub get: GetFn<E>,
    pub set: SetFn<E>,
    pub serialize: Option<SerializeFn<E>>,
    pub deserialize: Option<DeserializeFn<E>>,
}

impl<E: Entity> FieldMapping<E> {
    /// Mapping with the column name defaulting to the property name.
    pub fn new(property: &'static str, get: GetFn<E>, set: SetFn<E>) -> Self {
        Self {
            property,
            column: property,
            sql_type: "TEXT",
            date_valued: false,
            get,
            set,
            serialize: None,
            deserialize: None,
        }
    }

    pub fn column(mut self, column: &'static str) -> Self {
        self.column = column;
        self
    }

    pub fn sql_type(mut self, sql_type: &'static str) -> Self {
        self.sql_type = sql_type;
        self
    }

    pub fn date_valued(mut self) -> Self {
        self.date_valued = true;
        self
    }

    pub fn with_serialize(mut self, serialize: SerializeFn<E>) -> Self {
        self.serialize = Some(serialize);
        self
    }

    pub fn with_deserialize(mut self, deserialize: DeserializeFn<E>) -> Self {
        self.deserialize = Some(deserialize);
        self
    }

    /// Write-path value for this field, `None` when the column is suppressed.
    /// The override takes precedence over the default property read.
    pub fn write_value(&self, entity: &E) -> Result<Option<JsonValue>, StorageError> {
        if let Some(serialize) = self.serialize {
            return serialize(entity);
        }
        let value = (self.get)(entity);
        match value {
            JsonValue::Array(_) | JsonValue::Object(_) => Err(StorageError::InvalidFieldType(
                format!("field '{}' does not hold a scalar", self.property),
            )),
            scalar => Ok(Some(scalar)),
        }
    }

    /// Read-path application of a raw column value onto the entity.
    pub fn read_value(&self, entity: &mut E, raw: &JsonValue) -> Result<(), StorageError> {
        if let Some(deserialize) = self.deserialize {
            return deserialize(entity, raw);
        }
        (self.set)(entity, raw)
    }
}

/// Declarative persistence contract: the storage table plus the authored
/// mapping table. `Default` gives the persister a blank instance to hydrate.
pub trait Persistable: Entity + Default + 'static {
    fn table() -> &'static str;
    /// Authored mappings, lifecycle fields first (via [`lifecycle_mappings`]).
    fn field_mappings() -> Vec<FieldMapping<Self>>;
}

/// Mappings every entity carries: identity plus the lifecycle columns.
/// `created_at`/`updated_at` suppress their own writes; the store's defaults
/// and triggers maintain them. `deleted_at` stays writable for soft deletes.
pub fn lifecycle_mappings<E: Entity>() -> Vec<FieldMapping<E>> {
    vec![
        FieldMapping::new("identity", get_identity::<E>, set_identity::<E>)
            .column(IDENTITY_COLUMN),
        FieldMapping::new("created_at", get_created::<E>, set_created::<E>)
            .column(CREATED_COLUMN)
            .date_valued()
            .with_serialize(suppress_write::<E>),
        FieldMapping::new("updated_at", get_updated::<E>, set_updated::<E>)
            .column(UPDATED_COLUMN)
            .date_valued()
            .with_serialize(suppress_write::<E>),
        FieldMapping::new("deleted_at", get_deleted::<E>, set_deleted::<E>)
            .column(DELETED_COLUMN)
            .date_valued(),
    ]
}

fn suppress_write<E: Entity>(_entity: &E) -> Result<Option<JsonValue>, StorageError> {
    Ok(None)
}

fn get_identity<E: Entity>(entity: &E) -> JsonValue {
    match entity.identity() {
        Some(id) => JsonValue::String(id.to_string()),
        None => JsonValue::Null,
    }
}

fn set_identity<E: Entity>(entity: &mut E, raw: &JsonValue) -> Result<(), StorageError> {
    match raw {
        JsonValue::Null => Ok(()),
        JsonValue::String(id) => {
            entity.set_identity(id.clone());
            Ok(())
        }
        other => Err(StorageError::InvalidFieldType(format!(
            "identity column must be textual, got {other}"
        ))),
    }
}

fn get_created<E: Entity>(entity: &E) -> JsonValue {
    time::datetime_to_value(entity.created_at())
}

fn set_created<E: Entity>(entity: &mut E, raw: &JsonValue) -> Result<(), StorageError> {
    entity.set_created_at(time::datetime_from_value(raw)?);
    Ok(())
}

fn get_updated<E: Entity>(entity: &E) -> JsonValue {
    time::datetime_to_value(entity.updated_at())
}

fn set_updated<E: Entity>(entity: &mut E, raw: &JsonValue) -> Result<(), StorageError> {
    entity.set_updated_at(time::datetime_from_value(raw)?);
    Ok(())
}

fn get_deleted<E: Entity>(entity: &E) -> JsonValue {
    time::datetime_to_value(entity.deleted_at())
}

fn set_deleted<E: Entity>(entity: &mut E, raw: &JsonValue) -> Result<(), StorageError> {
    entity.set_deleted_at(time::datetime_from_value(raw)?);
    Ok(())
}

//! Carapace: declarative entity persistence over SQLite.
//!
//! **Carapace maps plain Rust entities onto relational rows and back, with
//! the failure semantics spelled out.**
//!
//! # Core Principles
//!
//! - **Declarative mapping**: each entity type authors a static field-to-column
//!   table; nothing is reflected at runtime, and unmapped properties never
//!   touch the store
//! - **Optimistic write guard**: every write must affect exactly one row, in
//!   place of explicit locking
//! - **Soft deletes**: rows are marked with `deleted_at`, never removed;
//!   default reads exclude them
//! - **Keyset pagination**: pages bound by the monotonic `insert_id` column,
//!   stable under concurrent inserts
//! - **Allow-listed identifiers**: table, column, and operator fragments are
//!   resolved from the mapping registry, never concatenated from caller text
//!
//! # Architecture
//!
//! Entities implement the [`core::entity::Entity`] lifecycle contract and
//! declare their storage shape through [`core::mapping::Persistable`]. The
//! [`core::persister::Persister`] drives CRUD through a
//! [`core::executor::QueryExecutor`], with [`core::filter::Filter`] and
//! [`core::paginator::Paginator`] contributing WHERE/ORDER/LIMIT fragments to
//! reads. Server-managed timestamps live in the store (column defaults plus
//! an update trigger generated by [`core::schema`]); the mapping layer
//! suppresses application writes to them.
//!
//! ```no_run
//! use carapace::core::{executor::SqliteExecutor, persister::Persister, schema};
//! # use carapace::core::error::StorageError;
//! # use carapace::core::mapping::{FieldMapping, Persistable, lifecycle_mappings};
//! # use carapace::core::entity::Lifecycle;
//! # #[derive(Debug, Default)]
//! # struct Subscriber { lifecycle: Lifecycle, email: String }
//! # carapace::impl_entity_via_lifecycle!(Subscriber, lifecycle);
//! # impl Persistable for Subscriber {
//! #     fn table() -> &'static str { "subscribers" }
//! #     fn field_mappings() -> Vec<FieldMapping<Self>> {
//! #         let mut maps = lifecycle_mappings::<Self>();
//! #         maps.push(FieldMapping::new(
//! #             "email",
//! #             |e: &Self| serde_json::Value::String(e.email.clone()),
//! #             |e: &mut Self, v| { e.email = v.as_str().unwrap_or_default().to_string(); Ok(()) },
//! #         ));
//! #         maps
//! #     }
//! # }
//! # fn main() -> Result<(), StorageError> {
//! let executor = SqliteExecutor::open_in_memory()?;
//! schema::initialize::<Subscriber>(&executor)?;
//! let persister = Persister::new(executor);
//!
//! let mut draft = Subscriber { email: "crab@example.org".into(), ..Default::default() };
//! let saved = persister.save(&mut draft)?;
//! assert!(saved.lifecycle.created_at.is_some());
//! # Ok(())
//! # }
//! ```

pub mod core;

// re-exported for the `impl_entity_via_lifecycle!` expansion
pub use chrono;

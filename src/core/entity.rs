//! Identity/lifecycle contract every persisted record implements.
//!
//! Entities stay plain data holders; persistence is composed in through
//! [`crate::core::persister::Persister`], never inherited.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Base contract consumed by the persister.
///
/// - `identity` is the canonical UUID text form. Unset before the first save,
///   immutable after.
/// - `created_at`/`updated_at` are owned by the storage layer; application
///   writes to them never reach the store.
/// - a non-null `deleted_at` marks a soft-deleted row.
pub trait Entity {
    fn identity(&self) -> Option<&str>;
    fn set_identity(&mut self, identity: String);
    fn created_at(&self) -> Option<DateTime<Utc>>;
    fn set_created_at(&mut self, ts: Option<DateTime<Utc>>);
    fn updated_at(&self) -> Option<DateTime<Utc>>;
    fn set_updated_at(&mut self, ts: Option<DateTime<Utc>>);
    fn deleted_at(&self) -> Option<DateTime<Utc>>;
    fn set_deleted_at(&mut self, ts: Option<DateTime<Utc>>);

    fn is_persisted(&self) -> bool {
        self.identity().is_some()
    }

    fn is_deleted(&self) -> bool {
        self.deleted_at().is_some()
    }
}

/// Embeddable lifecycle block. Concrete entities hold one of these and
/// forward the [`Entity`] accessors to it instead of re-declaring the four
/// fields by hand.
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Lifecycle {
    pub identity: Option<String>,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
    pub deleted_at: Option<DateTime<Utc>>,
}

impl Entity for Lifecycle {
    fn identity(&self) -> Option<&str> {
        self.identity.as_deref()
    }

    fn set_identity(&mut self, identity: String) {
        self.identity = Some(identity);
    }

    fn created_at(&self) -> Option<DateTime<Utc>> {
        self.created_at
    }

    fn set_created_at(&mut self, ts: Option<DateTime<Utc>>) {
        self.created_at = ts;
    }

    fn updated_at(&self) -> Option<DateTime<Utc>> {
        self.updated_at
    }

    fn set_updated_at(&mut self, ts: Option<DateTime<Utc>>) {
        self.updated_at = ts;
    }

    fn deleted_at(&self) -> Option<DateTime<Utc>> {
        self.deleted_at
    }

    fn set_deleted_at(&mut self, ts: Option<DateTime<Utc>>) {
        self.deleted_at = ts;
    }
}

/// Forwards the `Entity` accessors to a `Lifecycle` field on the type.
#[macro_export]
macro_rules! impl_entity_via_lifecycle {
    ($ty:ty, $field:ident) => {
        impl $crate::core::entity::Entity for $ty {
            fn identity(&self) -> Option<&str> {
                self.$field.identity.as_deref()
            }
            fn set_identity(&mut self, identity: String) {
                self.$field.identity = Some(identity);
            }
            fn created_at(&self) -> Option<$crate::chrono::DateTime<$crate::chrono::Utc>> {
                self.$field.created_at
            }
            fn set_created_at(&mut self, ts: Option<$crate::chrono::DateTime<$crate::chrono::Utc>>) {
                self.$field.created_at = ts;
            }
            fn updated_at(&self) -> Option<$crate::chrono::DateTime<$crate::chrono::Utc>> {
                self.$field.updated_at
            }
            fn set_updated_at(&mut self, ts: Option<$crate::chrono::DateTime<$crate::chrono::Utc>>) {
                self.$field.updated_at = ts;
            }
            fn deleted_at(&self) -> Option<$crate::chrono::DateTime<$crate::chrono::Utc>> {
                self.$field.deleted_at
            }
            fn set_deleted_at(&mut self, ts: Option<$crate::chrono::DateTime<$crate::chrono::Utc>>) {
                self.$field.deleted_at = ts;
            }
        }
    };
}

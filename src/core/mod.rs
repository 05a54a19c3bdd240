//! Core modules of the persistence engine.
//!
//! Leaf-first: scalar/SQL helpers and the clock seam at the bottom, the
//! mapping registry and query-fragment builders in the middle, the persister
//! on top.

pub mod entity;
pub mod error;
pub mod executor;
pub mod filter;
pub mod mapping;
pub mod paginator;
pub mod persister;
pub mod registry;
pub mod schema;
pub mod sql;
pub mod time;

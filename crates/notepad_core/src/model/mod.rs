//! Note record shapes shared by the store and its callers.
//!
//! # Responsibility
//! - Define the typed `Note` read model and partial write values.
//! - Define the materialized `ResultSet` returned by queries.
//!
//! # Invariants
//! - `id` is assigned by storage and never reused.
//! - A `ResultSet` always remembers the address it was produced for.

pub mod note;
pub mod result_set;

//! Repository layer over the `notes` table.
//!
//! # Responsibility
//! - Hold every SQL statement the store executes.
//! - Keep predicate composition next to the statements that use it.

pub mod note_repo;

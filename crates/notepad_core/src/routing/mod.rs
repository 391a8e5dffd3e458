//! Address routing and projection whitelists.
//!
//! # Responsibility
//! - Parse note addresses and resolve them to operation codes.
//! - Map requested columns per operation code.
//!
//! # Invariants
//! - Routing state is immutable after `RoutingTable::new`.

pub mod projection;
pub mod router;
pub mod uri;

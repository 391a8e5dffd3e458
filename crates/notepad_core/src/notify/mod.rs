//! Change notification for note addresses.
//!
//! # Responsibility
//! - Keep the subscriber registry owned by a store.
//! - Fan a changed address out to every interested subscriber.
//!
//! # Invariants
//! - Delivery is synchronous with `notify` and happens outside the registry lock.
//! - No matching subscriber is skipped.

pub mod registry;

//! Store entry points used by host applications.
//!
//! # Responsibility
//! - Expose query/insert/update/delete/export over note addresses.
//! - Keep callers decoupled from SQL, connections and threads.

pub mod error;
pub mod export;
pub mod note_store;
pub mod pipe;
pub mod request;

//! Single-table note store addressed by URIs.
//! Routing, projection, persistence, change notification and export live here;
//! hosts only build requests and read results.

pub mod config;
pub mod contract;
pub mod db;
pub mod logging;
pub mod model;
pub mod notify;
pub mod repo;
pub mod routing;
pub mod service;

pub use config::StoreConfig;
pub use logging::{default_log_level, init_logging, logging_status};
pub use model::note::{Note, NoteId, NoteValues};
pub use model::result_set::ResultSet;
pub use notify::registry::{ChangeObserver, ObserverRegistry, SubscriptionId};
pub use routing::router::{Route, RoutingTable};
pub use routing::uri::NoteUri;
pub use service::error::{StoreError, StoreResult};
pub use service::export::NoteStream;
pub use service::note_store::NoteStore;
pub use service::request::{NoteQuery, Selection};

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

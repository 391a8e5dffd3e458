//! Store configuration.
//!
//! # Responsibility
//! - Carry the tunables a host application may override when opening a store.
//!
//! # Invariants
//! - `StoreConfig::default()` is always a valid configuration.
//! - Every field is optional in serialized form and falls back to its default.

use crate::contract::{DEFAULT_AUTHORITY, DEFAULT_UNTITLED};
use serde::{Deserialize, Serialize};
use std::time::Duration;

const DEFAULT_READ_POOL_SIZE: usize = 4;
const DEFAULT_EXPORT_PIPE_CAPACITY: usize = 4;
const DEFAULT_BUSY_TIMEOUT_MS: u64 = 5_000;

/// Options for `NoteStore::open` / `NoteStore::open_in_memory`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    /// Authority every served address must carry.
    pub authority: String,
    /// Title written when an insert omits one.
    pub untitled_title: String,
    /// Read-only connections opened for file-backed stores. `0` routes reads
    /// through the writer connection.
    pub read_pool_size: usize,
    /// Chunks buffered between an export producer and its reader.
    pub export_pipe_capacity: usize,
    /// SQLite busy timeout per connection.
    pub busy_timeout_ms: u64,
}

impl StoreConfig {
    pub fn busy_timeout(&self) -> Duration {
        Duration::from_millis(self.busy_timeout_ms)
    }
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            authority: DEFAULT_AUTHORITY.to_string(),
            untitled_title: DEFAULT_UNTITLED.to_string(),
            read_pool_size: DEFAULT_READ_POOL_SIZE,
            export_pipe_capacity: DEFAULT_EXPORT_PIPE_CAPACITY,
            busy_timeout_ms: DEFAULT_BUSY_TIMEOUT_MS,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::StoreConfig;

    #[test]
    fn partial_json_falls_back_to_defaults() {
        let config: StoreConfig =
            serde_json::from_str(r#"{"authority":"com.example.notes","read_pool_size":1}"#)
                .unwrap();
        assert_eq!(config.authority, "com.example.notes");
        assert_eq!(config.read_pool_size, 1);
        assert_eq!(config.untitled_title, "Untitled");
        assert_eq!(config.busy_timeout().as_millis(), 5_000);
    }
}

//! Schema version check and destructive upgrade.
//!
//! # Responsibility
//! - Create the `notes` table on a fresh database.
//! - Drop and recreate it when an older schema version is found.
//!
//! # Invariants
//! - The applied version is mirrored to `PRAGMA user_version`.
//! - Upgrading from an older version loses every stored note.
//! - A newer on-disk version is refused, never downgraded.

use crate::contract::TABLE_NAME;
use crate::db::{DbError, DbResult};
use log::{info, warn};
use rusqlite::Connection;

/// Current on-disk schema version.
pub const SCHEMA_VERSION: u32 = 2;

const CREATE_NOTES_SQL: &str = include_str!("notes_v2.sql");

/// Returns the latest schema version known by this binary.
pub fn latest_version() -> u32 {
    SCHEMA_VERSION
}

/// Brings the connection to `SCHEMA_VERSION`.
pub fn apply_migrations(conn: &mut Connection) -> DbResult<()> {
    let current_version = current_user_version(conn)?;
    let latest = latest_version();

    if current_version > latest {
        return Err(DbError::UnsupportedSchemaVersion {
            db_version: current_version,
            latest_supported: latest,
        });
    }

    if current_version == latest {
        return Ok(());
    }

    let tx = conn.transaction()?;
    if current_version == 0 {
        info!("event=schema_create module=db status=start version={latest}");
    } else {
        warn!(
            "event=schema_upgrade module=db status=start from={current_version} to={latest} data_loss=true"
        );
        tx.execute_batch(&format!("DROP TABLE IF EXISTS {TABLE_NAME};"))?;
    }
    tx.execute_batch(CREATE_NOTES_SQL)?;
    tx.execute_batch(&format!("PRAGMA user_version = {latest};"))?;
    tx.commit()?;

    info!("event=schema_apply module=db status=ok version={latest}");
    Ok(())
}

/// Reads `PRAGMA user_version`.
pub fn current_user_version(conn: &Connection) -> DbResult<u32> {
    let version = conn.query_row("PRAGMA user_version;", [], |row| row.get::<_, u32>(0))?;
    Ok(version)
}

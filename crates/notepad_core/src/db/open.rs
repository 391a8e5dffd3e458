//! Connection bootstrap utilities for SQLite.
//!
//! # Responsibility
//! - Open file or in-memory SQLite connections.
//! - Configure the pragmas the store depends on.
//! - Apply the schema before returning a writable connection.
//!
//! # Invariants
//! - Writable connections have the current schema applied.
//! - File connections run in WAL mode so readers do not block the writer.
//! - Read-only connections never run schema changes.

use super::migrations::apply_migrations;
use super::DbResult;
use log::{error, info};
use rusqlite::{Connection, OpenFlags};
use std::path::Path;
use std::time::{Duration, Instant};

/// Opens a SQLite database file and applies the schema.
///
/// # Side effects
/// - Switches the file to WAL journaling.
/// - Emits `db_open` logging events with duration and status.
pub fn open_db(path: impl AsRef<Path>, busy_timeout: Duration) -> DbResult<Connection> {
    let started_at = Instant::now();
    info!("event=db_open module=db status=start mode=file");

    let mut conn = match Connection::open(path) {
        Ok(conn) => conn,
        Err(err) => {
            log_open_failure("file", "db_open_failed", started_at, &err);
            return Err(err.into());
        }
    };

    let bootstrapped = enable_wal(&conn)
        .and_then(|()| bootstrap_connection(&mut conn, busy_timeout));
    finish_open("file", started_at, bootstrapped).map(|()| conn)
}

/// Opens an in-memory SQLite database and applies the schema.
///
/// The database lives exactly as long as the returned connection.
pub fn open_db_in_memory(busy_timeout: Duration) -> DbResult<Connection> {
    let started_at = Instant::now();
    info!("event=db_open module=db status=start mode=memory");

    let mut conn = match Connection::open_in_memory() {
        Ok(conn) => conn,
        Err(err) => {
            log_open_failure("memory", "db_open_failed", started_at, &err);
            return Err(err.into());
        }
    };

    let bootstrapped = bootstrap_connection(&mut conn, busy_timeout);
    finish_open("memory", started_at, bootstrapped).map(|()| conn)
}

/// Opens an additional read-only connection to an already bootstrapped file.
pub fn open_db_read_only(path: impl AsRef<Path>, busy_timeout: Duration) -> DbResult<Connection> {
    let conn = Connection::open_with_flags(
        path,
        OpenFlags::SQLITE_OPEN_READ_ONLY | OpenFlags::SQLITE_OPEN_NO_MUTEX,
    )?;
    conn.busy_timeout(busy_timeout)?;
    Ok(conn)
}

fn enable_wal(conn: &Connection) -> DbResult<()> {
    let _mode: String = conn.query_row("PRAGMA journal_mode = WAL;", [], |row| row.get(0))?;
    Ok(())
}

fn bootstrap_connection(conn: &mut Connection, busy_timeout: Duration) -> DbResult<()> {
    conn.busy_timeout(busy_timeout)?;
    apply_migrations(conn)?;
    Ok(())
}

fn finish_open(mode: &str, started_at: Instant, result: DbResult<()>) -> DbResult<()> {
    match result {
        Ok(()) => {
            info!(
                "event=db_open module=db status=ok mode={} duration_ms={}",
                mode,
                started_at.elapsed().as_millis()
            );
            Ok(())
        }
        Err(err) => {
            log_open_failure(mode, "db_bootstrap_failed", started_at, &err);
            Err(err)
        }
    }
}

fn log_open_failure(
    mode: &str,
    error_code: &str,
    started_at: Instant,
    err: &dyn std::fmt::Display,
) {
    error!(
        "event=db_open module=db status=error mode={} duration_ms={} error_code={} error={}",
        mode,
        started_at.elapsed().as_millis(),
        error_code,
        err
    );
}

//! Database connection management

use std::time::Duration;

use rusqlite::Connection;
use tabula_core::Result;

use crate::config::StoreConfig;
use crate::errors::from_rusqlite;

/// Open and configure the database described by `config`
pub fn open(config: &StoreConfig) -> Result<Connection> {
    let conn = match &config.path {
        Some(path) => Connection::open(path),
        None => Connection::open_in_memory(),
    }
    .map_err(|e| from_rusqlite("open", "<database>", e))?;
    configure(&conn, config)?;
    Ok(conn)
}

/// Open an in-memory SQLite database with default settings (for testing)
pub fn open_in_memory() -> Result<Connection> {
    open(&StoreConfig::in_memory())
}

/// Apply connection pragmas
pub fn configure(conn: &Connection, config: &StoreConfig) -> Result<()> {
    let fail = |e| from_rusqlite("configure", "<database>", e);

    conn.pragma_update(None, "foreign_keys", config.foreign_keys)
        .map_err(fail)?;

    // In-memory databases ignore WAL and keep their own journal.
    if config.path.is_some() {
        conn.pragma_update(None, "journal_mode", config.journal_mode.as_pragma())
            .map_err(fail)?;
    }

    conn.busy_timeout(Duration::from_millis(config.busy_timeout_ms))
        .map_err(fail)?;

    Ok(())
}

use std::fs;
use std::path::{Path, PathBuf};

use rusqlite::Connection;

use crate::error::TodoError;

use super::migrations;

/// Owns the single SQLite handle for the lifetime of a command.
pub struct Database {
    conn: Connection,
    path: Option<PathBuf>,
}

impl Database {
    /// Open (creating if needed) the database file and bring the schema up to date.
    pub fn open(path: &Path) -> Result<Self, TodoError> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|e| {
                TodoError::database(format!("create {}: {e}", parent.display()))
            })?;
        }
        let conn = Connection::open(path)
            .map_err(|e| TodoError::from(e).context(&format!("open {}", path.display())))?;
        configure_connection(&conn)?;
        migrations::run_migrations(&conn)?;
        tracing::debug!(path = %path.display(), "database opened");
        Ok(Self {
            conn,
            path: Some(path.to_path_buf()),
        })
    }

    /// Throwaway database, used by tests.
    pub fn open_in_memory() -> Result<Self, TodoError> {
        let conn = Connection::open_in_memory()?;
        migrations::run_migrations(&conn)?;
        Ok(Self { conn, path: None })
    }

    pub fn conn(&self) -> &Connection {
        &self.conn
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Release the handle. Consumes the database, so it can only happen once.
    pub fn close(self) -> Result<(), TodoError> {
        self.conn
            .close()
            .map_err(|(_, e)| TodoError::from(e).context("close database"))?;
        tracing::debug!("database closed");
        Ok(())
    }
}

fn configure_connection(conn: &Connection) -> Result<(), TodoError> {
    conn.execute_batch(
        "PRAGMA journal_mode=WAL;
         PRAGMA busy_timeout=5000;",
    )?;
    Ok(())
}

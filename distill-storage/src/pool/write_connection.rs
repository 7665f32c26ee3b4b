//! The single write connection. All mutations are serialized through it,
//! which is also what serializes cluster merges within a run.

use std::path::Path;
use std::sync::Mutex;

use rusqlite::Connection;

use distill_core::errors::{DistillError, DistillResult, StorageError};

use super::pragmas::apply_pragmas;
use crate::to_storage_err;

/// Owns the writer. Mutations run under its mutex.
pub struct WriteConnection {
    conn: Mutex<Connection>,
}

impl WriteConnection {
    /// Open the writer against a database file.
    pub fn open(path: &Path) -> DistillResult<Self> {
        let conn = Connection::open(path).map_err(|e| to_storage_err(e.to_string()))?;
        apply_pragmas(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Open an in-memory writer (for testing).
    pub fn open_in_memory() -> DistillResult<Self> {
        let conn = Connection::open_in_memory().map_err(|e| to_storage_err(e.to_string()))?;
        apply_pragmas(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Execute a closure with the write connection.
    pub fn with_conn<F, T>(&self, f: F) -> DistillResult<T>
    where
        F: FnOnce(&Connection) -> DistillResult<T>,
    {
        let guard = self.conn.lock().map_err(|e| {
            DistillError::Storage(StorageError::PoolPoisoned {
                message: e.to_string(),
            })
        })?;
        f(&guard)
    }
}

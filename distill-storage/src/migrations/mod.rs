//! Versioned schema migrations, tracked via `PRAGMA user_version`.

pub mod v001_entity_tables;
pub mod v002_audit_tables;
pub mod v003_graph_tables;

use rusqlite::Connection;

use distill_core::errors::{DistillError, DistillResult, StorageError};

use crate::to_storage_err;

/// The schema version this build expects.
pub const CURRENT_VERSION: u32 = 3;

/// Run all pending migrations. Idempotent: already-applied versions are
/// skipped via user_version.
pub fn run_migrations(conn: &Connection) -> DistillResult<()> {
    let mut version = current_version(conn)?;

    while version < CURRENT_VERSION {
        let next = version + 1;
        let result = match next {
            1 => v001_entity_tables::migrate(conn),
            2 => v002_audit_tables::migrate(conn),
            3 => v003_graph_tables::migrate(conn),
            other => {
                return Err(DistillError::Storage(StorageError::MigrationFailed {
                    version: other,
                    reason: "no migration registered".to_string(),
                }))
            }
        };
        result.map_err(|e| {
            DistillError::Storage(StorageError::MigrationFailed {
                version: next,
                reason: e.to_string(),
            })
        })?;
        set_version(conn, next)?;
        tracing::debug!(version = next, "applied migration");
        version = next;
    }
    Ok(())
}

/// Read the current schema version.
pub fn current_version(conn: &Connection) -> DistillResult<u32> {
    conn.pragma_query_value(None, "user_version", |row| row.get::<_, i64>(0))
        .map(|v| v as u32)
        .map_err(|e| to_storage_err(e.to_string()))
}

fn set_version(conn: &Connection, version: u32) -> DistillResult<()> {
    conn.pragma_update(None, "user_version", version as i64)
        .map_err(|e| to_storage_err(e.to_string()))
}

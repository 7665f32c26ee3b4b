//! v002: entity_snapshots, audit_runs.

use rusqlite::Connection;

use distill_core::errors::DistillResult;

use crate::to_storage_err;

pub fn migrate(conn: &Connection) -> DistillResult<()> {
    conn.execute_batch(
        "
        CREATE TABLE IF NOT EXISTS entity_snapshots (
            id              INTEGER PRIMARY KEY AUTOINCREMENT,
            audit_id        TEXT NOT NULL,
            entity_id       TEXT NOT NULL,
            consolidated_id TEXT NOT NULL,
            payload         TEXT NOT NULL,
            created_at      TEXT NOT NULL DEFAULT (strftime('%Y-%m-%dT%H:%M:%fZ', 'now'))
        );

        CREATE INDEX IF NOT EXISTS idx_snapshot_audit ON entity_snapshots(audit_id);
        CREATE INDEX IF NOT EXISTS idx_snapshot_entity ON entity_snapshots(entity_id);

        CREATE TABLE IF NOT EXISTS audit_runs (
            audit_id           TEXT PRIMARY KEY,
            scope              TEXT NOT NULL DEFAULT '[]',
            status             TEXT NOT NULL,
            started_at         TEXT NOT NULL,
            finished_at        TEXT,
            entities_processed INTEGER NOT NULL DEFAULT 0,
            entities_merged    INTEGER NOT NULL DEFAULT 0,
            degraded           INTEGER NOT NULL DEFAULT 0,
            rollback_reason    TEXT,
            rolled_back_at     TEXT
        );

        CREATE INDEX IF NOT EXISTS idx_audit_status ON audit_runs(status);
        CREATE INDEX IF NOT EXISTS idx_audit_started ON audit_runs(started_at);
        ",
    )
    .map_err(|e| to_storage_err(e.to_string()))?;
    Ok(())
}

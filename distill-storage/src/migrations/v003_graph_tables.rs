//! v003: relationships, patterns.

use rusqlite::Connection;

use distill_core::errors::DistillResult;

use crate::to_storage_err;

pub fn migrate(conn: &Connection) -> DistillResult<()> {
    conn.execute_batch(
        "
        CREATE TABLE IF NOT EXISTS relationships (
            id                TEXT PRIMARY KEY,
            source_id         TEXT NOT NULL,
            target_id         TEXT NOT NULL,
            relationship_type TEXT NOT NULL,
            confidence        REAL NOT NULL,
            rule              TEXT NOT NULL,
            evidence          TEXT NOT NULL DEFAULT '[]',
            audit_id          TEXT NOT NULL,
            UNIQUE(source_id, target_id, relationship_type)
        );

        CREATE INDEX IF NOT EXISTS idx_rel_source ON relationships(source_id);
        CREATE INDEX IF NOT EXISTS idx_rel_target ON relationships(target_id);
        CREATE INDEX IF NOT EXISTS idx_rel_audit ON relationships(audit_id);

        CREATE TABLE IF NOT EXISTS patterns (
            id              TEXT PRIMARY KEY,
            pattern_type    TEXT NOT NULL,
            name            TEXT NOT NULL,
            org_id          TEXT NOT NULL,
            supporting_ids  TEXT NOT NULL DEFAULT '[]',
            frequency       INTEGER NOT NULL,
            strength        REAL NOT NULL,
            high_priority   INTEGER NOT NULL DEFAULT 0,
            audit_id        TEXT NOT NULL
        );

        CREATE INDEX IF NOT EXISTS idx_pattern_type ON patterns(pattern_type);
        CREATE INDEX IF NOT EXISTS idx_pattern_audit ON patterns(audit_id);
        ",
    )
    .map_err(|e| to_storage_err(e.to_string()))?;
    Ok(())
}

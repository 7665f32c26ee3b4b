//! v001: raw_entities, consolidated_entities.

use rusqlite::Connection;

use distill_core::errors::DistillResult;

use crate::to_storage_err;

pub fn migrate(conn: &Connection) -> DistillResult<()> {
    conn.execute_batch(
        "
        CREATE TABLE IF NOT EXISTS raw_entities (
            id                  TEXT PRIMARY KEY,
            entity_type         TEXT NOT NULL,
            org_id              TEXT NOT NULL,
            source_interview_id TEXT NOT NULL,
            name                TEXT NOT NULL,
            description         TEXT NOT NULL DEFAULT '',
            attributes          TEXT NOT NULL DEFAULT '{}',
            extracted_at        TEXT NOT NULL,
            consolidated_into   TEXT
        );

        CREATE INDEX IF NOT EXISTS idx_raw_type ON raw_entities(entity_type);
        CREATE INDEX IF NOT EXISTS idx_raw_org ON raw_entities(org_id);
        CREATE INDEX IF NOT EXISTS idx_raw_consolidated ON raw_entities(consolidated_into);

        CREATE TABLE IF NOT EXISTS consolidated_entities (
            id                    TEXT PRIMARY KEY,
            entity_type           TEXT NOT NULL,
            org_id                TEXT NOT NULL,
            name                  TEXT NOT NULL,
            description           TEXT NOT NULL DEFAULT '',
            attributes            TEXT NOT NULL DEFAULT '{}',
            source_count          INTEGER NOT NULL,
            mentioned_in          TEXT NOT NULL DEFAULT '[]',
            consensus_confidence  REAL NOT NULL,
            contradiction         INTEGER NOT NULL DEFAULT 0,
            contradicting_sources TEXT NOT NULL DEFAULT '[]',
            audit_id              TEXT NOT NULL,
            consolidated_at       TEXT NOT NULL
        );

        CREATE INDEX IF NOT EXISTS idx_consolidated_type ON consolidated_entities(entity_type);
        CREATE INDEX IF NOT EXISTS idx_consolidated_org ON consolidated_entities(org_id);
        CREATE INDEX IF NOT EXISTS idx_consolidated_audit ON consolidated_entities(audit_id);
        ",
    )
    .map_err(|e| to_storage_err(e.to_string()))?;
    Ok(())
}

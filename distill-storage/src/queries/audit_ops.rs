//! Audit run records: one row per consolidation run.

use rusqlite::{params, Connection};

use distill_core::entity::EntityType;
use distill_core::errors::DistillResult;
use distill_core::models::{AuditRecord, RunStatus};

use super::raw_ops::parse_dt;
use crate::to_storage_err;

/// Insert a freshly opened audit record.
pub fn insert_audit(conn: &Connection, record: &AuditRecord) -> DistillResult<()> {
    let scope_json =
        serde_json::to_string(&record.scope).map_err(|e| to_storage_err(e.to_string()))?;

    conn.execute(
        "INSERT INTO audit_runs (
            audit_id, scope, status, started_at, finished_at,
            entities_processed, entities_merged, degraded,
            rollback_reason, rolled_back_at
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
        params![
            record.audit_id,
            scope_json,
            record.status.as_str(),
            record.started_at.to_rfc3339(),
            record.finished_at.map(|t| t.to_rfc3339()),
            record.entities_processed,
            record.entities_merged,
            record.degraded as i32,
            record.rollback_reason,
            record.rolled_back_at.map(|t| t.to_rfc3339()),
        ],
    )
    .map_err(|e| to_storage_err(e.to_string()))?;
    Ok(())
}

/// Update an existing audit record in place.
pub fn update_audit(conn: &Connection, record: &AuditRecord) -> DistillResult<()> {
    let scope_json =
        serde_json::to_string(&record.scope).map_err(|e| to_storage_err(e.to_string()))?;

    conn.execute(
        "UPDATE audit_runs SET
            scope = ?2, status = ?3, started_at = ?4, finished_at = ?5,
            entities_processed = ?6, entities_merged = ?7, degraded = ?8,
            rollback_reason = ?9, rolled_back_at = ?10
         WHERE audit_id = ?1",
        params![
            record.audit_id,
            scope_json,
            record.status.as_str(),
            record.started_at.to_rfc3339(),
            record.finished_at.map(|t| t.to_rfc3339()),
            record.entities_processed,
            record.entities_merged,
            record.degraded as i32,
            record.rollback_reason,
            record.rolled_back_at.map(|t| t.to_rfc3339()),
        ],
    )
    .map_err(|e| to_storage_err(e.to_string()))?;
    Ok(())
}

/// Get one audit record by id.
pub fn get_audit(conn: &Connection, audit_id: &str) -> DistillResult<Option<AuditRecord>> {
    let mut stmt = conn
        .prepare(&format!("{SELECT_COLUMNS} WHERE audit_id = ?1"))
        .map_err(|e| to_storage_err(e.to_string()))?;

    let mut rows = stmt
        .query(params![audit_id])
        .map_err(|e| to_storage_err(e.to_string()))?;
    match rows.next().map_err(|e| to_storage_err(e.to_string()))? {
        Some(row) => Ok(Some(row_to_audit(row)?)),
        None => Ok(None),
    }
}

/// All audit records, most recent first.
pub fn list_audits(conn: &Connection) -> DistillResult<Vec<AuditRecord>> {
    let mut stmt = conn
        .prepare(&format!("{SELECT_COLUMNS} ORDER BY started_at DESC"))
        .map_err(|e| to_storage_err(e.to_string()))?;

    let mut rows = stmt.query([]).map_err(|e| to_storage_err(e.to_string()))?;
    let mut results = Vec::new();
    while let Some(row) = rows.next().map_err(|e| to_storage_err(e.to_string()))? {
        results.push(row_to_audit(row)?);
    }
    Ok(results)
}

const SELECT_COLUMNS: &str = "SELECT audit_id, scope, status, started_at, finished_at,
        entities_processed, entities_merged, degraded, rollback_reason, rolled_back_at
 FROM audit_runs";

fn row_to_audit(row: &rusqlite::Row<'_>) -> DistillResult<AuditRecord> {
    let scope_json: String = row.get(1).map_err(|e| to_storage_err(e.to_string()))?;
    let status_str: String = row.get(2).map_err(|e| to_storage_err(e.to_string()))?;
    let started_at_str: String = row.get(3).map_err(|e| to_storage_err(e.to_string()))?;
    let finished_at_str: Option<String> = row.get(4).map_err(|e| to_storage_err(e.to_string()))?;
    let rolled_back_at_str: Option<String> =
        row.get(9).map_err(|e| to_storage_err(e.to_string()))?;

    let scope: Vec<EntityType> = serde_json::from_str(&scope_json)
        .map_err(|e| to_storage_err(format!("parse scope: {e}")))?;
    let status: RunStatus = status_str
        .parse()
        .map_err(|e: String| to_storage_err(format!("parse status: {e}")))?;

    Ok(AuditRecord {
        audit_id: row.get(0).map_err(|e| to_storage_err(e.to_string()))?,
        scope,
        status,
        started_at: parse_dt(&started_at_str)?,
        finished_at: finished_at_str.as_deref().map(parse_dt).transpose()?,
        entities_processed: row
            .get::<_, i64>(5)
            .map_err(|e| to_storage_err(e.to_string()))? as usize,
        entities_merged: row
            .get::<_, i64>(6)
            .map_err(|e| to_storage_err(e.to_string()))? as usize,
        degraded: row
            .get::<_, i32>(7)
            .map_err(|e| to_storage_err(e.to_string()))?
            != 0,
        rollback_reason: row.get(8).map_err(|e| to_storage_err(e.to_string()))?,
        rolled_back_at: rolled_back_at_str.as_deref().map(parse_dt).transpose()?,
    })
}

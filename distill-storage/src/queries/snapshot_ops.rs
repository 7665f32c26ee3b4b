//! Write-once snapshot operations. Snapshots are read only by rollback and
//! removed only by explicit retention cleanup.

use rusqlite::{params, Connection};

use distill_core::entity::RawEntity;
use distill_core::errors::DistillResult;
use distill_core::models::EntitySnapshot;

use super::raw_ops::parse_dt;
use crate::to_storage_err;

/// Insert one pre-merge snapshot. Callers scope the transaction.
pub fn insert_snapshot(conn: &Connection, snapshot: &EntitySnapshot) -> DistillResult<()> {
    let payload =
        serde_json::to_string(&snapshot.entity).map_err(|e| to_storage_err(e.to_string()))?;

    conn.execute(
        "INSERT INTO entity_snapshots (audit_id, entity_id, consolidated_id, payload, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5)",
        params![
            snapshot.audit_id,
            snapshot.entity.id,
            snapshot.consolidated_id,
            payload,
            snapshot.created_at.to_rfc3339(),
        ],
    )
    .map_err(|e| to_storage_err(e.to_string()))?;
    Ok(())
}

/// All snapshots for a run, in insertion order.
pub fn snapshots_for_run(conn: &Connection, audit_id: &str) -> DistillResult<Vec<EntitySnapshot>> {
    let mut stmt = conn
        .prepare(
            "SELECT audit_id, consolidated_id, payload, created_at
             FROM entity_snapshots WHERE audit_id = ?1 ORDER BY id",
        )
        .map_err(|e| to_storage_err(e.to_string()))?;

    let mut rows = stmt
        .query(params![audit_id])
        .map_err(|e| to_storage_err(e.to_string()))?;
    let mut results = Vec::new();
    while let Some(row) = rows.next().map_err(|e| to_storage_err(e.to_string()))? {
        let payload: String = row.get(2).map_err(|e| to_storage_err(e.to_string()))?;
        let created_at_str: String = row.get(3).map_err(|e| to_storage_err(e.to_string()))?;
        let entity: RawEntity = serde_json::from_str(&payload)
            .map_err(|e| to_storage_err(format!("parse snapshot payload: {e}")))?;
        results.push(EntitySnapshot {
            audit_id: row.get(0).map_err(|e| to_storage_err(e.to_string()))?,
            consolidated_id: row.get(1).map_err(|e| to_storage_err(e.to_string()))?,
            entity,
            created_at: parse_dt(&created_at_str)?,
        });
    }
    Ok(results)
}

/// Retention cleanup for a rolled-back or expired run's snapshots.
pub fn delete_for_run(conn: &Connection, audit_id: &str) -> DistillResult<usize> {
    conn.execute(
        "DELETE FROM entity_snapshots WHERE audit_id = ?1",
        params![audit_id],
    )
    .map_err(|e| to_storage_err(e.to_string()))
}

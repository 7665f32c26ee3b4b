//! StorageEngine — owns the ConnectionPool, implements EntityStore, and is
//! the only place transaction boundaries are drawn.

use std::path::Path;

use chrono::Utc;
use rusqlite::Connection;

use distill_core::entity::{ConsolidatedEntity, EntityType, RawEntity};
use distill_core::errors::{DistillError, DistillResult, RollbackError, StorageError};
use distill_core::models::{
    AuditRecord, EntitySnapshot, Pattern, Relationship, RollbackOutcome, RunStatus,
};
use distill_core::traits::EntityStore;

use crate::migrations;
use crate::pool::ConnectionPool;
use crate::queries::{
    audit_ops, consolidated_ops, pattern_ops, raw_ops, relationship_ops, snapshot_ops,
};
use crate::to_storage_err;

/// The persistent store. A single writer serializes every mutation; reads go
/// through the read pool when the store is file-backed.
pub struct StorageEngine {
    pool: ConnectionPool,
}

impl StorageEngine {
    /// Open a storage engine backed by a file on disk.
    pub fn open(path: &Path) -> DistillResult<Self> {
        let pool = ConnectionPool::open(path, 4)?;
        let engine = Self { pool };
        engine.initialize()?;
        Ok(engine)
    }

    /// Open an in-memory storage engine (for testing).
    pub fn open_in_memory() -> DistillResult<Self> {
        let pool = ConnectionPool::open_in_memory()?;
        let engine = Self { pool };
        engine.initialize()?;
        Ok(engine)
    }

    fn initialize(&self) -> DistillResult<()> {
        self.pool
            .writer
            .with_conn(|conn| migrations::run_migrations(conn))
    }

    /// Get a reference to the connection pool (for advanced operations).
    pub fn pool(&self) -> &ConnectionPool {
        &self.pool
    }

    /// Execute a read-only query on the best available connection.
    fn with_reader<F, T>(&self, f: F) -> DistillResult<T>
    where
        F: FnOnce(&Connection) -> DistillResult<T>,
    {
        match &self.pool.readers {
            Some(readers) => readers.with_conn(f),
            None => self.pool.writer.with_conn(f),
        }
    }

    /// Run `body` inside one write transaction. A failure rolls everything
    /// back and surfaces as a TransactionFailed error.
    fn in_transaction<F, T>(&self, operation: &str, body: F) -> DistillResult<T>
    where
        F: FnOnce(&Connection) -> DistillResult<T>,
    {
        self.pool.writer.with_conn(|conn| {
            conn.execute_batch("BEGIN IMMEDIATE")
                .map_err(|e| to_storage_err(format!("{operation} begin: {e}")))?;

            match body(conn) {
                Ok(value) => {
                    conn.execute_batch("COMMIT").map_err(|e| {
                        DistillError::Storage(StorageError::TransactionFailed {
                            operation: operation.to_string(),
                            reason: format!("commit: {e}"),
                        })
                    })?;
                    Ok(value)
                }
                Err(e) => {
                    let _ = conn.execute_batch("ROLLBACK");
                    Err(DistillError::Storage(StorageError::TransactionFailed {
                        operation: operation.to_string(),
                        reason: e.to_string(),
                    }))
                }
            }
        })
    }
}

impl EntityStore for StorageEngine {
    fn insert_raw_entities(&self, entities: &[RawEntity]) -> DistillResult<usize> {
        if entities.is_empty() {
            return Ok(0);
        }
        self.in_transaction("insert_raw_entities", |conn| {
            for entity in entities {
                raw_ops::insert_raw(conn, entity)?;
            }
            Ok(entities.len())
        })
    }

    fn get_raw(&self, id: &str) -> DistillResult<Option<RawEntity>> {
        self.with_reader(|conn| raw_ops::get_raw(conn, id))
    }

    fn load_unconsolidated(&self, entity_type: EntityType) -> DistillResult<Vec<RawEntity>> {
        self.with_reader(|conn| raw_ops::load_unconsolidated(conn, entity_type))
    }

    fn commit_merge(
        &self,
        audit_id: &str,
        members: &[RawEntity],
        consolidated: &ConsolidatedEntity,
    ) -> DistillResult<()> {
        // Snapshot-then-write: every member snapshot, the consolidated row,
        // and the absorbed markers commit together or not at all.
        self.in_transaction("commit_merge", |conn| {
            let now = Utc::now();
            for member in members {
                snapshot_ops::insert_snapshot(
                    conn,
                    &EntitySnapshot {
                        audit_id: audit_id.to_string(),
                        consolidated_id: consolidated.id.clone(),
                        entity: member.clone(),
                        created_at: now,
                    },
                )?;
            }
            consolidated_ops::insert_consolidated(conn, consolidated)?;
            let member_ids: Vec<String> = members.iter().map(|m| m.id.clone()).collect();
            raw_ops::mark_consolidated(conn, &member_ids, &consolidated.id)?;
            Ok(())
        })
    }

    fn get_consolidated(&self, id: &str) -> DistillResult<Option<ConsolidatedEntity>> {
        self.with_reader(|conn| consolidated_ops::get_consolidated(conn, id))
    }

    fn all_consolidated(&self) -> DistillResult<Vec<ConsolidatedEntity>> {
        self.with_reader(consolidated_ops::all_consolidated)
    }

    fn consolidated_for_run(&self, audit_id: &str) -> DistillResult<Vec<ConsolidatedEntity>> {
        self.with_reader(|conn| consolidated_ops::consolidated_for_run(conn, audit_id))
    }

    fn replace_relationships(
        &self,
        audit_id: &str,
        edges: &[Relationship],
    ) -> DistillResult<usize> {
        self.in_transaction("replace_relationships", |conn| {
            relationship_ops::delete_for_run(conn, audit_id)?;
            for edge in edges {
                relationship_ops::insert_relationship(conn, edge)?;
            }
            Ok(edges.len())
        })
    }

    fn relationships_for_run(&self, audit_id: &str) -> DistillResult<Vec<Relationship>> {
        self.with_reader(|conn| relationship_ops::relationships_for_run(conn, audit_id))
    }

    fn all_relationships(&self) -> DistillResult<Vec<Relationship>> {
        self.with_reader(relationship_ops::all_relationships)
    }

    fn replace_patterns(&self, audit_id: &str, patterns: &[Pattern]) -> DistillResult<usize> {
        self.in_transaction("replace_patterns", |conn| {
            pattern_ops::delete_for_run(conn, audit_id)?;
            for pattern in patterns {
                pattern_ops::insert_pattern(conn, pattern)?;
            }
            Ok(patterns.len())
        })
    }

    fn patterns_for_run(&self, audit_id: &str) -> DistillResult<Vec<Pattern>> {
        self.with_reader(|conn| pattern_ops::patterns_for_run(conn, audit_id))
    }

    fn snapshots_for_run(&self, audit_id: &str) -> DistillResult<Vec<EntitySnapshot>> {
        self.with_reader(|conn| snapshot_ops::snapshots_for_run(conn, audit_id))
    }

    fn insert_audit(&self, record: &AuditRecord) -> DistillResult<()> {
        self.pool
            .writer
            .with_conn(|conn| audit_ops::insert_audit(conn, record))
    }

    fn update_audit(&self, record: &AuditRecord) -> DistillResult<()> {
        self.pool
            .writer
            .with_conn(|conn| audit_ops::update_audit(conn, record))
    }

    fn get_audit(&self, audit_id: &str) -> DistillResult<Option<AuditRecord>> {
        self.with_reader(|conn| audit_ops::get_audit(conn, audit_id))
    }

    fn list_audits(&self) -> DistillResult<Vec<AuditRecord>> {
        self.with_reader(audit_ops::list_audits)
    }

    fn rollback_run(&self, audit_id: &str, reason: &str) -> DistillResult<RollbackOutcome> {
        // Precondition guards run against current state before the
        // transaction opens. Re-invoking on a rolled-back run is an explicit
        // error, never a silent no-op.
        let record = self
            .get_audit(audit_id)?
            .ok_or_else(|| RollbackError::UnknownAudit {
                audit_id: audit_id.to_string(),
            })?;
        match record.status {
            RunStatus::RolledBack => {
                return Err(RollbackError::AlreadyRolledBack {
                    audit_id: audit_id.to_string(),
                }
                .into())
            }
            RunStatus::Active => {
                return Err(RollbackError::RunStillActive {
                    audit_id: audit_id.to_string(),
                }
                .into())
            }
            _ => {}
        }

        let mut updated = record;
        self.in_transaction("rollback_run", |conn| {
            let snapshots = snapshot_ops::snapshots_for_run(conn, audit_id)?;
            for snapshot in &snapshots {
                raw_ops::restore_raw(conn, &snapshot.entity)?;
            }
            let removed_consolidated = consolidated_ops::delete_for_run(conn, audit_id)?;
            let removed_relationships = relationship_ops::delete_for_run(conn, audit_id)?;
            let removed_patterns = pattern_ops::delete_for_run(conn, audit_id)?;

            updated.status = RunStatus::RolledBack;
            updated.rollback_reason = Some(reason.to_string());
            updated.rolled_back_at = Some(Utc::now());
            audit_ops::update_audit(conn, &updated)?;

            tracing::info!(
                audit_id,
                restored = snapshots.len(),
                removed_consolidated,
                "run rolled back"
            );

            Ok(RollbackOutcome {
                audit_id: audit_id.to_string(),
                restored_entities: snapshots.len(),
                removed_consolidated,
                removed_relationships,
                removed_patterns,
            })
        })
    }
}

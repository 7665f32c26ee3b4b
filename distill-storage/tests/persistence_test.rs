//! Integration test: file-backed persistence, migrations, WAL mode.

use chrono::Utc;
use distill_core::entity::attributes::SystemAttributes;
use distill_core::entity::{EntityType, RawEntity, TypedAttributes};
use distill_core::traits::EntityStore;
use distill_storage::pool::pragmas::verify_wal_mode;
use distill_storage::{migrations, StorageEngine};

fn make_system(id: &str) -> RawEntity {
    RawEntity {
        id: id.to_string(),
        entity_type: EntityType::System,
        org_id: "org-a".to_string(),
        source_interview_id: "i1".to_string(),
        name: "SAP".to_string(),
        description: "erp platform".to_string(),
        attributes: TypedAttributes::System(SystemAttributes::default()),
        extracted_at: Utc::now(),
    }
}

#[test]
fn data_survives_reopen() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("distill.db");

    {
        let engine = StorageEngine::open(&path).unwrap();
        engine.insert_raw_entities(&[make_system("sys-1")]).unwrap();
    }

    let engine = StorageEngine::open(&path).unwrap();
    let loaded = engine.get_raw("sys-1").unwrap().unwrap();
    assert_eq!(loaded.name, "SAP");
}

#[test]
fn migrations_are_idempotent() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("distill.db");

    let engine = StorageEngine::open(&path).unwrap();
    engine
        .pool()
        .writer
        .with_conn(|conn| {
            // A second pass must be a no-op at the current version.
            migrations::run_migrations(conn)?;
            assert_eq!(
                migrations::current_version(conn)?,
                migrations::CURRENT_VERSION
            );
            Ok(())
        })
        .unwrap();
}

#[test]
fn file_backed_store_runs_in_wal_mode() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("distill.db");

    let engine = StorageEngine::open(&path).unwrap();
    engine
        .pool()
        .writer
        .with_conn(|conn| {
            assert!(verify_wal_mode(conn)?);
            Ok(())
        })
        .unwrap();
}

#[test]
fn duplicate_raw_inserts_are_ignored() {
    let engine = StorageEngine::open_in_memory().unwrap();
    engine.insert_raw_entities(&[make_system("sys-1")]).unwrap();
    engine.insert_raw_entities(&[make_system("sys-1")]).unwrap();
    let all = engine.load_unconsolidated(EntityType::System).unwrap();
    assert_eq!(all.len(), 1);
}

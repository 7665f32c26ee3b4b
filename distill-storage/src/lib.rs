//! # distill-storage
//!
//! SQLite persistence for the consolidation engine. Single write connection
//! plus a round-robin read pool (WAL), versioned migrations, and the
//! transactional merge/rollback primitives behind `EntityStore`.

pub mod engine;
pub mod migrations;
pub mod pool;
pub mod queries;

pub use engine::StorageEngine;

use distill_core::errors::{DistillError, StorageError};

/// Map an error message into the storage error variant.
pub(crate) fn to_storage_err(message: impl Into<String>) -> DistillError {
    DistillError::Storage(StorageError::Sqlite {
        message: message.into(),
    })
}

pub mod rollback;
pub mod run;
pub mod runs;
pub mod validate;

use std::path::Path;
use std::sync::Arc;

use distill_core::errors::DistillResult;
use distill_core::traits::EntityStore;
use distill_storage::StorageEngine;

/// Open the store behind the trait the engine components expect.
pub(crate) fn open_store(db: &Path) -> DistillResult<Arc<dyn EntityStore>> {
    Ok(Arc::new(StorageEngine::open(db)?))
}

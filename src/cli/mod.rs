pub mod commands;

use std::sync::Arc;

use crate::storage::{Database, ProjectStore, default_db_path};
use crate::types::Result;

/// Open the durable store at its default location.
pub fn open_store() -> Result<Arc<ProjectStore>> {
    let db = Arc::new(Database::open(default_db_path())?);
    Ok(Arc::new(ProjectStore::new(db)))
}

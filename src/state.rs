use std::sync::Arc;

use crate::db::DbLayer;
use crate::storage::StorageService;

/// Shared per-process state. Read-only after startup apart from the store
/// itself, so handlers never coordinate with each other.
#[derive(Clone)]
pub struct AppState {
    pub db: Arc<DbLayer>,
    pub storage: StorageService,
    pub jwt_secret: String,
}

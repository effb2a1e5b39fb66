use std::sync::Arc;

use crate::database::{PgStore, Store};

/// Shared handler state
pub struct AppState {
    pub store: Arc<dyn Store>,
}

impl AppState {
    pub fn new(store: Arc<dyn Store>) -> Arc<Self> {
        Arc::new(Self { store })
    }

    /// State backed by the PostgreSQL pool, connected lazily on first query
    pub fn postgres() -> Arc<Self> {
        Self::new(Arc::new(PgStore::new()))
    }
}

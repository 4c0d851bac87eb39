use std::sync::Arc;

use sqlx::SqlitePool;

use warden::prelude::SqlxPolicyStore;

#[derive(Clone)]
pub struct AppState {
    pub pool: SqlitePool,
    pub store: Arc<SqlxPolicyStore>,
}

impl AppState {
    pub fn new(pool: SqlitePool) -> Self {
        let store = Arc::new(SqlxPolicyStore::new(pool.clone()));
        Self { pool, store }
    }
}

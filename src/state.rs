use std::sync::Arc;

use sqlx::PgPool;

use crate::config::Config;
use crate::ledger::InventoryLedger;

/// Shared handles for request handlers. The ledger is injected as a trait
/// object so the seat-accounting core carries no knowledge of the wiring.
#[derive(Clone)]
pub struct AppState {
    pub pool: PgPool,
    pub ledger: Arc<dyn InventoryLedger>,
    pub config: Arc<Config>,
}

impl AppState {
    pub fn new(pool: PgPool, ledger: Arc<dyn InventoryLedger>, config: Config) -> Self {
        Self {
            pool,
            ledger,
            config: Arc::new(config),
        }
    }
}

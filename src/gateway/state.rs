use std::sync::Arc;

use crate::db::Database;
use crate::transfer::TransferCoordinator;
use crate::user_auth::TokenVerifier;

/// Gateway shared state
#[derive(Clone)]
pub struct AppState {
    pub coordinator: Arc<TransferCoordinator>,
    pub token_verifier: Arc<TokenVerifier>,
    /// PostgreSQL, when configured (health checks only)
    pub pg_db: Option<Arc<Database>>,
}

impl AppState {
    pub fn new(
        coordinator: Arc<TransferCoordinator>,
        token_verifier: Arc<TokenVerifier>,
        pg_db: Option<Arc<Database>>,
    ) -> Self {
        Self {
            coordinator,
            token_verifier,
            pg_db,
        }
    }
}

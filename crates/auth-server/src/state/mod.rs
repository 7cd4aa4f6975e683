//! Application state
//!
//! Shared by the health handlers and the bus responder.

use std::sync::Arc;

use auth_bus::RedisPool;
use auth_db::PgPool;
use auth_service::CredentialService;

/// Application state shared across all handlers
#[derive(Clone)]
pub struct AppState {
    service: Arc<CredentialService>,
    db_pool: PgPool,
    bus_pool: RedisPool,
}

impl AppState {
    /// Create a new AppState
    pub fn new(
        service: CredentialService,
        db_pool: PgPool,
        bus_pool: RedisPool,
    ) -> Self {
        Self {
            service: Arc::new(service),
            db_pool,
            bus_pool,
        }
    }

    /// Get the credential service
    pub fn service(&self) -> &Arc<CredentialService> {
        &self.service
    }

    /// Get the PostgreSQL connection pool
    pub fn db_pool(&self) -> &PgPool {
        &self.db_pool
    }

    /// Get the bus connection pool
    pub fn bus_pool(&self) -> &RedisPool {
        &self.bus_pool
    }
}

impl std::fmt::Debug for AppState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppState")
            .field("service", &"CredentialService")
            .field("bus_pool", &self.bus_pool)
            .finish_non_exhaustive()
    }
}

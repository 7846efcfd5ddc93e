//! HTTP server configuration object and helpers.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use linkup_backend::domain::ports::{AccessTokenVerifier, FixturePlaceResolver, PlaceResolver};
use linkup_backend::domain::{DEFAULT_PLACE_TIMEOUT, DEFAULT_STORE_TIMEOUT};
use linkup_backend::outbound::persistence::DbPool;

/// Builder-style configuration for creating the HTTP server.
pub struct ServerConfig {
    pub(crate) bind_addr: SocketAddr,
    pub(crate) token_verifier: Arc<dyn AccessTokenVerifier>,
    pub(crate) db_pool: Option<DbPool>,
    pub(crate) place_resolver: Arc<dyn PlaceResolver>,
    pub(crate) store_timeout: Duration,
    pub(crate) place_timeout: Duration,
}

impl ServerConfig {
    /// Start from a bind address and the bearer token verifier. Everything
    /// else defaults to the in-memory store and a resolver that always
    /// answers `manual`.
    #[must_use]
    pub fn new(bind_addr: SocketAddr, token_verifier: Arc<dyn AccessTokenVerifier>) -> Self {
        Self {
            bind_addr,
            token_verifier,
            db_pool: None,
            place_resolver: Arc::new(FixturePlaceResolver),
            store_timeout: DEFAULT_STORE_TIMEOUT,
            place_timeout: DEFAULT_PLACE_TIMEOUT,
        }
    }

    /// Attach a database connection pool for the PostGIS store.
    #[must_use]
    pub fn with_db_pool(mut self, pool: DbPool) -> Self {
        self.db_pool = Some(pool);
        self
    }

    #[must_use]
    pub fn with_place_resolver(mut self, resolver: Arc<dyn PlaceResolver>) -> Self {
        self.place_resolver = resolver;
        self
    }

    /// Override the per-request store budget and the place lookup budget.
    #[must_use]
    pub fn with_timeouts(mut self, store: Duration, place: Duration) -> Self {
        self.store_timeout = store;
        self.place_timeout = place;
        self
    }

    /// Return the socket address the server will bind to.
    #[must_use]
    pub fn bind_addr(&self) -> SocketAddr {
        self.bind_addr
    }

    /// True when the PostGIS store will be used.
    #[must_use]
    pub fn uses_database(&self) -> bool {
        self.db_pool.is_some()
    }
}

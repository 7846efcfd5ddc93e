//! Shared HTTP adapter state.
//!
//! Handlers accept this state via `actix_web::web::Data` so they only depend
//! on domain ports and remain testable without I/O.

use std::sync::Arc;

use crate::domain::ports::{AccessTokenVerifier, LinkupCommand, LinkupQuery, UserLocationCommand};

/// Dependency bundle for HTTP handlers.
#[derive(Clone)]
pub struct HttpState {
    pub linkups: Arc<dyn LinkupCommand>,
    pub linkup_queries: Arc<dyn LinkupQuery>,
    pub locations: Arc<dyn UserLocationCommand>,
    pub tokens: Arc<dyn AccessTokenVerifier>,
}

impl HttpState {
    pub fn new(
        linkups: Arc<dyn LinkupCommand>,
        linkup_queries: Arc<dyn LinkupQuery>,
        locations: Arc<dyn UserLocationCommand>,
        tokens: Arc<dyn AccessTokenVerifier>,
    ) -> Self {
        Self {
            linkups,
            linkup_queries,
            locations,
            tokens,
        }
    }
}

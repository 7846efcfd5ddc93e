//! Test helpers for inbound HTTP components.

use std::sync::Arc;

use crate::domain::UserId;
use crate::domain::ports::{
    AccessTokenError, AccessTokenVerifier, MockLinkupCommand, MockLinkupQuery,
    MockUserLocationCommand,
};

use super::state::HttpState;

/// Accepts any token that is itself a user UUID.
pub struct UuidTokenVerifier;

impl AccessTokenVerifier for UuidTokenVerifier {
    fn verify(&self, token: &str) -> Result<UserId, AccessTokenError> {
        UserId::parse(token).map_err(|err| AccessTokenError::invalid(err.to_string()))
    }
}

/// `Authorization` header value accepted by [`UuidTokenVerifier`].
pub fn bearer(user: UserId) -> String {
    format!("Bearer {user}")
}

/// Mocks for every driving port, configured by the caller before use.
#[derive(Default)]
pub struct PortMocks {
    pub linkups: MockLinkupCommand,
    pub linkup_queries: MockLinkupQuery,
    pub locations: MockUserLocationCommand,
}

/// Build state from mocks after letting `configure` set expectations.
pub fn state_with(configure: impl FnOnce(&mut PortMocks)) -> HttpState {
    let mut mocks = PortMocks::default();
    configure(&mut mocks);
    HttpState::new(
        Arc::new(mocks.linkups),
        Arc::new(mocks.linkup_queries),
        Arc::new(mocks.locations),
        Arc::new(UuidTokenVerifier),
    )
}

//! Port for turning a free-text place description into a canonical place id.
//!
//! Resolution is best effort. Implementations swallow their own failures and
//! answer [`PlaceRef::Manual`] instead of raising.

use async_trait::async_trait;

use crate::domain::{Coordinate, PlaceRef};

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait PlaceResolver: Send + Sync {
    /// Resolve `text` near `near`.
    async fn resolve(&self, text: &str, near: &Coordinate) -> PlaceRef;
}

/// Resolver that never resolves. Used when no places backend is configured.
#[derive(Debug, Default, Clone, Copy)]
pub struct FixturePlaceResolver;

#[async_trait]
impl PlaceResolver for FixturePlaceResolver {
    async fn resolve(&self, _text: &str, _near: &Coordinate) -> PlaceRef {
        PlaceRef::Manual
    }
}

//! Driving port for the two linkup read views.

use async_trait::async_trait;

use crate::domain::{Coordinate, Error, NearbyLinkup, UserId, UserLinkup};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ListNearbyRequest {
    pub user: UserId,
    pub origin: Coordinate,
    /// Raw `max_radius`; absent or non-positive values use the listing default.
    pub max_radius: Option<f64>,
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait LinkupQuery: Send + Sync {
    /// Linkups the caller is invited to, nearest first.
    async fn list_nearby(&self, request: ListNearbyRequest) -> Result<Vec<NearbyLinkup>, Error>;

    /// Linkups the caller initiated or joined, newest first.
    async fn list_mine(&self, user: UserId) -> Result<Vec<UserLinkup>, Error>;
}

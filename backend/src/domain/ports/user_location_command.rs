//! Driving port for reporting the caller's current location.

use async_trait::async_trait;

use crate::domain::{Coordinate, Error, UserId};

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait UserLocationCommand: Send + Sync {
    async fn report(&self, user: UserId, location: Coordinate) -> Result<(), Error>;
}

//! Port for recording users' last known location fixes.

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::domain::{Coordinate, UserId};

use super::define_port_error;

define_port_error! {
    /// Errors raised by location store adapters.
    pub enum UserLocationRepositoryError {
        Connection { message: String } =>
            "location store connection failed: {message}",
        Query { message: String } =>
            "location store query failed: {message}",
        Timeout { operation: String } =>
            "location store timed out during {operation}",
    }
}

/// Writes the location fixes the candidate selector reads.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait UserLocationRepository: Send + Sync {
    /// Upsert the user's fix and mark them active as of `at`.
    async fn record_fix(
        &self,
        user: &UserId,
        location: &Coordinate,
        at: DateTime<Utc>,
    ) -> Result<(), UserLocationRepositoryError>;
}

//! Driving port for linkup mutations: create, join, and cancel.

use async_trait::async_trait;

use crate::domain::{Coordinate, Error, FanoutReport, LinkupId, UserId};

/// Create request after transport-level parsing.
///
/// `search_radius` is the raw requested value; the coordinator clamps it.
#[derive(Debug, Clone, PartialEq)]
pub struct CreateLinkupRequest {
    pub initiator: UserId,
    pub origin: Coordinate,
    pub search_radius: Option<f64>,
    pub vibe: String,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CreateLinkupResponse {
    pub linkup_id: LinkupId,
    /// Coverage of the best-effort invitation fan-out.
    pub fan_out: FanoutReport,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct JoinLinkupRequest {
    pub linkup_id: LinkupId,
    pub joiner: UserId,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CancelLinkupRequest {
    pub linkup_id: LinkupId,
    pub caller: UserId,
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait LinkupCommand: Send + Sync {
    /// Persist a linkup and fan invitations out to nearby users.
    ///
    /// Succeeds once the linkup row is written, whatever the fan-out coverage.
    async fn create(&self, request: CreateLinkupRequest) -> Result<CreateLinkupResponse, Error>;

    /// Claim the second-participant slot. At most one caller ever succeeds.
    async fn join(&self, request: JoinLinkupRequest) -> Result<LinkupId, Error>;

    /// Delete a searching linkup owned by the caller.
    async fn cancel(&self, request: CancelLinkupRequest) -> Result<(), Error>;
}

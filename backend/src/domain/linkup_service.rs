//! Matching coordinator.
//!
//! Owns the linkup lifecycle: creation with best-effort fan-out, the
//! compare-and-swap join, initiator-only cancellation, and the two read
//! views. No coordination state lives in process; every decision that must
//! hold across requests is delegated to a conditional write in the store.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use mockable::Clock;
use serde_json::json;
use tracing::{debug, warn};

use crate::domain::ports::{
    CancelLinkupRequest, CancelOutcome, ClaimOutcome, CreateLinkupRequest, CreateLinkupResponse,
    JoinLinkupRequest, LinkupCommand, LinkupQuery, LinkupRepository, LinkupRepositoryError,
    ListNearbyRequest, PlaceResolver,
};
use crate::domain::{
    CandidateSelector, Deadline, Error, FanoutReport, InviteFanout, Linkup, LinkupId,
    LinkupStatus, NearbyLinkup, PlaceRef, SearchRadius, UserId, UserLinkup,
};

/// Store budget for one request when none is configured.
pub const DEFAULT_STORE_TIMEOUT: Duration = Duration::from_secs(30);
/// Place lookup budget when none is configured.
pub const DEFAULT_PLACE_TIMEOUT: Duration = Duration::from_secs(2);

/// Query sent to the place resolver when the initiator wrote no message.
const CURRENT_LOCATION_QUERY: &str = "Current Location";

const UNAVAILABLE: &str = "linkup is no longer available";

fn map_repository_error(error: LinkupRepositoryError) -> Error {
    match error {
        LinkupRepositoryError::Timeout { operation } => {
            Error::internal(format!("linkup store timed out during {operation}"))
        }
        other => Error::internal(format!("linkup store error: {other}")),
    }
}

fn field_error(field: &str, code: &str, message: impl Into<String>) -> Error {
    Error::invalid_request(message).with_details(json!({ "field": field, "code": code }))
}

fn validate_text(request: &CreateLinkupRequest) -> Result<(String, String), Error> {
    let vibe = request.vibe.trim();
    if vibe.is_empty() {
        return Err(field_error("vibe", "missing", "vibe is required"));
    }
    Ok((vibe.to_owned(), request.message.trim().to_owned()))
}

/// Command side of the matching coordinator.
pub struct LinkupCommandService<R> {
    repo: Arc<R>,
    selector: CandidateSelector<R>,
    fanout: InviteFanout<R>,
    places: Arc<dyn PlaceResolver>,
    clock: Arc<dyn Clock>,
    store_timeout: Duration,
    place_timeout: Duration,
}

impl<R> Clone for LinkupCommandService<R> {
    fn clone(&self) -> Self {
        Self {
            repo: Arc::clone(&self.repo),
            selector: self.selector.clone(),
            fanout: self.fanout.clone(),
            places: Arc::clone(&self.places),
            clock: Arc::clone(&self.clock),
            store_timeout: self.store_timeout,
            place_timeout: self.place_timeout,
        }
    }
}

impl<R: LinkupRepository> LinkupCommandService<R> {
    pub fn new(repo: Arc<R>, places: Arc<dyn PlaceResolver>, clock: Arc<dyn Clock>) -> Self {
        Self {
            selector: CandidateSelector::new(Arc::clone(&repo)),
            fanout: InviteFanout::new(Arc::clone(&repo)),
            repo,
            places,
            clock,
            store_timeout: DEFAULT_STORE_TIMEOUT,
            place_timeout: DEFAULT_PLACE_TIMEOUT,
        }
    }

    /// Override the per-request store budget and the place lookup budget.
    #[must_use]
    pub fn with_timeouts(mut self, store: Duration, place: Duration) -> Self {
        self.store_timeout = store;
        self.place_timeout = place;
        self
    }

    async fn resolve_place(
        &self,
        message: &str,
        request: &CreateLinkupRequest,
        deadline: Deadline,
    ) -> PlaceRef {
        let text = if message.is_empty() {
            CURRENT_LOCATION_QUERY
        } else {
            message
        };
        let budget = self.place_timeout.min(deadline.remaining());
        match tokio::time::timeout(budget, self.places.resolve(text, &request.origin)).await {
            Ok(place) => place,
            Err(_) => {
                warn!(budget_ms = budget.as_millis(), "place resolution timed out");
                PlaceRef::Manual
            }
        }
    }

    async fn invite_nearby(&self, linkup: &Linkup, deadline: Deadline) -> FanoutReport {
        let candidates = match self
            .selector
            .select(&linkup.origin, linkup.search_radius, &linkup.initiator, deadline)
            .await
        {
            Ok(candidates) => candidates,
            Err(err) => {
                warn!(linkup_id = %linkup.id, error = %err, "candidate selection failed");
                return FanoutReport::empty();
            }
        };
        self.fanout
            .fan_out(linkup.id, linkup.initiator, &candidates, deadline)
            .await
    }
}

#[async_trait]
impl<R> LinkupCommand for LinkupCommandService<R>
where
    R: LinkupRepository,
{
    async fn create(&self, request: CreateLinkupRequest) -> Result<CreateLinkupResponse, Error> {
        let (vibe, message) = validate_text(&request)?;
        let deadline = Deadline::after(self.store_timeout);
        let place_ref = self.resolve_place(&message, &request, deadline).await;

        let linkup = Linkup {
            id: LinkupId::random(),
            initiator: request.initiator,
            second_participant: None,
            origin: request.origin,
            search_radius: SearchRadius::from_requested(request.search_radius),
            vibe,
            message,
            place_ref,
            created_at: self.clock.utc(),
        };
        deadline
            .bound("linkup insert", self.repo.insert_linkup(&linkup))
            .await
            .map_err(map_repository_error)?;

        let fan_out = self.invite_nearby(&linkup, deadline).await;
        Ok(CreateLinkupResponse {
            linkup_id: linkup.id,
            fan_out,
        })
    }

    async fn join(&self, request: JoinLinkupRequest) -> Result<LinkupId, Error> {
        let JoinLinkupRequest { linkup_id, joiner } = request;
        let deadline = Deadline::after(self.store_timeout);
        let linkup = deadline
            .bound("linkup lookup", self.repo.find_linkup(&linkup_id))
            .await
            .map_err(map_repository_error)?
            .ok_or_else(|| Error::not_found(format!("linkup {linkup_id} not found")))?;

        if linkup.initiator == joiner {
            return Err(Error::invalid_request("cannot join your own linkup"));
        }
        if linkup.status() == LinkupStatus::Confirmed {
            return Err(Error::conflict(UNAVAILABLE));
        }

        let outcome = deadline
            .bound(
                "join",
                self.repo.claim_second_participant(&linkup_id, &joiner),
            )
            .await
            .map_err(map_repository_error)?;
        match outcome {
            ClaimOutcome::Claimed => Ok(linkup_id),
            ClaimOutcome::Lost => {
                debug!(linkup_id = %linkup_id, joiner = %joiner, "join race lost");
                Err(Error::conflict(UNAVAILABLE))
            }
        }
    }

    async fn cancel(&self, request: CancelLinkupRequest) -> Result<(), Error> {
        let CancelLinkupRequest { linkup_id, caller } = request;
        let deadline = Deadline::after(self.store_timeout);
        let linkup = deadline
            .bound("linkup lookup", self.repo.find_linkup(&linkup_id))
            .await
            .map_err(map_repository_error)?
            .ok_or_else(|| Error::not_found(format!("linkup {linkup_id} not found")))?;

        if linkup.initiator != caller {
            return Err(Error::forbidden("only the initiator can cancel a linkup"));
        }
        if linkup.status() == LinkupStatus::Confirmed {
            return Err(Error::invalid_request("cannot cancel a confirmed linkup"));
        }

        let outcome = deadline
            .bound(
                "cancel",
                self.repo.delete_searching_linkup(&linkup_id, &caller),
            )
            .await
            .map_err(map_repository_error)?;
        match outcome {
            CancelOutcome::Deleted => Ok(()),
            CancelOutcome::Missing => Err(Error::not_found(format!("linkup {linkup_id} not found"))),
            CancelOutcome::NotInitiator => {
                Err(Error::forbidden("only the initiator can cancel a linkup"))
            }
            CancelOutcome::Confirmed => {
                Err(Error::invalid_request("cannot cancel a confirmed linkup"))
            }
        }
    }
}

/// Read side of the matching coordinator.
pub struct LinkupQueryService<R> {
    repo: Arc<R>,
    store_timeout: Duration,
}

impl<R> Clone for LinkupQueryService<R> {
    fn clone(&self) -> Self {
        Self {
            repo: Arc::clone(&self.repo),
            store_timeout: self.store_timeout,
        }
    }
}

impl<R> LinkupQueryService<R> {
    pub fn new(repo: Arc<R>) -> Self {
        Self {
            repo,
            store_timeout: DEFAULT_STORE_TIMEOUT,
        }
    }

    #[must_use]
    pub fn with_store_timeout(mut self, timeout: Duration) -> Self {
        self.store_timeout = timeout;
        self
    }
}

#[async_trait]
impl<R> LinkupQuery for LinkupQueryService<R>
where
    R: LinkupRepository,
{
    async fn list_nearby(&self, request: ListNearbyRequest) -> Result<Vec<NearbyLinkup>, Error> {
        let radius = SearchRadius::for_nearby(request.max_radius);
        let deadline = Deadline::after(self.store_timeout);
        let mut rows = deadline
            .bound(
                "nearby listing",
                self.repo
                    .list_invited_nearby(&request.user, &request.origin, radius),
            )
            .await
            .map_err(map_repository_error)?;
        rows.sort_by(|a, b| a.distance_meters.total_cmp(&b.distance_meters));
        Ok(rows)
    }

    async fn list_mine(&self, user: UserId) -> Result<Vec<UserLinkup>, Error> {
        let deadline = Deadline::after(self.store_timeout);
        let linkups = deadline
            .bound("participant listing", self.repo.list_for_participant(&user))
            .await
            .map_err(map_repository_error)?;
        let mut mine: Vec<UserLinkup> = linkups
            .iter()
            .filter_map(|linkup| UserLinkup::project(linkup, user))
            .collect();
        mine.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(mine)
    }
}

#[cfg(test)]
#[path = "linkup_service_tests.rs"]
mod tests;

//! Port for the spatial store holding linkups and their invitations.
//!
//! Adapters must execute [`LinkupRepository::claim_second_participant`] and
//! [`LinkupRepository::delete_searching_linkup`] as single atomic units:
//! either every write inside them is observable or none is.

use async_trait::async_trait;

use crate::domain::{
    Candidate, Coordinate, Invitation, Linkup, LinkupId, NearbyLinkup, SearchRadius, UserId,
};

use super::define_port_error;

define_port_error! {
    /// Errors raised by spatial store adapters.
    pub enum LinkupRepositoryError {
        /// The store could not be reached or a connection could not be checked out.
        Connection { message: String } =>
            "linkup store connection failed: {message}",
        /// A query or mutation failed while executing.
        Query { message: String } =>
            "linkup store query failed: {message}",
        /// The request-scoped deadline elapsed before the store answered.
        Timeout { operation: String } =>
            "linkup store timed out during {operation}",
    }
}

/// Result of an idempotent invitation insert.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InvitationInsert {
    Inserted,
    AlreadyPresent,
}

/// Result of the compare-and-swap join.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClaimOutcome {
    /// The slot was empty and now holds the joiner. Loser invitations were
    /// revoked and the winner's invitation, if any, is `going`.
    Claimed,
    /// Zero rows matched: the slot was already taken or the linkup is gone.
    Lost,
}

/// Result of a guarded cancellation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CancelOutcome {
    Deleted,
    Missing,
    NotInitiator,
    Confirmed,
}

/// Spatial store operations used by the matching coordinator.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait LinkupRepository: Send + Sync {
    /// Persist a new linkup in the searching state.
    async fn insert_linkup(&self, linkup: &Linkup) -> Result<(), LinkupRepositoryError>;

    async fn find_linkup(&self, id: &LinkupId) -> Result<Option<Linkup>, LinkupRepositoryError>;

    /// Active users with a location fix within `radius` of `origin`, nearest
    /// first, excluding `exclude`, at most `limit` rows.
    async fn nearby_users(
        &self,
        origin: &Coordinate,
        radius: SearchRadius,
        exclude: &UserId,
        limit: usize,
    ) -> Result<Vec<Candidate>, LinkupRepositoryError>;

    /// Insert an `invited` row; an existing row for the pair is left untouched.
    async fn insert_invitation(
        &self,
        linkup_id: &LinkupId,
        user_id: &UserId,
    ) -> Result<InvitationInsert, LinkupRepositoryError>;

    /// Set `second_participant = joiner` only where it is still unset, then in
    /// the same transaction delete the other `invited` rows and flip the
    /// joiner's row to `going`.
    async fn claim_second_participant(
        &self,
        linkup_id: &LinkupId,
        joiner: &UserId,
    ) -> Result<ClaimOutcome, LinkupRepositoryError>;

    /// Delete the linkup and its invitations if `initiator` owns it and it is
    /// still searching.
    async fn delete_searching_linkup(
        &self,
        linkup_id: &LinkupId,
        initiator: &UserId,
    ) -> Result<CancelOutcome, LinkupRepositoryError>;

    /// Linkups where `user` holds an `invited` row and whose initiator is
    /// within `radius` of `origin`, nearest first.
    async fn list_invited_nearby(
        &self,
        user: &UserId,
        origin: &Coordinate,
        radius: SearchRadius,
    ) -> Result<Vec<NearbyLinkup>, LinkupRepositoryError>;

    /// Linkups where `user` is initiator or second participant, newest first.
    async fn list_for_participant(
        &self,
        user: &UserId,
    ) -> Result<Vec<Linkup>, LinkupRepositoryError>;

    async fn list_invitations(
        &self,
        linkup_id: &LinkupId,
    ) -> Result<Vec<Invitation>, LinkupRepositoryError>;
}

/// Fixture implementation for tests and wiring that never touch the store.
#[derive(Debug, Default, Clone, Copy)]
pub struct FixtureLinkupRepository;

#[async_trait]
impl LinkupRepository for FixtureLinkupRepository {
    async fn insert_linkup(&self, _linkup: &Linkup) -> Result<(), LinkupRepositoryError> {
        Ok(())
    }

    async fn find_linkup(&self, _id: &LinkupId) -> Result<Option<Linkup>, LinkupRepositoryError> {
        Ok(None)
    }

    async fn nearby_users(
        &self,
        _origin: &Coordinate,
        _radius: SearchRadius,
        _exclude: &UserId,
        _limit: usize,
    ) -> Result<Vec<Candidate>, LinkupRepositoryError> {
        Ok(Vec::new())
    }

    async fn insert_invitation(
        &self,
        _linkup_id: &LinkupId,
        _user_id: &UserId,
    ) -> Result<InvitationInsert, LinkupRepositoryError> {
        Ok(InvitationInsert::Inserted)
    }

    async fn claim_second_participant(
        &self,
        _linkup_id: &LinkupId,
        _joiner: &UserId,
    ) -> Result<ClaimOutcome, LinkupRepositoryError> {
        Ok(ClaimOutcome::Lost)
    }

    async fn delete_searching_linkup(
        &self,
        _linkup_id: &LinkupId,
        _initiator: &UserId,
    ) -> Result<CancelOutcome, LinkupRepositoryError> {
        Ok(CancelOutcome::Missing)
    }

    async fn list_invited_nearby(
        &self,
        _user: &UserId,
        _origin: &Coordinate,
        _radius: SearchRadius,
    ) -> Result<Vec<NearbyLinkup>, LinkupRepositoryError> {
        Ok(Vec::new())
    }

    async fn list_for_participant(
        &self,
        _user: &UserId,
    ) -> Result<Vec<Linkup>, LinkupRepositoryError> {
        Ok(Vec::new())
    }

    async fn list_invitations(
        &self,
        _linkup_id: &LinkupId,
    ) -> Result<Vec<Invitation>, LinkupRepositoryError> {
        Ok(Vec::new())
    }
}

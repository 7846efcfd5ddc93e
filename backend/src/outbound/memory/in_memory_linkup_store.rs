//! In-process spatial store.
//!
//! Used for local runs without PostgreSQL and by the integration tests. All
//! state sits behind one mutex so each port call is a single critical section,
//! which gives the join and cancel operations the same all-or-nothing
//! semantics the relational adapter gets from a transaction. The lock is never
//! held across an await point.

use std::collections::{BTreeMap, HashMap};
use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::domain::ports::{
    CancelOutcome, ClaimOutcome, InvitationInsert, LinkupRepository, LinkupRepositoryError,
    UserLocationRepository, UserLocationRepositoryError,
};
use crate::domain::{
    AttendanceStatus, Candidate, Coordinate, Invitation, Linkup, LinkupId, NearbyLinkup,
    SearchRadius, UserId,
};

#[derive(Debug, Clone, Default)]
struct UserRecord {
    display_name: Option<String>,
    location: Option<Coordinate>,
    active: bool,
    last_active: Option<DateTime<Utc>>,
}

#[derive(Debug, Default)]
struct StoreState {
    users: HashMap<UserId, UserRecord>,
    linkups: HashMap<LinkupId, Linkup>,
    invitations: BTreeMap<(LinkupId, UserId), AttendanceStatus>,
}

/// Mutex-guarded store implementing the linkup and location ports.
#[derive(Debug, Default)]
pub struct InMemoryLinkupStore {
    state: Mutex<StoreState>,
}

impl InMemoryLinkupStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> Result<MutexGuard<'_, StoreState>, LinkupRepositoryError> {
        self.state
            .lock()
            .map_err(|_| LinkupRepositoryError::connection("in-memory store lock poisoned"))
    }

    /// Record a display name shown in nearby listings.
    pub fn set_display_name(
        &self,
        user: UserId,
        name: impl Into<String>,
    ) -> Result<(), LinkupRepositoryError> {
        let mut state = self.lock()?;
        state.users.entry(user).or_default().display_name = Some(name.into());
        Ok(())
    }

    /// Mark a user as inactive so candidate selection skips them.
    pub fn deactivate(&self, user: UserId) -> Result<(), LinkupRepositoryError> {
        let mut state = self.lock()?;
        state.users.entry(user).or_default().active = false;
        Ok(())
    }

    /// When the user last reported a location fix.
    pub fn last_active(
        &self,
        user: &UserId,
    ) -> Result<Option<DateTime<Utc>>, LinkupRepositoryError> {
        Ok(self.lock()?.users.get(user).and_then(|u| u.last_active))
    }
}

impl StoreState {
    fn location_of(&self, user: &UserId) -> Option<Coordinate> {
        self.users.get(user).and_then(|u| u.location)
    }

    fn invitations_for(&self, linkup_id: LinkupId) -> impl Iterator<Item = Invitation> + '_ {
        self.invitations
            .range((linkup_id, UserId::from(uuid::Uuid::nil()))..)
            .take_while(move |((id, _), _)| *id == linkup_id)
            .map(|((id, user), status)| Invitation {
                linkup_id: *id,
                user_id: *user,
                status: *status,
            })
    }

    fn remove_invitations(
        &mut self,
        linkup_id: LinkupId,
        keep: impl Fn(&UserId, AttendanceStatus) -> bool,
    ) {
        self.invitations
            .retain(|(id, user), status| *id != linkup_id || keep(user, *status));
    }
}

#[async_trait]
impl LinkupRepository for InMemoryLinkupStore {
    async fn insert_linkup(&self, linkup: &Linkup) -> Result<(), LinkupRepositoryError> {
        let mut state = self.lock()?;
        if state.linkups.contains_key(&linkup.id) {
            return Err(LinkupRepositoryError::query("duplicate linkup id"));
        }
        state.linkups.insert(linkup.id, linkup.clone());
        Ok(())
    }

    async fn find_linkup(&self, id: &LinkupId) -> Result<Option<Linkup>, LinkupRepositoryError> {
        Ok(self.lock()?.linkups.get(id).cloned())
    }

    async fn nearby_users(
        &self,
        origin: &Coordinate,
        radius: SearchRadius,
        exclude: &UserId,
        limit: usize,
    ) -> Result<Vec<Candidate>, LinkupRepositoryError> {
        let state = self.lock()?;
        let mut candidates: Vec<Candidate> = state
            .users
            .iter()
            .filter(|(id, record)| *id != exclude && record.active)
            .filter_map(|(id, record)| {
                let distance_meters = origin.distance_to(&record.location?);
                (distance_meters <= radius.meters()).then_some(Candidate {
                    user_id: *id,
                    distance_meters,
                })
            })
            .collect();
        candidates.sort_by(|a, b| a.distance_meters.total_cmp(&b.distance_meters));
        candidates.truncate(limit);
        Ok(candidates)
    }

    async fn insert_invitation(
        &self,
        linkup_id: &LinkupId,
        user_id: &UserId,
    ) -> Result<InvitationInsert, LinkupRepositoryError> {
        let mut state = self.lock()?;
        if !state.linkups.contains_key(linkup_id) {
            return Err(LinkupRepositoryError::query(format!(
                "invitation references missing linkup {linkup_id}"
            )));
        }
        let key = (*linkup_id, *user_id);
        if state.invitations.contains_key(&key) {
            return Ok(InvitationInsert::AlreadyPresent);
        }
        state.invitations.insert(key, AttendanceStatus::Invited);
        Ok(InvitationInsert::Inserted)
    }

    async fn claim_second_participant(
        &self,
        linkup_id: &LinkupId,
        joiner: &UserId,
    ) -> Result<ClaimOutcome, LinkupRepositoryError> {
        let mut state = self.lock()?;
        let Some(linkup) = state.linkups.get_mut(linkup_id) else {
            return Ok(ClaimOutcome::Lost);
        };
        if linkup.second_participant.is_some() {
            return Ok(ClaimOutcome::Lost);
        }
        if linkup.initiator == *joiner {
            return Err(LinkupRepositoryError::query(
                "second participant must differ from initiator",
            ));
        }
        linkup.second_participant = Some(*joiner);

        state.remove_invitations(*linkup_id, |user, status| {
            user == joiner || status != AttendanceStatus::Invited
        });
        if let Some(status) = state.invitations.get_mut(&(*linkup_id, *joiner)) {
            *status = AttendanceStatus::Going;
        }
        Ok(ClaimOutcome::Claimed)
    }

    async fn delete_searching_linkup(
        &self,
        linkup_id: &LinkupId,
        initiator: &UserId,
    ) -> Result<CancelOutcome, LinkupRepositoryError> {
        let mut state = self.lock()?;
        let Some(linkup) = state.linkups.get(linkup_id) else {
            return Ok(CancelOutcome::Missing);
        };
        if linkup.initiator != *initiator {
            return Ok(CancelOutcome::NotInitiator);
        }
        if linkup.second_participant.is_some() {
            return Ok(CancelOutcome::Confirmed);
        }
        state.remove_invitations(*linkup_id, |_, _| false);
        state.linkups.remove(linkup_id);
        Ok(CancelOutcome::Deleted)
    }

    async fn list_invited_nearby(
        &self,
        user: &UserId,
        origin: &Coordinate,
        radius: SearchRadius,
    ) -> Result<Vec<NearbyLinkup>, LinkupRepositoryError> {
        let state = self.lock()?;
        let mut rows: Vec<NearbyLinkup> = state
            .invitations
            .iter()
            .filter(|((_, invitee), status)| {
                invitee == user && **status == AttendanceStatus::Invited
            })
            .filter_map(|((linkup_id, _), _)| state.linkups.get(linkup_id))
            .filter_map(|linkup| {
                let initiator_at = state
                    .location_of(&linkup.initiator)
                    .unwrap_or(linkup.origin);
                let distance_meters = origin.distance_to(&initiator_at);
                (distance_meters <= radius.meters()).then(|| NearbyLinkup {
                    linkup_id: linkup.id,
                    initiator_id: linkup.initiator,
                    initiator_name: state
                        .users
                        .get(&linkup.initiator)
                        .and_then(|u| u.display_name.clone()),
                    vibe: linkup.vibe.clone(),
                    message: linkup.message.clone(),
                    distance_meters,
                    created_at: linkup.created_at,
                })
            })
            .collect();
        rows.sort_by(|a, b| a.distance_meters.total_cmp(&b.distance_meters));
        Ok(rows)
    }

    async fn list_for_participant(
        &self,
        user: &UserId,
    ) -> Result<Vec<Linkup>, LinkupRepositoryError> {
        let state = self.lock()?;
        let mut rows: Vec<Linkup> = state
            .linkups
            .values()
            .filter(|l| l.initiator == *user || l.second_participant == Some(*user))
            .cloned()
            .collect();
        rows.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(rows)
    }

    async fn list_invitations(
        &self,
        linkup_id: &LinkupId,
    ) -> Result<Vec<Invitation>, LinkupRepositoryError> {
        Ok(self.lock()?.invitations_for(*linkup_id).collect())
    }
}

#[async_trait]
impl UserLocationRepository for InMemoryLinkupStore {
    async fn record_fix(
        &self,
        user: &UserId,
        location: &Coordinate,
        at: DateTime<Utc>,
    ) -> Result<(), UserLocationRepositoryError> {
        let mut state = self
            .state
            .lock()
            .map_err(|_| UserLocationRepositoryError::connection("in-memory store lock poisoned"))?;
        let record = state.users.entry(*user).or_default();
        record.location = Some(*location);
        record.active = true;
        record.last_active = Some(at);
        Ok(())
    }
}

#[cfg(test)]
#[path = "in_memory_linkup_store_tests.rs"]
mod tests;

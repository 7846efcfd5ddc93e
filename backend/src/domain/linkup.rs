//! Linkup entities and the read models built from them.
//!
//! A linkup has exactly two lifecycle states, derived from whether a second
//! participant has been recorded. Cancellation deletes the record outright.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use super::{Coordinate, SearchRadius, UserId};

/// Opaque linkup identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LinkupId(Uuid);

impl LinkupId {
    #[must_use]
    pub fn random() -> Self {
        Self(Uuid::new_v4())
    }

    /// Parse a path segment into an identifier.
    pub fn parse(raw: &str) -> Result<Self, uuid::Error> {
        Uuid::parse_str(raw).map(Self)
    }

    #[must_use]
    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl From<Uuid> for LinkupId {
    fn from(value: Uuid) -> Self {
        Self(value)
    }
}

impl fmt::Display for LinkupId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

/// Lifecycle state derived from `second_participant`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum LinkupStatus {
    Searching,
    Confirmed,
}

/// Invitation state for a single candidate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum AttendanceStatus {
    Invited,
    Going,
}

impl AttendanceStatus {
    /// Column value used by the relational store.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Invited => "invited",
            Self::Going => "going",
        }
    }

    /// Parse a stored column value.
    #[must_use]
    pub fn from_db(raw: &str) -> Option<Self> {
        match raw {
            "invited" => Some(Self::Invited),
            "going" => Some(Self::Going),
            _ => None,
        }
    }
}

/// Caller's relationship to a linkup in the "mine" listing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum LinkupRole {
    Initiator,
    Joined,
}

/// Canonical place identifier, or the `manual` sentinel when resolution
/// failed or was skipped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PlaceRef {
    Resolved(String),
    Manual,
}

impl PlaceRef {
    const MANUAL: &'static str = "manual";

    /// Stored representation.
    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            Self::Resolved(id) => id.as_str(),
            Self::Manual => Self::MANUAL,
        }
    }

    /// Rehydrate from storage; blank values and the sentinel map to `Manual`.
    #[must_use]
    pub fn from_stored(raw: &str) -> Self {
        let trimmed = raw.trim();
        if trimmed.is_empty() || trimmed == Self::MANUAL {
            Self::Manual
        } else {
            Self::Resolved(trimmed.to_owned())
        }
    }
}

/// Persisted linkup record.
#[derive(Debug, Clone, PartialEq)]
pub struct Linkup {
    pub id: LinkupId,
    pub initiator: UserId,
    pub second_participant: Option<UserId>,
    pub origin: Coordinate,
    pub search_radius: SearchRadius,
    pub vibe: String,
    pub message: String,
    pub place_ref: PlaceRef,
    pub created_at: DateTime<Utc>,
}

impl Linkup {
    #[must_use]
    pub fn status(&self) -> LinkupStatus {
        if self.second_participant.is_some() {
            LinkupStatus::Confirmed
        } else {
            LinkupStatus::Searching
        }
    }

    /// Role of `user`, if they are one of the two participants.
    #[must_use]
    pub fn role_of(&self, user: UserId) -> Option<LinkupRole> {
        if self.initiator == user {
            Some(LinkupRole::Initiator)
        } else if self.second_participant == Some(user) {
            Some(LinkupRole::Joined)
        } else {
            None
        }
    }

    /// The other participant from `user`'s point of view, once confirmed.
    #[must_use]
    pub fn partner_of(&self, user: UserId) -> Option<UserId> {
        match self.role_of(user)? {
            LinkupRole::Initiator => self.second_participant,
            LinkupRole::Joined => Some(self.initiator),
        }
    }
}

/// A user eligible to be invited, with their distance from the origin.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Candidate {
    pub user_id: UserId,
    pub distance_meters: f64,
}

/// Invitation row.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Invitation {
    pub linkup_id: LinkupId,
    pub user_id: UserId,
    pub status: AttendanceStatus,
}

/// Entry in the "nearby" listing: a linkup the caller is invited to.
#[derive(Debug, Clone, PartialEq)]
pub struct NearbyLinkup {
    pub linkup_id: LinkupId,
    pub initiator_id: UserId,
    pub initiator_name: Option<String>,
    pub vibe: String,
    pub message: String,
    pub distance_meters: f64,
    pub created_at: DateTime<Utc>,
}

/// Entry in the "mine" listing.
#[derive(Debug, Clone, PartialEq)]
pub struct UserLinkup {
    pub linkup_id: LinkupId,
    pub status: LinkupStatus,
    pub partner_id: Option<UserId>,
    pub vibe: String,
    pub message: String,
    pub created_at: DateTime<Utc>,
    pub role: LinkupRole,
}

impl UserLinkup {
    /// Project `linkup` for `viewer`; `None` when the viewer is not a participant.
    #[must_use]
    pub fn project(linkup: &Linkup, viewer: UserId) -> Option<Self> {
        let role = linkup.role_of(viewer)?;
        Some(Self {
            linkup_id: linkup.id,
            status: linkup.status(),
            partner_id: linkup.partner_of(viewer),
            vibe: linkup.vibe.clone(),
            message: linkup.message.clone(),
            created_at: linkup.created_at,
            role,
        })
    }
}

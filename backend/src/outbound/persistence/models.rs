//! Internal Diesel row structs.
//!
//! Rows returned by raw PostGIS queries derive `QueryableByName`; the rest use
//! the generated table DSL. None of these leave the persistence module.

use chrono::{DateTime, Utc};
use diesel::prelude::*;
use diesel::sql_types::{Double, Nullable, Text, Timestamptz, Uuid as SqlUuid};
use uuid::Uuid;

use super::schema::linkup_invitations;

/// Linkup row with the origin split into latitude and longitude.
#[derive(Debug, Clone, QueryableByName)]
pub(crate) struct LinkupRow {
    #[diesel(sql_type = SqlUuid)]
    pub id: Uuid,
    #[diesel(sql_type = SqlUuid)]
    pub initiator: Uuid,
    #[diesel(sql_type = Nullable<SqlUuid>)]
    pub second_participant: Option<Uuid>,
    #[diesel(sql_type = Double)]
    pub origin_lat: f64,
    #[diesel(sql_type = Double)]
    pub origin_lng: f64,
    #[diesel(sql_type = Double)]
    pub search_radius_m: f64,
    #[diesel(sql_type = Text)]
    pub vibe: String,
    #[diesel(sql_type = Text)]
    pub message: String,
    #[diesel(sql_type = Text)]
    pub place_ref: String,
    #[diesel(sql_type = Timestamptz)]
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, QueryableByName)]
pub(crate) struct CandidateRow {
    #[diesel(sql_type = SqlUuid)]
    pub user_id: Uuid,
    #[diesel(sql_type = Double)]
    pub distance_m: f64,
}

#[derive(Debug, Clone, QueryableByName)]
pub(crate) struct NearbyLinkupRow {
    #[diesel(sql_type = SqlUuid)]
    pub linkup_id: Uuid,
    #[diesel(sql_type = SqlUuid)]
    pub initiator_id: Uuid,
    #[diesel(sql_type = Nullable<Text>)]
    pub initiator_name: Option<String>,
    #[diesel(sql_type = Text)]
    pub vibe: String,
    #[diesel(sql_type = Text)]
    pub message: String,
    #[diesel(sql_type = Double)]
    pub distance_m: f64,
    #[diesel(sql_type = Timestamptz)]
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = linkup_invitations)]
pub(crate) struct NewInvitationRow<'a> {
    pub linkup_id: Uuid,
    pub user_id: Uuid,
    pub attendance_status: &'a str,
}

#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = linkup_invitations)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub(crate) struct InvitationRow {
    pub linkup_id: Uuid,
    pub user_id: Uuid,
    pub attendance_status: String,
}

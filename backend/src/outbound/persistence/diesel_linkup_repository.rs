//! PostgreSQL/PostGIS spatial store.
//!
//! Geography columns are read and written through `sql_query`; everything
//! else goes through the Diesel DSL. The join and cancel operations each run
//! in one transaction so a failure part way leaves the pre-operation state.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use diesel::prelude::*;
use diesel::sql_query;
use diesel::sql_types::{BigInt, Double, Text, Timestamptz, Uuid as SqlUuid};
use diesel_async::scoped_futures::ScopedFutureExt;
use diesel_async::{AsyncConnection, RunQueryDsl};

use crate::domain::ports::{
    CancelOutcome, ClaimOutcome, InvitationInsert, LinkupRepository, LinkupRepositoryError,
    UserLocationRepository, UserLocationRepositoryError,
};
use crate::domain::{
    AttendanceStatus, Candidate, Coordinate, Invitation, Linkup, LinkupId, NearbyLinkup,
    PlaceRef, SearchRadius, UserId,
};

use super::diesel_basic_error_mapping::{map_basic_diesel_error, map_basic_pool_error};
use super::models::{CandidateRow, InvitationRow, LinkupRow, NearbyLinkupRow, NewInvitationRow};
use super::pool::{DbPool, PoolError};
use super::schema::{linkup_invitations, linkups};

const LINKUP_COLUMNS: &str = "
    id, initiator, second_participant,
    ST_Y(origin::geometry) AS origin_lat,
    ST_X(origin::geometry) AS origin_lng,
    search_radius_m, vibe, message, place_ref, created_at";

const INSERT_LINKUP_SQL: &str = "
    INSERT INTO linkups
        (id, initiator, origin, search_radius_m, vibe, message, place_ref, created_at)
    VALUES
        ($1, $2, ST_SetSRID(ST_MakePoint($3, $4), 4326)::geography, $5, $6, $7, $8, $9)";

const NEARBY_USERS_SQL: &str = "
    WITH origin AS (SELECT ST_SetSRID(ST_MakePoint($1, $2), 4326)::geography AS point)
    SELECT u.user_id, ST_Distance(u.last_location, origin.point) AS distance_m
    FROM user_locations u, origin
    WHERE u.user_id <> $3
      AND u.active
      AND u.last_location IS NOT NULL
      AND ST_DWithin(u.last_location, origin.point, $4)
    ORDER BY distance_m
    LIMIT $5";

const INVITED_NEARBY_SQL: &str = "
    WITH origin AS (SELECT ST_SetSRID(ST_MakePoint($2, $3), 4326)::geography AS point)
    SELECT l.id AS linkup_id,
           l.initiator AS initiator_id,
           u.display_name AS initiator_name,
           l.vibe,
           l.message,
           l.created_at,
           ST_Distance(COALESCE(u.last_location, l.origin), origin.point) AS distance_m
    FROM linkup_invitations i
    JOIN linkups l ON l.id = i.linkup_id
    LEFT JOIN user_locations u ON u.user_id = l.initiator
    CROSS JOIN origin
    WHERE i.user_id = $1
      AND i.attendance_status = 'invited'
      AND ST_DWithin(COALESCE(u.last_location, l.origin), origin.point, $4)
    ORDER BY distance_m";

const RECORD_FIX_SQL: &str = "
    INSERT INTO user_locations (user_id, last_location, active, last_active)
    VALUES ($1, ST_SetSRID(ST_MakePoint($2, $3), 4326)::geography, TRUE, $4)
    ON CONFLICT (user_id) DO UPDATE
    SET last_location = EXCLUDED.last_location,
        active = TRUE,
        last_active = EXCLUDED.last_active";

/// Diesel-backed spatial store.
#[derive(Clone)]
pub struct DieselLinkupRepository {
    pool: DbPool,
}

impl DieselLinkupRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

fn map_pool_error(error: PoolError) -> LinkupRepositoryError {
    map_basic_pool_error(error, LinkupRepositoryError::connection)
}

fn map_diesel_error(error: diesel::result::Error) -> LinkupRepositoryError {
    map_basic_diesel_error(
        error,
        LinkupRepositoryError::query,
        LinkupRepositoryError::connection,
    )
}

fn row_to_linkup(row: LinkupRow) -> Result<Linkup, LinkupRepositoryError> {
    let origin = Coordinate::new(row.origin_lat, row.origin_lng).map_err(|err| {
        LinkupRepositoryError::query(format!("stored origin for {} invalid: {err}", row.id))
    })?;
    let search_radius = SearchRadius::within_bounds(Some(row.search_radius_m)).ok_or_else(|| {
        LinkupRepositoryError::query(format!("stored radius for {} out of bounds", row.id))
    })?;
    Ok(Linkup {
        id: LinkupId::from(row.id),
        initiator: UserId::from(row.initiator),
        second_participant: row.second_participant.map(UserId::from),
        origin,
        search_radius,
        vibe: row.vibe,
        message: row.message,
        place_ref: PlaceRef::from_stored(&row.place_ref),
        created_at: row.created_at,
    })
}

fn row_to_invitation(row: InvitationRow) -> Result<Invitation, LinkupRepositoryError> {
    let status = AttendanceStatus::from_db(&row.attendance_status).ok_or_else(|| {
        LinkupRepositoryError::query(format!(
            "unknown attendance status {:?}",
            row.attendance_status
        ))
    })?;
    Ok(Invitation {
        linkup_id: LinkupId::from(row.linkup_id),
        user_id: UserId::from(row.user_id),
        status,
    })
}

fn row_to_nearby(row: NearbyLinkupRow) -> NearbyLinkup {
    NearbyLinkup {
        linkup_id: LinkupId::from(row.linkup_id),
        initiator_id: UserId::from(row.initiator_id),
        initiator_name: row.initiator_name,
        vibe: row.vibe,
        message: row.message,
        distance_meters: row.distance_m,
        created_at: row.created_at,
    }
}

#[async_trait]
impl LinkupRepository for DieselLinkupRepository {
    async fn insert_linkup(&self, linkup: &Linkup) -> Result<(), LinkupRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        sql_query(INSERT_LINKUP_SQL)
            .bind::<SqlUuid, _>(*linkup.id.as_uuid())
            .bind::<SqlUuid, _>(*linkup.initiator.as_uuid())
            .bind::<Double, _>(linkup.origin.longitude())
            .bind::<Double, _>(linkup.origin.latitude())
            .bind::<Double, _>(linkup.search_radius.meters())
            .bind::<Text, _>(linkup.vibe.as_str())
            .bind::<Text, _>(linkup.message.as_str())
            .bind::<Text, _>(linkup.place_ref.as_str())
            .bind::<Timestamptz, _>(linkup.created_at)
            .execute(&mut conn)
            .await
            .map(|_| ())
            .map_err(map_diesel_error)
    }

    async fn find_linkup(&self, id: &LinkupId) -> Result<Option<Linkup>, LinkupRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let row: Option<LinkupRow> =
            sql_query(format!("SELECT {LINKUP_COLUMNS} FROM linkups WHERE id = $1"))
                .bind::<SqlUuid, _>(*id.as_uuid())
                .get_result(&mut conn)
                .await
                .optional()
                .map_err(map_diesel_error)?;
        row.map(row_to_linkup).transpose()
    }

    async fn nearby_users(
        &self,
        origin: &Coordinate,
        radius: SearchRadius,
        exclude: &UserId,
        limit: usize,
    ) -> Result<Vec<Candidate>, LinkupRepositoryError> {
        let limit = i64::try_from(limit)
            .map_err(|_| LinkupRepositoryError::query("candidate limit exceeds i64"))?;
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let rows: Vec<CandidateRow> = sql_query(NEARBY_USERS_SQL)
            .bind::<Double, _>(origin.longitude())
            .bind::<Double, _>(origin.latitude())
            .bind::<SqlUuid, _>(*exclude.as_uuid())
            .bind::<Double, _>(radius.meters())
            .bind::<BigInt, _>(limit)
            .load(&mut conn)
            .await
            .map_err(map_diesel_error)?;
        Ok(rows
            .into_iter()
            .map(|row| Candidate {
                user_id: UserId::from(row.user_id),
                distance_meters: row.distance_m,
            })
            .collect())
    }

    async fn insert_invitation(
        &self,
        linkup_id: &LinkupId,
        user_id: &UserId,
    ) -> Result<InvitationInsert, LinkupRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let row = NewInvitationRow {
            linkup_id: *linkup_id.as_uuid(),
            user_id: *user_id.as_uuid(),
            attendance_status: AttendanceStatus::Invited.as_str(),
        };
        let inserted = diesel::insert_into(linkup_invitations::table)
            .values(&row)
            .on_conflict((linkup_invitations::linkup_id, linkup_invitations::user_id))
            .do_nothing()
            .execute(&mut conn)
            .await
            .map_err(map_diesel_error)?;
        Ok(if inserted == 0 {
            InvitationInsert::AlreadyPresent
        } else {
            InvitationInsert::Inserted
        })
    }

    async fn claim_second_participant(
        &self,
        linkup_id: &LinkupId,
        joiner: &UserId,
    ) -> Result<ClaimOutcome, LinkupRepositoryError> {
        let id = *linkup_id.as_uuid();
        let joiner = *joiner.as_uuid();
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;

        conn.transaction(|conn| {
            async move {
                let claimed = diesel::update(
                    linkups::table
                        .filter(linkups::id.eq(id))
                        .filter(linkups::second_participant.is_null()),
                )
                .set(linkups::second_participant.eq(joiner))
                .execute(conn)
                .await?;
                if claimed == 0 {
                    return Ok(ClaimOutcome::Lost);
                }

                diesel::delete(
                    linkup_invitations::table
                        .filter(linkup_invitations::linkup_id.eq(id))
                        .filter(linkup_invitations::user_id.ne(joiner))
                        .filter(
                            linkup_invitations::attendance_status
                                .eq(AttendanceStatus::Invited.as_str()),
                        ),
                )
                .execute(conn)
                .await?;

                diesel::update(
                    linkup_invitations::table
                        .filter(linkup_invitations::linkup_id.eq(id))
                        .filter(linkup_invitations::user_id.eq(joiner)),
                )
                .set(linkup_invitations::attendance_status.eq(AttendanceStatus::Going.as_str()))
                .execute(conn)
                .await?;

                Ok(ClaimOutcome::Claimed)
            }
            .scope_boxed()
        })
        .await
        .map_err(map_diesel_error)
    }

    async fn delete_searching_linkup(
        &self,
        linkup_id: &LinkupId,
        initiator: &UserId,
    ) -> Result<CancelOutcome, LinkupRepositoryError> {
        let id = *linkup_id.as_uuid();
        let caller = *initiator.as_uuid();
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;

        conn.transaction(|conn| {
            async move {
                let current: Option<(uuid::Uuid, Option<uuid::Uuid>)> = linkups::table
                    .filter(linkups::id.eq(id))
                    .select((linkups::initiator, linkups::second_participant))
                    .for_update()
                    .first(conn)
                    .await
                    .optional()?;
                match current {
                    None => return Ok(CancelOutcome::Missing),
                    Some((owner, _)) if owner != caller => return Ok(CancelOutcome::NotInitiator),
                    Some((_, Some(_))) => return Ok(CancelOutcome::Confirmed),
                    Some((_, None)) => {}
                }

                diesel::delete(
                    linkup_invitations::table.filter(linkup_invitations::linkup_id.eq(id)),
                )
                .execute(conn)
                .await?;
                diesel::delete(
                    linkups::table
                        .filter(linkups::id.eq(id))
                        .filter(linkups::initiator.eq(caller))
                        .filter(linkups::second_participant.is_null()),
                )
                .execute(conn)
                .await?;

                Ok(CancelOutcome::Deleted)
            }
            .scope_boxed()
        })
        .await
        .map_err(map_diesel_error)
    }

    async fn list_invited_nearby(
        &self,
        user: &UserId,
        origin: &Coordinate,
        radius: SearchRadius,
    ) -> Result<Vec<NearbyLinkup>, LinkupRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let rows: Vec<NearbyLinkupRow> = sql_query(INVITED_NEARBY_SQL)
            .bind::<SqlUuid, _>(*user.as_uuid())
            .bind::<Double, _>(origin.longitude())
            .bind::<Double, _>(origin.latitude())
            .bind::<Double, _>(radius.meters())
            .load(&mut conn)
            .await
            .map_err(map_diesel_error)?;
        Ok(rows.into_iter().map(row_to_nearby).collect())
    }

    async fn list_for_participant(
        &self,
        user: &UserId,
    ) -> Result<Vec<Linkup>, LinkupRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let rows: Vec<LinkupRow> = sql_query(format!(
            "SELECT {LINKUP_COLUMNS} FROM linkups \
             WHERE initiator = $1 OR second_participant = $1 \
             ORDER BY created_at DESC"
        ))
        .bind::<SqlUuid, _>(*user.as_uuid())
        .load(&mut conn)
        .await
        .map_err(map_diesel_error)?;
        rows.into_iter().map(row_to_linkup).collect()
    }

    async fn list_invitations(
        &self,
        linkup_id: &LinkupId,
    ) -> Result<Vec<Invitation>, LinkupRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let rows: Vec<InvitationRow> = linkup_invitations::table
            .filter(linkup_invitations::linkup_id.eq(linkup_id.as_uuid()))
            .order(linkup_invitations::user_id.asc())
            .select(InvitationRow::as_select())
            .load(&mut conn)
            .await
            .map_err(map_diesel_error)?;
        rows.into_iter().map(row_to_invitation).collect()
    }
}

#[async_trait]
impl UserLocationRepository for DieselLinkupRepository {
    async fn record_fix(
        &self,
        user: &UserId,
        location: &Coordinate,
        at: DateTime<Utc>,
    ) -> Result<(), UserLocationRepositoryError> {
        let mut conn = self
            .pool
            .get()
            .await
            .map_err(|err| map_basic_pool_error(err, UserLocationRepositoryError::connection))?;
        sql_query(RECORD_FIX_SQL)
            .bind::<SqlUuid, _>(*user.as_uuid())
            .bind::<Double, _>(location.longitude())
            .bind::<Double, _>(location.latitude())
            .bind::<Timestamptz, _>(at)
            .execute(&mut conn)
            .await
            .map(|_| ())
            .map_err(|err| {
                map_basic_diesel_error(
                    err,
                    UserLocationRepositoryError::query,
                    UserLocationRepositoryError::connection,
                )
            })
    }
}

#[cfg(test)]
mod tests {
    use rstest::rstest;
    use uuid::Uuid;

    use super::*;

    fn row() -> LinkupRow {
        LinkupRow {
            id: Uuid::new_v4(),
            initiator: Uuid::new_v4(),
            second_participant: None,
            origin_lat: 42.28,
            origin_lng: -83.74,
            search_radius_m: 500.0,
            vibe: "coffee".into(),
            message: String::new(),
            place_ref: "manual".into(),
            created_at: Utc::now(),
        }
    }

    #[rstest]
    fn linkup_rows_map_to_domain() {
        let source = row();
        let joiner = Uuid::new_v4();
        let linkup = row_to_linkup(LinkupRow {
            second_participant: Some(joiner),
            ..source.clone()
        })
        .expect("valid row");
        assert_eq!(linkup.id.as_uuid(), &source.id);
        assert_eq!(linkup.second_participant, Some(UserId::from(joiner)));
        assert_eq!(linkup.place_ref, PlaceRef::Manual);
        assert!((linkup.origin.longitude() + 83.74).abs() < f64::EPSILON);
    }

    #[rstest]
    #[case(LinkupRow { origin_lat: 120.0, ..row() })]
    #[case(LinkupRow { search_radius_m: 0.0, ..row() })]
    #[case(LinkupRow { search_radius_m: 7_500.0, ..row() })]
    fn corrupt_rows_are_query_errors(#[case] bad: LinkupRow) {
        let err = row_to_linkup(bad).expect_err("row rejected");
        assert!(matches!(err, LinkupRepositoryError::Query { .. }));
    }

    #[rstest]
    fn unknown_attendance_status_is_rejected() {
        let err = row_to_invitation(InvitationRow {
            linkup_id: Uuid::new_v4(),
            user_id: Uuid::new_v4(),
            attendance_status: "maybe".into(),
        })
        .expect_err("unknown status");
        assert!(matches!(err, LinkupRepositoryError::Query { .. }));
    }

    #[rstest]
    fn geography_queries_take_longitude_first() {
        assert!(INSERT_LINKUP_SQL.contains("ST_MakePoint($3, $4)"));
        assert!(NEARBY_USERS_SQL.contains("LIMIT $5"));
        assert!(INVITED_NEARBY_SQL.contains("attendance_status = 'invited'"));
    }
}

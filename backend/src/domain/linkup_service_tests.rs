//! Tests for the matching coordinator services.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Local, TimeZone, Utc};
use mockable::Clock;
use rstest::{fixture, rstest};

use super::*;
use crate::domain::ports::{
    FixturePlaceResolver, InvitationInsert, MockLinkupRepository, MockPlaceResolver,
};
use crate::domain::{Candidate, Coordinate, ErrorCode};

struct FixtureClock(DateTime<Utc>);

impl Clock for FixtureClock {
    fn local(&self) -> DateTime<Local> {
        self.0.with_timezone(&Local)
    }

    fn utc(&self) -> DateTime<Utc> {
        self.0
    }
}

struct StalledPlaceResolver;

#[async_trait]
impl PlaceResolver for StalledPlaceResolver {
    async fn resolve(&self, _text: &str, _near: &Coordinate) -> PlaceRef {
        tokio::time::sleep(Duration::from_secs(30)).await;
        PlaceRef::Resolved("too-late".into())
    }
}

fn fixture_now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 3, 14, 18, 0, 0)
        .single()
        .expect("valid fixture timestamp")
}

#[fixture]
fn origin() -> Coordinate {
    Coordinate::new(42.28, -83.74).expect("valid origin")
}

#[fixture]
fn initiator() -> UserId {
    UserId::random()
}

fn command_service(
    repo: MockLinkupRepository,
    places: Arc<dyn PlaceResolver>,
) -> LinkupCommandService<MockLinkupRepository> {
    LinkupCommandService::new(
        Arc::new(repo),
        places,
        Arc::new(FixtureClock(fixture_now())),
    )
}

fn create_request(initiator: UserId, origin: Coordinate, radius: Option<f64>) -> CreateLinkupRequest {
    CreateLinkupRequest {
        initiator,
        origin,
        search_radius: radius,
        vibe: "coffee".into(),
        message: "Espresso Royale on State".into(),
    }
}

fn stored_linkup(initiator: UserId, second_participant: Option<UserId>) -> Linkup {
    Linkup {
        id: LinkupId::random(),
        initiator,
        second_participant,
        origin: Coordinate::new(42.28, -83.74).expect("valid origin"),
        search_radius: SearchRadius::from_requested(None),
        vibe: "coffee".into(),
        message: String::new(),
        place_ref: PlaceRef::Manual,
        created_at: fixture_now(),
    }
}

fn candidate(distance_meters: f64) -> Candidate {
    Candidate {
        user_id: UserId::random(),
        distance_meters,
    }
}

#[rstest]
#[case(Some(9_000.0))]
#[case(Some(0.0))]
#[case(None)]
#[tokio::test]
async fn create_clamps_radius_and_fans_out(
    origin: Coordinate,
    initiator: UserId,
    #[case] requested: Option<f64>,
) {
    let mut repo = MockLinkupRepository::new();
    repo.expect_insert_linkup()
        .withf(move |linkup| {
            (linkup.search_radius.meters() - 500.0).abs() < f64::EPSILON
                && linkup.status() == LinkupStatus::Searching
                && linkup.initiator == initiator
                && linkup.created_at == fixture_now()
        })
        .times(1)
        .return_once(|_| Ok(()));
    repo.expect_nearby_users()
        .times(1)
        .return_once(|_, _, _, _| Ok(vec![candidate(120.0), candidate(300.0)]));
    repo.expect_insert_invitation()
        .times(2)
        .returning(|_, _| Ok(InvitationInsert::Inserted));

    let service = command_service(repo, Arc::new(FixturePlaceResolver));
    let response = service
        .create(create_request(initiator, origin, requested))
        .await
        .expect("create succeeds");

    assert_eq!(response.fan_out.summary().invited, 2);
}

#[rstest]
#[tokio::test]
async fn create_rejects_blank_vibe_before_touching_the_store(
    origin: Coordinate,
    initiator: UserId,
) {
    let repo = MockLinkupRepository::new();
    let service = command_service(repo, Arc::new(FixturePlaceResolver));
    let mut request = create_request(initiator, origin, None);
    request.vibe = "   ".into();

    let err = service.create(request).await.expect_err("blank vibe rejected");
    assert_eq!(err.code(), ErrorCode::InvalidRequest);
    assert_eq!(
        err.details().and_then(|d| d.get("field")),
        Some(&serde_json::json!("vibe"))
    );
}

#[rstest]
#[tokio::test]
async fn create_accepts_long_free_text(origin: Coordinate, initiator: UserId) {
    let long_vibe = "v".repeat(200);
    let long_message = "m".repeat(600);
    let (expected_vibe, expected_message) = (long_vibe.clone(), long_message.clone());
    let mut repo = MockLinkupRepository::new();
    repo.expect_insert_linkup()
        .withf(move |linkup| linkup.vibe == expected_vibe && linkup.message == expected_message)
        .times(1)
        .return_once(|_| Ok(()));
    repo.expect_nearby_users()
        .times(1)
        .return_once(|_, _, _, _| Ok(Vec::new()));

    let service = command_service(repo, Arc::new(FixturePlaceResolver));
    let mut request = create_request(initiator, origin, None);
    request.vibe = long_vibe;
    request.message = long_message;

    service.create(request).await.expect("long text is accepted");
}

#[rstest]
#[tokio::test]
async fn create_succeeds_when_candidate_selection_fails(origin: Coordinate, initiator: UserId) {
    let mut repo = MockLinkupRepository::new();
    repo.expect_insert_linkup().times(1).return_once(|_| Ok(()));
    repo.expect_nearby_users()
        .return_once(|_, _, _, _| Err(LinkupRepositoryError::connection("reset")));
    repo.expect_insert_invitation().never();

    let service = command_service(repo, Arc::new(FixturePlaceResolver));
    let response = service
        .create(create_request(initiator, origin, None))
        .await
        .expect("create still succeeds");

    assert!(response.fan_out.results().is_empty());
}

#[rstest]
#[tokio::test]
async fn create_reports_partial_fan_out(origin: Coordinate, initiator: UserId) {
    let people = vec![candidate(10.0), candidate(20.0), candidate(30.0)];
    let flaky = people[0].user_id;
    let mut repo = MockLinkupRepository::new();
    repo.expect_insert_linkup().return_once(|_| Ok(()));
    repo.expect_nearby_users()
        .return_once(move |_, _, _, _| Ok(people));
    repo.expect_insert_invitation().returning(move |_, user| {
        if *user == flaky {
            Err(LinkupRepositoryError::query("deadlock detected"))
        } else {
            Ok(InvitationInsert::AlreadyPresent)
        }
    });

    let service = command_service(repo, Arc::new(FixturePlaceResolver));
    let response = service
        .create(create_request(initiator, origin, None))
        .await
        .expect("create succeeds");

    let summary = response.fan_out.summary();
    assert_eq!((summary.invited, summary.already_invited, summary.failed), (0, 2, 1));
}

#[rstest]
#[tokio::test]
async fn create_fails_when_linkup_row_cannot_be_written(origin: Coordinate, initiator: UserId) {
    let mut repo = MockLinkupRepository::new();
    repo.expect_insert_linkup()
        .return_once(|_| Err(LinkupRepositoryError::connection("refused")));
    repo.expect_nearby_users().never();

    let service = command_service(repo, Arc::new(FixturePlaceResolver));
    let err = service
        .create(create_request(initiator, origin, None))
        .await
        .expect_err("insert failure surfaces");
    assert_eq!(err.code(), ErrorCode::InternalError);
}

#[rstest]
#[tokio::test]
async fn create_queries_current_location_for_empty_message(origin: Coordinate, initiator: UserId) {
    let mut places = MockPlaceResolver::new();
    places
        .expect_resolve()
        .withf(|text, _| text == "Current Location")
        .times(1)
        .return_once(|_, _| PlaceRef::Resolved("ChIJ-current".into()));
    let mut repo = MockLinkupRepository::new();
    repo.expect_insert_linkup()
        .withf(|linkup| linkup.place_ref == PlaceRef::Resolved("ChIJ-current".into()))
        .times(1)
        .return_once(|_| Ok(()));
    repo.expect_nearby_users()
        .return_once(|_, _, _, _| Ok(Vec::new()));

    let service = command_service(repo, Arc::new(places));
    let mut request = create_request(initiator, origin, None);
    request.message = "  ".into();
    service.create(request).await.expect("create succeeds");
}

#[rstest]
#[tokio::test]
async fn create_falls_back_to_manual_when_resolver_stalls(origin: Coordinate, initiator: UserId) {
    let mut repo = MockLinkupRepository::new();
    repo.expect_insert_linkup()
        .withf(|linkup| linkup.place_ref == PlaceRef::Manual)
        .times(1)
        .return_once(|_| Ok(()));
    repo.expect_nearby_users()
        .return_once(|_, _, _, _| Ok(Vec::new()));

    let service = command_service(repo, Arc::new(StalledPlaceResolver))
        .with_timeouts(Duration::from_secs(5), Duration::from_millis(10));
    service
        .create(create_request(initiator, origin, None))
        .await
        .expect("create succeeds");
}

fn join_service(repo: MockLinkupRepository) -> LinkupCommandService<MockLinkupRepository> {
    command_service(repo, Arc::new(FixturePlaceResolver))
}

#[rstest]
#[tokio::test]
async fn join_unknown_linkup_is_not_found() {
    let mut repo = MockLinkupRepository::new();
    repo.expect_find_linkup().return_once(|_| Ok(None));
    repo.expect_claim_second_participant().never();

    let err = join_service(repo)
        .join(JoinLinkupRequest {
            linkup_id: LinkupId::random(),
            joiner: UserId::random(),
        })
        .await
        .expect_err("missing linkup");
    assert_eq!(err.code(), ErrorCode::NotFound);
}

#[rstest]
#[tokio::test]
async fn join_own_linkup_is_rejected(initiator: UserId) {
    let linkup = stored_linkup(initiator, None);
    let id = linkup.id;
    let mut repo = MockLinkupRepository::new();
    repo.expect_find_linkup().return_once(move |_| Ok(Some(linkup)));
    repo.expect_claim_second_participant().never();

    let err = join_service(repo)
        .join(JoinLinkupRequest {
            linkup_id: id,
            joiner: initiator,
        })
        .await
        .expect_err("self join rejected");
    assert_eq!(err.code(), ErrorCode::InvalidRequest);
}

#[rstest]
#[tokio::test]
async fn join_confirmed_linkup_conflicts_without_writing(initiator: UserId) {
    let linkup = stored_linkup(initiator, Some(UserId::random()));
    let id = linkup.id;
    let mut repo = MockLinkupRepository::new();
    repo.expect_find_linkup().return_once(move |_| Ok(Some(linkup)));
    repo.expect_claim_second_participant().never();

    let err = join_service(repo)
        .join(JoinLinkupRequest {
            linkup_id: id,
            joiner: UserId::random(),
        })
        .await
        .expect_err("already confirmed");
    assert_eq!(err.code(), ErrorCode::Conflict);
    assert_eq!(err.message(), "linkup is no longer available");
}

#[rstest]
#[case(Ok(ClaimOutcome::Claimed), None)]
#[case(Ok(ClaimOutcome::Lost), Some(ErrorCode::Conflict))]
#[case(Err(LinkupRepositoryError::query("serialization failure")), Some(ErrorCode::InternalError))]
#[tokio::test]
async fn join_maps_claim_outcomes(
    initiator: UserId,
    #[case] claim: Result<ClaimOutcome, LinkupRepositoryError>,
    #[case] expected: Option<ErrorCode>,
) {
    let linkup = stored_linkup(initiator, None);
    let id = linkup.id;
    let joiner = UserId::random();
    let mut repo = MockLinkupRepository::new();
    repo.expect_find_linkup().return_once(move |_| Ok(Some(linkup)));
    repo.expect_claim_second_participant()
        .withf(move |linkup_id, user| *linkup_id == id && *user == joiner)
        .times(1)
        .return_once(move |_, _| claim);

    let result = join_service(repo)
        .join(JoinLinkupRequest {
            linkup_id: id,
            joiner,
        })
        .await;
    match expected {
        None => assert_eq!(result.expect("join succeeds"), id),
        Some(code) => assert_eq!(result.expect_err("join fails").code(), code),
    }
}

#[rstest]
#[tokio::test]
async fn cancel_by_stranger_is_forbidden(initiator: UserId) {
    let linkup = stored_linkup(initiator, None);
    let id = linkup.id;
    let mut repo = MockLinkupRepository::new();
    repo.expect_find_linkup().return_once(move |_| Ok(Some(linkup)));
    repo.expect_delete_searching_linkup().never();

    let err = join_service(repo)
        .cancel(CancelLinkupRequest {
            linkup_id: id,
            caller: UserId::random(),
        })
        .await
        .expect_err("stranger cannot cancel");
    assert_eq!(err.code(), ErrorCode::Forbidden);
}

#[rstest]
#[tokio::test]
async fn cancel_confirmed_linkup_is_bad_request_and_writes_nothing(initiator: UserId) {
    let linkup = stored_linkup(initiator, Some(UserId::random()));
    let id = linkup.id;
    let mut repo = MockLinkupRepository::new();
    repo.expect_find_linkup().return_once(move |_| Ok(Some(linkup)));
    repo.expect_delete_searching_linkup().never();

    let err = join_service(repo)
        .cancel(CancelLinkupRequest {
            linkup_id: id,
            caller: initiator,
        })
        .await
        .expect_err("confirmed linkups stay");
    assert_eq!(err.code(), ErrorCode::InvalidRequest);
}

#[rstest]
#[case(CancelOutcome::Deleted, None)]
#[case(CancelOutcome::Confirmed, Some(ErrorCode::InvalidRequest))]
#[case(CancelOutcome::Missing, Some(ErrorCode::NotFound))]
#[tokio::test]
async fn cancel_maps_guarded_delete_outcomes(
    initiator: UserId,
    #[case] outcome: CancelOutcome,
    #[case] expected: Option<ErrorCode>,
) {
    let linkup = stored_linkup(initiator, None);
    let id = linkup.id;
    let mut repo = MockLinkupRepository::new();
    repo.expect_find_linkup().return_once(move |_| Ok(Some(linkup)));
    repo.expect_delete_searching_linkup()
        .withf(move |linkup_id, caller| *linkup_id == id && *caller == initiator)
        .times(1)
        .return_once(move |_, _| Ok(outcome));

    let result = join_service(repo)
        .cancel(CancelLinkupRequest {
            linkup_id: id,
            caller: initiator,
        })
        .await;
    assert_eq!(result.err().map(|e| e.code()), expected);
}

#[rstest]
#[tokio::test]
async fn list_mine_is_newest_first_with_roles(initiator: UserId) {
    let partner = UserId::random();
    let mut older = stored_linkup(initiator, Some(partner));
    older.created_at = fixture_now() - chrono::Duration::hours(2);
    let mut joined = stored_linkup(partner, Some(initiator));
    joined.created_at = fixture_now() - chrono::Duration::hours(1);
    let newest = stored_linkup(initiator, None);
    let rows = vec![older.clone(), newest.clone(), joined.clone()];

    let mut repo = MockLinkupRepository::new();
    repo.expect_list_for_participant()
        .withf(move |user| *user == initiator)
        .return_once(move |_| Ok(rows));

    let mine = LinkupQueryService::new(Arc::new(repo))
        .list_mine(initiator)
        .await
        .expect("listing succeeds");

    let ids: Vec<_> = mine.iter().map(|m| m.linkup_id).collect();
    assert_eq!(ids, vec![newest.id, joined.id, older.id]);
    assert_eq!(mine[0].status, LinkupStatus::Searching);
    assert_eq!(mine[0].partner_id, None);
    assert_eq!(mine[1].role, crate::domain::LinkupRole::Joined);
    assert_eq!(mine[1].partner_id, Some(partner));
    assert_eq!(mine[2].role, crate::domain::LinkupRole::Initiator);
    assert_eq!(mine[2].status, LinkupStatus::Confirmed);
}

#[rstest]
#[case(None, 5_000.0)]
#[case(Some(-3.0), 5_000.0)]
#[case(Some(750.0), 750.0)]
#[tokio::test]
async fn list_nearby_applies_listing_radius(
    origin: Coordinate,
    #[case] requested: Option<f64>,
    #[case] expected: f64,
) {
    let mut repo = MockLinkupRepository::new();
    repo.expect_list_invited_nearby()
        .withf(move |_, _, radius| (radius.meters() - expected).abs() < f64::EPSILON)
        .times(1)
        .return_once(|_, _, _| Ok(Vec::new()));

    let listed = LinkupQueryService::new(Arc::new(repo))
        .list_nearby(ListNearbyRequest {
            user: UserId::random(),
            origin,
            max_radius: requested,
        })
        .await
        .expect("listing succeeds");
    assert!(listed.is_empty());
}

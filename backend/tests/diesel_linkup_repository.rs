//! Integration tests for `DieselLinkupRepository`.
//!
//! These run the adapter's claim, cancel and invitation writes against a real
//! PostGIS-enabled database so the conditional update and the transactional
//! cleanup are exercised under genuine concurrency.

use std::sync::Arc;

use chrono::Utc;
use linkup_backend::domain::ports::{
    CancelOutcome, ClaimOutcome, InvitationInsert, LinkupRepository,
};
use linkup_backend::domain::{
    AttendanceStatus, Coordinate, Linkup, LinkupId, PlaceRef, SearchRadius, UserId,
};
use linkup_backend::outbound::persistence::{DbPool, DieselLinkupRepository, PoolConfig};
use pg_embedded_setup_unpriv::TemporaryDatabase;
use postgres::{Client, NoTls};
use rstest::{fixture, rstest};
use tokio::runtime::Runtime;
use tokio::sync::Barrier;
use uuid::Uuid;

mod support;

use support::{
    SetupFailure, format_postgres_error, handle_cluster_setup_failure, provision_linkup_database,
};

const CONTENDERS: usize = 8;

struct TestContext {
    runtime: Runtime,
    repository: DieselLinkupRepository,
    database_url: String,
    _database: TemporaryDatabase,
}

type LinkupRowSnapshot = (Uuid, Uuid, Option<Uuid>, String);
type InvitationRowSnapshot = (Uuid, Uuid, String);

fn setup_context() -> Result<TestContext, SetupFailure> {
    let database = provision_linkup_database()?;
    let database_url = database.url().to_owned();
    let runtime = Runtime::new().map_err(|err| SetupFailure::Cluster(err.to_string()))?;

    let config = PoolConfig::new(database_url.as_str()).with_max_size(CONTENDERS as u32);
    let pool = runtime
        .block_on(async { DbPool::new(config).await })
        .map_err(|err| SetupFailure::Cluster(err.to_string()))?;

    Ok(TestContext {
        runtime,
        repository: DieselLinkupRepository::new(pool),
        database_url,
        _database: database,
    })
}

#[fixture]
fn repo_context() -> Option<TestContext> {
    match setup_context() {
        Ok(ctx) => Some(ctx),
        Err(failure) => handle_cluster_setup_failure(failure),
    }
}

fn searching_linkup(initiator: UserId) -> Linkup {
    Linkup {
        id: LinkupId::random(),
        initiator,
        second_participant: None,
        origin: Coordinate::new(51.5074, -0.1278).expect("valid origin"),
        search_radius: SearchRadius::from_requested(None),
        vibe: "coffee".to_owned(),
        message: "anyone around?".to_owned(),
        place_ref: PlaceRef::Manual,
        created_at: Utc::now(),
    }
}

/// Insert a searching linkup and invite `count` fresh users to it.
fn seed_invited_linkup(context: &TestContext, count: usize) -> (Linkup, Vec<UserId>) {
    let linkup = searching_linkup(UserId::random());
    let invitees: Vec<UserId> = (0..count).map(|_| UserId::random()).collect();
    context.runtime.block_on(async {
        context
            .repository
            .insert_linkup(&linkup)
            .await
            .expect("insert linkup");
        for invitee in &invitees {
            let inserted = context
                .repository
                .insert_invitation(&linkup.id, invitee)
                .await
                .expect("insert invitation");
            assert_eq!(inserted, InvitationInsert::Inserted);
        }
    });
    (linkup, invitees)
}

fn connect(url: &str) -> Client {
    Client::connect(url, NoTls)
        .unwrap_or_else(|err| panic!("connect: {}", format_postgres_error(&err)))
}

fn linkup_rows(url: &str) -> Vec<LinkupRowSnapshot> {
    connect(url)
        .query(
            "SELECT id, initiator, second_participant, vibe FROM linkups ORDER BY id",
            &[],
        )
        .unwrap_or_else(|err| panic!("read linkups: {}", format_postgres_error(&err)))
        .iter()
        .map(|row| (row.get(0), row.get(1), row.get(2), row.get(3)))
        .collect()
}

fn invitation_rows(url: &str, linkup_id: &LinkupId) -> Vec<InvitationRowSnapshot> {
    connect(url)
        .query(
            concat!(
                "SELECT linkup_id, user_id, attendance_status FROM linkup_invitations ",
                "WHERE linkup_id = $1 ORDER BY user_id"
            ),
            &[linkup_id.as_uuid()],
        )
        .unwrap_or_else(|err| panic!("read invitations: {}", format_postgres_error(&err)))
        .iter()
        .map(|row| (row.get(0), row.get(1), row.get(2)))
        .collect()
}

#[rstest]
fn concurrent_claims_have_exactly_one_winner(repo_context: Option<TestContext>) {
    let Some(context) = repo_context else {
        eprintln!("SKIP-TEST-CLUSTER: concurrent_claims_have_exactly_one_winner skipped");
        return;
    };
    let (linkup, invitees) = seed_invited_linkup(&context, CONTENDERS);

    let outcomes = context.runtime.block_on(async {
        let barrier = Arc::new(Barrier::new(CONTENDERS));
        let handles: Vec<_> = invitees
            .iter()
            .copied()
            .map(|joiner| {
                let repository = context.repository.clone();
                let barrier = Arc::clone(&barrier);
                let linkup_id = linkup.id;
                tokio::spawn(async move {
                    barrier.wait().await;
                    let outcome = repository
                        .claim_second_participant(&linkup_id, &joiner)
                        .await
                        .expect("claim should not error");
                    (joiner, outcome)
                })
            })
            .collect();

        let mut outcomes = Vec::with_capacity(handles.len());
        for handle in handles {
            outcomes.push(handle.await.expect("claim task should not panic"));
        }
        outcomes
    });

    let winners: Vec<UserId> = outcomes
        .iter()
        .filter(|(_, outcome)| *outcome == ClaimOutcome::Claimed)
        .map(|(joiner, _)| *joiner)
        .collect();
    assert_eq!(winners.len(), 1, "outcomes: {outcomes:?}");

    let stored = context
        .runtime
        .block_on(context.repository.find_linkup(&linkup.id))
        .expect("find linkup")
        .expect("linkup still exists");
    assert_eq!(stored.second_participant, Some(winners[0]));
}

#[rstest]
fn winning_claim_revokes_other_invitations(repo_context: Option<TestContext>) {
    let Some(context) = repo_context else {
        eprintln!("SKIP-TEST-CLUSTER: winning_claim_revokes_other_invitations skipped");
        return;
    };
    let (linkup, invitees) = seed_invited_linkup(&context, 3);
    let winner = invitees[1];

    let outcome = context
        .runtime
        .block_on(context.repository.claim_second_participant(&linkup.id, &winner))
        .expect("claim");
    assert_eq!(outcome, ClaimOutcome::Claimed);

    let rows = invitation_rows(&context.database_url, &linkup.id);
    assert_eq!(
        rows,
        vec![(*linkup.id.as_uuid(), *winner.as_uuid(), "going".to_owned())]
    );

    let invitations = context
        .runtime
        .block_on(context.repository.list_invitations(&linkup.id))
        .expect("list invitations");
    assert_eq!(invitations.len(), 1);
    assert_eq!(invitations[0].user_id, winner);
    assert_eq!(invitations[0].status, AttendanceStatus::Going);

    let late = context
        .runtime
        .block_on(
            context
                .repository
                .claim_second_participant(&linkup.id, &invitees[0]),
        )
        .expect("late claim");
    assert_eq!(late, ClaimOutcome::Lost);
    assert_eq!(invitation_rows(&context.database_url, &linkup.id), rows);
}

#[rstest]
fn cancelling_a_confirmed_linkup_changes_nothing(repo_context: Option<TestContext>) {
    let Some(context) = repo_context else {
        eprintln!("SKIP-TEST-CLUSTER: cancelling_a_confirmed_linkup_changes_nothing skipped");
        return;
    };
    let (linkup, invitees) = seed_invited_linkup(&context, 2);
    let claimed = context
        .runtime
        .block_on(
            context
                .repository
                .claim_second_participant(&linkup.id, &invitees[0]),
        )
        .expect("claim");
    assert_eq!(claimed, ClaimOutcome::Claimed);

    let linkups_before = linkup_rows(&context.database_url);
    let invitations_before = invitation_rows(&context.database_url, &linkup.id);

    let outcome = context
        .runtime
        .block_on(
            context
                .repository
                .delete_searching_linkup(&linkup.id, &linkup.initiator),
        )
        .expect("cancel");
    assert_eq!(outcome, CancelOutcome::Confirmed);

    assert_eq!(linkup_rows(&context.database_url), linkups_before);
    assert_eq!(
        invitation_rows(&context.database_url, &linkup.id),
        invitations_before
    );
}

#[rstest]
fn cancel_by_a_stranger_is_refused_and_owner_cancel_cascades(
    repo_context: Option<TestContext>,
) {
    let Some(context) = repo_context else {
        eprintln!(
            "SKIP-TEST-CLUSTER: cancel_by_a_stranger_is_refused_and_owner_cancel_cascades skipped"
        );
        return;
    };
    let (linkup, invitees) = seed_invited_linkup(&context, 2);

    let refused = context
        .runtime
        .block_on(
            context
                .repository
                .delete_searching_linkup(&linkup.id, &invitees[0]),
        )
        .expect("stranger cancel");
    assert_eq!(refused, CancelOutcome::NotInitiator);
    assert_eq!(invitation_rows(&context.database_url, &linkup.id).len(), 2);

    let deleted = context
        .runtime
        .block_on(
            context
                .repository
                .delete_searching_linkup(&linkup.id, &linkup.initiator),
        )
        .expect("owner cancel");
    assert_eq!(deleted, CancelOutcome::Deleted);
    assert!(invitation_rows(&context.database_url, &linkup.id).is_empty());

    let again = context
        .runtime
        .block_on(
            context
                .repository
                .delete_searching_linkup(&linkup.id, &linkup.initiator),
        )
        .expect("repeat cancel");
    assert_eq!(again, CancelOutcome::Missing);
}

#[rstest]
fn reinviting_keeps_a_single_row(repo_context: Option<TestContext>) {
    let Some(context) = repo_context else {
        eprintln!("SKIP-TEST-CLUSTER: reinviting_keeps_a_single_row skipped");
        return;
    };
    let (linkup, invitees) = seed_invited_linkup(&context, 1);
    let invitee = invitees[0];

    let again = context
        .runtime
        .block_on(context.repository.insert_invitation(&linkup.id, &invitee))
        .expect("re-invite");
    assert_eq!(again, InvitationInsert::AlreadyPresent);
    assert_eq!(
        invitation_rows(&context.database_url, &linkup.id),
        vec![(*linkup.id.as_uuid(), *invitee.as_uuid(), "invited".to_owned())]
    );

    context
        .runtime
        .block_on(context.repository.claim_second_participant(&linkup.id, &invitee))
        .expect("claim");
    let after_claim = context
        .runtime
        .block_on(context.repository.insert_invitation(&linkup.id, &invitee))
        .expect("re-invite after claim");
    assert_eq!(after_claim, InvitationInsert::AlreadyPresent);
    assert_eq!(
        invitation_rows(&context.database_url, &linkup.id),
        vec![(*linkup.id.as_uuid(), *invitee.as_uuid(), "going".to_owned())]
    );
}

//! Best-effort invitation fan-out.
//!
//! Every candidate gets its own outcome. One failed insert never blocks the
//! others and nothing is retried; the report tells callers what coverage they
//! actually achieved.

use std::sync::Arc;

use futures_util::stream::{self, StreamExt};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use super::ports::{InvitationInsert, LinkupRepository};
use super::{Candidate, Deadline, FANOUT_CAP, LinkupId, UserId};

/// Concurrent inserts in flight per fan-out.
const FANOUT_CONCURRENCY: usize = 8;

/// What happened to one candidate's invitation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InviteOutcome {
    Invited,
    /// A row for this pair already existed; nothing changed.
    AlreadyInvited,
    Failed { reason: String },
    /// The candidate was the initiator or beyond the cap.
    Skipped,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InviteResult {
    pub user_id: UserId,
    pub outcome: InviteOutcome,
}

/// Per-candidate outcomes of one fan-out, in candidate order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FanoutReport {
    results: Vec<InviteResult>,
}

/// Aggregate counts exposed to clients.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, utoipa::ToSchema)]
pub struct FanoutSummary {
    pub invited: usize,
    pub already_invited: usize,
    pub failed: usize,
}

impl FanoutReport {
    #[must_use]
    pub fn results(&self) -> &[InviteResult] {
        &self.results
    }

    fn count(&self, matches: impl Fn(&InviteOutcome) -> bool) -> usize {
        self.results.iter().filter(|r| matches(&r.outcome)).count()
    }

    #[must_use]
    pub fn summary(&self) -> FanoutSummary {
        FanoutSummary {
            invited: self.count(|o| matches!(o, InviteOutcome::Invited)),
            already_invited: self.count(|o| matches!(o, InviteOutcome::AlreadyInvited)),
            failed: self.count(|o| matches!(o, InviteOutcome::Failed { .. })),
        }
    }

    /// Report for a fan-out that never ran, e.g. when candidate selection
    /// failed.
    #[must_use]
    pub fn empty() -> Self {
        Self::default()
    }
}

impl From<Vec<InviteResult>> for FanoutReport {
    fn from(results: Vec<InviteResult>) -> Self {
        Self { results }
    }
}

/// Turns a candidate list into invitation rows.
pub struct InviteFanout<R> {
    repo: Arc<R>,
}

impl<R> Clone for InviteFanout<R> {
    fn clone(&self) -> Self {
        Self {
            repo: Arc::clone(&self.repo),
        }
    }
}

impl<R: LinkupRepository> InviteFanout<R> {
    pub fn new(repo: Arc<R>) -> Self {
        Self { repo }
    }

    /// Invite each candidate to `linkup_id`.
    ///
    /// The initiator is skipped and at most [`FANOUT_CAP`] inserts are
    /// attempted regardless of what the caller passes in.
    pub async fn fan_out(
        &self,
        linkup_id: LinkupId,
        initiator: UserId,
        candidates: &[Candidate],
        deadline: Deadline,
    ) -> FanoutReport {
        let mut attempted = 0_usize;
        let plan: Vec<(UserId, bool)> = candidates
            .iter()
            .map(|c| {
                let eligible = c.user_id != initiator && attempted < FANOUT_CAP;
                if eligible {
                    attempted += 1;
                }
                (c.user_id, eligible)
            })
            .collect();

        let results: Vec<InviteResult> = stream::iter(plan)
            .map(|(user_id, eligible)| async move {
                let outcome = if eligible {
                    self.invite_one(linkup_id, user_id, deadline).await
                } else {
                    InviteOutcome::Skipped
                };
                InviteResult { user_id, outcome }
            })
            .buffered(FANOUT_CONCURRENCY)
            .collect()
            .await;

        let report = FanoutReport { results };
        let summary = report.summary();
        info!(
            linkup_id = %linkup_id,
            invited = summary.invited,
            already_invited = summary.already_invited,
            failed = summary.failed,
            "invitation fan-out finished"
        );
        report
    }

    async fn invite_one(
        &self,
        linkup_id: LinkupId,
        user_id: UserId,
        deadline: Deadline,
    ) -> InviteOutcome {
        let inserted = deadline
            .bound(
                "invitation insert",
                self.repo.insert_invitation(&linkup_id, &user_id),
            )
            .await;
        match inserted {
            Ok(InvitationInsert::Inserted) => InviteOutcome::Invited,
            Ok(InvitationInsert::AlreadyPresent) => InviteOutcome::AlreadyInvited,
            Err(err) => {
                warn!(
                    linkup_id = %linkup_id,
                    user_id = %user_id,
                    error = %err,
                    "invitation insert failed"
                );
                InviteOutcome::Failed {
                    reason: err.to_string(),
                }
            }
        }
    }
}

//! Candidate selection for invitation fan-out.

use std::collections::HashSet;
use std::sync::Arc;

use super::ports::{LinkupRepository, LinkupRepositoryError};
use super::{Candidate, Coordinate, Deadline, SearchRadius, UserId};

/// Upper bound on invitations created per linkup.
pub const FANOUT_CAP: usize = 50;

/// Picks the nearest eligible users around a linkup origin.
///
/// The store does the spatial work; the selector re-applies the exclusion,
/// radius, ordering, and cap so those guarantees do not depend on any one
/// adapter getting them right.
pub struct CandidateSelector<R> {
    repo: Arc<R>,
    cap: usize,
}

impl<R> Clone for CandidateSelector<R> {
    fn clone(&self) -> Self {
        Self {
            repo: Arc::clone(&self.repo),
            cap: self.cap,
        }
    }
}

impl<R: LinkupRepository> CandidateSelector<R> {
    pub fn new(repo: Arc<R>) -> Self {
        Self {
            repo,
            cap: FANOUT_CAP,
        }
    }

    /// Nearest-first candidates within `radius` of `origin`, never including
    /// `requester` and never more than [`FANOUT_CAP`].
    pub async fn select(
        &self,
        origin: &Coordinate,
        radius: SearchRadius,
        requester: &UserId,
        deadline: Deadline,
    ) -> Result<Vec<Candidate>, LinkupRepositoryError> {
        let rows = deadline
            .bound(
                "candidate selection",
                self.repo.nearby_users(origin, radius, requester, self.cap),
            )
            .await?;
        Ok(refine(rows, requester, radius, self.cap))
    }
}

fn refine(
    mut rows: Vec<Candidate>,
    requester: &UserId,
    radius: SearchRadius,
    cap: usize,
) -> Vec<Candidate> {
    rows.retain(|c| {
        c.user_id != *requester
            && c.distance_meters.is_finite()
            && c.distance_meters <= radius.meters()
    });
    rows.sort_by(|a, b| a.distance_meters.total_cmp(&b.distance_meters));
    let mut seen = HashSet::with_capacity(rows.len());
    rows.retain(|c| seen.insert(c.user_id));
    rows.truncate(cap);
    rows
}

//! Records the location fixes candidate selection depends on.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use mockable::Clock;

use crate::domain::ports::{UserLocationCommand, UserLocationRepository, UserLocationRepositoryError};
use crate::domain::{Coordinate, DEFAULT_STORE_TIMEOUT, Deadline, Error, UserId};

fn map_repository_error(error: UserLocationRepositoryError) -> Error {
    Error::internal(format!("location store error: {error}"))
}

#[derive(Clone)]
pub struct UserLocationService<R> {
    repo: Arc<R>,
    clock: Arc<dyn Clock>,
    store_timeout: Duration,
}

impl<R> UserLocationService<R> {
    pub fn new(repo: Arc<R>, clock: Arc<dyn Clock>) -> Self {
        Self {
            repo,
            clock,
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
impl<R> UserLocationCommand for UserLocationService<R>
where
    R: UserLocationRepository,
{
    async fn report(&self, user: UserId, location: Coordinate) -> Result<(), Error> {
        let at = self.clock.utc();
        Deadline::after(self.store_timeout)
            .bound(
                "location update",
                self.repo.record_fix(&user, &location, at),
            )
            .await
            .map_err(map_repository_error)
    }
}

#[cfg(test)]
mod tests {
    use chrono::{DateTime, Local, TimeZone, Utc};
    use rstest::rstest;

    use super::*;
    use crate::domain::ErrorCode;
    use crate::domain::ports::MockUserLocationRepository;

    struct FixtureClock(DateTime<Utc>);

    impl Clock for FixtureClock {
        fn local(&self) -> DateTime<Local> {
            self.0.with_timezone(&Local)
        }

        fn utc(&self) -> DateTime<Utc> {
            self.0
        }
    }

    fn clock() -> Arc<dyn Clock> {
        let now = Utc
            .with_ymd_and_hms(2026, 3, 14, 9, 0, 0)
            .single()
            .expect("valid timestamp");
        Arc::new(FixtureClock(now))
    }

    #[rstest]
    #[tokio::test]
    async fn report_stamps_fix_with_clock_time() {
        let user = UserId::random();
        let here = Coordinate::new(42.28, -83.74).expect("valid");
        let expected_at = clock().utc();
        let mut repo = MockUserLocationRepository::new();
        repo.expect_record_fix()
            .withf(move |u, loc, at| *u == user && *loc == here && *at == expected_at)
            .times(1)
            .return_once(|_, _, _| Ok(()));

        UserLocationService::new(Arc::new(repo), clock())
            .report(user, here)
            .await
            .expect("report succeeds");
    }

    #[rstest]
    #[tokio::test]
    async fn store_failures_are_internal_errors() {
        let mut repo = MockUserLocationRepository::new();
        repo.expect_record_fix()
            .return_once(|_, _, _| Err(UserLocationRepositoryError::connection("refused")));

        let err = UserLocationService::new(Arc::new(repo), clock())
            .report(UserId::random(), Coordinate::new(0.0, 0.0).expect("valid"))
            .await
            .expect_err("store failure surfaces");
        assert_eq!(err.code(), ErrorCode::InternalError);
    }
}

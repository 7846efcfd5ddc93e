//! Request-scoped deadline shared by every store call of one operation.

use std::future::Future;
use std::time::Duration;

use tokio::time::{Instant, timeout_at};

use super::ports::{LinkupRepositoryError, UserLocationRepositoryError};

/// Port errors that can represent an elapsed deadline.
pub trait DeadlineError {
    fn elapsed(operation: &str) -> Self;
}

impl DeadlineError for LinkupRepositoryError {
    fn elapsed(operation: &str) -> Self {
        Self::timeout(operation)
    }
}

impl DeadlineError for UserLocationRepositoryError {
    fn elapsed(operation: &str) -> Self {
        Self::timeout(operation)
    }
}

/// Instant by which an operation's store work must finish.
///
/// Dropping an in-flight transaction future on expiry discards its pooled
/// connection, which rolls the transaction back server side.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Deadline(Instant);

impl Deadline {
    /// Deadline `budget` from now.
    #[must_use]
    pub fn after(budget: Duration) -> Self {
        Self(Instant::now() + budget)
    }

    #[must_use]
    pub fn remaining(&self) -> Duration {
        self.0.saturating_duration_since(Instant::now())
    }

    /// Await `fut`, failing with a timeout error naming `operation` once the
    /// deadline passes.
    pub async fn bound<F, T, E>(&self, operation: &str, fut: F) -> Result<T, E>
    where
        F: Future<Output = Result<T, E>>,
        E: DeadlineError,
    {
        timeout_at(self.0, fut)
            .await
            .unwrap_or_else(|_| Err(E::elapsed(operation)))
    }
}

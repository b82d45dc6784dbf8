//! Cancellation and deadlines for terminal `exec` calls.

use crate::errors::DbError;
use std::future::Future;
use std::time::Duration;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

/// Carries a cancellation token and an optional deadline into one backend call.
#[derive(Debug, Clone, Default)]
pub struct Context {
    token: CancellationToken,
    deadline: Option<Instant>,
}

impl Context {
    /// A context that is never canceled and has no deadline.
    #[must_use]
    pub fn background() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_timeout(timeout: Duration) -> Self {
        Self { token: CancellationToken::new(), deadline: Some(Instant::now() + timeout) }
    }

    #[must_use]
    pub fn with_deadline(deadline: Instant) -> Self {
        Self { token: CancellationToken::new(), deadline: Some(deadline) }
    }

    /// Child context: canceled with its parent; the tighter deadline applies.
    #[must_use]
    pub fn child(&self, timeout: Option<Duration>) -> Self {
        let own = timeout.map(|t| Instant::now() + t);
        let deadline = match (self.deadline, own) {
            (Some(a), Some(b)) => Some(a.min(b)),
            (a, b) => a.or(b),
        };
        Self { token: self.token.child_token(), deadline }
    }

    pub fn cancel(&self) {
        self.token.cancel();
    }

    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.token.is_cancelled()
    }

    #[must_use]
    pub const fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    #[must_use]
    pub const fn token(&self) -> &CancellationToken {
        &self.token
    }

    /// Drives `fut` until it completes, the token fires, or the deadline passes.
    ///
    /// The future is dropped on cancellation, aborting the in-flight call.
    pub async fn run<F, T>(&self, fut: F) -> Result<T, DbError>
    where
        F: Future<Output = Result<T, DbError>>,
    {
        if self.token.is_cancelled() {
            return Err(DbError::Canceled);
        }
        if self.deadline.is_some_and(|dl| Instant::now() >= dl) {
            return Err(DbError::TimedOut);
        }

        match self.deadline {
            Some(deadline) => tokio::select! {
                biased;
                () = self.token.cancelled() => Err(DbError::Canceled),
                res = tokio::time::timeout_at(deadline, fut) => res.unwrap_or_else(|_| Err(DbError::TimedOut)),
            },
            None => tokio::select! {
                biased;
                () = self.token.cancelled() => Err(DbError::Canceled),
                res = fut => res,
            },
        }
    }
}

//! # Check Context
//!
//! Cancellation signal plus optional deadline passed to every resolver call.
//!
//! Deadlines nest: a child created with [`CheckContext::with_timeout`] keeps the
//! tighter of its parent's deadline and its own, so a per-request timeout can
//! only shorten the run-wide budget. Cancelling a parent cancels its children;
//! a child never cancels its parent.

use crate::checks::errors::ResolveError;
use std::future::Future;
use std::time::Duration;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

#[derive(Debug, Clone, Default)]
pub struct CheckContext {
    token: CancellationToken,
    deadline: Option<Instant>,
}

impl CheckContext {
    /// Context that is never cancelled and has no deadline
    pub fn new() -> Self {
        Self::default()
    }

    /// Context driven by an existing cancellation token
    pub fn with_cancellation(token: CancellationToken) -> Self {
        Self {
            token,
            deadline: None,
        }
    }

    /// Child context whose deadline is at most `timeout` from now.
    ///
    /// A timeout too large to represent as an instant adds no deadline, so the
    /// child keeps its parent's.
    pub fn with_timeout(&self, timeout: Duration) -> Self {
        let deadline = match (self.deadline, Instant::now().checked_add(timeout)) {
            (Some(current), Some(candidate)) => Some(current.min(candidate)),
            (current, candidate) => current.or(candidate),
        };
        Self {
            token: self.token.child_token(),
            deadline,
        }
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    pub fn cancellation_token(&self) -> &CancellationToken {
        &self.token
    }

    /// Cancel this context and every child derived from it
    pub fn cancel(&self) {
        self.token.cancel();
    }

    pub fn is_done(&self) -> bool {
        self.err().is_some()
    }

    /// Why the context is done, if it is
    pub fn err(&self) -> Option<ResolveError> {
        if self.token.is_cancelled() {
            return Some(ResolveError::Cancelled);
        }
        match self.deadline {
            Some(deadline) if Instant::now() >= deadline => Some(ResolveError::DeadlineExceeded),
            _ => None,
        }
    }

    /// Completes once the context is cancelled or its deadline passes
    pub async fn done(&self) {
        match self.deadline {
            Some(deadline) => {
                tokio::select! {
                    _ = self.token.cancelled() => {}
                    _ = tokio::time::sleep_until(deadline) => {}
                }
            }
            None => self.token.cancelled().await,
        }
    }

    /// Races `fut` against the context; the context wins ties
    pub async fn run<T, F>(&self, fut: F) -> Result<T, ResolveError>
    where
        F: Future<Output = Result<T, ResolveError>>,
    {
        tokio::select! {
            biased;
            _ = self.done() => Err(self.done_error()),
            result = fut => result,
        }
    }

    /// Sleeps for `duration` unless the context finishes first
    pub async fn sleep(&self, duration: Duration) -> Result<(), ResolveError> {
        self.run(async {
            tokio::time::sleep(duration).await;
            Ok(())
        })
        .await
    }

    fn done_error(&self) -> ResolveError {
        self.err().unwrap_or(ResolveError::DeadlineExceeded)
    }
}

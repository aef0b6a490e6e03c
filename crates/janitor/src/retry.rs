//! Bounded retry for store mutations.
//!
//! Each mutation (label, close, comment, lock) gets its own
//! [`RetryExecutor::execute`] call. Failures are retried up to a fixed number
//! of attempts with a delay from the configured [`Backoff`]; the first attempt
//! runs immediately. Both the backoff and the sleep are injectable so tests
//! never wait on a real timer.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tracing::warn;

use crate::{JanitorError, StoreError};

/// Attempts made for a single mutation before giving up.
pub const DEFAULT_MAX_ATTEMPTS: u32 = 5;

/// Computes how long to wait after a failed attempt.
pub trait Backoff: Send + Sync {
    /// `attempt` is the zero-based index of the attempt that just failed.
    fn delay(&self, attempt: u32) -> Duration;
}

/// Waits `step × attempt` after each failure: 0 s, 1 s, 2 s, ... with a 1 s step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LinearBackoff {
    step: Duration,
}

impl LinearBackoff {
    pub fn new(step: Duration) -> Self {
        Self { step }
    }
}

impl Default for LinearBackoff {
    fn default() -> Self {
        Self::new(Duration::from_secs(1))
    }
}

impl Backoff for LinearBackoff {
    fn delay(&self, attempt: u32) -> Duration {
        self.step.saturating_mul(attempt)
    }
}

/// Suspends the current task for a duration.
#[async_trait]
pub trait Sleeper: Send + Sync {
    async fn sleep(&self, duration: Duration);
}

/// Sleeps on the tokio timer.
#[derive(Debug, Clone, Copy, Default)]
pub struct TokioSleeper;

#[async_trait]
impl Sleeper for TokioSleeper {
    async fn sleep(&self, duration: Duration) {
        tokio::time::sleep(duration).await;
    }
}

/// Runs one mutation with bounded retry.
pub struct RetryExecutor {
    max_attempts: u32,
    backoff: Box<dyn Backoff>,
    sleeper: Arc<dyn Sleeper>,
}

impl RetryExecutor {
    /// Creates an executor. A `max_attempts` of zero is treated as one.
    pub fn new(max_attempts: u32, backoff: Box<dyn Backoff>, sleeper: Arc<dyn Sleeper>) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            backoff,
            sleeper,
        }
    }

    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    /// Calls `mutation` until it succeeds or the attempt bound is reached.
    ///
    /// `operation` names the mutation in progress lines and in the returned
    /// [`JanitorError::MutationError`], which carries the last failure.
    pub async fn execute<F, Fut>(
        &self,
        operation: &str,
        mut mutation: F,
    ) -> Result<(), JanitorError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<(), StoreError>>,
    {
        let mut attempt = 0;
        loop {
            let error = match mutation().await {
                Ok(()) => return Ok(()),
                Err(error) => error,
            };

            let attempts = attempt + 1;
            if attempts >= self.max_attempts {
                return Err(JanitorError::MutationError {
                    operation: operation.to_string(),
                    attempts,
                    source: error,
                });
            }

            let delay = self.backoff.delay(attempt);
            warn!(
                operation,
                attempt = attempts,
                max_attempts = self.max_attempts,
                delay_secs = delay.as_secs_f64(),
                %error,
                "Mutation failed (retrying)"
            );
            self.sleeper.sleep(delay).await;
            attempt = attempts;
        }
    }
}

impl Default for RetryExecutor {
    fn default() -> Self {
        Self::new(
            DEFAULT_MAX_ATTEMPTS,
            Box::new(LinearBackoff::default()),
            Arc::new(TokioSleeper),
        )
    }
}

impl std::fmt::Debug for RetryExecutor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RetryExecutor")
            .field("max_attempts", &self.max_attempts)
            .finish_non_exhaustive()
    }
}

//! Retry policies for query and mutation functions.

use std::future::Future;
use std::time::Duration;

use tracing::warn;

/// Backoff strategy between retry attempts.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum BackoffStrategy {
    /// No delay between retries.
    #[default]
    None,
    /// Fixed delay between retries.
    Fixed(Duration),
    /// Exponential backoff with base and max.
    Exponential {
        /// Initial delay.
        base: Duration,
        /// Maximum delay.
        max: Duration,
    },
}

impl BackoffStrategy {
    /// Calculate delay for a given attempt number (0-indexed).
    pub fn delay_for_attempt(&self, attempt: u32) -> Duration {
        match self {
            Self::None => Duration::ZERO,
            Self::Fixed(d) => *d,
            Self::Exponential { base, max } => {
                let multiplier = 2u32.saturating_pow(attempt);
                std::cmp::min(base.saturating_mul(multiplier), *max)
            }
        }
    }
}

/// How many times a failed fetch is re-run, and how long to wait in between.
///
/// Any error triggers a retry; the cache cannot tell transport failures from
/// application errors.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Maximum number of retries after the first attempt.
    pub max_retries: u32,
    /// Backoff strategy.
    pub backoff: BackoffStrategy,
}

impl RetryPolicy {
    /// Retry up to `max_retries` times with exponential backoff.
    pub fn new(max_retries: u32) -> Self {
        Self {
            max_retries,
            backoff: BackoffStrategy::Exponential {
                base: Duration::from_millis(50),
                max: Duration::from_secs(30),
            },
        }
    }

    /// Create a policy with no retries.
    pub fn none() -> Self {
        Self::default()
    }

    /// Set backoff strategy.
    pub fn with_backoff(mut self, strategy: BackoffStrategy) -> Self {
        self.backoff = strategy;
        self
    }

    /// Whether a failure on `attempt` (0-indexed) should be retried.
    pub fn should_retry(&self, attempt: u32) -> bool {
        attempt < self.max_retries
    }

    /// Run `f` until it succeeds or the policy gives up.
    ///
    /// Returns the last error and the number of failures seen.
    pub async fn run<T, E, F, Fut>(&self, mut f: F) -> Result<T, (E, u32)>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, E>>,
        E: std::fmt::Debug,
    {
        let mut attempt = 0;
        loop {
            match f().await {
                Ok(value) => return Ok(value),
                Err(err) if self.should_retry(attempt) => {
                    let delay = self.backoff.delay_for_attempt(attempt);
                    warn!(attempt, ?delay, error = ?err, "Fetch failed, retrying");
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
                Err(err) => return Err((err, attempt + 1)),
            }
        }
    }
}

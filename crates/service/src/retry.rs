//! Retry policy and the retrying transport decorator.
//!
//! A [`RetryPolicy`] is a plain value: attempt budget, exponential backoff
//! bounds, jitter, and the predicate that decides which failures are worth
//! another attempt. [`RetryingTransport`] applies it around any
//! [`Transport`], so the policy is injected where the transport is built
//! rather than attached to individual call sites.

use std::time::Duration;

use async_trait::async_trait;
use search::{HttpMethod, QueryParams, Retryability, Transport, TransportError};
use serde_json::Value;
use tracing::{debug, warn};

pub const DEFAULT_MAX_ATTEMPTS: u32 = 5;
pub const DEFAULT_BASE_DELAY: Duration = Duration::from_secs(1);
pub const DEFAULT_MAX_DELAY: Duration = Duration::from_secs(10);

/// Decides whether a failure may be retried.
pub type RetryClassifier = fn(&TransportError) -> Retryability;

/// When and how often to retry a failed call.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    max_attempts: u32,
    base_delay: Duration,
    max_delay: Duration,
    jitter: bool,
    classify: RetryClassifier,
}

impl Default for RetryPolicy {
    /// 5 attempts, 1s doubling to a 10s cap, jitter on, transient failures
    /// retried.
    fn default() -> Self {
        Self {
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            base_delay: DEFAULT_BASE_DELAY,
            max_delay: DEFAULT_MAX_DELAY,
            jitter: true,
            classify: TransportError::retryability,
        }
    }
}

impl RetryPolicy {
    /// A single attempt; nothing is retried.
    pub fn none() -> Self {
        Self::default().with_max_attempts(1)
    }

    /// Total attempts including the first. Zero is treated as one.
    pub fn with_max_attempts(mut self, max_attempts: u32) -> Self {
        self.max_attempts = max_attempts.max(1);
        self
    }

    pub fn with_backoff(mut self, base_delay: Duration, max_delay: Duration) -> Self {
        self.base_delay = base_delay;
        self.max_delay = max_delay.max(base_delay);
        self
    }

    pub fn with_jitter(mut self, jitter: bool) -> Self {
        self.jitter = jitter;
        self
    }

    pub fn with_classifier(mut self, classify: RetryClassifier) -> Self {
        self.classify = classify;
        self
    }

    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    pub fn classify(&self, err: &TransportError) -> Retryability {
        (self.classify)(err)
    }

    /// Delay before the attempt following failed attempt `attempt` (1-based).
    ///
    /// `base * 2^(attempt-1)`, capped at `max_delay`, plus up to a quarter of
    /// that as jitter. A server hint (`Retry-After`) raises the floor.
    pub fn delay_for(&self, attempt: u32, hint: Option<Duration>) -> Duration {
        let exp = 2u32.saturating_pow(attempt.saturating_sub(1));
        let capped = self.base_delay.saturating_mul(exp).min(self.max_delay);
        let jitter = if self.jitter {
            let quarter = u64::try_from(capped.as_millis()).unwrap_or(u64::MAX) / 4;
            Duration::from_millis(rand::random::<u64>() % quarter.saturating_add(1))
        } else {
            Duration::ZERO
        };
        let delay = capped.saturating_add(jitter);
        match hint {
            Some(floor) if floor > delay => floor,
            _ => delay,
        }
    }
}

/// Wraps a transport and retries failures its policy classifies as
/// retryable.
///
/// Exhausting the attempt budget yields [`TransportError::RetryExhausted`]
/// carrying the last failure; a non-retryable failure is returned as-is after
/// the attempt that produced it. Dropping the future during a backoff sleep
/// abandons the loop before the next attempt starts.
#[derive(Debug, Clone)]
pub struct RetryingTransport<T> {
    inner: T,
    policy: RetryPolicy,
}

impl<T: Transport> RetryingTransport<T> {
    pub fn new(inner: T, policy: RetryPolicy) -> Self {
        Self { inner, policy }
    }

    pub fn policy(&self) -> &RetryPolicy {
        &self.policy
    }

    pub fn inner(&self) -> &T {
        &self.inner
    }
}

#[async_trait]
impl<T: Transport> Transport for RetryingTransport<T> {
    async fn execute(
        &self,
        method: HttpMethod,
        path: &str,
        query: &QueryParams,
        body: Option<&Value>,
    ) -> Result<Value, TransportError> {
        let mut attempt = 0;
        loop {
            attempt += 1;
            let err = match self.inner.execute(method, path, query, body).await {
                Ok(value) => {
                    if attempt > 1 {
                        debug!(%method, path, attempt, "request succeeded after retry");
                    }
                    return Ok(value);
                }
                Err(err) => err,
            };

            let after = match self.policy.classify(&err) {
                Retryability::NonRetryable => {
                    warn!(%method, path, attempt, error = %err, "request failed permanently");
                    return Err(err);
                }
                Retryability::Retryable { after } => after,
            };

            if attempt >= self.policy.max_attempts {
                warn!(%method, path, attempts = attempt, error = %err, "retry budget exhausted");
                return Err(TransportError::RetryExhausted {
                    attempts: attempt,
                    last: Box::new(err),
                });
            }

            let delay = self.policy.delay_for(attempt, after);
            warn!(%method, path, attempt, ?delay, error = %err, "transient failure, retrying");
            tokio::time::sleep(delay).await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn no_jitter() -> RetryPolicy {
        RetryPolicy::default().with_jitter(false)
    }

    #[test]
    fn delays_double_and_cap() {
        let policy = no_jitter();
        assert_eq!(policy.delay_for(1, None), Duration::from_secs(1));
        assert_eq!(policy.delay_for(2, None), Duration::from_secs(2));
        assert_eq!(policy.delay_for(3, None), Duration::from_secs(4));
        assert_eq!(policy.delay_for(4, None), Duration::from_secs(8));
        assert_eq!(policy.delay_for(5, None), Duration::from_secs(10));
        assert_eq!(policy.delay_for(40, None), Duration::from_secs(10));
    }

    #[test]
    fn jitter_stays_within_a_quarter() {
        let policy = RetryPolicy::default();
        for attempt in 1..=6 {
            let base = no_jitter().delay_for(attempt, None);
            for _ in 0..50 {
                let delay = policy.delay_for(attempt, None);
                assert!(delay >= base);
                assert!(delay <= base + base / 4);
            }
        }
    }

    #[test]
    fn server_hint_raises_the_floor() {
        let policy = no_jitter();
        assert_eq!(
            policy.delay_for(1, Some(Duration::from_secs(30))),
            Duration::from_secs(30)
        );
        assert_eq!(
            policy.delay_for(3, Some(Duration::from_millis(10))),
            Duration::from_secs(4)
        );
    }

    #[test]
    fn huge_backoff_saturates_instead_of_overflowing() {
        let policy = RetryPolicy::default().with_backoff(Duration::MAX, Duration::MAX);
        assert_eq!(policy.delay_for(1, None), Duration::MAX);
        assert_eq!(policy.delay_for(u32::MAX, None), Duration::MAX);
        assert_eq!(policy.delay_for(3, Some(Duration::from_secs(1))), Duration::MAX);

        let exact = policy.with_jitter(false);
        assert_eq!(exact.delay_for(2, None), Duration::MAX);
    }

    #[test]
    fn zero_attempts_means_one() {
        assert_eq!(RetryPolicy::default().with_max_attempts(0).max_attempts(), 1);
        assert_eq!(RetryPolicy::none().max_attempts(), 1);
    }

    #[test]
    fn default_classifier_follows_transport_error() {
        let policy = RetryPolicy::default();
        let transient = TransportError::from_status(503, "busy", None);
        let permanent = TransportError::from_status(400, "bad", None);
        assert_eq!(policy.classify(&transient), Retryability::Retryable { after: None });
        assert_eq!(policy.classify(&permanent), Retryability::NonRetryable);
    }
}

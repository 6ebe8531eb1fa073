//! Bounded retries with exponential backoff around any [`Fetch`] implementation.
//!
//! Page requests are idempotent GETs, so transient failures (transport errors,
//! timeouts, 5xx, 429) are retried. Other 4xx answers are permanent and
//! returned right away.

use std::time::Duration;

use async_trait::async_trait;
use rand::Rng;
use tracing::{debug, warn};

use crate::request::Fetch;
use crate::{Error, Result};

pub const DEFAULT_MAX_ATTEMPTS: u32 = 3;
const DEFAULT_BASE_DELAY: Duration = Duration::from_secs(1);
const DEFAULT_MAX_DELAY: Duration = Duration::from_secs(32);
const DEFAULT_MULTIPLIER: f64 = 2.0;
const MAX_JITTER_MS: u64 = 250;
/// Keeps `base_delay * multiplier^n` far away from `Duration` overflow.
const MAX_EXPONENT: u32 = 16;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureType {
    Transient,
    Permanent,
}

pub fn classify(err: &Error) -> FailureType {
    match err {
        Error::Network { status: None, .. } | Error::Network { timeout: true, .. } => {
            FailureType::Transient
        }
        Error::Network {
            status: Some(code), ..
        } if *code >= 500 || *code == 429 => FailureType::Transient,
        _ => FailureType::Permanent,
    }
}

#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// Attempts including the first one, never below 1.
    max_attempts: u32,
    base_delay: Duration,
    max_delay: Duration,
    multiplier: f64,
    jitter: bool,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            base_delay: DEFAULT_BASE_DELAY,
            max_delay: DEFAULT_MAX_DELAY,
            multiplier: DEFAULT_MULTIPLIER,
            jitter: true,
        }
    }
}

impl RetryPolicy {
    pub fn new(max_attempts: u32, base_delay: Duration, max_delay: Duration) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            base_delay,
            max_delay,
            ..Self::default()
        }
    }

    /// A single attempt, no retries.
    pub fn none() -> Self {
        Self::new(1, Duration::ZERO, Duration::ZERO)
    }

    pub fn without_jitter(mut self) -> Self {
        self.jitter = false;
        self
    }

    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    /// Delay before the next attempt, or `None` if `attempt` (1-indexed) was the last one
    /// or the failure isn't worth retrying.
    pub fn next_delay(&self, failure: FailureType, attempt: u32) -> Option<Duration> {
        if failure == FailureType::Permanent || attempt >= self.max_attempts {
            return None;
        }
        let exponent = attempt.saturating_sub(1).min(MAX_EXPONENT) as i32;
        let factor = self.multiplier.powi(exponent);
        let backoff = Duration::try_from_secs_f64(self.base_delay.as_secs_f64() * factor)
            .unwrap_or(Duration::MAX)
            .min(self.max_delay);
        let jitter = if self.jitter && !backoff.is_zero() {
            Duration::from_millis(rand::thread_rng().gen_range(0..=MAX_JITTER_MS))
        } else {
            Duration::ZERO
        };
        Some(backoff.saturating_add(jitter))
    }
}

/// Wraps a fetcher so transient failures are retried according to a [`RetryPolicy`].
pub struct Retrying<F> {
    inner: F,
    policy: RetryPolicy,
}

impl<F: Fetch> Retrying<F> {
    pub fn new(inner: F, policy: RetryPolicy) -> Self {
        Self { inner, policy }
    }
}

#[async_trait]
impl<F: Fetch> Fetch for Retrying<F> {
    async fn fetch(&self, page_num: u32) -> Result<String> {
        let mut attempt = 1;
        loop {
            let err = match self.inner.fetch(page_num).await {
                Ok(html) => return Ok(html),
                Err(e) => e,
            };

            let failure = classify(&err);
            match self.policy.next_delay(failure, attempt) {
                Some(delay) => {
                    warn!(
                        page = page_num,
                        attempt,
                        delay_ms = delay.as_millis() as u64,
                        error = %err,
                        "page request failed, retrying"
                    );
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
                None => {
                    debug!(page = page_num, attempt, ?failure, "giving up on page");
                    return Err(err);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicU32, Ordering};

    use super::*;

    fn network(status: Option<u16>) -> Error {
        Error::Network {
            page: 1,
            status,
            message: "boom".into(),
            timeout: false,
        }
    }

    #[test]
    fn classifies_failures() {
        assert_eq!(classify(&network(None)), FailureType::Transient);
        assert_eq!(classify(&network(Some(503))), FailureType::Transient);
        assert_eq!(classify(&network(Some(429))), FailureType::Transient);
        assert_eq!(classify(&network(Some(404))), FailureType::Permanent);
        assert_eq!(
            classify(&Error::Selector("div".into())),
            FailureType::Permanent
        );
    }

    #[test]
    fn backoff_doubles_up_to_the_cap() {
        let policy =
            RetryPolicy::new(5, Duration::from_secs(1), Duration::from_secs(3)).without_jitter();
        let t = FailureType::Transient;
        assert_eq!(policy.next_delay(t, 1), Some(Duration::from_secs(1)));
        assert_eq!(policy.next_delay(t, 2), Some(Duration::from_secs(2)));
        assert_eq!(policy.next_delay(t, 3), Some(Duration::from_secs(3)));
        assert_eq!(policy.next_delay(t, 5), None);
        assert_eq!(policy.next_delay(FailureType::Permanent, 1), None);
        assert_eq!(RetryPolicy::none().next_delay(t, 1), None);
    }

    #[test]
    fn backoff_never_overflows() {
        let policy = RetryPolicy::new(40, Duration::MAX, Duration::MAX);
        assert_eq!(
            policy.next_delay(FailureType::Transient, 30),
            Some(Duration::MAX)
        );
    }

    struct Flaky {
        calls: AtomicU32,
        fail_first: u32,
        status: Option<u16>,
    }

    #[async_trait]
    impl Fetch for Flaky {
        async fn fetch(&self, page_num: u32) -> Result<String> {
            let call = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
            if call <= self.fail_first {
                return Err(Error::Network {
                    page: page_num,
                    status: self.status,
                    message: "flaky".into(),
                    timeout: false,
                });
            }
            Ok(format!("page {page_num}"))
        }
    }

    #[tokio::test]
    async fn retries_transient_failures() {
        let fetcher = Retrying::new(
            Flaky {
                calls: AtomicU32::new(0),
                fail_first: 2,
                status: Some(502),
            },
            RetryPolicy::new(3, Duration::ZERO, Duration::ZERO),
        );
        assert_eq!(fetcher.fetch(4).await.unwrap(), "page 4");
        assert_eq!(fetcher.inner.calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn permanent_failures_are_not_retried() {
        let fetcher = Retrying::new(
            Flaky {
                calls: AtomicU32::new(0),
                fail_first: 5,
                status: Some(404),
            },
            RetryPolicy::new(3, Duration::ZERO, Duration::ZERO),
        );
        let err = fetcher.fetch(2).await.unwrap_err();
        assert_eq!(err.page(), Some(2));
        assert_eq!(fetcher.inner.calls.load(Ordering::SeqCst), 1);
    }
}

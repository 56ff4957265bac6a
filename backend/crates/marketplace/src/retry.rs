//! Iterative retry with backoff, shared by every component that talks to the
//! marketplace or the database.
//!
//! Two delay shapes are in use:
//!
//! | Shape | Delay before retry `n` (0-based) | Used by |
//! |-------|----------------------------------|---------|
//! | [`Backoff::Exponential`] | `base * 2^n + U[0, max_jitter)` | token, order items, products, order persistence |
//! | [`Backoff::RandomRange`] | `U[min, max]` | order feed pages |
//!
//! With `base = 1s`, `max_jitter = 1s` and 4 attempts the waits are roughly
//! 1-2 s, 2-3 s and 4-5 s.

use std::fmt;
use std::future::Future;
use std::time::Duration;

use rand::Rng;
use tokio::time::Instant;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Backoff {
    Exponential { base: Duration, max_jitter: Duration },
    RandomRange { min: Duration, max: Duration },
}

impl Backoff {
    /// Delay to wait before retry number `retry` (0 for the first retry).
    pub fn delay_for_retry(&self, retry: u32) -> Duration {
        match *self {
            Self::Exponential { base, max_jitter } => {
                let exponential = base.saturating_mul(1u32 << retry.min(16));
                exponential.saturating_add(random_up_to(max_jitter))
            }
            Self::RandomRange { min, max } => {
                if max <= min {
                    return min;
                }
                let span_ms = (max - min).as_millis() as u64;
                let offset = rand::thread_rng().gen_range(0..=span_ms);
                min + Duration::from_millis(offset)
            }
        }
    }
}

fn random_up_to(max: Duration) -> Duration {
    let max_ms = max.as_millis() as u64;
    if max_ms == 0 {
        return Duration::ZERO;
    }
    Duration::from_millis(rand::thread_rng().gen_range(0..max_ms))
}

#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// Total attempts including the first one. Treated as at least 1.
    pub max_attempts: u32,
    pub backoff: Backoff,
    /// Give up instead of sleeping past this instant.
    pub deadline: Option<Instant>,
}

impl RetryPolicy {
    pub fn new(max_attempts: u32, backoff: Backoff) -> Self {
        Self {
            max_attempts,
            backoff,
            deadline: None,
        }
    }

    /// `2^n` seconds plus up to one second of jitter.
    pub fn exponential(max_attempts: u32) -> Self {
        Self::new(
            max_attempts,
            Backoff::Exponential {
                base: Duration::from_secs(1),
                max_jitter: Duration::from_secs(1),
            },
        )
    }

    /// No waiting between attempts.
    pub fn immediate(max_attempts: u32) -> Self {
        Self::new(
            max_attempts,
            Backoff::Exponential {
                base: Duration::ZERO,
                max_jitter: Duration::ZERO,
            },
        )
    }

    pub fn with_deadline(mut self, deadline: Option<Instant>) -> Self {
        self.deadline = deadline;
        self
    }
}

/// The operation failed on every permitted attempt.
#[derive(Debug)]
pub struct RetryExhausted<E> {
    pub attempts: u32,
    pub last_error: E,
}

impl<E: fmt::Display> fmt::Display for RetryExhausted<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "gave up after {} attempts: {}",
            self.attempts, self.last_error
        )
    }
}

impl<E: fmt::Debug + fmt::Display> std::error::Error for RetryExhausted<E> {}

/// Run `operation` until it succeeds or `policy` is exhausted.
///
/// Every error is treated as retryable; callers that need fail-fast
/// behaviour should not route those errors through here.
pub async fn with_retry<T, E, F, Fut>(
    policy: &RetryPolicy,
    op_name: &str,
    mut operation: F,
) -> Result<T, RetryExhausted<E>>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: fmt::Display,
{
    let max_attempts = policy.max_attempts.max(1);
    let mut attempt: u32 = 0;

    loop {
        attempt += 1;
        let err = match operation().await {
            Ok(value) => return Ok(value),
            Err(err) => err,
        };

        if attempt >= max_attempts {
            tracing::warn!(op = op_name, attempts = attempt, error = %err, "retries exhausted");
            return Err(RetryExhausted {
                attempts: attempt,
                last_error: err,
            });
        }

        let delay = policy.backoff.delay_for_retry(attempt - 1);
        if let Some(deadline) = policy.deadline {
            if Instant::now() + delay >= deadline {
                tracing::warn!(
                    op = op_name,
                    attempts = attempt,
                    error = %err,
                    "run deadline reached, not retrying"
                );
                return Err(RetryExhausted {
                    attempts: attempt,
                    last_error: err,
                });
            }
        }

        tracing::warn!(
            op = op_name,
            attempt,
            max_attempts,
            delay_ms = delay.as_millis() as u64,
            error = %err,
            "retrying after backoff"
        );
        tokio::time::sleep(delay).await;
    }
}

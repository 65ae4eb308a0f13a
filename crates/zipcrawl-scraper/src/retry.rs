//! Bounded retry with exponential back-off and jitter for locator requests.
//!
//! Every page request runs through [`retry_with_backoff`]. Transport errors,
//! non-2xx statuses, and rejected sessions are retried up to
//! [`RetryPolicy::max_retries`] extra times; anything else is returned at
//! once. An optional [`RetryBudget`] caps the retries a single location may
//! spend across all of its pages.

use std::future::Future;
use std::time::Duration;

use crate::error::ScraperError;

const MAX_DELAY_MS: u64 = 60_000;

/// Per-page retry schedule.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Additional attempts after the first failure. `0` disables retries.
    pub max_retries: u32,
    /// Base delay: the n-th retry waits `backoff_base_ms * 2^(n-1)` ms ± 25 %.
    pub backoff_base_ms: u64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 5,
            backoff_base_ms: 3_000,
        }
    }
}

impl RetryPolicy {
    /// Delay before retry number `attempt` (1-based), before jitter.
    #[must_use]
    pub fn base_delay_ms(&self, attempt: u32) -> u64 {
        let exponent = attempt.saturating_sub(1).min(16);
        self.backoff_base_ms
            .saturating_mul(1u64 << exponent)
            .min(MAX_DELAY_MS)
    }
}

/// Retries left for one location across all of its pages.
#[derive(Debug)]
pub(crate) struct RetryBudget {
    limit: Option<u32>,
    used: u32,
}

impl RetryBudget {
    pub(crate) fn new(limit: Option<u32>) -> Self {
        Self { limit, used: 0 }
    }

    /// Consume one retry; returns `false` when the ceiling is already reached.
    fn take(&mut self) -> bool {
        match self.limit {
            Some(limit) if self.used >= limit => false,
            _ => {
                self.used += 1;
                true
            }
        }
    }
}

/// Result of a retried operation plus the attempts that got an HTTP response.
#[derive(Debug)]
pub(crate) struct Attempted<T> {
    pub result: Result<T, ScraperError>,
    pub responded: u32,
}

/// Returns `true` for errors worth another attempt after a back-off delay.
///
/// **Retriable:** transport failures, non-2xx statuses, rejected sessions.
///
/// **Not retriable:** parse anomalies, deserialization failures, invalid
/// URLs; retrying would yield the same body.
pub(crate) fn is_retriable(err: &ScraperError) -> bool {
    matches!(
        err,
        ScraperError::Http(_)
            | ScraperError::UnexpectedStatus { .. }
            | ScraperError::SessionRejected { .. }
    )
}

/// Runs `operation` until it succeeds, fails with a non-retriable error, or
/// the retry policy or location budget is exhausted.
///
/// | Retry | Sleep before it (base 3 000 ms)  |
/// |-------|----------------------------------|
/// | 1     | 3 000 ms × 2⁰ ± 25 % jitter      |
/// | 2     | 3 000 ms × 2¹ ± 25 % jitter      |
/// | 3     | 3 000 ms × 2² ± 25 % jitter      |
///
/// Delay is capped at 60 s. Exhaustion wraps the last error in
/// [`ScraperError::RetriesExhausted`] or [`ScraperError::RetryBudgetExhausted`].
pub(crate) async fn retry_with_backoff<T, F, Fut>(
    policy: &RetryPolicy,
    budget: &mut RetryBudget,
    mut operation: F,
) -> Attempted<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, ScraperError>>,
{
    let mut attempt = 0u32;
    let mut responded = 0u32;
    loop {
        let err = match operation().await {
            Ok(value) => {
                return Attempted {
                    result: Ok(value),
                    responded: responded + 1,
                }
            }
            Err(err) => err,
        };
        if err.responded() {
            responded += 1;
        }
        if !is_retriable(&err) {
            return Attempted {
                result: Err(err),
                responded,
            };
        }
        if attempt >= policy.max_retries {
            return Attempted {
                result: Err(ScraperError::RetriesExhausted {
                    attempts: attempt + 1,
                    last: Box::new(err),
                }),
                responded,
            };
        }
        if !budget.take() {
            return Attempted {
                result: Err(ScraperError::RetryBudgetExhausted {
                    limit: budget.limit.unwrap_or_default(),
                    last: Box::new(err),
                }),
                responded,
            };
        }

        attempt += 1;
        let capped = policy.base_delay_ms(attempt);
        #[allow(
            clippy::cast_possible_truncation,
            clippy::cast_sign_loss,
            clippy::cast_precision_loss
        )]
        let delay_ms = (capped as f64 * (rand::random::<f64>() * 0.5 + 0.75)) as u64;
        tracing::warn!(
            attempt,
            max_retries = policy.max_retries,
            delay_ms,
            error = %err,
            "locator request failed; retrying after back-off"
        );
        tokio::time::sleep(Duration::from_millis(delay_ms)).await;
    }
}

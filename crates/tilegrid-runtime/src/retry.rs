#![forbid(unsafe_code)]

//! Retry policy for full-replace commits.
//!
//! A failed or timed-out replace is not fatal: the local order stays the
//! presented truth and the same full replace is attempted again. The
//! default policy retries exactly once.
//!
//! # Determinism
//!
//! Delays are pure functions of the attempt number, with no jitter.
//!
//! # Example
//!
//! ```
//! use tilegrid_runtime::retry::{BackoffStrategy, RetryPolicy};
//! use std::time::Duration;
//!
//! let once = RetryPolicy::default();
//! assert_eq!(once.max_retries, 1);
//! assert_eq!(once.worst_case_delay(), Duration::from_millis(250));
//!
//! let doubling = RetryPolicy::new(2, BackoffStrategy::Exponential { base_ms: 50, max_ms: 80 });
//! assert_eq!(doubling.delay(0), Duration::from_millis(50));
//! assert_eq!(doubling.delay(1), Duration::from_millis(80));
//! ```

use serde::{Deserialize, Serialize};
use tilegrid_core::ItemId;
use web_time::Duration;

use crate::commit::CommitStatus;
use crate::store::{OrderStore, UserId};

/// Wait between two attempts of the same commit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum BackoffStrategy {
    /// Same wait every time.
    Fixed { delay_ms: u64 },
    /// `base_ms` doubled per retry, never above `max_ms`.
    Exponential { base_ms: u64, max_ms: u64 },
    /// `base_ms` times the retry number, never above `max_ms`.
    Linear { base_ms: u64, max_ms: u64 },
}

/// How often, and how patiently, a failed full replace is re-sent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RetryPolicy {
    /// Extra attempts after the first; `0` sends once.
    pub max_retries: u32,
    pub backoff: BackoffStrategy,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::single_retry(250)
    }
}

impl RetryPolicy {
    pub fn new(max_retries: u32, backoff: BackoffStrategy) -> Self {
        Self {
            max_retries,
            backoff,
        }
    }

    /// Exactly one retry after a fixed delay.
    pub fn single_retry(delay_ms: u64) -> Self {
        Self::new(1, BackoffStrategy::Fixed { delay_ms })
    }

    /// Single attempt, no retries.
    pub fn no_retry() -> Self {
        Self::new(0, BackoffStrategy::Fixed { delay_ms: 0 })
    }

    /// Wait after failed attempt `attempt` (zero-based).
    pub fn delay(&self, attempt: u32) -> Duration {
        let ms = match self.backoff {
            BackoffStrategy::Fixed { delay_ms } => delay_ms,
            BackoffStrategy::Exponential { base_ms, max_ms } => {
                let factor = 1u64.checked_shl(attempt).unwrap_or(u64::MAX);
                base_ms.saturating_mul(factor).min(max_ms)
            }
            BackoffStrategy::Linear { base_ms, max_ms } => {
                base_ms.saturating_mul(u64::from(attempt) + 1).min(max_ms)
            }
        };
        Duration::from_millis(ms)
    }

    /// Sum of every wait a fully failing commit sleeps through.
    pub fn worst_case_delay(&self) -> Duration {
        (0..self.max_retries).map(|i| self.delay(i)).sum()
    }
}

/// Run one full replace under `policy`.
///
/// Between attempts `superseded` is polled; once a newer order for the same
/// user is waiting, retrying this one is pointless and the commit reports
/// [`CommitStatus::Superseded`].
pub fn replace_with_retry(
    store: &dyn OrderStore,
    user: &UserId,
    order: &[ItemId],
    policy: &RetryPolicy,
    mut superseded: impl FnMut() -> bool,
) -> CommitStatus {
    let mut last_err = String::new();
    for attempt in 0..=policy.max_retries {
        let _span = tracing::debug_span!(
            target: "tilegrid.commit",
            "commit.replace",
            user = %user,
            len = order.len(),
            attempt,
        )
        .entered();

        match store.replace_order(user, order) {
            Ok(()) => {
                tracing::debug!(
                    target: "tilegrid.commit",
                    user = %user,
                    attempts = attempt + 1,
                    "order committed"
                );
                return CommitStatus::Committed {
                    attempts: attempt + 1,
                };
            }
            Err(e) => {
                tracing::warn!(
                    target: "tilegrid.commit",
                    user = %user,
                    attempt,
                    error = %e,
                    "replace_order failed"
                );
                last_err = e.to_string();
            }
        }

        if attempt < policy.max_retries {
            if superseded() {
                return CommitStatus::Superseded;
            }
            std::thread::sleep(policy.delay(attempt));
            if superseded() {
                return CommitStatus::Superseded;
            }
        }
    }

    tracing::error!(
        target: "tilegrid.commit",
        user = %user,
        attempts = policy.max_retries + 1,
        error = %last_err,
        "commit abandoned; local order kept"
    );
    CommitStatus::Failed {
        error: last_err,
        attempts: policy.max_retries + 1,
    }
}

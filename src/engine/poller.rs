//! Fixed-interval status polling.
//!
//! One loop serves both order fills and transfer completion: fetch,
//! stop on the done predicate, otherwise sleep a constant interval and
//! try again until the attempt cap runs out. No backoff.

use std::future::Future;
use std::time::Duration;
use tokio::time::sleep;
use tracing::debug;

use crate::types::RelayError;

/// Interval and attempt cap for one polling loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollPolicy {
    pub interval: Duration,
    pub max_attempts: u32,
}

impl PollPolicy {
    pub const fn new(interval: Duration, max_attempts: u32) -> Self {
        Self {
            interval,
            max_attempts,
        }
    }

    /// 5 s × 10 attempts.
    pub const fn order_fill() -> Self {
        Self::new(Duration::from_secs(5), 10)
    }

    /// 5 s × 120 attempts (about ten minutes).
    pub const fn transfer_completion() -> Self {
        Self::new(Duration::from_secs(5), 120)
    }

    /// Longest time the loop can spend sleeping. Saturates at
    /// `Duration::MAX` rather than overflowing.
    pub fn worst_case(&self) -> Duration {
        self.interval.saturating_mul(self.max_attempts)
    }
}

/// Poll `fetch` until `is_done` accepts its value.
///
/// `fetch` receives the 1-based attempt number. An error from `fetch`
/// ends the loop immediately; there is no retry past a bad response.
/// When the cap runs out the result is `RelayError::Timeout`.
pub async fn poll_until<S, F, Fut, P>(
    policy: PollPolicy,
    what: &str,
    mut fetch: F,
    is_done: P,
) -> Result<S, RelayError>
where
    F: FnMut(u32) -> Fut,
    Fut: Future<Output = Result<S, RelayError>>,
    P: Fn(&S) -> bool,
{
    let mut attempts = 0;
    while attempts < policy.max_attempts {
        let value = fetch(attempts + 1).await?;
        if is_done(&value) {
            debug!(what, attempt = attempts + 1, "Poll reached done state");
            return Ok(value);
        }
        attempts += 1;
        debug!(
            what,
            attempt = attempts,
            max_attempts = policy.max_attempts,
            "Not done yet, sleeping"
        );
        sleep(policy.interval).await;
    }

    Err(RelayError::Timeout {
        what: what.to_string(),
        attempts: policy.max_attempts,
    })
}

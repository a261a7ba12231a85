//! Bounded polling.

use std::fmt::Display;
use std::future::Future;
use std::time::Duration;

use tracing::{debug, trace};

/// How often and how many times to probe.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub interval: Duration,
    /// Total probes, including the first immediate one.
    pub max_attempts: u32,
}

impl RetryPolicy {
    /// Waiting for the page's dynamic content to render.
    pub const PAGE_READY: Self = Self::new(Duration::from_millis(500), 20);

    /// Waiting for one workflow sub-step's target.
    pub const STAGE: Self = Self::new(Duration::from_millis(500), 10);

    pub const fn new(interval: Duration, max_attempts: u32) -> Self {
        Self {
            interval,
            max_attempts,
        }
    }

    /// Time spent suspended when every probe comes back empty.
    pub fn worst_case(&self) -> Duration {
        self.interval * self.max_attempts.saturating_sub(1)
    }
}

/// Probe `locate` until it yields a value or the policy is exhausted.
///
/// The first probe runs immediately and a hit returns without suspending.
/// Between misses the task sleeps for `policy.interval`; there is no sleep
/// after the final miss. A probe that fails counts as a miss. Never panics
/// and never waits longer than [`RetryPolicy::worst_case`] plus probe time.
pub async fn wait_for<T, E, F, Fut>(policy: RetryPolicy, mut locate: F) -> Option<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<Option<T>, E>>,
    E: Display,
{
    for attempt in 1..=policy.max_attempts {
        match locate().await {
            Ok(Some(found)) => {
                trace!(attempt, "Probe succeeded");
                return Some(found);
            }
            Ok(None) => trace!(attempt, "Probe came back empty"),
            Err(e) => debug!(attempt, "Probe failed: {}", e),
        }

        if attempt < policy.max_attempts {
            tokio::time::sleep(policy.interval).await;
        }
    }

    None
}

use std::future::Future;
use std::time::Duration;

/// Fixed delay-then-poll schedule used after creating a remote todo, to
/// ride out the window in which a new issue is missing from listings.
///
/// The schedule is `initial_delay`, then up to `max_attempts` checks
/// separated by `interval`. No backoff, no cancellation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub initial_delay: Duration,
    pub max_attempts: u32,
    pub interval: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            initial_delay: Duration::from_millis(500),
            max_attempts: 3,
            interval: Duration::from_millis(300),
        }
    }
}

impl RetryPolicy {
    /// Never waits and never polls.
    pub fn disabled() -> Self {
        Self {
            initial_delay: Duration::ZERO,
            max_attempts: 0,
            interval: Duration::ZERO,
        }
    }

    /// Run `check` on the schedule until it returns true.
    /// Returns whether it ever did.
    pub async fn poll<F, Fut>(&self, mut check: F) -> bool
    where
        F: FnMut(u32) -> Fut,
        Fut: Future<Output = bool>,
    {
        if self.max_attempts == 0 {
            return false;
        }
        tokio::time::sleep(self.initial_delay).await;
        for attempt in 1..=self.max_attempts {
            if check(attempt).await {
                return true;
            }
            if attempt < self.max_attempts {
                tokio::time::sleep(self.interval).await;
            }
        }
        false
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicU32, Ordering};

    use tokio::time::Instant;

    use super::*;

    #[tokio::test(start_paused = true)]
    async fn gives_up_after_max_attempts() {
        let calls = AtomicU32::new(0);
        let start = Instant::now();
        let found = RetryPolicy::default()
            .poll(|_| {
                calls.fetch_add(1, Ordering::SeqCst);
                async { false }
            })
            .await;
        assert!(!found);
        assert_eq!(calls.load(Ordering::SeqCst), 3);
        // 500ms + 2 * 300ms, no pause after the last attempt
        let elapsed = start.elapsed();
        assert!(elapsed >= Duration::from_millis(1100), "{elapsed:?}");
        assert!(elapsed < Duration::from_millis(1400), "{elapsed:?}");
    }

    #[tokio::test(start_paused = true)]
    async fn stops_at_first_success() {
        let start = Instant::now();
        let found = RetryPolicy::default().poll(|attempt| async move { attempt == 2 }).await;
        assert!(found);
        let elapsed = start.elapsed();
        assert!(elapsed >= Duration::from_millis(800), "{elapsed:?}");
        assert!(elapsed < Duration::from_millis(1100), "{elapsed:?}");
    }

    #[tokio::test(start_paused = true)]
    async fn disabled_policy_does_nothing() {
        let start = Instant::now();
        let found = RetryPolicy::disabled().poll(|_| async { true }).await;
        assert!(!found);
        assert!(start.elapsed() < Duration::from_millis(1));
    }
}

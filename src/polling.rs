//! Caller-side polling cadence
//!
//! The service allows at most a few requests per minute and expects polls
//! to be spaced out. The client itself never waits or retries; these types
//! are what the workflow helpers use to stay inside those limits.

use crate::config::Config;
use crate::constants::{MAX_REQUESTS_PER_WINDOW, MIN_POLL_INTERVAL, RATE_LIMIT_WINDOW};
use std::collections::VecDeque;
use std::time::Duration;
use tokio::time::Instant;

/// Sliding-window request budget
///
/// Tracks the instants of recent requests and tells the caller how long to
/// wait before the next one fits in the window.
#[derive(Debug, Clone)]
pub struct RequestBudget {
    max_requests: usize,
    window: Duration,
    sent: VecDeque<Instant>,
}

impl RequestBudget {
    /// Budget of `max_requests` per `window`
    pub fn new(max_requests: usize, window: Duration) -> Self {
        Self {
            max_requests: max_requests.max(1),
            window,
            sent: VecDeque::new(),
        }
    }

    /// How long until one more request is allowed (zero if allowed now)
    pub fn delay_until_available(&mut self, now: Instant) -> Duration {
        while let Some(oldest) = self.sent.front() {
            if now.duration_since(*oldest) >= self.window {
                self.sent.pop_front();
            } else {
                break;
            }
        }
        if self.sent.len() < self.max_requests {
            return Duration::ZERO;
        }
        match self.sent.front() {
            Some(oldest) => self.window - now.duration_since(*oldest),
            None => Duration::ZERO,
        }
    }

    /// Record a request sent at `now`
    pub fn record(&mut self, now: Instant) {
        self.sent.push_back(now);
    }

    /// Wait until the budget allows one more request, then record it
    pub async fn acquire(&mut self) {
        let delay = self.delay_until_available(Instant::now());
        if !delay.is_zero() {
            tracing::debug!(delay_ms = delay.as_millis() as u64, "Request budget exhausted, waiting");
            tokio::time::sleep(delay).await;
        }
        self.record(Instant::now());
    }
}

impl Default for RequestBudget {
    fn default() -> Self {
        Self::new(MAX_REQUESTS_PER_WINDOW, RATE_LIMIT_WINDOW)
    }
}

/// How a workflow helper polls a resource
#[derive(Debug, Clone)]
pub struct PollPolicy {
    interval: Duration,
    max_attempts: u32,
    budget: RequestBudget,
}

impl PollPolicy {
    /// Policy with the given interval (clamped to the service minimum) and
    /// attempt bound, using the service's default request budget
    pub fn new(interval: Duration, max_attempts: u32) -> Self {
        Self {
            interval: interval.max(MIN_POLL_INTERVAL),
            max_attempts: max_attempts.max(1),
            budget: RequestBudget::default(),
        }
    }

    /// Policy built from the polling section of a `Config`
    pub fn from_config(config: &Config) -> Self {
        Self::new(config.poll_interval(), config.polling.max_attempts)
    }

    /// Replace the request budget
    pub fn with_budget(mut self, budget: RequestBudget) -> Self {
        self.budget = budget;
        self
    }

    /// Spacing between two polls
    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Polls attempted before giving up
    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    /// Wait before poll number `attempt` (1-based): the interval between
    /// polls, then whatever the budget still requires
    pub async fn pace(&mut self, attempt: u32) {
        if attempt > 1 {
            tokio::time::sleep(self.interval).await;
        }
        self.budget.acquire().await;
    }

    /// Wait for room in the budget for a request that is not a poll
    pub async fn acquire(&mut self) {
        self.budget.acquire().await;
    }
}

impl Default for PollPolicy {
    fn default() -> Self {
        Self::new(Duration::from_secs(15), 40)
    }
}

/// Result of polling a resource until it reaches a terminal state
#[derive(Debug, Clone, PartialEq)]
pub enum PollOutcome<T> {
    /// The resource reached a terminal state
    Finished(T),
    /// Attempts ran out while the resource was still in progress
    GaveUp {
        /// Last value observed
        last: T,
        /// Polls performed
        attempts: u32,
    },
}

impl<T> PollOutcome<T> {
    /// The terminal value, if polling finished
    pub fn finished(self) -> Option<T> {
        match self {
            PollOutcome::Finished(value) => Some(value),
            PollOutcome::GaveUp { .. } => None,
        }
    }

    /// The last observed value, terminal or not
    pub fn into_last(self) -> T {
        match self {
            PollOutcome::Finished(value) | PollOutcome::GaveUp { last: value, .. } => value,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_budget_allows_within_limit() {
        let mut budget = RequestBudget::new(5, Duration::from_secs(60));
        let now = Instant::now();
        for _ in 0..5 {
            assert_eq!(budget.delay_until_available(now), Duration::ZERO);
            budget.record(now);
        }
        assert_eq!(budget.delay_until_available(now), Duration::from_secs(60));
    }

    #[test]
    fn test_budget_window_slides() {
        let mut budget = RequestBudget::new(2, Duration::from_secs(60));
        let start = Instant::now();
        budget.record(start);
        budget.record(start + Duration::from_secs(10));

        let later = start + Duration::from_secs(30);
        assert_eq!(budget.delay_until_available(later), Duration::from_secs(30));

        // Oldest entry expired
        let after_expiry = start + Duration::from_secs(60);
        assert_eq!(budget.delay_until_available(after_expiry), Duration::ZERO);
    }

    #[test]
    fn test_policy_clamps_interval() {
        let policy = PollPolicy::new(Duration::from_millis(100), 0);
        assert_eq!(policy.interval(), MIN_POLL_INTERVAL);
        assert_eq!(policy.max_attempts(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_pace_respects_budget() {
        let mut policy = PollPolicy::new(Duration::from_secs(2), 10);
        let start = Instant::now();
        for attempt in 1..=6 {
            policy.pace(attempt).await;
        }
        // Five polls fit in the first window; the sixth waits for the first to expire
        assert!(start.elapsed() >= Duration::from_secs(60));
        assert!(start.elapsed() < Duration::from_secs(61));
    }

    #[tokio::test(start_paused = true)]
    async fn test_first_pace_does_not_sleep() {
        let mut policy = PollPolicy::default();
        let start = Instant::now();
        policy.pace(1).await;
        assert_eq!(start.elapsed(), Duration::ZERO);
    }

    #[tokio::test(start_paused = true)]
    async fn test_acquire_shares_budget_with_polls() {
        let mut policy = PollPolicy::new(Duration::from_secs(2), 10);
        let start = Instant::now();
        for _ in 0..4 {
            policy.acquire().await;
        }
        policy.pace(1).await;
        assert_eq!(start.elapsed(), Duration::ZERO);

        // Sixth request of the window, poll or not, waits for the first to expire
        policy.acquire().await;
        assert_eq!(start.elapsed(), Duration::from_secs(60));
    }

    #[test]
    fn test_outcome_accessors() {
        let done: PollOutcome<u8> = PollOutcome::Finished(1);
        assert_eq!(done.clone().finished(), Some(1));
        let gave_up = PollOutcome::GaveUp {
            last: 7u8,
            attempts: 3,
        };
        assert_eq!(gave_up.clone().finished(), None);
        assert_eq!(gave_up.into_last(), 7);
        assert_eq!(done.into_last(), 1);
    }
}

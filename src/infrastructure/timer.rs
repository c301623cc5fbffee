use std::cmp;
use std::time::Duration;

use tokio::time::sleep;

/// Reconnection backoff policy: delay grows linearly with the number of
/// failed attempts and is capped at a configured maximum. Pure over the
/// configuration and the failure counter; no I/O besides `schedule_timeout`.
pub struct ReconnectTimer {
    failed_attempts: u32,
    interval: Duration,
    max_interval: Duration,
    max_attempts: Option<u32>,
}

impl ReconnectTimer {
    pub fn new(interval_ms: u64, max_interval_ms: u64, max_attempts: Option<u32>) -> Self {
        Self {
            failed_attempts: 0,
            interval: Duration::from_millis(interval_ms),
            max_interval: Duration::from_millis(max_interval_ms),
            max_attempts,
        }
    }

    /// Delay before the next attempt: `min(interval × failed_attempts, max)`.
    pub fn next_delay(&self) -> Duration {
        cmp::min(self.interval * self.failed_attempts, self.max_interval)
    }

    /// Whether another attempt is allowed. Unlimited when no attempt cap is
    /// configured.
    pub fn should_retry(&self) -> bool {
        self.max_attempts
            .is_none_or(|max| self.failed_attempts < max)
    }

    pub fn record_failure(&mut self) {
        self.failed_attempts += 1;
    }

    pub fn reset(&mut self) {
        self.failed_attempts = 0;
    }

    pub fn failed_attempts(&self) -> u32 {
        self.failed_attempts
    }

    /// Sleep for the current backoff delay.
    pub async fn schedule_timeout(&self) {
        sleep(self.next_delay()).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_delay_is_monotonically_non_decreasing() {
        let mut timer = ReconnectTimer::new(5_000, 30_000, None);
        let mut previous = timer.next_delay();
        for _ in 0..20 {
            timer.record_failure();
            let delay = timer.next_delay();
            assert!(delay >= previous);
            previous = delay;
        }
    }

    #[test]
    fn test_delay_caps_at_max_interval() {
        let mut timer = ReconnectTimer::new(5_000, 30_000, None);
        for _ in 0..10 {
            timer.record_failure();
        }
        assert_eq!(timer.failed_attempts(), 10);
        assert_eq!(timer.next_delay(), Duration::from_secs(30));
    }

    #[test]
    fn test_delay_grows_linearly_below_the_cap() {
        let mut timer = ReconnectTimer::new(5_000, 30_000, None);
        assert_eq!(timer.next_delay(), Duration::ZERO);
        timer.record_failure();
        assert_eq!(timer.next_delay(), Duration::from_secs(5));
        timer.record_failure();
        assert_eq!(timer.next_delay(), Duration::from_secs(10));
    }

    #[test]
    fn test_unlimited_retries_without_attempt_cap() {
        let mut timer = ReconnectTimer::new(1_000, 10_000, None);
        for _ in 0..1_000 {
            timer.record_failure();
        }
        assert!(timer.should_retry());
    }

    #[test]
    fn test_retries_stop_at_attempt_cap() {
        let mut timer = ReconnectTimer::new(1_000, 10_000, Some(3));
        assert!(timer.should_retry());
        timer.record_failure();
        timer.record_failure();
        assert!(timer.should_retry());
        timer.record_failure();
        assert!(!timer.should_retry());
    }

    #[test]
    fn test_reset_clears_the_failure_counter() {
        let mut timer = ReconnectTimer::new(1_000, 10_000, Some(1));
        timer.record_failure();
        assert!(!timer.should_retry());
        timer.reset();
        assert!(timer.should_retry());
        assert_eq!(timer.next_delay(), Duration::ZERO);
    }
}

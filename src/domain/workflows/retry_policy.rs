use time::Duration;

/// Retry budget and exponential backoff for webhook jobs.
///
/// Classification depends on the attempt count only: a 4xx response is
/// retried exactly like a 5xx or a timeout.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub base_delay_ms: u64,
    pub factor: u64,
}

/// What happens to a job after a failed attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureDisposition {
    Retry { delay: Duration },
    Exhausted,
}

impl RetryPolicy {
    /// Return the backoff delay after the given failed attempt.
    ///
    /// `attempt` is the attempt count after the failure, starting at 1.
    pub fn next_delay(&self, attempt: u32) -> Duration {
        // Step 1: Compute base * factor^(attempt-1), saturating on overflow.
        let attempt = attempt.max(1);
        let raw = self
            .base_delay_ms
            .saturating_mul(self.factor.saturating_pow(attempt - 1));

        // Step 2: Clamp to what a `Duration` in milliseconds can hold.
        Duration::milliseconds(raw.min(i64::MAX as u64) as i64)
    }

    /// Returns `true` once the retry budget is spent.
    pub fn is_exhausted(&self, attempt_count: u32) -> bool {
        attempt_count >= self.max_attempts
    }

    /// Decide between rescheduling and permanent failure.
    pub fn after_failure(&self, attempt_count: u32) -> FailureDisposition {
        if self.is_exhausted(attempt_count) {
            return FailureDisposition::Exhausted;
        }
        FailureDisposition::Retry {
            delay: self.next_delay(attempt_count),
        }
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 5,
            base_delay_ms: 30_000,
            factor: 4,
        }
    }
}

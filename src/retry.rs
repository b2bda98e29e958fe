use std::time::Duration;

pub const DEFAULT_MAX_ATTEMPTS: u32 = 3;
pub const DEFAULT_RETRY_DELAY: Duration = Duration::from_secs(5);

/// Whether a failed request may succeed if repeated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    Transient,
    Fatal,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryDecision {
    RetryAfter(Duration),
    GiveUp,
}

/// Fixed-delay retry: at most `max_attempts` attempts in total, `delay` between them.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            delay: DEFAULT_RETRY_DELAY,
        }
    }
}

impl RetryPolicy {
    /// `attempt` is the 1-based number of the attempt that just failed.
    pub fn decide(&self, attempt: u32, kind: FailureKind) -> RetryDecision {
        match kind {
            FailureKind::Transient if attempt < self.max_attempts => {
                RetryDecision::RetryAfter(self.delay)
            }
            _ => RetryDecision::GiveUp,
        }
    }
}

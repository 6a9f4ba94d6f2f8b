//! Connect retry policy.
//!
//! The phone's telemetry server usually needs a moment after the service is
//! started and the port is forwarded, so the first few connects are
//! expected to fail.

use std::time::Duration;

/// Default number of connect attempts per session.
pub const DEFAULT_CONNECT_ATTEMPTS: u32 = 10;

/// Default pause between connect attempts (1 second).
pub const DEFAULT_CONNECT_DELAY_MS: u64 = 1000;

/// How a session retries its initial connect.
#[derive(Clone, Debug, PartialEq)]
pub enum RetryPolicy {
    /// Single attempt.
    None,

    /// Fixed number of attempts with a constant pause in between.
    Fixed {
        /// Maximum number of attempts (including the initial attempt).
        max_attempts: u32,
        /// Pause between attempts.
        delay: Duration,
    },
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::fixed(
            DEFAULT_CONNECT_ATTEMPTS,
            Duration::from_millis(DEFAULT_CONNECT_DELAY_MS),
        )
    }
}

impl RetryPolicy {
    pub fn fixed(max_attempts: u32, delay: Duration) -> Self {
        Self::Fixed {
            max_attempts,
            delay,
        }
    }

    /// Pause before the attempt after `attempt` (1-based).
    ///
    /// `None` means `attempt` was the last one allowed.
    pub fn delay_after(&self, attempt: u32) -> Option<Duration> {
        match self {
            Self::None => None,
            Self::Fixed {
                max_attempts,
                delay,
            } => (attempt < *max_attempts).then_some(*delay),
        }
    }

    /// Total attempts allowed, at least one.
    pub fn max_attempts(&self) -> u32 {
        match self {
            Self::None => 1,
            Self::Fixed { max_attempts, .. } => (*max_attempts).max(1),
        }
    }
}

use std::time::Duration;

use crate::config::ClientConfig;

/// Internal decision for how to proceed after a buffered attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Decision {
    Accept,
    Retry { delay: Duration },
    Fail,
}

/// Retry policy for the non-streaming path.
///
/// Only 5xx responses are retried, at most `max_retries` times, waiting
/// `backoff_unit * 2^attempt` before each retry. Streams are never retried:
/// partial output has already been delivered and cannot be replayed.
#[derive(Debug, Clone, Copy)]
pub(crate) struct RetryPolicy {
    max_retries: u32,
    backoff_unit: Duration,
}

impl RetryPolicy {
    pub fn from_config(config: &ClientConfig) -> Self {
        Self {
            max_retries: config.max_retries,
            backoff_unit: config.backoff_unit,
        }
    }

    fn backoff_delay(&self, attempt: u32) -> Duration {
        let factor = 1u32.checked_shl(attempt).unwrap_or(u32::MAX);
        self.backoff_unit.saturating_mul(factor)
    }

    pub fn decide(&self, status: u16, attempt: u32) -> Decision {
        match status {
            200..=299 => Decision::Accept,
            500..=599 if attempt < self.max_retries => Decision::Retry {
                delay: self.backoff_delay(attempt),
            },
            _ => Decision::Fail,
        }
    }
}

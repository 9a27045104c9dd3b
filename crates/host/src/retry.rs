//! Retrying failed handshakes
//!
//! The handshake itself never retries. [`RetryPolicy`] wraps any closure
//! producing a [`SessionOutcome`] and runs it again when the failure is a
//! transient transport error. Backoff doubles after every failed attempt.

use crate::handshake::SessionOutcome;
use std::thread;
use std::time::Duration;
use tracing::{debug, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total number of attempts, including the first
    pub max_attempts: u32,
    /// Delay before the second attempt
    pub backoff: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 1,
            backoff: Duration::from_millis(500),
        }
    }
}

impl RetryPolicy {
    pub fn new(max_attempts: u32, backoff: Duration) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            backoff,
        }
    }

    /// A single attempt
    pub fn once() -> Self {
        Self::default()
    }

    /// Call `attempt` with the 1-based attempt number until it succeeds,
    /// fails with a non-retryable error, or attempts run out
    pub fn run<F>(&self, mut attempt: F) -> SessionOutcome
    where
        F: FnMut(u32) -> SessionOutcome,
    {
        let max_attempts = self.max_attempts.max(1);
        let mut delay = self.backoff;
        let mut number = 1;

        loop {
            let outcome = attempt(number);
            let retryable = outcome.error().is_some_and(|err| err.is_retryable());

            if !retryable || number >= max_attempts {
                if retryable {
                    warn!("Giving up after {} attempt(s)", number);
                }
                return outcome;
            }

            if let Some(err) = outcome.error() {
                debug!(
                    "Attempt {}/{} failed: {}; retrying in {:?}",
                    number, max_attempts, err, delay
                );
            }
            thread::sleep(delay);
            delay = delay.saturating_mul(2);
            number += 1;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{HandshakeStage, HostError};
    use crate::handshake::DeviceBanner;
    use crate::usb::transfers::TransferError;
    use protocol::MessageKind;

    fn timeout() -> SessionOutcome {
        SessionOutcome::Failed(HostError::TransportFailure {
            stage: HandshakeStage::ReadToken,
            kind: TransferError::Timeout,
        })
    }

    #[test]
    fn test_default_is_single_attempt() {
        let mut calls = 0;
        let outcome = RetryPolicy::default().run(|_| {
            calls += 1;
            timeout()
        });
        assert_eq!(calls, 1);
        assert!(!outcome.is_authenticated());
    }

    #[test]
    fn test_retries_transient_failures_until_success() {
        let policy = RetryPolicy::new(3, Duration::ZERO);
        let mut seen = Vec::new();
        let outcome = policy.run(|attempt| {
            seen.push(attempt);
            if attempt < 3 {
                timeout()
            } else {
                SessionOutcome::Authenticated(DeviceBanner::parse(b"device::"))
            }
        });
        assert!(outcome.is_authenticated());
        assert_eq!(seen, vec![1, 2, 3]);
    }

    #[test]
    fn test_stops_at_max_attempts() {
        let policy = RetryPolicy::new(2, Duration::ZERO);
        let mut calls = 0;
        let outcome = policy.run(|_| {
            calls += 1;
            timeout()
        });
        assert_eq!(calls, 2);
        assert!(outcome.error().unwrap().is_retryable());
    }

    #[test]
    fn test_rejection_is_not_retried() {
        let policy = RetryPolicy::new(5, Duration::ZERO);
        let mut calls = 0;
        let outcome = policy.run(|_| {
            calls += 1;
            SessionOutcome::Failed(HostError::ProtocolRejection(MessageKind::AuthToken))
        });
        assert_eq!(calls, 1);
        assert!(matches!(
            outcome.error(),
            Some(HostError::ProtocolRejection(_))
        ));
    }

    #[test]
    fn test_zero_attempts_still_runs_once() {
        let policy = RetryPolicy {
            max_attempts: 0,
            backoff: Duration::ZERO,
        };
        let mut calls = 0;
        policy.run(|_| {
            calls += 1;
            timeout()
        });
        assert_eq!(calls, 1);
    }
}

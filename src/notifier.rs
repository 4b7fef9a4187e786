//! Outbound message delivery.
//!
//! The registry only knows the [`Notifier`] capability; how a message
//! actually leaves the process (SMTP, API, queue) is an implementation of
//! that trait. [`LogNotifier`] is the local-dev default: it logs the
//! message and reports success.
//!
//! Delivery goes through [`deliver`], which retries with linear backoff
//! and only surfaces a failure once every attempt is exhausted. Callers
//! persist their one-time codes *before* delivering, so an exhausted
//! delivery leaves a valid code behind that a resend can pick up.

use std::time::Duration;

use anyhow::Result;
use thiserror::Error;
use tokio::time::sleep;
use tracing::{info, warn};

/// A message addressed to one recipient.
#[derive(Clone, Debug)]
pub struct Message {
    pub to: String,
    pub subject: String,
    pub body: String,
}

/// Message delivery abstraction.
pub trait Notifier: Send + Sync {
    /// Deliver a message once, or return the underlying error.
    fn send(&self, message: &Message) -> Result<()>;
}

/// Local dev notifier that logs the payload instead of sending it.
#[derive(Clone, Debug, Default)]
pub struct LogNotifier;

impl Notifier for LogNotifier {
    fn send(&self, message: &Message) -> Result<()> {
        info!(
            to = %message.to,
            subject = %message.subject,
            body = %message.body,
            "notifier send stub"
        );
        Ok(())
    }
}

/// All attempts failed; wraps the error from the last one.
#[derive(Debug, Error)]
#[error("failed to deliver to {to} after {attempts} attempts: {last_error}")]
pub struct DeliveryError {
    to: String,
    attempts: u32,
    last_error: anyhow::Error,
}

/// How often and how patiently [`deliver`] retries.
#[derive(Clone, Copy, Debug)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub backoff_base: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            backoff_base: Duration::from_secs(1),
        }
    }
}

/// Send with retries: up to `max_attempts` tries, sleeping `base * n`
/// after the n-th failure.
pub async fn deliver(
    notifier: &dyn Notifier,
    message: &Message,
    policy: RetryPolicy,
) -> Result<(), DeliveryError> {
    let max_attempts = policy.max_attempts.max(1);
    let mut attempt = 1u32;

    loop {
        match notifier.send(message) {
            Ok(()) => {
                info!(to = %message.to, attempt, "message delivered");
                return Ok(());
            }
            Err(err) if attempt >= max_attempts => {
                return Err(DeliveryError {
                    to: message.to.clone(),
                    attempts: attempt,
                    last_error: err,
                });
            }
            Err(err) => {
                warn!(to = %message.to, attempt, error = %err, "delivery failed, retrying");
                sleep(policy.backoff_base.saturating_mul(attempt)).await;
                attempt += 1;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::anyhow;
    use std::sync::atomic::{AtomicU32, Ordering};

    /// Fails the first `failures` sends, then succeeds.
    struct Flaky {
        failures: u32,
        calls: AtomicU32,
    }

    impl Flaky {
        fn new(failures: u32) -> Self {
            Self {
                failures,
                calls: AtomicU32::new(0),
            }
        }

        fn calls(&self) -> u32 {
            self.calls.load(Ordering::SeqCst)
        }
    }

    impl Notifier for Flaky {
        fn send(&self, _message: &Message) -> Result<()> {
            let call = self.calls.fetch_add(1, Ordering::SeqCst);
            if call < self.failures {
                Err(anyhow!("smtp unreachable"))
            } else {
                Ok(())
            }
        }
    }

    fn message() -> Message {
        Message {
            to: "a@x.com".to_string(),
            subject: "subject".to_string(),
            body: "body".to_string(),
        }
    }

    fn fast_policy() -> RetryPolicy {
        RetryPolicy {
            max_attempts: 3,
            backoff_base: Duration::from_millis(1),
        }
    }

    #[tokio::test]
    async fn first_attempt_success_sends_once() {
        let notifier = Flaky::new(0);
        deliver(&notifier, &message(), fast_policy()).await.unwrap();
        assert_eq!(notifier.calls(), 1);
    }

    #[tokio::test]
    async fn recovers_within_retry_budget() {
        let notifier = Flaky::new(2);
        deliver(&notifier, &message(), fast_policy()).await.unwrap();
        assert_eq!(notifier.calls(), 3);
    }

    #[tokio::test]
    async fn exhausted_retries_surface_last_error() {
        let notifier = Flaky::new(10);
        let err = deliver(&notifier, &message(), fast_policy())
            .await
            .unwrap_err();
        assert_eq!(notifier.calls(), 3);
        let rendered = err.to_string();
        assert!(rendered.contains("after 3 attempts"), "{rendered}");
        assert!(rendered.contains("smtp unreachable"), "{rendered}");
    }
}

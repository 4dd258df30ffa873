use std::time::Duration;

use tokio_util::sync::CancellationToken;

use super::RetryConfig;
use crate::{Error, Result, resource::ResourceKey};

/// Exponential backoff for one request's conflict-retry loop.
pub(super) struct Backoff<'a> {
  cfg:      &'a RetryConfig,
  cancel:   &'a CancellationToken,
  attempts: u32,
  delay:    Duration,
}

impl<'a> Backoff<'a> {
  pub(super) fn new(cfg: &'a RetryConfig, cancel: &'a CancellationToken) -> Self {
    Self {
      cfg,
      cancel,
      attempts: 0,
      delay: Duration::from_millis(cfg.initial_backoff_ms),
    }
  }

  /// Fail fast if the caller has gone away. Checked before every attempt.
  pub(super) fn check(&self) -> Result<()> {
    if self.cancel.is_cancelled() { Err(Error::Cancelled) } else { Ok(()) }
  }

  /// Record a conflicting write and wait before the next attempt.
  pub(super) async fn conflict(&mut self, key: &ResourceKey) -> Result<()> {
    self.attempts += 1;
    if self.attempts >= self.cfg.max_attempts {
      tracing::warn!(resource = %key, attempts = self.attempts, "giving up on conflicting writes");
      return Err(Error::RetriesExhausted {
        resource: key.to_string(),
        attempts: self.attempts,
      });
    }

    tracing::debug!(
      resource = %key,
      attempt = self.attempts,
      delay_ms = self.delay.as_millis() as u64,
      "version conflict, retrying"
    );

    tokio::select! {
      _ = self.cancel.cancelled() => return Err(Error::Cancelled),
      _ = tokio::time::sleep(self.delay) => {}
    }

    self.delay = next_delay(self.delay, Duration::from_millis(self.cfg.max_backoff_ms));
    Ok(())
  }
}

/// Double `delay`, capped at `max`.
fn next_delay(delay: Duration, max: Duration) -> Duration { delay.saturating_mul(2).min(max) }

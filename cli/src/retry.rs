//! Bounded retries with exponential backoff and jitter.
//!
//! Wraps every network-dependent or lock-contending external call. Sleeps
//! between attempts wait on the run's [`CancelToken`], so an interrupt
//! during backoff returns immediately with the cancellation error instead of
//! the operation's last error.
use std::time::Duration;

use crate::cancel::CancelToken;
use crate::error::Cancelled;

/// Attempt count and backoff bounds for one call site.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryOptions {
    /// Total invocations, including the first. `0` is treated as `1`.
    pub attempts: u32,
    /// Delay before the second attempt. `ZERO` falls back to 250ms.
    pub base_delay: Duration,
    /// Upper bound for any single sleep. `ZERO` falls back to 5s.
    pub max_delay: Duration,
}

impl Default for RetryOptions {
    fn default() -> Self {
        Self {
            attempts: 3,
            base_delay: Duration::from_millis(250),
            max_delay: Duration::from_secs(5),
        }
    }
}

impl RetryOptions {
    /// `attempts` tries starting at `base_delay`, capped at the default max.
    #[must_use]
    pub fn new(attempts: u32, base_delay: Duration) -> Self {
        Self {
            attempts,
            base_delay,
            ..Self::default()
        }
    }

    /// Package-manager installs, downloads, and clones: 3 tries from 500ms.
    #[must_use]
    pub fn network() -> Self {
        Self::new(3, Duration::from_millis(500))
    }

    /// Package-manager metadata operations: 3 tries from 300ms.
    #[must_use]
    pub fn metadata() -> Self {
        Self::new(3, Duration::from_millis(300))
    }

    fn normalized(self) -> Self {
        let defaults = Self::default();
        Self {
            attempts: self.attempts.max(1),
            base_delay: if self.base_delay.is_zero() {
                defaults.base_delay
            } else {
                self.base_delay
            },
            max_delay: if self.max_delay.is_zero() {
                defaults.max_delay
            } else {
                self.max_delay
            },
        }
    }
}

/// Sleep duration for a backoff step: `delay` plus up to a quarter of
/// `delay` in jitter, capped at `max`.
fn backoff(delay: Duration, max: Duration) -> Duration {
    let quarter = u64::try_from((delay / 4).as_nanos()).unwrap_or(u64::MAX);
    let jitter = match quarter {
        0 => Duration::ZERO,
        q => Duration::from_nanos(fastrand::u64(..q)),
    };
    (delay + jitter).min(max)
}

/// Invoke `op` until it succeeds or `opts.attempts` is exhausted.
///
/// `op` receives the 1-based attempt number. The last error is returned
/// unchanged so callers can classify it.
///
/// # Errors
///
/// Returns `op`'s last error after the final attempt, or
/// `E::from(Cancelled)` if `cancel` fires before an attempt starts or while
/// sleeping between attempts.
pub fn retry<T, E, F>(cancel: &CancelToken, opts: RetryOptions, mut op: F) -> Result<T, E>
where
    E: From<Cancelled>,
    F: FnMut(u32) -> Result<T, E>,
{
    let opts = opts.normalized();
    let mut delay = opts.base_delay;
    let mut attempt = 1;
    loop {
        cancel.check()?;
        match op(attempt) {
            Ok(value) => return Ok(value),
            Err(err) if attempt >= opts.attempts => return Err(err),
            Err(_) => {
                let sleep = backoff(delay, opts.max_delay);
                tracing::debug!("attempt {attempt} failed, retrying in {sleep:?}");
                cancel.sleep(sleep)?;
                delay = (delay * 2).min(opts.max_delay);
                attempt += 1;
            }
        }
    }
}

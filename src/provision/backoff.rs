//! Truncated exponential backoff for readiness polling.
//!
//! [`wait_for`] keeps calling a probe until it succeeds or an absolute
//! deadline passes. Every sleep is capped at the deadline, and every probe
//! call runs under it, so a hung container cannot block the caller past
//! the cutoff.

use std::future::Future;
use std::time::Duration;

use thiserror::Error;
use tokio::time::Instant;

/// Delay schedule for [`wait_for`].
#[derive(Debug, Clone, PartialEq)]
pub struct RetryPolicy {
    /// Sleep once before the first probe.
    pub pre_delay: Duration,
    /// Delay after the first failed probe.
    pub min_delay: Duration,
    /// Upper bound for any single delay.
    pub max_delay: Duration,
    /// Growth factor applied after every failure, within `1.0..=10.0`.
    pub rate: f64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            pre_delay: Duration::ZERO,
            min_delay: Duration::from_millis(500),
            max_delay: Duration::from_secs(5),
            rate: 1.5,
        }
    }
}

/// A [`RetryPolicy`] whose parameters violate its invariants.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum InvalidRetryPolicy {
    #[error("backoff rate must be in range 1 <= RATE <= 10, got {rate}")]
    RateOutOfRange { rate: f64 },

    #[error("minimum delay must be positive")]
    ZeroMinDelay,

    #[error("maximum delay {max:?} is below the minimum delay {min:?}")]
    MaxBelowMin { min: Duration, max: Duration },
}

/// Why [`wait_for`] gave up.
#[derive(Debug, Error)]
pub enum BackoffError {
    #[error(transparent)]
    InvalidPolicy(#[from] InvalidRetryPolicy),

    #[error("deadline passed after {attempts} attempt(s)")]
    TimedOut {
        /// Number of probe invocations made.
        attempts: u32,
        /// Message of the last probe failure, if there was one.
        last_error: Option<String>,
    },
}

impl RetryPolicy {
    /// Check the policy invariants.
    pub fn validate(&self) -> Result<(), InvalidRetryPolicy> {
        if !(1.0..=10.0).contains(&self.rate) {
            return Err(InvalidRetryPolicy::RateOutOfRange { rate: self.rate });
        }
        if self.min_delay.is_zero() {
            return Err(InvalidRetryPolicy::ZeroMinDelay);
        }
        if self.max_delay < self.min_delay {
            return Err(InvalidRetryPolicy::MaxBelowMin {
                min: self.min_delay,
                max: self.max_delay,
            });
        }
        Ok(())
    }

    /// Delay that follows `current` in the schedule.
    pub fn next_delay(&self, current: Duration) -> Duration {
        current.mul_f64(self.rate).min(self.max_delay)
    }

    /// The (infinite) sequence of delays slept between failed probes.
    ///
    /// Only meaningful for a policy that passes [`validate`](Self::validate).
    pub fn delays(&self) -> impl Iterator<Item = Duration> + '_ {
        std::iter::successors(Some(self.min_delay), move |d| Some(self.next_delay(*d)))
    }
}

/// Call `probe` until it returns `Ok`, backing off exponentially between
/// failures.
///
/// The policy is validated before the probe is ever called. The deadline is
/// checked at the top of every iteration; sleeps are cut short by it and a
/// probe still running when it passes is dropped.
pub async fn wait_for<F, Fut, T, E>(
    policy: &RetryPolicy,
    deadline: Instant,
    mut probe: F,
) -> Result<T, BackoffError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: std::fmt::Display,
{
    policy.validate()?;

    if !policy.pre_delay.is_zero() {
        sleep_capped(policy.pre_delay, deadline).await;
    }

    let mut delay = policy.min_delay;
    let mut attempts = 0u32;
    let mut last_error = None;

    loop {
        if Instant::now() >= deadline {
            return Err(BackoffError::TimedOut {
                attempts,
                last_error,
            });
        }

        attempts += 1;
        match tokio::time::timeout_at(deadline, probe()).await {
            Ok(Ok(value)) => {
                tracing::debug!(attempts, "Probe succeeded");
                return Ok(value);
            }
            Ok(Err(e)) => {
                tracing::debug!(attempts, error = %e, "Probe failed, retrying in {:?}", delay);
                last_error = Some(e.to_string());
            }
            Err(_) => {
                last_error = Some("probe still running at the deadline".to_string());
                continue;
            }
        }

        sleep_capped(delay, deadline).await;
        delay = policy.next_delay(delay);
    }
}

async fn sleep_capped(duration: Duration, deadline: Instant) {
    let wake = Instant::now()
        .checked_add(duration)
        .map_or(deadline, |at| at.min(deadline));
    tokio::time::sleep_until(wake).await;
}

//! Bounded retry with exponential backoff for catalog calls
//!
//! A policy is applied per unit of work (one film's cast, one person's
//! details). It never propagates the failure: the caller gets a tagged
//! [`Attempted`] result and decides whether a skip is fatal.

use std::time::Duration;

use crate::catalog::CatalogError;

/// Default attempts per unit of work
pub const DEFAULT_MAX_ATTEMPTS: u32 = 3;

/// Default delay before the second attempt
pub const DEFAULT_BASE_DELAY: Duration = Duration::from_millis(500);

/// Default growth factor between consecutive delays
pub const DEFAULT_MULTIPLIER: u32 = 2;

/// Outcome of running a unit of work under a [`RetryPolicy`]
#[derive(Debug, Clone, PartialEq)]
pub enum Attempted<T> {
    /// The call succeeded on attempt number `attempts`
    Fetched { value: T, attempts: u32 },
    /// The call was given up after `attempts` tries
    Skipped { error: CatalogError, attempts: u32 },
}

impl<T> Attempted<T> {
    pub fn into_result(self) -> Result<T, CatalogError> {
        match self {
            Attempted::Fetched { value, .. } => Ok(value),
            Attempted::Skipped { error, .. } => Err(error),
        }
    }

    pub fn attempts(&self) -> u32 {
        match self {
            Attempted::Fetched { attempts, .. } | Attempted::Skipped { attempts, .. } => *attempts,
        }
    }
}

/// Max attempts, base delay and multiplier for one unit of work
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub base_delay: Duration,
    pub multiplier: u32,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            base_delay: DEFAULT_BASE_DELAY,
            multiplier: DEFAULT_MULTIPLIER,
        }
    }
}

impl RetryPolicy {
    /// A policy that retries without sleeping
    pub fn immediate(max_attempts: u32) -> Self {
        Self {
            max_attempts,
            base_delay: Duration::ZERO,
            multiplier: 1,
        }
    }

    /// Delay after the `failures`-th failed attempt (1-based)
    pub fn delay_after(&self, failures: u32) -> Duration {
        let factor = self
            .multiplier
            .saturating_pow(failures.saturating_sub(1));
        self.base_delay.saturating_mul(factor)
    }

    /// Run `call` until it succeeds, fails permanently, or attempts run out
    pub fn run<T, F>(&self, call: F) -> Attempted<T>
    where
        F: FnMut() -> Result<T, CatalogError>,
    {
        self.run_with_sleep(call, std::thread::sleep)
    }

    /// [`run`](Self::run) with an injectable sleep
    pub fn run_with_sleep<T, F, Z>(&self, mut call: F, mut sleep: Z) -> Attempted<T>
    where
        F: FnMut() -> Result<T, CatalogError>,
        Z: FnMut(Duration),
    {
        let max_attempts = self.max_attempts.max(1);
        let mut attempts = 0;
        loop {
            attempts += 1;
            match call() {
                Ok(value) => return Attempted::Fetched { value, attempts },
                Err(error) if !error.is_transient() || attempts >= max_attempts => {
                    return Attempted::Skipped { error, attempts };
                }
                Err(error) => {
                    let delay = self.delay_after(attempts);
                    tracing::debug!(
                        attempt = attempts,
                        ?delay,
                        %error,
                        "catalog call failed, retrying"
                    );
                    if !delay.is_zero() {
                        sleep(delay);
                    }
                }
            }
        }
    }
}

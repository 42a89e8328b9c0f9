//! Bounded retry around one request pipeline

use std::future::Future;

use tracing::{debug, warn};

use crate::{config::MAX_TRIES, error::Result};

/// Retry configuration
#[derive(Debug, Clone)]
pub struct RetryConfig {
    /// Attempts used when the caller does not pass its own count
    pub max_tries: u8,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_tries: MAX_TRIES,
        }
    }
}

/// Runs an operation until it succeeds or the attempts run out
///
/// Attempts follow each other immediately, without any delay.
#[derive(Debug, Clone, Default)]
pub struct RetryController {
    config: RetryConfig,
}

impl RetryController {
    /// Create new retry controller
    pub fn new(config: RetryConfig) -> Self {
        Self { config }
    }

    pub fn default_max_tries(&self) -> u8 {
        self.config.max_tries
    }

    /// Execute operation with retry logic
    ///
    /// Returns the first successful value. Errors that are not retryable end
    /// the loop at once. `max_tries` of `None` uses the configured default;
    /// `Some(0)` returns `None` without calling `operation`.
    pub async fn execute<F, Fut, T>(
        &self,
        max_tries: Option<u8>,
        target: &str,
        mut operation: F,
    ) -> Option<T>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        let max_tries = max_tries.unwrap_or_else(|| self.default_max_tries());
        if max_tries == 0 {
            warn!("Refusing to request {target} with zero attempts");
            return None;
        }

        for attempt in 1..=max_tries {
            match operation().await {
                Ok(result) => {
                    if attempt > 1 {
                        debug!("Request succeeded after {attempt} attempts");
                    }
                    return Some(result);
                }
                Err(e) if !e.is_retryable() => {
                    warn!("Request to {target} cannot be sent: {e}");
                    return None;
                }
                Err(e) if e.is_decode() => {
                    debug!("Response from {target} could not be decoded (attempt {attempt}/{max_tries}): {e}");
                }
                Err(e) => {
                    debug!("Request failed (attempt {attempt}/{max_tries}): {e}");
                }
            }
        }

        if max_tries > 1 {
            warn!("Request failed too many times ({max_tries})");
            debug!("Failing request: {target}");
        }

        None
    }
}

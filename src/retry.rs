//! Fixed-interval bounded retry.
//!
//! Every mutating call against the API server goes through [`retry_fixed`]:
//! the same delay between every attempt, no growth and no jitter, and a hard
//! cap on the number of attempts.
//!
//! # Example
//!
//! ```ignore
//! use reallocator::retry::{retry_fixed, RetryConfig};
//!
//! let deployment = retry_fixed(
//!     &RetryConfig::default(),
//!     "patch_replicas",
//!     || async { client.patch_replicas(&handle, 0).await },
//! ).await?;
//! ```

use std::future::Future;
use std::time::Duration;

use tracing::{error, warn};

/// Default attempt cap for a bounded loop
pub const DEFAULT_MAX_ATTEMPTS: u32 = 60;

/// Default delay between attempts
pub const DEFAULT_RETRY_INTERVAL: Duration = Duration::from_secs(1);

/// Configuration for a bounded retry loop
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RetryConfig {
    /// Maximum number of attempts (values below 1 are treated as 1)
    pub max_attempts: u32,
    /// Delay between attempts
    pub interval: Duration,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            interval: DEFAULT_RETRY_INTERVAL,
        }
    }
}

impl RetryConfig {
    /// Create a config with the given cap and interval
    pub fn new(max_attempts: u32, interval: Duration) -> Self {
        Self {
            max_attempts,
            interval,
        }
    }
}

/// Returned when every attempt failed
#[derive(Debug, PartialEq, Eq)]
pub struct RetryExhausted<E> {
    /// Attempts made
    pub attempts: u32,
    /// Error from the final attempt
    pub last_error: E,
}

/// Execute an async operation until it succeeds or the attempt cap is hit.
///
/// The operation runs at most `config.max_attempts` times, with
/// `config.interval` slept between consecutive attempts (never after the
/// last one).
pub async fn retry_fixed<F, Fut, T, E>(
    config: &RetryConfig,
    operation_name: &str,
    mut operation: F,
) -> Result<T, RetryExhausted<E>>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: std::fmt::Display,
{
    let max_attempts = config.max_attempts.max(1);
    let mut attempt = 0u32;

    loop {
        attempt += 1;

        match operation().await {
            Ok(result) => return Ok(result),
            Err(e) => {
                if attempt >= max_attempts {
                    error!(
                        operation = %operation_name,
                        attempt = attempt,
                        error = %e,
                        "Operation failed after max retries"
                    );
                    return Err(RetryExhausted {
                        attempts: attempt,
                        last_error: e,
                    });
                }

                warn!(
                    operation = %operation_name,
                    attempt = attempt,
                    error = %e,
                    delay_ms = config.interval.as_millis(),
                    "Operation failed, retrying"
                );

                tokio::time::sleep(config.interval).await;
            }
        }
    }
}

//! Retry logic with exponential backoff
//!
//! Only transport failures (timeouts, refused or reset connections) are worth
//! retrying. A missing item or unparsable page will not get better by asking
//! again, so those errors pass straight through.
//!
//! # Example
//!
//! ```no_run
//! use comic_dl::config::RetryConfig;
//! use comic_dl::error::Error;
//! use comic_dl::retry::with_retry;
//!
//! # async fn example() -> Result<(), Error> {
//! let config = RetryConfig::default();
//! let body = with_retry(&config, || async {
//!     Ok::<String, Error>("fetched".to_string())
//! })
//! .await?;
//! # Ok(())
//! # }
//! ```

use crate::config::RetryConfig;
use crate::error::Error;
use rand::Rng;
use std::future::Future;
use std::time::Duration;

/// Trait for errors that can be classified as retryable or not
pub trait IsRetryable {
    /// Returns true if the error is transient and the operation should be retried
    fn is_retryable(&self) -> bool;
}

impl IsRetryable for Error {
    fn is_retryable(&self) -> bool {
        match self {
            Error::Transport(e) => e.is_timeout() || e.is_connect(),
            Error::Io(e) => matches!(
                e.kind(),
                std::io::ErrorKind::TimedOut
                    | std::io::ErrorKind::ConnectionRefused
                    | std::io::ErrorKind::ConnectionReset
                    | std::io::ErrorKind::ConnectionAborted
                    | std::io::ErrorKind::NotConnected
                    | std::io::ErrorKind::BrokenPipe
                    | std::io::ErrorKind::Interrupted
            ),
            Error::NotFound(_)
            | Error::Storage { .. }
            | Error::Conflict { .. }
            | Error::InvalidId(_)
            | Error::InvalidStrategy(_)
            | Error::Config { .. }
            | Error::ApiServerError(_)
            | Error::ShuttingDown
            | Error::Other(_) => false,
        }
    }
}

/// Run an async operation, retrying transient failures with exponential backoff
///
/// The operation runs at most `config.max_attempts + 1` times. Delays start at
/// `initial_delay`, grow by `backoff_multiplier`, and never exceed `max_delay`
/// (before jitter).
pub async fn with_retry<F, Fut, T, E>(config: &RetryConfig, mut operation: F) -> Result<T, E>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: IsRetryable + std::fmt::Display,
{
    let mut attempt = 0;
    let mut delay = config.initial_delay;

    loop {
        match operation().await {
            Ok(result) => {
                if attempt > 0 {
                    tracing::info!(attempts = attempt + 1, "Operation succeeded after retry");
                }
                return Ok(result);
            }
            Err(e) if e.is_retryable() && attempt < config.max_attempts => {
                attempt += 1;

                tracing::warn!(
                    error = %e,
                    attempt,
                    max_attempts = config.max_attempts,
                    delay_ms = delay.as_millis(),
                    "Transient failure, retrying"
                );

                let wait = if config.jitter {
                    add_jitter(delay)
                } else {
                    delay
                };
                tokio::time::sleep(wait).await;

                let next = Duration::from_secs_f64(delay.as_secs_f64() * config.backoff_multiplier);
                delay = next.min(config.max_delay);
            }
            Err(e) => {
                if e.is_retryable() {
                    tracing::warn!(error = %e, attempts = attempt + 1, "Retries exhausted");
                }
                return Err(e);
            }
        }
    }
}

/// Stretch a delay by a random 0-100% so parallel workers do not retry in lockstep
fn add_jitter(delay: Duration) -> Duration {
    let mut rng = rand::thread_rng();
    let jitter_factor: f64 = rng.gen_range(0.0..=1.0);
    Duration::from_secs_f64(delay.as_secs_f64() * (1.0 + jitter_factor))
}

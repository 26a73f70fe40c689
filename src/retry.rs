//! Retry logic driven by a caller-supplied delay sequence
//!
//! A delay sequence of length N allows at most N retries (N + 1 attempts).
//! Retry `n` waits `delays[min(n, N - 1)]` first; a zero delay retries at once.
//! Only errors that report themselves as retryable are re-attempted; anything
//! else is returned after the first failure regardless of remaining budget.
//!
//! # Example
//!
//! ```no_run
//! use weread_export::retry::{IsRetryable, with_retry};
//! use weread_export::config::RetryConfig;
//!
//! #[derive(Debug)]
//! enum MyError {
//!     Transient,
//!     Permanent,
//! }
//!
//! impl std::fmt::Display for MyError {
//!     fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
//!         write!(f, "{self:?}")
//!     }
//! }
//!
//! impl IsRetryable for MyError {
//!     fn is_retryable(&self) -> bool {
//!         matches!(self, MyError::Transient)
//!     }
//! }
//!
//! # async fn example() -> Result<(), MyError> {
//! let config = RetryConfig::from_millis(&[100, 500]);
//! with_retry(&config.delays, || async {
//!     // Your operation here
//!     Ok::<_, MyError>(())
//! }).await?;
//! # Ok(())
//! # }
//! ```

use crate::error::{Error, RequestError};
use std::future::Future;
use std::time::Duration;

/// Trait for errors that can be classified as retryable or not
pub trait IsRetryable {
    /// Returns true if the error is transient and the operation should be retried
    fn is_retryable(&self) -> bool;
}

impl IsRetryable for RequestError {
    fn is_retryable(&self) -> bool {
        self.should_retry()
    }
}

impl IsRetryable for Error {
    fn is_retryable(&self) -> bool {
        match self {
            Error::Request(e) => e.should_retry(),
            // Everything else is local: contract violations, disk, encoding
            Error::Config { .. }
            | Error::UnsupportedFormat(_)
            | Error::ClipboardUnavailable
            | Error::FileExists(_)
            | Error::Io(_)
            | Error::Serialization(_)
            | Error::Csv(_)
            | Error::Other(_) => false,
        }
    }
}

/// Where a retrying operation currently stands
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RetryState {
    /// Running attempt number `attempt` (zero-based)
    Attempting {
        /// Zero-based attempt index
        attempt: usize,
    },
    /// Attempt `attempt` failed with a retryable error; waiting `delay` before the next
    WaitingToRetry {
        /// Zero-based index of the attempt that failed
        attempt: usize,
        /// Pause before the next attempt
        delay: Duration,
    },
    /// An attempt succeeded
    Succeeded {
        /// Total number of attempts made
        attempts: usize,
    },
    /// Gave up; the last error is surfaced to the caller
    Failed {
        /// Total number of attempts made
        attempts: usize,
    },
}

impl RetryState {
    /// Initial state of every retrying operation
    pub fn start() -> Self {
        RetryState::Attempting { attempt: 0 }
    }

    /// Transition after an attempt settles
    ///
    /// `outcome_retryable` is `None` on success and `Some(retryable)` on failure.
    pub fn on_outcome(self, outcome_retryable: Option<bool>, delays: &[Duration]) -> Self {
        let RetryState::Attempting { attempt } = self else {
            return self;
        };
        match outcome_retryable {
            None => RetryState::Succeeded {
                attempts: attempt + 1,
            },
            Some(true) if attempt < delays.len() => RetryState::WaitingToRetry {
                attempt,
                delay: retry_delay(delays, attempt),
            },
            Some(_) => RetryState::Failed {
                attempts: attempt + 1,
            },
        }
    }

    /// Transition once the wait is over
    pub fn resume(self) -> Self {
        match self {
            RetryState::WaitingToRetry { attempt, .. } => RetryState::Attempting {
                attempt: attempt + 1,
            },
            other => other,
        }
    }

    /// Whether the operation has finished
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            RetryState::Succeeded { .. } | RetryState::Failed { .. }
        )
    }
}

/// Delay to wait after failed attempt `attempt`, clamped to the last entry
///
/// Returns zero for an empty sequence.
pub fn retry_delay(delays: &[Duration], attempt: usize) -> Duration {
    match delays.len() {
        0 => Duration::ZERO,
        len => delays[attempt.min(len - 1)],
    }
}

/// Execute an async operation, retrying retryable failures per `delays`
///
/// # Arguments
///
/// * `delays` - One entry per permitted retry
/// * `operation` - Async closure re-invoked from scratch on every attempt
///
/// # Returns
///
/// Returns the successful result, or the error from the final attempt.
pub async fn with_retry<F, Fut, T, E>(delays: &[Duration], mut operation: F) -> Result<T, E>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: IsRetryable + std::fmt::Display,
{
    let mut state = RetryState::start();

    loop {
        let result = operation().await;
        state = state.on_outcome(result.as_ref().err().map(IsRetryable::is_retryable), delays);

        match (state, result) {
            (RetryState::Succeeded { attempts }, Ok(value)) => {
                if attempts > 1 {
                    tracing::info!(attempts, "Operation succeeded after retry");
                }
                return Ok(value);
            }
            (RetryState::WaitingToRetry { attempt, delay }, Err(e)) => {
                tracing::warn!(
                    error = %e,
                    attempt = attempt + 1,
                    max_attempts = delays.len() + 1,
                    delay_ms = delay.as_millis(),
                    "Operation failed, retrying"
                );
                if !delay.is_zero() {
                    tokio::time::sleep(delay).await;
                }
                state = state.resume();
            }
            (RetryState::Failed { attempts }, Err(e)) => {
                if e.is_retryable() {
                    tracing::error!(
                        error = %e,
                        attempts,
                        "Operation failed after all retry attempts exhausted"
                    );
                } else {
                    tracing::error!(error = %e, "Operation failed with non-retryable error");
                }
                return Err(e);
            }
            // on_outcome maps Ok to Succeeded and Err to WaitingToRetry/Failed
            (_, result) => return result,
        }
    }
}

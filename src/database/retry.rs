//! Exponential backoff for store writes that hit a busy or locked database.

use crate::error::{AppError, Result};
use backon::{BlockingRetryable, ExponentialBuilder};
use log::warn;
use serde::{Deserialize, Serialize};
use std::time::Duration;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetryPolicy {
    /// Retries after the first attempt.
    pub max_retries: usize,
    pub min_delay_ms: u64,
    pub max_delay_ms: u64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 3,
            min_delay_ms: 50,
            max_delay_ms: 1000,
        }
    }
}

impl RetryPolicy {
    /// A policy that gives up after the first failure.
    pub fn none() -> Self {
        Self {
            max_retries: 0,
            ..Self::default()
        }
    }

    fn backoff(&self) -> ExponentialBuilder {
        ExponentialBuilder::default()
            .with_min_delay(Duration::from_millis(self.min_delay_ms))
            .with_max_delay(Duration::from_millis(self.max_delay_ms))
            .with_max_times(self.max_retries)
    }
}

/// Runs `op`, retrying only transient failures as described by `policy`.
pub fn with_retry<T>(policy: &RetryPolicy, mut op: impl FnMut() -> Result<T>) -> Result<T> {
    (|| op())
        .retry(policy.backoff())
        .sleep(std::thread::sleep)
        .when(|e: &AppError| e.is_transient())
        .notify(|e: &AppError, delay: Duration| {
            warn!("Store write failed ({}), retrying in {:?}", e, delay);
        })
        .call()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rusqlite::ffi;

    fn busy() -> AppError {
        AppError::Database(rusqlite::Error::SqliteFailure(
            ffi::Error::new(ffi::SQLITE_BUSY),
            None,
        ))
    }

    fn fast_policy(max_retries: usize) -> RetryPolicy {
        RetryPolicy {
            max_retries,
            min_delay_ms: 1,
            max_delay_ms: 2,
        }
    }

    #[test]
    fn test_busy_error_is_transient() {
        assert!(busy().is_transient());
    }

    #[test]
    fn test_retries_transient_failure() {
        let mut attempts = 0;
        let result = with_retry(&fast_policy(3), || {
            attempts += 1;
            if attempts < 3 { Err(busy()) } else { Ok(attempts) }
        });

        assert_eq!(result.unwrap(), 3);
    }

    #[test]
    fn test_gives_up_after_max_retries() {
        let mut attempts = 0;
        let result: Result<()> = with_retry(&fast_policy(2), || {
            attempts += 1;
            Err(busy())
        });

        assert!(result.is_err());
        assert_eq!(attempts, 3);
    }

    #[test]
    fn test_permanent_failure_is_not_retried() {
        let mut attempts = 0;
        let result: Result<()> = with_retry(&fast_policy(5), || {
            attempts += 1;
            Err(AppError::Validation("bad record".to_string()))
        });

        assert!(result.is_err());
        assert_eq!(attempts, 1);
    }
}

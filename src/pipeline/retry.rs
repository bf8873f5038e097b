//! Retry utilities for transient stage failures
//!
//! A stage invocation is retried only while its outcome is transient, with a
//! fixed pause between attempts and a hard attempt bound.

use tokio::time::sleep;
use tracing::{debug, warn};

use crate::config::RetryConfig;
use crate::models::ProbeOutcome;

/// Something a retry loop can inspect and annotate
pub trait Retryable {
    /// Whether another attempt could change the result
    fn is_retryable(&self) -> bool;

    /// Human-readable reason for logging
    fn reason(&self) -> &str;

    /// Record that the attempt budget was used up
    fn exhausted(self, attempts: u32) -> Self;
}

impl Retryable for ProbeOutcome {
    fn is_retryable(&self) -> bool {
        self.is_transient()
    }

    fn reason(&self) -> &str {
        &self.reason
    }

    fn exhausted(mut self, attempts: u32) -> Self {
        let plural = if attempts == 1 { "" } else { "s" };
        self.reason = format!("{} (after {} attempt{})", self.reason, attempts, plural);
        self
    }
}

/// Execute an operation with retry logic
///
/// # Arguments
///
/// * `config` - Retry configuration; `max_attempts` of 0 behaves like 1
/// * `operation` - Async closure producing one attempt's result
/// * `operation_name` - Human-readable name for logging
///
/// # Returns
///
/// The first non-retryable result, or the last result annotated with the
/// attempt count once the budget is exhausted
pub async fn with_retry<T, F, Fut>(config: &RetryConfig, mut operation: F, operation_name: &str) -> T
where
    T: Retryable,
    F: FnMut() -> Fut,
    Fut: std::future::Future<Output = T>,
{
    let max_attempts = config.max_attempts.max(1);
    let mut attempt = 1;

    loop {
        let result = operation().await;

        if !result.is_retryable() {
            if attempt > 1 {
                debug!(
                    "Operation '{}' settled on attempt {}/{}",
                    operation_name, attempt, max_attempts
                );
            }
            return result;
        }

        if attempt >= max_attempts {
            warn!(
                "Operation '{}' failed after {} attempts: {}",
                operation_name,
                attempt,
                result.reason()
            );
            return result.exhausted(attempt);
        }

        warn!(
            "Operation '{}' failed on attempt {}/{}, retrying in {:?}: {}",
            operation_name,
            attempt,
            max_attempts,
            config.delay,
            result.reason()
        );
        sleep(config.delay).await;
        attempt += 1;
    }
}

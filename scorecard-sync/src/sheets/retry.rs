//! Bounded retry for idempotent source reads
//!
//! Tab listing and row fetches are safe to repeat, so transient remote
//! failures get a few attempts with exponential backoff before the run
//! fails. Structural outcomes (no tabs, insufficient data, credential
//! faults) are returned immediately; retrying cannot change them.

use std::time::Duration;

use crate::sheets::SourceError;

/// Backoff ceiling between attempts.
const MAX_BACKOFF_MS: u64 = 5_000;

/// Run an idempotent source read with bounded exponential backoff.
///
/// `max_attempts` counts total tries, so `1` disables retrying. Only
/// errors reporting as transient are retried.
pub async fn retry_source_read<F, Fut, T>(
    operation_name: &str,
    max_attempts: u32,
    base_delay: Duration,
    mut operation: F,
) -> Result<T, SourceError>
where
    F: FnMut() -> Fut,
    Fut: std::future::Future<Output = Result<T, SourceError>>,
{
    let max_attempts = max_attempts.max(1);
    let mut backoff = base_delay;

    for attempt in 1..=max_attempts {
        match operation().await {
            Ok(result) => {
                if attempt > 1 {
                    tracing::debug!(
                        operation = operation_name,
                        attempt,
                        "Source read succeeded after retry"
                    );
                }
                return Ok(result);
            }
            Err(err) if err.is_transient() && attempt < max_attempts => {
                tracing::warn!(
                    operation = operation_name,
                    attempt,
                    backoff_ms = backoff.as_millis() as u64,
                    error = %err,
                    "Transient source failure, will retry after backoff"
                );
                tokio::time::sleep(backoff).await;
                backoff = (backoff * 2).min(Duration::from_millis(MAX_BACKOFF_MS));
            }
            Err(err) => return Err(err),
        }
    }

    unreachable!("loop returns on final attempt")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_succeeds_first_attempt() {
        let result = retry_source_read("test_op", 3, Duration::from_millis(1), || async {
            Ok::<i32, SourceError>(42)
        })
        .await;
        assert_eq!(result.unwrap(), 42);
    }

    #[tokio::test]
    async fn test_transient_errors_retried_until_success() {
        let mut attempts = 0;
        let result = retry_source_read("test_op", 5, Duration::from_millis(1), || {
            attempts += 1;
            let current = attempts;
            async move {
                if current < 3 {
                    Err(SourceError::Unavailable("flaky".to_string()))
                } else {
                    Ok(99)
                }
            }
        })
        .await;

        assert_eq!(result.unwrap(), 99);
        assert_eq!(attempts, 3);
    }

    #[tokio::test]
    async fn test_attempts_exhausted_returns_last_error() {
        let mut attempts = 0;
        let result = retry_source_read("test_op", 3, Duration::from_millis(1), || {
            attempts += 1;
            async { Err::<i32, SourceError>(SourceError::Unavailable("down".to_string())) }
        })
        .await;

        assert!(matches!(result, Err(SourceError::Unavailable(_))));
        assert_eq!(attempts, 3);
    }

    #[tokio::test]
    async fn test_structural_error_not_retried() {
        let mut attempts = 0;
        let result = retry_source_read("test_op", 5, Duration::from_millis(1), || {
            attempts += 1;
            async { Err::<i32, SourceError>(SourceError::InsufficientData) }
        })
        .await;

        assert!(matches!(result, Err(SourceError::InsufficientData)));
        assert_eq!(attempts, 1);
    }

    #[tokio::test]
    async fn test_single_attempt_disables_retry() {
        let mut attempts = 0;
        let result = retry_source_read("test_op", 1, Duration::from_millis(1), || {
            attempts += 1;
            async { Err::<i32, SourceError>(SourceError::Unavailable("down".to_string())) }
        })
        .await;

        assert!(result.is_err());
        assert_eq!(attempts, 1);
    }
}

//! Request Timeouts
//!
//! Every generation call is bounded by an explicit deadline in addition to
//! the HTTP client's own timeout, so a stalled connection resolves into a
//! per-item error instead of hanging the batch.
//!
//! ```ignore
//! use crate::ai::timeout::with_timeout;
//!
//! let body = with_timeout(Duration::from_secs(120), send_request(), "generateContent").await?;
//! ```

use std::future::Future;
use std::time::Duration;

use crate::types::{QuotaDocError, Result};

/// Execute an async operation with a timeout
///
/// Returns [`QuotaDocError::Timeout`] if the operation doesn't complete in time.
pub async fn with_timeout<T, F>(timeout: Duration, future: F, operation_name: &str) -> Result<T>
where
    F: Future<Output = Result<T>>,
{
    match tokio::time::timeout(timeout, future).await {
        Ok(result) => result,
        Err(_) => Err(QuotaDocError::timeout(operation_name, timeout)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_with_timeout_success() {
        let result = with_timeout(
            Duration::from_secs(1),
            async { Ok::<_, QuotaDocError>(42) },
            "test operation",
        )
        .await;
        assert_eq!(result.unwrap(), 42);
    }

    #[tokio::test]
    async fn test_with_timeout_expires() {
        let result = with_timeout(
            Duration::from_millis(10),
            async {
                tokio::time::sleep(Duration::from_secs(1)).await;
                Ok::<_, QuotaDocError>(42)
            },
            "slow operation",
        )
        .await;
        assert!(matches!(result.unwrap_err(), QuotaDocError::Timeout { .. }));
    }
}

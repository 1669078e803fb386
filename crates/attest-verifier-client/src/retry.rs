//! Retry with exponential backoff for verifier HTTP calls.
//!
//! Retries only transport failures (connection refused or reset, timeouts).
//! Any HTTP response, 4xx and 5xx included, is returned to the caller on
//! the first attempt: a verifier rejecting a request will reject it again.

use std::time::Duration;

/// How many times to retry and how long to wait.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct RetryPolicy {
    /// Attempts after the first.
    pub max_retries: u32,
    /// Delay before the first retry; doubles each retry.
    pub base_delay: Duration,
}

impl RetryPolicy {
    fn delay(&self, attempt: u32) -> Duration {
        self.base_delay.saturating_mul(2u32.saturating_pow(attempt))
    }
}

/// Send an HTTP request, retrying transport errors per `policy`.
///
/// `f` is called up to `policy.max_retries + 1` times. Request-building
/// errors are returned immediately since they cannot succeed on retry.
pub(crate) async fn retry_send<F, Fut>(
    policy: RetryPolicy,
    endpoint: &str,
    f: F,
) -> Result<reqwest::Response, reqwest::Error>
where
    F: Fn() -> Fut,
    Fut: std::future::Future<Output = Result<reqwest::Response, reqwest::Error>>,
{
    for attempt in 0..policy.max_retries {
        match f().await {
            Ok(resp) => return Ok(resp),
            Err(e) if e.is_builder() => return Err(e),
            Err(e) => {
                let delay = policy.delay(attempt);
                tracing::warn!(
                    endpoint,
                    attempt = attempt + 1,
                    max_retries = policy.max_retries,
                    "verifier request failed, retrying in {delay:?}: {e}"
                );
                tokio::time::sleep(delay).await;
            }
        }
    }
    // Final attempt.
    f().await
}

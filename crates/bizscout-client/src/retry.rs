//! Retry with exponential back-off and jitter for the search client.
//!
//! [`retry_with_backoff`] wraps any fallible async operation and retries on
//! transient errors. Everything else is returned immediately.

use std::future::Future;
use std::time::Duration;

use crate::error::SearchError;

const MAX_DELAY_MS: u64 = 30_000;

/// Returns `true` for errors that are worth retrying after a back-off delay.
///
/// **Retriable:**
/// - [`SearchError::RateLimited`] (HTTP 429).
/// - Network-level failures: timeout, connection refused or reset.
/// - HTTP 5xx responses without an API error envelope.
///
/// **Not retriable:** API error envelopes, 4xx statuses, bad JSON and a bad
/// base URL. Retrying would return the same thing.
pub(crate) fn is_retriable(err: &SearchError) -> bool {
    match err {
        SearchError::RateLimited { .. } => true,
        SearchError::Http(e) => e.is_timeout() || e.is_connect(),
        SearchError::UnexpectedStatus { status, .. } => *status >= 500,
        SearchError::Api { .. }
        | SearchError::Deserialize { .. }
        | SearchError::InvalidBaseUrl { .. } => false,
    }
}

/// Runs `operation` with up to `max_retries` additional attempts on transient errors.
///
/// The n-th retry waits `backoff_base_ms × 2^(n-1)` ms, ±25 % jitter. A
/// rate-limit `Retry-After` hint raises the wait to at least that long. Every
/// wait is capped at 30 s.
pub(crate) async fn retry_with_backoff<T, F, Fut>(
    max_retries: u32,
    backoff_base_ms: u64,
    mut operation: F,
) -> Result<T, SearchError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, SearchError>>,
{
    let mut attempt = 0u32;
    loop {
        match operation().await {
            Ok(value) => return Ok(value),
            Err(err) => {
                if !is_retriable(&err) || attempt >= max_retries {
                    return Err(err);
                }
                attempt += 1;
                let computed = backoff_base_ms.saturating_mul(1u64 << (attempt - 1).min(10));
                let capped = computed.min(MAX_DELAY_MS);
                #[allow(
                    clippy::cast_possible_truncation,
                    clippy::cast_sign_loss,
                    clippy::cast_precision_loss
                )]
                let jittered = (capped as f64 * (rand::random::<f64>() * 0.5 + 0.75)) as u64;
                let delay_ms = retry_delay_ms(&err, jittered);
                tracing::warn!(
                    attempt,
                    max_retries,
                    delay_ms,
                    error = %err,
                    "transient search API error, retrying after back-off"
                );
                tokio::time::sleep(Duration::from_millis(delay_ms)).await;
            }
        }
    }
}

/// Stretches `backoff_ms` to the server's `Retry-After` hint on a 429.
fn retry_delay_ms(err: &SearchError, backoff_ms: u64) -> u64 {
    let hinted_ms = match err {
        SearchError::RateLimited {
            retry_after_secs: Some(secs),
        } => secs.saturating_mul(1000),
        _ => 0,
    };
    backoff_ms.max(hinted_ms).min(MAX_DELAY_MS)
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Arc;

    use super::*;

    fn rate_limited() -> SearchError {
        SearchError::RateLimited {
            retry_after_secs: None,
        }
    }

    #[test]
    fn api_error_is_not_retriable() {
        assert!(!is_retriable(&SearchError::Api {
            id: "INVALID_PARAMETER".to_owned(),
            text: "bad".to_owned(),
        }));
    }

    #[test]
    fn client_status_is_not_retriable_but_server_status_is() {
        assert!(!is_retriable(&SearchError::UnexpectedStatus {
            status: 404,
            path: "/search".to_owned(),
        }));
        assert!(is_retriable(&SearchError::UnexpectedStatus {
            status: 503,
            path: "/search".to_owned(),
        }));
    }

    #[test]
    fn deserialize_error_is_not_retriable() {
        let source = serde_json::from_str::<()>("invalid").unwrap_err();
        assert!(!is_retriable(&SearchError::Deserialize {
            context: "test".to_owned(),
            source,
        }));
    }

    #[test]
    fn retry_after_hint_stretches_backoff() {
        let hinted = SearchError::RateLimited {
            retry_after_secs: Some(3),
        };
        assert_eq!(retry_delay_ms(&hinted, 12), 3_000);
        assert_eq!(retry_delay_ms(&hinted, 5_000), 5_000);
        assert_eq!(retry_delay_ms(&rate_limited(), 12), 12);
    }

    #[test]
    fn retry_after_hint_is_capped() {
        let hinted = SearchError::RateLimited {
            retry_after_secs: Some(3_600),
        };
        assert_eq!(retry_delay_ms(&hinted, 10), MAX_DELAY_MS);
    }

    #[tokio::test]
    async fn succeeds_immediately_on_first_try() {
        let calls = Arc::new(AtomicU32::new(0));
        let c = Arc::clone(&calls);
        let result = retry_with_backoff(3, 0, || {
            let c = Arc::clone(&c);
            async move {
                c.fetch_add(1, Ordering::SeqCst);
                Ok::<u32, SearchError>(42)
            }
        })
        .await;
        assert_eq!(result.unwrap(), 42);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn retries_rate_limited_then_succeeds() {
        let calls = Arc::new(AtomicU32::new(0));
        let c = Arc::clone(&calls);
        let result = retry_with_backoff(3, 0, || {
            let c = Arc::clone(&c);
            async move {
                if c.fetch_add(1, Ordering::SeqCst) < 2 {
                    Err(rate_limited())
                } else {
                    Ok::<u32, SearchError>(7)
                }
            }
        })
        .await;
        assert_eq!(result.unwrap(), 7);
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn gives_up_after_max_retries() {
        let calls = Arc::new(AtomicU32::new(0));
        let c = Arc::clone(&calls);
        let result = retry_with_backoff(2, 0, || {
            let c = Arc::clone(&c);
            async move {
                c.fetch_add(1, Ordering::SeqCst);
                Err::<u32, _>(rate_limited())
            }
        })
        .await;
        assert_eq!(calls.load(Ordering::SeqCst), 3, "1 try + 2 retries");
        assert!(matches!(result, Err(SearchError::RateLimited { .. })));
    }

    #[tokio::test]
    async fn does_not_retry_api_error() {
        let calls = Arc::new(AtomicU32::new(0));
        let c = Arc::clone(&calls);
        let result = retry_with_backoff(3, 0, || {
            let c = Arc::clone(&c);
            async move {
                c.fetch_add(1, Ordering::SeqCst);
                Err::<u32, _>(SearchError::Api {
                    id: "UNAVAILABLE_FOR_LOCATION".to_owned(),
                    text: "no".to_owned(),
                })
            }
        })
        .await;
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert!(matches!(result, Err(SearchError::Api { .. })));
    }
}

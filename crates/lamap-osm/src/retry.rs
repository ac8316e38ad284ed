//! Retry with exponential back-off and jitter for the OSM clients.
//!
//! [`retry_with_backoff`] wraps any fallible async operation and retries
//! transient errors only. The public OSM instances rate-limit hard, so
//! malformed-payload and client errors are returned immediately.

use std::future::Future;
use std::time::Duration;

use crate::error::OsmError;

/// Returns `true` for errors that are worth retrying after a back-off delay.
///
/// **Retriable:**
/// - Network-level failures: timeout, connection reset.
/// - HTTP 5xx responses: transient server/infrastructure errors.
///
/// **Not retriable:**
/// - HTTP 4xx: bad query or rate-limit rejection; retrying won't fix it.
/// - [`OsmError::UnexpectedPayload`] / [`OsmError::Deserialize`] —
///   malformed response; retrying won't fix it.
/// - [`OsmError::InvalidBaseUrl`] — configuration error.
pub(crate) fn is_retriable(err: &OsmError) -> bool {
    match err {
        OsmError::Http(e) => {
            e.is_timeout() || e.is_connect() || e.status().is_some_and(|s| s.is_server_error())
        }
        OsmError::UnexpectedPayload { .. }
        | OsmError::Deserialize { .. }
        | OsmError::InvalidBaseUrl(_) => false,
    }
}

/// Runs `operation` with up to `max_retries` additional attempts on
/// transient errors. Delay doubles per attempt from `backoff_base_ms`,
/// is capped at 60 s, and carries ±25 % jitter.
pub(crate) async fn retry_with_backoff<T, F, Fut>(
    max_retries: u32,
    backoff_base_ms: u64,
    mut operation: F,
) -> Result<T, OsmError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, OsmError>>,
{
    const MAX_DELAY_MS: u64 = 60_000;
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
                let delay_ms = (capped as f64 * (rand::random::<f64>() * 0.5 + 0.75)) as u64;
                tracing::warn!(
                    attempt,
                    max_retries,
                    delay_ms,
                    error = %err,
                    "OSM transient error — retrying after back-off"
                );
                tokio::time::sleep(Duration::from_millis(delay_ms)).await;
            }
        }
    }
}

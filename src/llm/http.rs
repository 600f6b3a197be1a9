//! Shared HTTP plumbing for the reqwest-backed provider adapters.

use std::time::Duration;

use rand::Rng;
use reqwest::Client;
use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::error::LlmError;

/// Retries on transient statuses before a request is given up on.
pub(crate) const MAX_RETRIES: u32 = 2;

/// Returns `true` if the HTTP status code is transient and worth retrying.
fn is_retryable_status(status: u16) -> bool {
    matches!(status, 429 | 500 | 502 | 503 | 504)
}

/// Calculate exponential backoff delay with random jitter.
///
/// Base delay is 1 second, doubled each attempt, with +/-25% jitter.
fn retry_backoff_delay(attempt: u32) -> Duration {
    let base_ms: u64 = 1000 * 2u64.saturating_pow(attempt);
    let jitter_range = base_ms / 4;
    let jitter = if jitter_range > 0 {
        let offset = rand::thread_rng().gen_range(0..=jitter_range * 2);
        offset as i64 - jitter_range as i64
    } else {
        0
    };
    let delay_ms = (base_ms as i64 + jitter).max(100) as u64;
    Duration::from_millis(delay_ms)
}

/// POST `body` as JSON and deserialize the response, retrying transient
/// failures with backoff. 401 and 429 map to their dedicated error
/// variants so callers can tell auth problems from load problems.
pub(crate) async fn send_json_request<T, R>(
    client: &Client,
    provider: &str,
    url: &str,
    headers: &[(&str, String)],
    body: &T,
) -> Result<R, LlmError>
where
    T: Serialize + Sync,
    R: DeserializeOwned,
{
    for attempt in 0..=MAX_RETRIES {
        let mut request = client.post(url).header("content-type", "application/json");
        for (name, value) in headers {
            request = request.header(*name, value);
        }

        let response = match request.json(body).send().await {
            Ok(r) => r,
            Err(e) => {
                if attempt < MAX_RETRIES {
                    let delay = retry_backoff_delay(attempt);
                    tracing::warn!(
                        "{provider} request error (attempt {}/{}), retrying in {delay:?}: {e}",
                        attempt + 1,
                        MAX_RETRIES + 1,
                    );
                    tokio::time::sleep(delay).await;
                    continue;
                }
                return Err(LlmError::RequestFailed {
                    provider: provider.to_string(),
                    reason: e.to_string(),
                });
            }
        };

        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|e| LlmError::RequestFailed {
                provider: provider.to_string(),
                reason: format!("failed to read response body: {e}"),
            })?;

        if !status.is_success() {
            let code = status.as_u16();
            if is_retryable_status(code) && attempt < MAX_RETRIES {
                let delay = retry_backoff_delay(attempt);
                tracing::warn!(
                    "{provider} HTTP {status} (attempt {}/{}), retrying in {delay:?}",
                    attempt + 1,
                    MAX_RETRIES + 1,
                );
                tokio::time::sleep(delay).await;
                continue;
            }
            if code == 401 {
                return Err(LlmError::AuthFailed {
                    provider: provider.to_string(),
                });
            }
            if code == 429 {
                return Err(LlmError::RateLimited {
                    provider: provider.to_string(),
                    retry_after: None,
                });
            }
            return Err(LlmError::RequestFailed {
                provider: provider.to_string(),
                reason: format!("HTTP {}: {}", status, &text[..text.len().min(200)]),
            });
        }

        return serde_json::from_str(&text).map_err(|e| LlmError::InvalidResponse {
            provider: provider.to_string(),
            reason: format!("JSON parse error: {e}. Raw: {}", &text[..text.len().min(200)]),
        });
    }

    // Unreachable because the loop always returns, but the compiler cannot
    // prove that. Generic error as a safety net.
    Err(LlmError::RequestFailed {
        provider: provider.to_string(),
        reason: "retry loop exited unexpectedly".to_string(),
    })
}

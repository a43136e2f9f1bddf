// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Shared retry-on-transient-status helper for the three HTTP clients.
//! Grounded on the original's `requests.Session` + `urllib3.util.retry.Retry`
//! (`total=3, backoff_factor=1, status_forcelist=[429, 500, 502, 503, 504]`):
//! `rn_core::RetryPolicy::network_default` plays the same role.

use rn_core::RetryPolicy;
use tracing::warn;

const RETRYABLE_STATUS: &[u16] = &[429, 500, 502, 503, 504];

/// Sends a request built fresh on each attempt (a `RequestBuilder` may not
/// be safely reused once consumed), retrying on transient statuses and
/// connection/timeout errors.
pub(crate) async fn send_with_retry<F>(
    mut build: F,
    retry_policy: &RetryPolicy,
    operation: &str,
) -> Result<reqwest::Response, String>
where
    F: FnMut() -> reqwest::RequestBuilder,
{
    let mut last_error = String::new();
    for attempt in 0..=retry_policy.max_retries {
        let outcome = build().send().await;
        match outcome {
            Ok(response) if RETRYABLE_STATUS.contains(&response.status().as_u16()) => {
                last_error = format!("transient status {}", response.status());
            }
            Ok(response) => return Ok(response),
            Err(err) if err.is_timeout() || err.is_connect() => {
                last_error = format!("transport error: {err}");
            }
            Err(err) => return Err(format!("{operation} failed: {err}")),
        }

        if attempt < retry_policy.max_retries {
            let delay = retry_policy.delay(attempt);
            warn!(attempt, operation, reason = %last_error, delay_ms = delay.as_millis() as u64, "retrying HTTP request");
            tokio::time::sleep(delay).await;
        }
    }

    Err(format!(
        "{operation} failed after {} retries: {last_error}",
        retry_policy.max_retries
    ))
}

//! Short retry loop for image fetches.
//!
//! Fetches run while the installation is live, so the budget is small: a
//! couple of quick retries with exponential backoff for transient failures
//! (timeouts, connection resets, 429, 5xx). Client errors fail immediately.

use std::time::Duration;

use crate::SampleError;

/// First backoff delay; doubles on every retry.
const BASE_DELAY: Duration = Duration::from_millis(250);

/// Sends the request built by `build_request`, retrying transient failures
/// up to `max_retries` times.
///
/// # Errors
///
/// Returns the last [`SampleError`] once the retry budget is spent, or the
/// first permanent error.
pub async fn send<F>(build_request: F, max_retries: u32) -> Result<reqwest::Response, SampleError>
where
    F: Fn() -> reqwest::RequestBuilder + Send + Sync,
{
    let mut attempt = 0;
    loop {
        if attempt > 0 {
            let delay = BASE_DELAY * (1u32 << (attempt - 1).min(4));
            log::debug!("  image fetch retry {attempt}/{max_retries} in {delay:?}");
            tokio::time::sleep(delay).await;
        }

        match build_request().send().await {
            Err(e) => {
                if is_transient(&e) && attempt < max_retries {
                    log::debug!("  transient fetch error: {e}");
                    attempt += 1;
                    continue;
                }
                return Err(SampleError::Http(e));
            }
            Ok(response) => {
                let status = response.status();
                let retryable = status == reqwest::StatusCode::TOO_MANY_REQUESTS
                    || status.is_server_error();

                if retryable && attempt < max_retries {
                    log::debug!("  HTTP {status}, retrying");
                    attempt += 1;
                    continue;
                }
                if !status.is_success() {
                    return Err(SampleError::Status {
                        status: status.as_u16(),
                        url: redact_key(response.url().as_str()),
                    });
                }
                return Ok(response);
            }
        }
    }
}

fn is_transient(e: &reqwest::Error) -> bool {
    e.is_timeout() || e.is_connect() || e.is_body() || e.is_request()
}

/// Replaces the value of a `key=` query parameter so URLs can be logged.
pub fn redact_key(url: &str) -> String {
    let Some(start) = url.find("key=").map(|i| i + "key=".len()) else {
        return url.to_string();
    };
    let end = url[start..].find('&').map_or(url.len(), |i| start + i);
    format!("{}***{}", &url[..start], &url[end..])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn redacts_key_parameter() {
        assert_eq!(
            redact_key("https://x/streetview?size=50x50&key=SECRET"),
            "https://x/streetview?size=50x50&key=***"
        );
        assert_eq!(
            redact_key("https://x/?key=SECRET&size=50x50"),
            "https://x/?key=***&size=50x50"
        );
        assert_eq!(redact_key("https://x/?size=50x50"), "https://x/?size=50x50");
    }
}

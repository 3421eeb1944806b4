//! Retry policy for release downloads and GitHub API calls.

use reqwest::StatusCode;
use thiserror::Error;

/// Maximum number of attempts for one network operation.
pub const MAX_RETRIES: usize = 3;

/// Delay between attempts in milliseconds.
pub const RETRY_DELAY_MS: u64 = 1000;

/// HTTP failures that will not go away by asking again.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum NonRetryableError {
    #[error("Rate limit exceeded for {0}. Try again later or set GITHUB_TOKEN.")]
    RateLimitExceeded(String),
    #[error("Authentication failed for {0}. Check your GITHUB_TOKEN.")]
    AuthenticationFailed(String),
    #[error("Not found: {0}")]
    NotFound(String),
    #[error("Access forbidden: {0}. Private releases need GITHUB_TOKEN.")]
    Forbidden(String),
    #[error("Request error: HTTP {status} for {url}")]
    ClientError { status: u16, url: String },
}

/// Map a response status to a non-retryable error, if it is one.
///
/// 5xx and anything that is not a client error stay retryable.
pub fn classify_status(status: StatusCode, url: &str) -> Option<NonRetryableError> {
    let url = url.to_string();
    match status {
        StatusCode::UNAUTHORIZED => Some(NonRetryableError::AuthenticationFailed(url)),
        StatusCode::FORBIDDEN => Some(NonRetryableError::Forbidden(url)),
        StatusCode::TOO_MANY_REQUESTS => Some(NonRetryableError::RateLimitExceeded(url)),
        StatusCode::NOT_FOUND => Some(NonRetryableError::NotFound(url)),
        s if s.is_client_error() => Some(NonRetryableError::ClientError {
            status: s.as_u16(),
            url,
        }),
        _ => None,
    }
}

/// Convert an `error_for_status()` failure, keeping retryable ones as-is.
pub fn check_retryable(error: reqwest::Error) -> anyhow::Error {
    let classified = error.status().and_then(|status| {
        let url = error.url().map(|u| u.as_str()).unwrap_or("<unknown>");
        classify_status(status, url)
    });

    match classified {
        Some(non_retryable) => anyhow::Error::from(non_retryable),
        None => anyhow::Error::from(error),
    }
}

/// Whether a failed attempt is worth repeating
pub fn is_retryable(error: &anyhow::Error) -> bool {
    error.downcast_ref::<NonRetryableError>().is_none()
}

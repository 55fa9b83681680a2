//! HTTP error mapping shared by the provider adapters

use doppel_core::ProviderError;
use reqwest::StatusCode;

/// Map a failed send to a provider error
pub fn transport_error(err: &reqwest::Error) -> ProviderError {
    if err.is_timeout() {
        ProviderError::Network(format!("request timed out: {err}"))
    } else if err.is_connect() {
        ProviderError::Network(format!("connection failed: {err}"))
    } else {
        ProviderError::Network(err.to_string())
    }
}

/// Map a non-success status and its body to a provider error
pub fn status_error(status: StatusCode, body: String) -> ProviderError {
    match status.as_u16() {
        401 | 403 => ProviderError::Auth(body),
        429 => ProviderError::RateLimited(body),
        code => ProviderError::Api { status: code, body },
    }
}

/// Pass a successful response through, or turn it into an error
pub async fn check_status(
    response: reqwest::Response,
) -> Result<reqwest::Response, ProviderError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().await.unwrap_or_default();
    tracing::warn!(%status, "Provider returned an error status");
    Err(status_error(status, body))
}

//! Shared HTTP plumbing for the balance provider clients

use std::time::Duration;

use reqwest::blocking::{Client, Response};
use serde::de::DeserializeOwned;
use url::Url;

use crate::domain::result::{Error, Result};
use crate::domain::ProviderKind;

/// Build a blocking client with an explicit per-request timeout
pub fn build_client(timeout: Duration) -> Result<Client> {
    Client::builder()
        .timeout(timeout)
        .user_agent(concat!("seedscan/", env!("CARGO_PKG_VERSION")))
        .build()
        .map_err(|e| Error::config(format!("Failed to create HTTP client: {}", e)))
}

/// Pick the override or the production URL and validate it
pub fn resolve_base_url(provider: ProviderKind, base_url: Option<&str>, default: &str) -> Result<String> {
    let raw = base_url.unwrap_or(default);
    let parsed = Url::parse(raw)
        .map_err(|e| Error::config(format!("Invalid {} base URL '{}': {}", provider, raw, e)))?;

    match parsed.scheme() {
        "http" | "https" => Ok(raw.trim_end_matches('/').to_string()),
        scheme => Err(Error::config(format!(
            "{} base URL must use http or https, got '{}'",
            provider, scheme
        ))),
    }
}

/// Map request errors to user-friendly messages
pub fn map_request_error(provider: ProviderKind, timeout: Duration, error: reqwest::Error) -> Error {
    if error.is_timeout() {
        Error::transport(format!("{} request timed out after {:?}", provider, timeout))
    } else if error.is_connect() {
        Error::transport(format!("Unable to connect to {} servers", provider))
    } else {
        Error::transport(format!("{} request failed: {}", provider, error))
    }
}

/// Check response status and return appropriate errors
pub fn check_response_status(provider: ProviderKind, response: &Response) -> Result<()> {
    let status = response.status();
    if status.is_success() {
        return Ok(());
    }
    match status.as_u16() {
        401 | 403 => Err(Error::transport(format!(
            "{} authentication failed. Your credential may be invalid or revoked.",
            provider
        ))),
        429 => Err(Error::transport(format!("{} rate limit exceeded", provider))),
        code => Err(Error::transport(format!("{} API error: HTTP {}", provider, code))),
    }
}

/// Read the body and decode it as JSON
///
/// A body that cannot be read is a transport failure; one that cannot be
/// decoded is a data failure.
pub fn read_json<T: DeserializeOwned>(provider: ProviderKind, timeout: Duration, response: Response) -> Result<T> {
    let body = response
        .text()
        .map_err(|e| map_request_error(provider, timeout, e))?;
    serde_json::from_str(&body)
        .map_err(|e| Error::data(format!("Failed to parse {} response: {}", provider, e)))
}

/// Whether a client-error body says the address is not valid on this chain
pub fn mentions_invalid_address(body: &str) -> bool {
    let lower = body.to_lowercase();
    lower.contains("invalid") && lower.contains("address")
}

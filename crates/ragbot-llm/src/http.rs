use std::time::Duration;

use ragbot_core::{Error, Result};
use serde::de::DeserializeOwned;

const MAX_ERROR_BODY_CHARS: usize = 300;

pub(crate) fn build_client(provider: &str, timeout_secs: u64) -> Result<reqwest::Client> {
    reqwest::Client::builder()
        .timeout(Duration::from_secs(timeout_secs))
        .build()
        .map_err(|e| transport_error(provider, e))
}

/// Request URLs can carry credentials for some providers, so they never
/// reach an error message.
pub(crate) fn transport_error(provider: &str, err: reqwest::Error) -> Error {
    Error::provider(provider, err.without_url().to_string())
}

pub(crate) fn require_key<'a>(provider: &str, api_key: Option<&'a str>) -> Result<&'a str> {
    match api_key {
        Some(key) if !key.trim().is_empty() => Ok(key),
        _ => Err(Error::provider(provider, "no API key configured")),
    }
}

pub(crate) fn endpoint(base_url: &str, path: &str) -> String {
    format!("{}/{}", base_url.trim_end_matches('/'), path.trim_start_matches('/'))
}

/// Send a prepared request and decode a JSON body, mapping non-2xx
/// statuses to a provider error that includes a truncated response body.
pub(crate) async fn send_json<T: DeserializeOwned>(
    provider: &str,
    request: reqwest::RequestBuilder,
) -> Result<T> {
    let response = request.send().await.map_err(|e| transport_error(provider, e))?;
    let status = response.status();
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        let body: String = body.chars().take(MAX_ERROR_BODY_CHARS).collect();
        return Err(Error::provider(provider, format!("HTTP {status}: {body}")));
    }
    response
        .json::<T>()
        .await
        .map_err(|e| Error::provider(provider, format!("malformed response: {}", e.without_url())))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn endpoint_joins_without_double_slashes() {
        assert_eq!(
            endpoint("https://api.example.com/", "/v1/embeddings"),
            "https://api.example.com/v1/embeddings"
        );
        assert_eq!(endpoint("http://localhost:8080", "v1/x"), "http://localhost:8080/v1/x");
    }

    #[test]
    fn blank_keys_are_rejected() {
        assert!(require_key("openai", None).is_err());
        assert!(require_key("openai", Some("  ")).is_err());
        assert_eq!(require_key("openai", Some("sk-1")).unwrap(), "sk-1");
    }
}

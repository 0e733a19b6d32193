use std::future::Future;

use reqwest::RequestBuilder;
use serde_json::Value;
use tracing::debug;

use super::rotation::Rotator;
use super::types::ProviderError;

pub(crate) async fn send_json(builder: RequestBuilder) -> Result<Value, ProviderError> {
    let resp = builder
        .send()
        .await
        .map_err(|err| ProviderError::new("network_error", &err.to_string(), true))?;

    let status = resp.status();
    let body = resp
        .text()
        .await
        .map_err(|err| ProviderError::new("network_error", &err.to_string(), true))?;
    debug!(status = status.as_u16(), bytes = body.len(), "provider response");
    if !status.is_success() {
        return Err(ProviderError::from_status(status.as_u16(), &body));
    }

    serde_json::from_str(&body).map_err(|_| ProviderError::new("parse_error", "invalid json", false))
}

/// Sends with the next key, moving on to the following key only when the
/// failure is tied to the key itself (rejected or rate limited).
pub(crate) async fn send_with_rotation<F, Fut>(rotator: &Rotator, mut send: F) -> Result<Value, ProviderError>
where
    F: FnMut(String) -> Fut,
    Fut: Future<Output = Result<Value, ProviderError>>,
{
    if rotator.is_empty() {
        return Err(ProviderError::new("auth_error", "no API keys configured", false));
    }
    let mut last_err = None;
    for _ in 0..rotator.len() {
        let key = match rotator.next() {
            Some(key) => key.to_string(),
            None => break,
        };
        match send(key).await {
            Ok(value) => return Ok(value),
            Err(err) if err.code == "auth_error" || err.code == "rate_limit" => last_err = Some(err),
            Err(err) => return Err(err),
        }
    }
    Err(last_err.unwrap_or_else(|| ProviderError::new("api_error", "request failed", true)))
}

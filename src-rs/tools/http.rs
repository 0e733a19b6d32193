use reqwest::RequestBuilder;
use serde_json::Value;

use super::types::ToolError;

/// Single attempt: transport failures, non-2xx statuses and undecodable
/// bodies all map onto [`ToolError`].
pub(crate) async fn fetch_json(builder: RequestBuilder, service: &'static str) -> Result<Value, ToolError> {
    let resp = builder.send().await.map_err(|err| ToolError::Transport {
        service,
        message: err.to_string(),
    })?;
    let status = resp.status();
    if !status.is_success() {
        return Err(ToolError::Status {
            service,
            status: status.as_u16(),
        });
    }
    resp.json::<Value>().await.map_err(|err| ToolError::Malformed {
        service,
        message: err.to_string(),
    })
}

pub(crate) fn str_field<'a>(value: &'a Value, key: &str) -> &'a str {
    value.get(key).and_then(|v| v.as_str()).unwrap_or("")
}

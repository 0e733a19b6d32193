use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

use crate::tools::ToolSchema;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
    Tool,
}

/// An image attached to a message, either by reference or embedded.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ImageSource {
    Url { url: String },
    Inline { media_type: String, data: String },
}

impl ImageSource {
    pub fn url(url: &str) -> Self {
        Self::Url {
            url: url.to_string(),
        }
    }

    /// Renders the image as something a URL-accepting provider can take:
    /// the URL itself, or a `data:` URL for embedded bytes.
    pub fn as_url(&self) -> String {
        match self {
            Self::Url { url } => url.clone(),
            Self::Inline { media_type, data } => format!("data:{};base64,{}", media_type, data),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ToolCall {
    pub id: String,
    pub name: String,
    pub args: Value,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Message {
    pub role: Role,
    pub content: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub images: Vec<ImageSource>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tool_calls: Vec<ToolCall>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tool_call_id: Option<String>,
}

impl Message {
    fn new(role: Role, content: String) -> Self {
        Self {
            role,
            content,
            images: Vec::new(),
            tool_calls: Vec::new(),
            tool_call_id: None,
        }
    }

    pub fn system(content: impl Into<String>) -> Self {
        Self::new(Role::System, content.into())
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self::new(Role::User, content.into())
    }

    pub fn user_with_image(content: impl Into<String>, image: ImageSource) -> Self {
        let mut msg = Self::new(Role::User, content.into());
        msg.images.push(image);
        msg
    }

    /// Assistant turn that requested tools. Any free text from that turn is
    /// not kept.
    pub fn assistant_tool_calls(calls: Vec<ToolCall>) -> Self {
        let mut msg = Self::new(Role::Assistant, String::new());
        msg.tool_calls = calls;
        msg
    }

    pub fn tool_result(call: &ToolCall, content: impl Into<String>) -> Self {
        let mut msg = Self::new(Role::Tool, content.into());
        msg.tool_call_id = Some(call.id.clone());
        msg
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ContentBlock {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
}

impl ContentBlock {
    pub fn text(text: &str) -> Self {
        Self {
            kind: "text".to_string(),
            text: Some(text.to_string()),
        }
    }
}

/// Answer text as the provider shaped it.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ModelContent {
    Text(String),
    Blocks(Vec<ContentBlock>),
}

impl Default for ModelContent {
    fn default() -> Self {
        Self::Text(String::new())
    }
}

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct LLMResponse {
    pub content: ModelContent,
    pub tool_calls: Vec<ToolCall>,
    pub raw: Option<Value>,
}

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct CompletionRequest {
    pub messages: Vec<Message>,
    pub tools: Option<Vec<ToolSchema>>,
    pub temperature: Option<f64>,
    pub model: Option<String>,
    pub max_tokens: Option<u32>,
}

#[derive(Clone, Debug, Error)]
#[error("{code}: {message}")]
pub struct ProviderError {
    pub code: String,
    pub message: String,
    pub retryable: bool,
}

impl ProviderError {
    pub fn new(code: &str, message: &str, retryable: bool) -> Self {
        Self {
            code: code.to_string(),
            message: message.to_string(),
            retryable,
        }
    }

    pub fn timeout(after: Duration) -> Self {
        Self::new(
            "timeout",
            &format!("no response within {}s", after.as_secs_f64()),
            true,
        )
    }

    /// Maps a non-success HTTP status and its body onto an error code.
    pub fn from_status(status: u16, body: &str) -> Self {
        let lowered = body.to_lowercase();
        if status == 401 || status == 403 {
            return Self::new("auth_error", body, false);
        }
        if status == 429 || lowered.contains("quota") || lowered.contains("rate_limit") {
            return Self::new("rate_limit", body, true);
        }
        if status >= 500 {
            return Self::new("server_error", body, true);
        }
        Self::new("api_error", body, false)
    }
}

#[async_trait]
pub trait ProviderAdapter: Send + Sync {
    fn name(&self) -> &'static str;

    /// Whether images may be passed as remote URLs. Providers returning false
    /// only take embedded base64 payloads.
    fn accepts_image_urls(&self) -> bool {
        true
    }

    async fn complete(&self, request: CompletionRequest) -> Result<LLMResponse, ProviderError>;
}

use async_trait::async_trait;
use reqwest::Client;
use serde_json::{json, Value};

use super::rotation::Rotator;
use super::transport::{send_json, send_with_rotation};
use super::types::{
    CompletionRequest, ContentBlock, LLMResponse, Message, ModelContent, ProviderAdapter, ProviderError,
    Role, ToolCall,
};
use crate::tools::ToolSchema;

pub const OPENAI_DEFAULT_MODEL: &str = "gpt-4o";
pub const OPENAI_BASE_URL: &str = "https://api.openai.com";

pub struct OpenAIConfig {
    pub api_keys: Vec<String>,
    pub base_url: String,
    pub model: String,
    pub temperature: f64,
    pub max_tokens: u32,
}

pub struct OpenAIAdapter {
    cfg: OpenAIConfig,
    rotator: Rotator,
    client: Client,
}

impl OpenAIAdapter {
    pub fn new(mut cfg: OpenAIConfig) -> Self {
        if cfg.base_url.is_empty() {
            cfg.base_url = OPENAI_BASE_URL.to_string();
        }
        if cfg.model.is_empty() {
            cfg.model = OPENAI_DEFAULT_MODEL.to_string();
        }
        let client = Client::builder()
            .connect_timeout(std::time::Duration::from_secs(10))
            .build()
            .unwrap_or_else(|_| Client::new());
        Self {
            rotator: Rotator::new(cfg.api_keys.clone()),
            cfg,
            client,
        }
    }
}

#[async_trait]
impl ProviderAdapter for OpenAIAdapter {
    fn name(&self) -> &'static str {
        "openai"
    }

    async fn complete(&self, request: CompletionRequest) -> Result<LLMResponse, ProviderError> {
        let model = request.model.clone().unwrap_or_else(|| self.cfg.model.clone());
        let payload = build_payload(
            &request.messages,
            request.tools.as_ref(),
            &model,
            request.temperature.unwrap_or(self.cfg.temperature),
            request.max_tokens.unwrap_or(self.cfg.max_tokens),
        );
        let endpoint = format!("{}/v1/chat/completions", self.cfg.base_url.trim_end_matches('/'));

        let raw = send_with_rotation(&self.rotator, |key| {
            send_json(self.client.post(&endpoint).bearer_auth(key).json(&payload))
        })
        .await?;
        parse_response(raw)
    }
}

fn build_payload(
    messages: &[Message],
    tools: Option<&Vec<ToolSchema>>,
    model: &str,
    temperature: f64,
    max_tokens: u32,
) -> Value {
    let messages: Vec<Value> = messages.iter().map(message_payload).collect();
    let mut payload = json!({
        "model": model,
        "messages": messages,
        "temperature": temperature,
        "max_tokens": max_tokens,
    });

    if let Some(tools) = tools.filter(|tools| !tools.is_empty()) {
        let functions: Vec<Value> = tools
            .iter()
            .map(|tool| {
                json!({
                    "type": "function",
                    "function": {
                        "name": tool.name,
                        "description": tool.description,
                        "parameters": tool.parameters,
                    }
                })
            })
            .collect();
        payload["tools"] = json!(functions);
    }

    payload
}

fn message_payload(msg: &Message) -> Value {
    match msg.role {
        Role::System => json!({"role": "system", "content": msg.content}),
        Role::User if msg.images.is_empty() => json!({"role": "user", "content": msg.content}),
        Role::User => {
            let mut parts = vec![json!({"type": "text", "text": msg.content})];
            for image in &msg.images {
                parts.push(json!({
                    "type": "image_url",
                    "image_url": {"url": image.as_url()}
                }));
            }
            json!({"role": "user", "content": parts})
        }
        Role::Assistant => {
            let content = if msg.content.is_empty() {
                Value::Null
            } else {
                json!(msg.content)
            };
            let mut out = json!({"role": "assistant", "content": content});
            if !msg.tool_calls.is_empty() {
                let calls: Vec<Value> = msg
                    .tool_calls
                    .iter()
                    .map(|call| {
                        json!({
                            "id": call.id,
                            "type": "function",
                            "function": {
                                "name": call.name,
                                "arguments": call.args.to_string(),
                            }
                        })
                    })
                    .collect();
                out["tool_calls"] = json!(calls);
            }
            out
        }
        Role::Tool => json!({
            "role": "tool",
            "tool_call_id": msg.tool_call_id.clone().unwrap_or_default(),
            "content": msg.content,
        }),
    }
}

fn parse_response(raw: Value) -> Result<LLMResponse, ProviderError> {
    let message = raw
        .get("choices")
        .and_then(|v| v.get(0))
        .and_then(|v| v.get("message"))
        .ok_or_else(|| ProviderError::new("parse_error", "response has no choices", false))?;

    let content = match message.get("content") {
        Some(Value::String(text)) => ModelContent::Text(text.clone()),
        Some(Value::Array(parts)) => ModelContent::Blocks(
            parts
                .iter()
                .filter_map(|part| serde_json::from_value::<ContentBlock>(part.clone()).ok())
                .collect(),
        ),
        _ => ModelContent::default(),
    };

    let mut tool_calls = Vec::new();
    if let Some(calls) = message.get("tool_calls").and_then(|v| v.as_array()) {
        for call in calls {
            let id = call.get("id").and_then(|v| v.as_str()).unwrap_or("");
            let function = call.get("function");
            let name = function
                .and_then(|f| f.get("name"))
                .and_then(|v| v.as_str())
                .unwrap_or("");
            let arguments = function
                .and_then(|f| f.get("arguments"))
                .and_then(|v| v.as_str())
                .unwrap_or("{}");
            // Unparseable arguments are passed through as a string and
            // rejected by argument validation.
            let args = serde_json::from_str::<Value>(arguments)
                .unwrap_or_else(|_| Value::String(arguments.to_string()));
            tool_calls.push(ToolCall {
                id: id.to_string(),
                name: name.to_string(),
                args,
            });
        }
    }

    Ok(LLMResponse {
        content,
        tool_calls,
        raw: Some(raw),
    })
}

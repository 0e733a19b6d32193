use async_trait::async_trait;
use reqwest::Client;
use serde_json::{json, Value};

use super::rotation::Rotator;
use super::transport::{send_json, send_with_rotation};
use super::types::{
    CompletionRequest, ContentBlock, ImageSource, LLMResponse, Message, ModelContent, ProviderAdapter,
    ProviderError, Role, ToolCall,
};
use crate::tools::ToolSchema;

pub const ANTHROPIC_DEFAULT_MODEL: &str = "claude-3-5-sonnet-20240620";
pub const ANTHROPIC_BASE_URL: &str = "https://api.anthropic.com";
const ANTHROPIC_VERSION: &str = "2023-06-01";

pub struct AnthropicConfig {
    pub api_keys: Vec<String>,
    pub base_url: String,
    pub model: String,
    pub temperature: f64,
    pub max_tokens: u32,
}

pub struct AnthropicAdapter {
    cfg: AnthropicConfig,
    rotator: Rotator,
    client: Client,
}

impl AnthropicAdapter {
    pub fn new(mut cfg: AnthropicConfig) -> Self {
        if cfg.base_url.is_empty() {
            cfg.base_url = ANTHROPIC_BASE_URL.to_string();
        }
        if cfg.model.is_empty() {
            cfg.model = ANTHROPIC_DEFAULT_MODEL.to_string();
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
impl ProviderAdapter for AnthropicAdapter {
    fn name(&self) -> &'static str {
        "anthropic"
    }

    fn accepts_image_urls(&self) -> bool {
        false
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
        let endpoint = format!("{}/v1/messages", self.cfg.base_url.trim_end_matches('/'));

        let raw = send_with_rotation(&self.rotator, |key| {
            send_json(
                self.client
                    .post(&endpoint)
                    .header("x-api-key", key)
                    .header("anthropic-version", ANTHROPIC_VERSION)
                    .json(&payload),
            )
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
    let mut system_parts = Vec::new();
    let mut turns: Vec<Value> = Vec::new();

    for msg in messages {
        match msg.role {
            Role::System => system_parts.push(msg.content.clone()),
            Role::User => {
                let mut blocks = vec![json!({"type": "text", "text": msg.content})];
                blocks.extend(msg.images.iter().map(image_block));
                turns.push(json!({"role": "user", "content": blocks}));
            }
            Role::Assistant => {
                let mut blocks = Vec::new();
                if !msg.content.is_empty() {
                    blocks.push(json!({"type": "text", "text": msg.content}));
                }
                for call in &msg.tool_calls {
                    let input = if call.args.is_object() { call.args.clone() } else { json!({}) };
                    blocks.push(json!({
                        "type": "tool_use",
                        "id": call.id,
                        "name": call.name,
                        "input": input,
                    }));
                }
                turns.push(json!({"role": "assistant", "content": blocks}));
            }
            Role::Tool => {
                let block = json!({
                    "type": "tool_result",
                    "tool_use_id": msg.tool_call_id.clone().unwrap_or_default(),
                    "content": msg.content,
                });
                // All results for one assistant turn travel in a single user turn.
                if turns.last().map(is_tool_result_turn).unwrap_or(false) {
                    if let Some(content) = turns.last_mut().and_then(|t| t["content"].as_array_mut()) {
                        content.push(block);
                    }
                } else {
                    turns.push(json!({"role": "user", "content": [block]}));
                }
            }
        }
    }

    let mut payload = json!({
        "model": model,
        "max_tokens": max_tokens,
        "temperature": temperature,
        "messages": turns,
    });
    if !system_parts.is_empty() {
        payload["system"] = json!(system_parts.join("\n\n"));
    }
    if let Some(tools) = tools.filter(|tools| !tools.is_empty()) {
        let declared: Vec<Value> = tools
            .iter()
            .map(|tool| {
                json!({
                    "name": tool.name,
                    "description": tool.description,
                    "input_schema": tool.parameters,
                })
            })
            .collect();
        payload["tools"] = json!(declared);
    }
    payload
}

fn image_block(image: &ImageSource) -> Value {
    match image {
        ImageSource::Inline { media_type, data } => json!({
            "type": "image",
            "source": {"type": "base64", "media_type": media_type, "data": data}
        }),
        ImageSource::Url { url } => json!({
            "type": "image",
            "source": {"type": "url", "url": url}
        }),
    }
}

fn is_tool_result_turn(turn: &Value) -> bool {
    turn["role"] == "user"
        && turn["content"]
            .as_array()
            .map(|blocks| blocks.iter().all(|b| b["type"] == "tool_result"))
            .unwrap_or(false)
}

fn parse_response(raw: Value) -> Result<LLMResponse, ProviderError> {
    let blocks = raw
        .get("content")
        .and_then(|v| v.as_array())
        .ok_or_else(|| ProviderError::new("parse_error", "response has no content", false))?;

    let mut text_blocks = Vec::new();
    let mut tool_calls = Vec::new();
    for block in blocks {
        match block.get("type").and_then(|v| v.as_str()) {
            Some("tool_use") => tool_calls.push(ToolCall {
                id: block.get("id").and_then(|v| v.as_str()).unwrap_or("").to_string(),
                name: block.get("name").and_then(|v| v.as_str()).unwrap_or("").to_string(),
                args: block.get("input").cloned().unwrap_or_else(|| json!({})),
            }),
            Some(_) => {
                if let Ok(parsed) = serde_json::from_value::<ContentBlock>(block.clone()) {
                    text_blocks.push(parsed);
                }
            }
            None => {}
        }
    }

    Ok(LLMResponse {
        content: ModelContent::Blocks(text_blocks),
        tool_calls,
        raw: Some(raw),
    })
}

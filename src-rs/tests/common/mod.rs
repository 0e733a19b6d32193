#![allow(dead_code)]

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use fact_check_rs::llm::{
    CompletionRequest, LLMResponse, LLMRouter, ModelContent, ProviderAdapter, ProviderError, Role, ToolCall,
};
use fact_check_rs::tools::ToolRegistry;
use fact_check_rs::{Agent, AgentConfig};
use serde_json::Value;

type Responder = dyn Fn(&CompletionRequest, usize) -> Result<LLMResponse, ProviderError> + Send + Sync;

/// In-memory model: every query is answered by `respond(request, index)`.
pub struct ScriptedProvider {
    respond: Box<Responder>,
    pub requests: Mutex<Vec<CompletionRequest>>,
}

impl ScriptedProvider {
    pub fn new<F>(respond: F) -> Arc<Self>
    where
        F: Fn(&CompletionRequest, usize) -> Result<LLMResponse, ProviderError> + Send + Sync + 'static,
    {
        Arc::new(Self {
            respond: Box::new(respond),
            requests: Mutex::new(Vec::new()),
        })
    }

    pub fn queries(&self) -> usize {
        self.requests.lock().unwrap().len()
    }
}

#[async_trait]
impl ProviderAdapter for ScriptedProvider {
    fn name(&self) -> &'static str {
        "scripted"
    }

    async fn complete(&self, request: CompletionRequest) -> Result<LLMResponse, ProviderError> {
        let index = {
            let mut requests = self.requests.lock().unwrap();
            requests.push(request.clone());
            requests.len() - 1
        };
        (self.respond)(&request, index)
    }
}

pub fn text(answer: &str) -> LLMResponse {
    LLMResponse {
        content: ModelContent::Text(answer.to_string()),
        ..LLMResponse::default()
    }
}

pub fn tool_call(id: &str, name: &str, args: Value) -> LLMResponse {
    LLMResponse {
        tool_calls: vec![ToolCall {
            id: id.to_string(),
            name: name.to_string(),
            args,
        }],
        ..LLMResponse::default()
    }
}

/// Content of the most recent tool result in the request.
pub fn last_tool_output(request: &CompletionRequest) -> Option<String> {
    request
        .messages
        .iter()
        .rev()
        .find(|m| m.role == Role::Tool)
        .map(|m| m.content.clone())
}

pub fn router(provider: Arc<ScriptedProvider>) -> Arc<LLMRouter> {
    Arc::new(LLMRouter::new(provider).with_retries(0))
}

pub fn agent(router: Arc<LLMRouter>, tools: ToolRegistry, max_turns: usize) -> Arc<Agent> {
    let config = AgentConfig {
        max_turns,
        ..AgentConfig::default()
    };
    Arc::new(Agent::new("test", config, "", router, Arc::new(tools)))
}

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use reqwest::Client;

use crate::agent::Agent;
use crate::config::{Config, ProviderKind};
use crate::llm::{AnthropicAdapter, AnthropicConfig, LLMRouter, OpenAIAdapter, OpenAIConfig, ProviderAdapter};
use crate::prompt::SYSTEM_PROMPT;
use crate::tools::{DescribeImageTool, FactCheckTool, NewsTool, RegistryError, SearchTool, ToolRegistry};

static COUNTER: AtomicU64 = AtomicU64::new(1);

/// Keys from `primary` (comma separated) followed by `primary_2` ..
/// `primary_10`. Blank entries are skipped.
pub fn collect_keys<F>(primary: &str, lookup: &F) -> Vec<String>
where
    F: Fn(&str) -> Option<String>,
{
    let mut keys = Vec::new();
    if let Some(raw) = lookup(primary) {
        for item in raw.split(',') {
            let trimmed = item.trim();
            if !trimmed.is_empty() {
                keys.push(trimmed.to_string());
            }
        }
    }
    for idx in 2..=10 {
        if let Some(value) = lookup(&format!("{}_{}", primary, idx)) {
            let trimmed = value.trim();
            if !trimmed.is_empty() {
                keys.push(trimmed.to_string());
            }
        }
    }
    keys
}

pub fn build_provider(cfg: &Config) -> Arc<dyn ProviderAdapter> {
    let agent = cfg.agent_config();
    let endpoints = &cfg.settings.endpoints;
    match cfg.provider {
        ProviderKind::OpenAI => Arc::new(OpenAIAdapter::new(OpenAIConfig {
            api_keys: cfg.secrets.provider_keys.clone(),
            base_url: endpoints.openai.clone(),
            model: agent.model,
            temperature: agent.temperature,
            max_tokens: agent.max_tokens,
        })),
        ProviderKind::Anthropic => Arc::new(AnthropicAdapter::new(AnthropicConfig {
            api_keys: cfg.secrets.provider_keys.clone(),
            base_url: endpoints.anthropic.clone(),
            model: agent.model,
            temperature: agent.temperature,
            max_tokens: agent.max_tokens,
        })),
    }
}

pub fn build_llm_router(cfg: &Config, adapter: Arc<dyn ProviderAdapter>) -> LLMRouter {
    LLMRouter::new(adapter)
        .with_retries(cfg.settings.model_retries)
        .with_timeout(cfg.settings.model_timeout())
        .with_backoff(cfg.settings.retry_backoff())
}

/// Shared client for every tool. Each call is still bounded by the
/// registry's own timeout.
pub fn tool_http_client() -> Client {
    Client::builder()
        .connect_timeout(Duration::from_secs(10))
        .user_agent(concat!("fact-check/", env!("CARGO_PKG_VERSION")))
        .build()
        .unwrap_or_else(|_| Client::new())
}

pub fn build_tool_registry(cfg: &Config, router: Arc<LLMRouter>) -> Result<ToolRegistry, RegistryError> {
    let client = tool_http_client();
    let settings = &cfg.settings;
    let endpoints = &settings.endpoints;

    let mut registry = ToolRegistry::new().with_timeout(settings.tool_timeout());
    registry.register(
        SearchTool::new(client.clone(), &endpoints.tavily, &cfg.secrets.tavily_key)
            .into_descriptor(settings.search_max_results),
    )?;
    registry.register(
        FactCheckTool::new(client.clone(), &endpoints.fact_check, &cfg.secrets.fact_check_key).into_descriptor(),
    )?;
    registry.register(NewsTool::new(client.clone(), &endpoints.gdelt, settings.news_max_results).into_descriptor())?;
    registry.register(
        DescribeImageTool::new(router, client, settings.max_tokens).into_descriptor(settings.tool_timeout()),
    )?;
    Ok(registry)
}

/// Wires provider, router, tools and agent from a resolved config.
pub fn build_agent(cfg: &Config) -> Result<(Arc<Agent>, Arc<LLMRouter>), RegistryError> {
    let router = Arc::new(build_llm_router(cfg, build_provider(cfg)));
    let tools = Arc::new(build_tool_registry(cfg, router.clone())?);
    let agent = Agent::new("fact-checker", cfg.agent_config(), SYSTEM_PROMPT, router.clone(), tools);
    Ok((Arc::new(agent), router))
}

/// Process-unique id for correlating the log lines of one request.
pub fn next_request_id() -> String {
    let seq = COUNTER.fetch_add(1, Ordering::Relaxed);
    format!("req_{}_{}", Utc::now().timestamp_millis(), seq)
}

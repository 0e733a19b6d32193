use std::sync::Arc;

use async_trait::async_trait;
use reqwest::Client;
use serde_json::{json, Value};

use super::http::{fetch_json, str_field};
use super::types::{arg_str, arg_u64, ParamType, ToolArgs, ToolDescriptor, ToolError, ToolHandler, ToolKind, ToolParam};

pub const TAVILY_BASE_URL: &str = "https://api.tavily.com";
const SERVICE: &str = "Tavily Search API";
const MAX_RESULTS_CAP: u64 = 10;

/// Web search backed by Tavily.
pub struct SearchTool {
    client: Client,
    base_url: String,
    api_key: String,
}

impl SearchTool {
    pub fn new(client: Client, base_url: &str, api_key: &str) -> Self {
        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: api_key.to_string(),
        }
    }

    pub fn into_descriptor(self, default_max_results: u64) -> ToolDescriptor {
        ToolDescriptor::new(
            ToolKind::Search,
            "Search the web. Returns ranked snippets with their source URLs. \
             Use it to find current or general evidence about a claim.",
            vec![
                ToolParam::required("query", ParamType::String, "Search query"),
                ToolParam::optional(
                    "max_results",
                    ParamType::Integer,
                    "Number of results to return",
                    json!(default_max_results),
                ),
            ],
            Arc::new(self),
        )
    }
}

#[async_trait]
impl ToolHandler for SearchTool {
    async fn call(&self, args: ToolArgs) -> Result<String, ToolError> {
        let query = arg_str(&args, "query")?;
        let max_results = arg_u64(&args, "max_results")?.clamp(1, MAX_RESULTS_CAP);

        let request = self.client.post(format!("{}/search", self.base_url)).json(&json!({
            "api_key": self.api_key,
            "query": query,
            "max_results": max_results,
        }));
        let data = fetch_json(request, SERVICE).await?;
        Ok(render_results(&data))
    }
}

fn render_results(data: &Value) -> String {
    let results = data
        .get("results")
        .and_then(|v| v.as_array())
        .cloned()
        .unwrap_or_default();
    let rendered: Vec<String> = results
        .iter()
        .enumerate()
        .map(|(idx, item)| {
            format!(
                "{}. {}\nSource: {}\n{}\n",
                idx + 1,
                str_field(item, "title"),
                str_field(item, "url"),
                str_field(item, "content").trim()
            )
        })
        .collect();
    if rendered.is_empty() {
        "No search results found.".to_string()
    } else {
        rendered.join("\n")
    }
}

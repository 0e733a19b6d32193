use std::sync::Arc;

use async_trait::async_trait;
use reqwest::Client;
use serde_json::Value;

use super::http::{fetch_json, str_field};
use super::types::{arg_str, ParamType, ToolArgs, ToolDescriptor, ToolError, ToolHandler, ToolKind, ToolParam};

pub const GDELT_BASE_URL: &str = "https://api.gdeltproject.org";
const SERVICE: &str = "GDELT API";

/// Recent news coverage from the GDELT doc API.
pub struct NewsTool {
    client: Client,
    base_url: String,
    max_records: u64,
}

impl NewsTool {
    pub fn new(client: Client, base_url: &str, max_records: u64) -> Self {
        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            max_records,
        }
    }

    pub fn into_descriptor(self) -> ToolDescriptor {
        ToolDescriptor::new(
            ToolKind::CheckNews,
            "Query the GDELT API for the latest news articles related to the query. \
             Returns title, description, source and URL of each article.",
            vec![ToolParam::required(
                "query",
                ParamType::String,
                "The text content to search for in news articles",
            )],
            Arc::new(self),
        )
    }
}

#[async_trait]
impl ToolHandler for NewsTool {
    async fn call(&self, args: ToolArgs) -> Result<String, ToolError> {
        let query = arg_str(&args, "query")?;
        let max_records = self.max_records.to_string();

        let request = self.client.get(format!("{}/api/v2/doc/doc", self.base_url)).query(&[
            ("query", query),
            ("mode", "artlist"),
            ("format", "json"),
            ("maxrecords", max_records.as_str()),
        ]);
        let data = fetch_json(request, SERVICE).await?;
        Ok(render_articles(&data))
    }
}

fn render_articles(data: &Value) -> String {
    let articles = data
        .get("articles")
        .and_then(|v| v.as_array())
        .cloned()
        .unwrap_or_default();

    let rendered: Vec<String> = articles
        .iter()
        .map(|article| {
            let source = match str_field(article, "source") {
                "" => str_field(article, "domain"),
                source => source,
            };
            format!(
                "Title: {}\nDescription: {}\nSource: {}\nURL: {}\n",
                or_placeholder(str_field(article, "title"), "No title"),
                or_placeholder(str_field(article, "seendescription"), "No description"),
                or_placeholder(source, "Unknown source"),
                str_field(article, "url")
            )
        })
        .collect();

    if rendered.is_empty() {
        "No news articles found.".to_string()
    } else {
        rendered.join("\n")
    }
}

fn or_placeholder<'a>(value: &'a str, placeholder: &'a str) -> &'a str {
    if value.is_empty() {
        placeholder
    } else {
        value
    }
}

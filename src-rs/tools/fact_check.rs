use std::sync::Arc;

use async_trait::async_trait;
use reqwest::Client;
use serde_json::{json, Value};

use super::http::{fetch_json, str_field};
use super::types::{arg_str, ParamType, ToolArgs, ToolDescriptor, ToolError, ToolHandler, ToolKind, ToolParam};

pub const FACT_CHECK_BASE_URL: &str = "https://factchecktools.googleapis.com";
const SERVICE: &str = "Google Fact Check API";

/// Lookup of published third-party fact checks (Google Fact Check Tools).
pub struct FactCheckTool {
    client: Client,
    base_url: String,
    api_key: String,
}

impl FactCheckTool {
    pub fn new(client: Client, base_url: &str, api_key: &str) -> Self {
        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: api_key.to_string(),
        }
    }

    pub fn into_descriptor(self) -> ToolDescriptor {
        ToolDescriptor::new(
            ToolKind::CheckFact,
            "Query the Google Fact Check API for published fact checks matching the claim. \
             Returns each matching claim with the reviewing publisher and its rating.",
            vec![
                ToolParam::required("query", ParamType::String, "The text content to verify"),
                ToolParam::optional(
                    "language_code",
                    ParamType::String,
                    "Language of the query",
                    json!("en"),
                ),
            ],
            Arc::new(self),
        )
    }
}

#[async_trait]
impl ToolHandler for FactCheckTool {
    async fn call(&self, args: ToolArgs) -> Result<String, ToolError> {
        let query = arg_str(&args, "query")?;
        let language_code = arg_str(&args, "language_code")?;

        let request = self
            .client
            .get(format!("{}/v1alpha1/claims:search", self.base_url))
            .query(&[("query", query), ("languageCode", language_code), ("key", self.api_key.as_str())]);
        let data = fetch_json(request, SERVICE).await?;
        Ok(render_claims(&data))
    }
}

fn render_claims(data: &Value) -> String {
    let claims = data
        .get("claims")
        .and_then(|v| v.as_array())
        .cloned()
        .unwrap_or_default();

    let mut results = Vec::new();
    for claim in &claims {
        // Claims without a review carry no verdict worth reporting.
        let review = match claim.get("claimReview").and_then(|v| v.get(0)) {
            Some(review) => review,
            None => continue,
        };
        let publisher = review
            .get("publisher")
            .map(|p| str_field(p, "name"))
            .unwrap_or("");
        let mut entry = format!(
            "Claim: {}\nReviewed by: {}\nRating: {}\n",
            str_field(claim, "text"),
            publisher,
            str_field(review, "textualRating")
        );
        let url = str_field(review, "url");
        if !url.is_empty() {
            entry.push_str(&format!("URL: {}\n", url));
        }
        results.push(entry);
    }

    if results.is_empty() {
        "No fact check results found.".to_string()
    } else {
        results.join("\n")
    }
}

use serde::{Deserialize, Serialize};

#[derive(Clone, Debug)]
pub struct CLIConfig {
    pub base_url: String,
    pub timeout_secs: u64,
    pub debug: bool,
    /// Image attached to the next claim only.
    pub pending_image: Option<String>,
}

#[derive(Clone, Debug)]
pub struct ChatMessage {
    pub role: String,
    pub content: String,
}

#[derive(Debug, Serialize)]
pub struct ClaimRequest {
    pub input: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct FactCheckResponse {
    pub output: Option<String>,
    pub error: Option<String>,
    pub kind: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TweetRequest {
    pub fact_check: String,
    pub original_tweet: String,
}

#[derive(Debug, Default, Deserialize)]
pub struct TweetResponse {
    pub tweet: Option<String>,
    pub error: Option<String>,
}

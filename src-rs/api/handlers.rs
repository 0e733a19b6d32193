use std::sync::Arc;
use std::time::Duration;

use axum::body::Bytes;
use axum::extract::State;
use axum::Json;
use chrono::Local;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::{info, info_span, warn, Instrument};

use crate::agent::Agent;
use crate::claim::Claim;
use crate::error::{AgentError, ValidationError};
use crate::formatter::{format_result, FactCheckResponse};
use crate::helpers::next_request_id;
use crate::llm::LLMRouter;
use crate::tweet::generate_tweet;

#[derive(Clone)]
pub struct AppState {
    pub agent: Arc<Agent>,
    pub router: Arc<LLMRouter>,
    pub request_timeout: Duration,
}

#[derive(Debug, Default, Deserialize)]
pub struct ClaimRequest {
    #[serde(default)]
    pub input: Option<String>,
    #[serde(default)]
    pub image: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TweetRequest {
    #[serde(default)]
    pub fact_check: Option<String>,
    #[serde(default)]
    pub original_tweet: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(untagged)]
pub enum TweetResponse {
    Tweet {
        tweet: String,
    },
    Error {
        error: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        kind: Option<String>,
    },
}

impl From<ValidationError> for TweetResponse {
    fn from(err: ValidationError) -> Self {
        Self::Error {
            error: err.to_string(),
            kind: None,
        }
    }
}

/// An empty body reads as `{}`; anything else must be a JSON object.
fn parse_body<T: DeserializeOwned + Default>(body: &Bytes) -> Result<T, ValidationError> {
    if body.iter().all(|b| b.is_ascii_whitespace()) {
        return Ok(T::default());
    }
    serde_json::from_slice(body).map_err(|err| ValidationError::Malformed(err.to_string()))
}

fn required(value: Option<String>, field: &'static str) -> Result<String, ValidationError> {
    value
        .filter(|v| !v.trim().is_empty())
        .ok_or(ValidationError::MissingField(field))
}

pub async fn handle_root() -> Json<Value> {
    Json(json!({"message": "Fact check service is running"}))
}

pub async fn handle_health() -> Json<Value> {
    Json(json!({"status": "ok", "version": env!("CARGO_PKG_VERSION")}))
}

pub async fn handle_stream(State(state): State<AppState>, body: Bytes) -> Json<FactCheckResponse> {
    let span = info_span!("stream", request_id = %next_request_id());
    async move {
        let req: ClaimRequest = match parse_body(&body) {
            Ok(req) => req,
            Err(err) => return Json(FactCheckResponse::from(err)),
        };
        let claim = match Claim::from_request(req.input, req.image) {
            Ok(claim) => claim,
            Err(err) => {
                info!("rejected request: {}", err);
                return Json(FactCheckResponse::from(err));
            }
        };
        info!(has_text = claim.text().is_some(), has_image = claim.image().is_some(), "checking claim");

        let today = Local::now().date_naive();
        let response = match tokio::time::timeout(state.request_timeout, state.agent.check(&claim, today)).await {
            Ok(result) => format_result(&result),
            Err(_) => {
                let err = AgentError::Timeout(state.request_timeout);
                warn!("{}", err);
                FactCheckResponse::error(err.to_string(), err.kind())
            }
        };
        Json(response)
    }
    .instrument(span)
    .await
}

pub async fn handle_generate_tweet(State(state): State<AppState>, body: Bytes) -> Json<TweetResponse> {
    let req: TweetRequest = match parse_body(&body) {
        Ok(req) => req,
        Err(err) => return Json(err.into()),
    };
    let (fact_check, original_tweet) = match (
        required(req.fact_check, "factCheck"),
        required(req.original_tweet, "originalTweet"),
    ) {
        (Ok(fact_check), Ok(original_tweet)) => (fact_check, original_tweet),
        (Err(err), _) | (_, Err(err)) => return Json(err.into()),
    };

    let config = &state.agent.config;
    match generate_tweet(&state.router, &config.model, config.max_tokens, &fact_check, &original_tweet).await {
        Ok(tweet) => Json(TweetResponse::Tweet { tweet }),
        Err(err) => {
            warn!("tweet generation failed: {}", err);
            let err = AgentError::Model(err);
            Json(TweetResponse::Error {
                error: err.to_string(),
                kind: Some(err.kind().to_string()),
            })
        }
    }
}

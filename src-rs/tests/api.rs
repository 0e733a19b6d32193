mod common;

use std::sync::Arc;
use std::time::Duration;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use common::{agent, router, text, tool_call, ScriptedProvider};
use fact_check_rs::api::{build_router, AppState};
use fact_check_rs::llm::{LLMRouter, ProviderError};
use fact_check_rs::tools::{FactCheckTool, ToolRegistry};
use reqwest::Client;
use serde_json::{json, Value};
use tower::ServiceExt;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn app(llm: Arc<LLMRouter>, tools: ToolRegistry, request_timeout: Duration) -> Router {
    build_router(AppState {
        agent: agent(llm.clone(), tools, 10),
        router: llm,
        request_timeout,
    })
}

fn answering(answer: &'static str) -> Router {
    app(
        router(ScriptedProvider::new(move |_, _| Ok(text(answer)))),
        ToolRegistry::new(),
        Duration::from_secs(30),
    )
}

async fn send(app: Router, method: &str, uri: &str, body: &str) -> (StatusCode, Value) {
    let request = Request::builder()
        .method(method)
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap();
    let response = app.oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = hyper::body::to_bytes(response.into_body()).await.unwrap();
    (status, serde_json::from_slice(&bytes).unwrap())
}

#[tokio::test]
async fn empty_object_is_no_input() {
    let (status, body) = send(answering("unused"), "POST", "/stream", "{}").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"error": "No input provided"}));
}

#[tokio::test]
async fn empty_body_is_no_input() {
    let (status, body) = send(answering("unused"), "POST", "/stream", "").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"error": "No input provided"}));
}

#[tokio::test]
async fn malformed_json_is_in_band() {
    let (status, body) = send(answering("unused"), "POST", "/stream", "{\"input\": ").await;
    assert_eq!(status, StatusCode::OK);
    assert!(body["error"].as_str().unwrap().starts_with("Invalid request body"));
}

#[tokio::test]
async fn great_wall_end_to_end() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v1alpha1/claims:search"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "claims": [{
                "text": "Great Wall visible from the moon",
                "claimReview": [{
                    "publisher": {"name": "NASA"},
                    "textualRating": "False",
                    "url": "https://www.nasa.gov/great-wall"
                }]
            }]
        })))
        .mount(&server)
        .await;

    let provider = ScriptedProvider::new(|_, i| match i {
        0 => Ok(tool_call("c1", "check_fact", json!({"query": "Great Wall moon"}))),
        _ => Ok(text(
            "**False:** The wall cannot be seen from the moon with the naked eye. [NASA](https://www.nasa.gov/great-wall)",
        )),
    });
    let mut tools = ToolRegistry::new();
    tools
        .register(FactCheckTool::new(Client::new(), &server.uri(), "g").into_descriptor())
        .unwrap();

    let (status, body) = send(
        app(router(provider.clone()), tools, Duration::from_secs(30)),
        "POST",
        "/stream",
        r#"{"input": "The Great Wall of China can be seen from the moon."}"#,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let output = body["output"].as_str().unwrap();
    let labels = ["**True", "**Partially True", "**False", "**Unverifiable"];
    assert!(labels.iter().any(|l| output.starts_with(l)));
    assert!(output.ends_with(')'));
    assert_eq!(provider.queries(), 2);
}

#[tokio::test]
async fn model_failure_is_in_band() {
    let provider = ScriptedProvider::new(|_, _| Err(ProviderError::new("auth_error", "bad key", false)));
    let (status, body) = send(
        app(router(provider), ToolRegistry::new(), Duration::from_secs(30)),
        "POST",
        "/stream",
        r#"{"input": "claim"}"#,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["kind"], json!("model_error"));
    assert!(body["error"].as_str().unwrap().contains("bad key"));
}

#[tokio::test]
async fn slow_request_times_out_in_band() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_secs(5)))
        .mount(&server)
        .await;
    let provider = ScriptedProvider::new(|_, _| Ok(tool_call("c1", "check_fact", json!({"query": "q"}))));
    let mut tools = ToolRegistry::new();
    tools
        .register(FactCheckTool::new(Client::new(), &server.uri(), "g").into_descriptor())
        .unwrap();

    let (_, body) = send(
        app(router(provider), tools, Duration::from_millis(100)),
        "POST",
        "/stream",
        r#"{"input": "claim"}"#,
    )
    .await;
    assert_eq!(body["kind"], json!("timeout"));
}

#[tokio::test]
async fn tweet_has_no_wrapping_quotes() {
    let (status, body) = send(
        answering("\"Actually, X is Y. The fact check says so.\""),
        "POST",
        "/generate_tweet",
        r#"{"factCheck": "False, X is actually Y.", "originalTweet": "X is Z"}"#,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let tweet = body["tweet"].as_str().unwrap();
    assert_eq!(tweet, "Actually, X is Y. The fact check says so.");
    assert!(!tweet.starts_with('"') && !tweet.ends_with('"'));
}

#[tokio::test]
async fn tweet_requires_both_fields() {
    let (_, body) = send(answering("unused"), "POST", "/generate_tweet", r#"{"factCheck": "False."}"#).await;
    assert_eq!(body, json!({"error": "Missing required field `originalTweet`"}));
}

#[tokio::test]
async fn liveness_endpoints() {
    let (status, body) = send(answering("unused"), "GET", "/health", "").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], json!("ok"));

    let (status, body) = send(answering("unused"), "GET", "/", "").await;
    assert_eq!(status, StatusCode::OK);
    assert!(body["message"].is_string());
}

#[tokio::test]
async fn cors_allows_any_origin() {
    let request = Request::builder()
        .method("OPTIONS")
        .uri("/stream")
        .header("origin", "https://twitter.com")
        .header("access-control-request-method", "POST")
        .body(Body::empty())
        .unwrap();
    let response = answering("unused").oneshot(request).await.unwrap();
    assert_eq!(
        response.headers().get("access-control-allow-origin").unwrap(),
        "*"
    );
}

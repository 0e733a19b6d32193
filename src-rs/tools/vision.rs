use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use reqwest::header::CONTENT_TYPE;
use reqwest::Client;

use super::types::{arg_str, ParamType, ToolArgs, ToolDescriptor, ToolError, ToolHandler, ToolKind, ToolParam};
use crate::formatter::extract_text;
use crate::llm::{CompletionRequest, ImageSource, LLMRouter, Message};

const DESCRIBE_PROMPT: &str = "Given the image below, describe the image in detail.";
const DEFAULT_MIME: &str = "image/jpeg";
const IMAGE_SERVICE: &str = "image host";

/// Describes an image with one multimodal call to the configured model.
pub struct DescribeImageTool {
    router: Arc<LLMRouter>,
    client: Client,
    max_tokens: u32,
}

impl DescribeImageTool {
    pub fn new(router: Arc<LLMRouter>, client: Client, max_tokens: u32) -> Self {
        Self {
            router,
            client,
            max_tokens,
        }
    }

    /// The descriptor carries its own timeout: the router's full retry
    /// budget plus `fetch_allowance` for downloading the image.
    pub fn into_descriptor(self, fetch_allowance: Duration) -> ToolDescriptor {
        let timeout = self.router.budget() + fetch_allowance;
        ToolDescriptor::new(
            ToolKind::DescribeImage,
            "Given an image URL, return a detailed description of the image.",
            vec![ToolParam::required("image_url", ParamType::String, "URL of the image")],
            Arc::new(self),
        )
        .with_timeout(timeout)
    }

    async fn image_source(&self, url: &str) -> Result<ImageSource, ToolError> {
        if self.router.accepts_image_urls() {
            Ok(ImageSource::url(url))
        } else {
            fetch_inline_image(&self.client, url).await
        }
    }
}

#[async_trait]
impl ToolHandler for DescribeImageTool {
    async fn call(&self, args: ToolArgs) -> Result<String, ToolError> {
        let url = arg_str(&args, "image_url")?;
        let image = self.image_source(url).await?;
        let request = CompletionRequest {
            messages: vec![Message::user_with_image(DESCRIBE_PROMPT, image)],
            max_tokens: Some(self.max_tokens),
            ..CompletionRequest::default()
        };
        let resp = self
            .router
            .complete(request)
            .await
            .map_err(|err| ToolError::Model(err.to_string()))?;
        Ok(extract_text(&resp.content))
    }
}

/// Downloads an image and embeds it as base64, tagged with the MIME type the
/// host reported.
pub async fn fetch_inline_image(client: &Client, url: &str) -> Result<ImageSource, ToolError> {
    let resp = client.get(url).send().await.map_err(|err| ToolError::Transport {
        service: IMAGE_SERVICE,
        message: err.to_string(),
    })?;
    let status = resp.status();
    if !status.is_success() {
        return Err(ToolError::Status {
            service: IMAGE_SERVICE,
            status: status.as_u16(),
        });
    }
    let media_type = resp
        .headers()
        .get(CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(';').next())
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .unwrap_or_else(|| DEFAULT_MIME.to_string());
    let bytes = resp.bytes().await.map_err(|err| ToolError::Transport {
        service: IMAGE_SERVICE,
        message: err.to_string(),
    })?;
    Ok(ImageSource::Inline {
        media_type,
        data: STANDARD.encode(&bytes),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::{LLMResponse, ModelContent, ProviderAdapter, ProviderError};
    use crate::tools::ToolRegistry;
    use serde_json::json;
    use std::sync::Mutex;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    struct Recorder {
        urls_ok: bool,
        seen: Mutex<Vec<ImageSource>>,
    }

    #[async_trait]
    impl ProviderAdapter for Recorder {
        fn name(&self) -> &'static str {
            "recorder"
        }

        fn accepts_image_urls(&self) -> bool {
            self.urls_ok
        }

        async fn complete(&self, request: CompletionRequest) -> Result<LLMResponse, ProviderError> {
            let msg = &request.messages[0];
            assert_eq!(msg.content, DESCRIBE_PROMPT);
            self.seen.lock().unwrap().extend(msg.images.iter().cloned());
            Ok(LLMResponse {
                content: ModelContent::Text("A wall on a hill.".to_string()),
                ..LLMResponse::default()
            })
        }
    }

    fn registry_with(adapter: Arc<Recorder>) -> ToolRegistry {
        let router = Arc::new(LLMRouter::new(adapter));
        let mut registry = ToolRegistry::new();
        registry
            .register(DescribeImageTool::new(router, Client::new(), 256).into_descriptor(Duration::from_secs(20)))
            .unwrap();
        registry
    }

    #[tokio::test]
    async fn url_capable_provider_gets_the_url() {
        let adapter = Arc::new(Recorder {
            urls_ok: true,
            seen: Mutex::new(Vec::new()),
        });
        let out = registry_with(adapter.clone())
            .invoke("describe_image", json!({"image_url": "https://img.test/wall.jpg"}))
            .await
            .unwrap();
        assert_eq!(out, "A wall on a hill.");
        assert_eq!(
            adapter.seen.lock().unwrap()[0],
            ImageSource::url("https://img.test/wall.jpg")
        );
    }

    #[tokio::test]
    async fn inline_only_provider_gets_base64() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/wall.png"))
            .respond_with(
                ResponseTemplate::new(200)
                    .insert_header("content-type", "image/png")
                    .set_body_bytes(b"png-bytes".to_vec()),
            )
            .mount(&server)
            .await;

        let adapter = Arc::new(Recorder {
            urls_ok: false,
            seen: Mutex::new(Vec::new()),
        });
        registry_with(adapter.clone())
            .invoke("describe_image", json!({"image_url": format!("{}/wall.png", server.uri())}))
            .await
            .unwrap();
        assert_eq!(
            adapter.seen.lock().unwrap()[0],
            ImageSource::Inline {
                media_type: "image/png".to_string(),
                data: STANDARD.encode(b"png-bytes"),
            }
        );
    }

    #[tokio::test]
    async fn missing_content_type_defaults_to_jpeg() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(vec![1u8, 2, 3]))
            .mount(&server)
            .await;
        let image = fetch_inline_image(&Client::new(), &server.uri()).await.unwrap();
        assert!(matches!(image, ImageSource::Inline { ref media_type, .. } if media_type == DEFAULT_MIME));
    }

    #[tokio::test]
    async fn unreachable_image_is_tool_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;
        let err = fetch_inline_image(&Client::new(), &server.uri()).await.unwrap_err();
        assert!(matches!(err, ToolError::Status { status: 404, .. }));
    }
}

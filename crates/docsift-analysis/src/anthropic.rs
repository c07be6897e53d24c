//! Anthropic Messages API transport.

use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt::{Debug, Formatter, Result as FmtResult};
use std::time::Duration;

use crate::client::{Attachment, ModelCallError, ModelRequest, ModelTransport};

const API_BASE: &str = "https://api.anthropic.com";
const API_VERSION: &str = "2023-06-01";
const MAX_TOKENS: u32 = 1024;
const MAX_ERROR_BODY_CHARS: usize = 500;

#[derive(Clone)]
pub struct AnthropicTransport {
    api_key: String,
    model: String,
    base_url: String,
    http_client: reqwest::Client,
}

impl Debug for AnthropicTransport {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.debug_struct("AnthropicTransport")
            .field("model", &self.model)
            .field("base_url", &self.base_url)
            .finish()
    }
}

// Messages API request/response structures
#[derive(Debug, Serialize)]
struct MessagesRequest {
    model: String,
    max_tokens: u32,
    messages: Vec<MessageParam>,
}

#[derive(Debug, Serialize)]
struct MessageParam {
    role: String,
    content: Vec<ContentBlock>,
}

#[derive(Debug, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum ContentBlock {
    Text { text: String },
    Image { source: Base64Source },
    Document { source: Base64Source },
}

#[derive(Debug, Serialize)]
struct Base64Source {
    #[serde(rename = "type")]
    source_type: String,
    media_type: String,
    data: String,
}

impl Base64Source {
    fn new(media_type: &str, data: &str) -> Self {
        Self {
            source_type: "base64".to_string(),
            media_type: media_type.to_string(),
            data: data.to_string(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct MessagesResponse {
    content: Vec<ContentBlockResponse>,
}

#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum ContentBlockResponse {
    Text {
        text: String,
    },
    #[serde(other)]
    Other,
}

impl AnthropicTransport {
    pub fn new(api_key: impl Into<String>, model: impl Into<String>) -> Result<Self> {
        let http_client = reqwest::Client::builder()
            .timeout(Duration::from_secs(120))
            .build()
            .context("Failed to create HTTP client for Anthropic API")?;

        Ok(Self {
            api_key: api_key.into(),
            model: model.into(),
            base_url: API_BASE.to_string(),
            http_client,
        })
    }

    /// Point the transport at a different host (proxies, tests).
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    fn messages_url(&self) -> String {
        format!("{}/v1/messages", self.base_url)
    }

    fn build_body(&self, request: &ModelRequest) -> MessagesRequest {
        let mut content = Vec::with_capacity(2);
        match &request.attachment {
            Attachment::Image { media_type, data } => content.push(ContentBlock::Image {
                source: Base64Source::new(media_type, data),
            }),
            Attachment::Pdf { data } => content.push(ContentBlock::Document {
                source: Base64Source::new("application/pdf", data),
            }),
            Attachment::Text { text } => content.push(ContentBlock::Text {
                text: format!("<document>\n{}\n</document>", text),
            }),
            Attachment::None => {}
        }
        content.push(ContentBlock::Text {
            text: request.prompt.clone(),
        });

        MessagesRequest {
            model: self.model.clone(),
            max_tokens: MAX_TOKENS,
            messages: vec![MessageParam {
                role: "user".to_string(),
                content,
            }],
        }
    }
}

fn classify_reqwest_error(e: reqwest::Error) -> ModelCallError {
    if e.is_timeout() {
        ModelCallError::Transport(format!("request timed out: {}", e))
    } else if e.is_connect() {
        ModelCallError::Connection(e.to_string())
    } else {
        ModelCallError::Transport(e.to_string())
    }
}

#[async_trait]
impl ModelTransport for AnthropicTransport {
    async fn complete(&self, request: &ModelRequest) -> Result<String, ModelCallError> {
        let body = self.build_body(request);

        let response = self
            .http_client
            .post(self.messages_url())
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", API_VERSION)
            .header("content-type", "application/json")
            .json(&body)
            .send()
            .await
            .map_err(classify_reqwest_error)?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(ModelCallError::Http {
                status: status.as_u16(),
                body: error_text.chars().take(MAX_ERROR_BODY_CHARS).collect(),
            });
        }

        let parsed: MessagesResponse = response
            .json()
            .await
            .map_err(|e| ModelCallError::Transport(format!("Failed to parse response: {}", e)))?;

        let text = parsed
            .content
            .into_iter()
            .filter_map(|block| match block {
                ContentBlockResponse::Text { text } => Some(text),
                ContentBlockResponse::Other => None,
            })
            .collect::<Vec<_>>()
            .join("");

        tracing::debug!(model = %self.model, chars = text.len(), "Anthropic response received");
        Ok(text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn request(attachment: Attachment) -> ModelRequest {
        ModelRequest {
            prompt: "Describe this".to_string(),
            attachment,
        }
    }

    #[test]
    fn test_body_places_attachment_before_prompt() {
        let transport = AnthropicTransport::new("k", "claude-sonnet-4-20250514").unwrap();
        let body = transport.build_body(&request(Attachment::Pdf {
            data: "JVBERg==".to_string(),
        }));
        let value = serde_json::to_value(&body).unwrap();

        assert_eq!(value["model"], "claude-sonnet-4-20250514");
        let content = &value["messages"][0]["content"];
        assert_eq!(content[0]["type"], "document");
        assert_eq!(content[0]["source"]["type"], "base64");
        assert_eq!(content[0]["source"]["media_type"], "application/pdf");
        assert_eq!(content[1]["type"], "text");
        assert_eq!(content[1]["text"], "Describe this");
    }

    #[test]
    fn test_body_without_attachment_has_prompt_only() {
        let transport = AnthropicTransport::new("k", "m").unwrap();
        let value = serde_json::to_value(transport.build_body(&request(Attachment::None))).unwrap();
        assert_eq!(value["messages"][0]["content"].as_array().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_complete_returns_text_blocks() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/v1/messages")
            .match_header("x-api-key", "test-key")
            .match_header("anthropic-version", API_VERSION)
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(
                json!({
                    "content": [
                        { "type": "thinking", "thinking": "..." },
                        { "type": "text", "text": "{\"description\": \"d\", \"summary\": \"s\"}" }
                    ]
                })
                .to_string(),
            )
            .create_async()
            .await;

        let transport = AnthropicTransport::new("test-key", "m")
            .unwrap()
            .with_base_url(server.url());
        let text = transport
            .complete(&request(Attachment::Text {
                text: "hello".to_string(),
            }))
            .await
            .unwrap();

        assert_eq!(text, "{\"description\": \"d\", \"summary\": \"s\"}");
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_http_errors_carry_status() {
        let mut server = mockito::Server::new_async().await;
        let _overloaded = server
            .mock("POST", "/v1/messages")
            .with_status(529)
            .with_body(r#"{"type":"error","error":{"type":"overloaded_error"}}"#)
            .create_async()
            .await;

        let transport = AnthropicTransport::new("k", "m")
            .unwrap()
            .with_base_url(format!("{}/", server.url()));
        let err = transport.complete(&request(Attachment::None)).await.unwrap_err();

        match &err {
            ModelCallError::Http { status, body } => {
                assert_eq!(*status, 529);
                assert!(body.contains("overloaded_error"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
        assert!(err.is_retryable());
    }

    #[tokio::test]
    async fn test_bad_request_is_not_retryable() {
        let mut server = mockito::Server::new_async().await;
        let _bad = server
            .mock("POST", "/v1/messages")
            .with_status(400)
            .with_body("invalid_request_error")
            .create_async()
            .await;

        let transport = AnthropicTransport::new("k", "m")
            .unwrap()
            .with_base_url(server.url());
        let err = transport.complete(&request(Attachment::None)).await.unwrap_err();
        assert!(!err.is_retryable());
    }
}

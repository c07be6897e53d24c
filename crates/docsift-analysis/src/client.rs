//! Model client: request building, timeout, retry and fallback.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use docsift_core::models::{sniff_image_type, AnalysisRequest, AnalysisResult, ContentKind, OutputLimits};
use docsift_core::retry::is_transient_message;
use docsift_core::RetryPolicy;
use tokio::time::Instant;

use crate::fallback;
use crate::validator::{validate_response, ValidationError};

const MAX_TEXT_ATTACHMENT_CHARS: usize = 100_000;
const SUPPORTED_IMAGE_TYPES: &[&str] = &["image/jpeg", "image/png", "image/gif", "image/webp"];

/// Failure of a single model call.
#[derive(Debug, thiserror::Error)]
pub enum ModelCallError {
    #[error("Model call timed out after {0:?}")]
    Timeout(Duration),

    #[error("Connection to model API failed: {0}")]
    Connection(String),

    #[error("Model API returned HTTP {status}: {body}")]
    Http { status: u16, body: String },

    #[error("Model API transport error: {0}")]
    Transport(String),

    #[error("Invalid model output: {0}")]
    InvalidOutput(#[from] ValidationError),
}

impl ModelCallError {
    /// Timeouts, connection failures, 5xx (including 529 overloaded) and 429
    /// are retried. Other 4xx and bad output are not.
    pub fn is_retryable(&self) -> bool {
        match self {
            ModelCallError::Timeout(_) | ModelCallError::Connection(_) => true,
            ModelCallError::Http { status, .. } => *status == 429 || *status >= 500,
            ModelCallError::Transport(message) => is_transient_message(message),
            ModelCallError::InvalidOutput(_) => false,
        }
    }
}

/// Content attached to the prompt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Attachment {
    Image { media_type: String, data: String },
    Pdf { data: String },
    Text { text: String },
    /// Binary content the model cannot read; only the name and type are sent.
    None,
}

/// Provider-agnostic request, built once and reused across attempts.
#[derive(Debug, Clone)]
pub struct ModelRequest {
    pub prompt: String,
    pub attachment: Attachment,
}

/// One round trip to a generative model, returning its raw text.
#[async_trait]
pub trait ModelTransport: Send + Sync {
    async fn complete(&self, request: &ModelRequest) -> Result<String, ModelCallError>;
}

fn is_text_type(content_type: &str) -> bool {
    content_type.starts_with("text/")
        || matches!(
            content_type,
            "application/json" | "application/xml" | "application/x-yaml" | "application/yaml"
        )
}

fn build_prompt(request: &AnalysisRequest, kind: ContentKind, limits: OutputLimits) -> String {
    format!(
        "You are analyzing an uploaded {kind} named \"{name}\" (content type: {content_type}).\n\
         Respond with only a JSON object of the form {{\"description\": string, \"summary\": string}}.\n\
         - description: what the {kind} contains, at most {description_max} characters\n\
         - summary: a one-line summary, at most {summary_max} characters\n\
         Do not include any other text.",
        kind = kind,
        name = request.display_name,
        content_type = request.content_type,
        description_max = limits.description_max_chars,
        summary_max = limits.summary_max_chars,
    )
}

fn build_attachment(request: &AnalysisRequest, kind: ContentKind) -> Attachment {
    let declared = request.content_type.trim().to_lowercase();

    match kind {
        ContentKind::Image => {
            let media_type = if SUPPORTED_IMAGE_TYPES.contains(&declared.as_str()) {
                Some(declared.as_str())
            } else {
                sniff_image_type(&request.content)
            };
            match media_type {
                Some(media_type) => Attachment::Image {
                    media_type: media_type.to_string(),
                    data: STANDARD.encode(&request.content),
                },
                None => Attachment::None,
            }
        }
        ContentKind::Document if declared == "application/pdf" => Attachment::Pdf {
            data: STANDARD.encode(&request.content),
        },
        ContentKind::Document if is_text_type(&declared) => {
            let text = String::from_utf8_lossy(&request.content);
            Attachment::Text {
                text: text.chars().take(MAX_TEXT_ATTACHMENT_CHARS).collect(),
            }
        }
        ContentKind::Document => Attachment::None,
    }
}

/// Calls the model with a bounded timeout and retry budget. Always yields a
/// result: anything that cannot be completed becomes the fallback.
#[derive(Clone)]
pub struct AnalysisClient {
    transport: Option<Arc<dyn ModelTransport>>,
    timeout: Duration,
    retry: RetryPolicy,
    limits: OutputLimits,
}

impl AnalysisClient {
    pub fn new(
        transport: Option<Arc<dyn ModelTransport>>,
        timeout: Duration,
        retry: RetryPolicy,
        limits: OutputLimits,
    ) -> Self {
        Self {
            transport,
            timeout,
            retry,
            limits,
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.transport.is_some()
    }

    pub fn fallback(&self, request: &AnalysisRequest, kind: ContentKind) -> AnalysisResult {
        fallback::build(&request.display_name, kind, self.limits)
    }

    pub async fn analyze(&self, request: &AnalysisRequest, kind: ContentKind) -> AnalysisResult {
        let Some(transport) = self.transport.as_ref() else {
            tracing::warn!(
                outcome = "fallback",
                "No model API key configured, returning fallback analysis"
            );
            return self.fallback(request, kind);
        };

        let model_request = ModelRequest {
            prompt: build_prompt(request, kind, self.limits),
            attachment: build_attachment(request, kind),
        };
        let started = Instant::now();

        let result = self
            .retry
            .run(ModelCallError::is_retryable, |attempt| {
                let model_request = &model_request;
                async move {
                    let attempt_started = Instant::now();
                    let outcome =
                        match tokio::time::timeout(self.timeout, transport.complete(model_request))
                            .await
                        {
                            Ok(Ok(text)) => validate_response(&text, self.limits)
                                .map_err(ModelCallError::from),
                            Ok(Err(e)) => Err(e),
                            Err(_) => Err(ModelCallError::Timeout(self.timeout)),
                        };

                    let elapsed_ms = attempt_started.elapsed().as_millis() as u64;
                    match &outcome {
                        Ok(_) => tracing::info!(
                            attempt,
                            elapsed_ms,
                            outcome = "success",
                            kind = %kind,
                            "Model analysis attempt"
                        ),
                        Err(e) => tracing::warn!(
                            attempt,
                            elapsed_ms,
                            outcome = "failure",
                            retryable = e.is_retryable(),
                            error = %e,
                            "Model analysis attempt"
                        ),
                    }
                    outcome
                }
            })
            .await;

        match result {
            Ok(result) => result,
            Err(e) => {
                tracing::warn!(
                    attempts = self.retry.max_attempts(),
                    elapsed_ms = started.elapsed().as_millis() as u64,
                    outcome = "fallback",
                    error = %e,
                    "Model analysis failed, returning fallback"
                );
                self.fallback(request, kind)
            }
        }
    }
}

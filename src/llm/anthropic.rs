//! Anthropic (Claude) inference provider: text and vision requests.

use async_trait::async_trait;
use base64::Engine;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::error::{Result, StatementError};
use crate::llm::{InferenceProvider, InferenceRequest, RequestContent, REQUEST_TIMEOUT_SECS};

const ANTHROPIC_API_URL: &str = "https://api.anthropic.com/v1";
const ANTHROPIC_VERSION: &str = "2023-06-01";
const DEFAULT_MODEL: &str = "claude-3-5-sonnet-20241022";
const MAX_TOKENS: u32 = 2000;

pub struct AnthropicProvider {
    client: Client,
    api_key: String,
    base_url: String,
    model: String,
}

#[derive(Debug, Serialize)]
struct MessagesRequest {
    model: String,
    max_tokens: u32,
    temperature: f32,
    messages: Vec<Message>,
}

#[derive(Debug, Serialize)]
struct Message {
    role: String,
    content: Vec<ContentBlock>,
}

#[derive(Debug, Serialize)]
#[serde(tag = "type", rename_all = "lowercase")]
enum ContentBlock {
    Text { text: String },
    Image { source: ImageSource },
    Document { source: ImageSource },
}

#[derive(Debug, Serialize)]
struct ImageSource {
    #[serde(rename = "type")]
    source_type: String,
    media_type: String,
    data: String,
}

#[derive(Debug, Deserialize)]
struct MessagesResponse {
    content: Vec<ResponseBlock>,
}

#[derive(Debug, Deserialize)]
struct ResponseBlock {
    #[serde(rename = "type")]
    block_type: String,
    text: Option<String>,
}

impl AnthropicProvider {
    pub fn new(api_key: String) -> Self {
        Self {
            client: Client::builder()
                .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
                .build()
                .unwrap_or_default(),
            api_key,
            base_url: ANTHROPIC_API_URL.to_string(),
            model: DEFAULT_MODEL.to_string(),
        }
    }

    fn content_blocks(&self, request: &InferenceRequest) -> Vec<ContentBlock> {
        let mut blocks = Vec::new();
        match &request.content {
            RequestContent::Text(text) => {
                blocks.push(ContentBlock::Text {
                    text: format!("{}\n\n{}", request.instructions, text),
                });
            }
            RequestContent::Binary { data, media_type } => {
                let source = ImageSource {
                    source_type: "base64".to_string(),
                    media_type: media_type.clone(),
                    data: base64::engine::general_purpose::STANDARD.encode(data),
                };
                if media_type == "application/pdf" {
                    blocks.push(ContentBlock::Document { source });
                } else {
                    blocks.push(ContentBlock::Image { source });
                }
                blocks.push(ContentBlock::Text {
                    text: request.instructions.clone(),
                });
            }
        }
        blocks
    }
}

#[async_trait]
impl InferenceProvider for AnthropicProvider {
    fn name(&self) -> &str {
        "anthropic"
    }

    async fn generate(&self, request: &InferenceRequest) -> Result<String> {
        let payload = MessagesRequest {
            model: self.model.clone(),
            max_tokens: MAX_TOKENS,
            // Determinism-favoring sampling: extraction should not be creative.
            temperature: 0.0,
            messages: vec![Message {
                role: "user".to_string(),
                content: self.content_blocks(request),
            }],
        };

        let response = self
            .client
            .post(format!("{}/messages", self.base_url))
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", ANTHROPIC_VERSION)
            .header("content-type", "application/json")
            .json(&payload)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(StatementError::ProviderFailed {
                provider: self.name().to_string(),
                details: format!("status {}: {}", status, body),
            });
        }

        let body: MessagesResponse = response.json().await?;
        body.content
            .iter()
            .find(|b| b.block_type == "text")
            .and_then(|b| b.text.clone())
            .ok_or_else(|| StatementError::ProviderFailed {
                provider: "anthropic".to_string(),
                details: "no text block in response".to_string(),
            })
    }
}

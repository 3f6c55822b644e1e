//! OpenAI-compatible chat-completions provider.
//!
//! Groq exposes the same wire format behind a different base URL, so one
//! implementation serves both endpoints.

use async_trait::async_trait;
use base64::Engine;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::time::Duration;

use crate::error::{Result, StatementError};
use crate::llm::{InferenceProvider, InferenceRequest, RequestContent, REQUEST_TIMEOUT_SECS};

const OPENAI_API_URL: &str = "https://api.openai.com/v1";
const GROQ_API_URL: &str = "https://api.groq.com/openai/v1";
const OPENAI_MODEL: &str = "gpt-4o-mini";
const GROQ_MODEL: &str = "llama-3.3-70b-versatile";
const MAX_TOKENS: u32 = 2000;

pub struct OpenAiCompatProvider {
    client: Client,
    name: &'static str,
    api_key: String,
    base_url: String,
    model: String,
    /// Groq's hosted models are text-only; binary requests fail fast so the
    /// chain can advance to a vision-capable provider.
    supports_vision: bool,
}

#[derive(Debug, Serialize)]
struct ChatRequest {
    model: String,
    temperature: f32,
    max_tokens: u32,
    messages: Vec<ChatMessage>,
}

#[derive(Debug, Serialize)]
struct ChatMessage {
    role: String,
    content: Value,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatResponseMessage,
}

#[derive(Debug, Deserialize)]
struct ChatResponseMessage {
    content: Option<String>,
}

impl OpenAiCompatProvider {
    pub fn openai(api_key: String) -> Self {
        Self::new("openai", api_key, OPENAI_API_URL, OPENAI_MODEL, true)
    }

    pub fn groq(api_key: String) -> Self {
        Self::new("groq", api_key, GROQ_API_URL, GROQ_MODEL, false)
    }

    fn new(
        name: &'static str,
        api_key: String,
        base_url: &str,
        model: &str,
        supports_vision: bool,
    ) -> Self {
        Self {
            client: Client::builder()
                .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
                .build()
                .unwrap_or_default(),
            name,
            api_key,
            base_url: base_url.to_string(),
            model: model.to_string(),
            supports_vision,
        }
    }

    fn message_content(&self, request: &InferenceRequest) -> Result<Value> {
        match &request.content {
            RequestContent::Text(text) => {
                Ok(json!(format!("{}\n\n{}", request.instructions, text)))
            }
            RequestContent::Binary { data, media_type } => {
                if !self.supports_vision {
                    return Err(StatementError::ProviderFailed {
                        provider: self.name.to_string(),
                        details: "binary content not supported".to_string(),
                    });
                }
                let encoded = base64::engine::general_purpose::STANDARD.encode(data);
                Ok(json!([
                    {"type": "text", "text": request.instructions},
                    {"type": "image_url", "image_url": {
                        "url": format!("data:{};base64,{}", media_type, encoded),
                    }},
                ]))
            }
        }
    }
}

#[async_trait]
impl InferenceProvider for OpenAiCompatProvider {
    fn name(&self) -> &str {
        self.name
    }

    async fn generate(&self, request: &InferenceRequest) -> Result<String> {
        let payload = ChatRequest {
            model: self.model.clone(),
            temperature: 0.1,
            max_tokens: MAX_TOKENS,
            messages: vec![ChatMessage {
                role: "user".to_string(),
                content: self.message_content(request)?,
            }],
        };

        let response = self
            .client
            .post(format!("{}/chat/completions", self.base_url))
            .header("Authorization", format!("Bearer {}", self.api_key))
            .header("Content-Type", "application/json")
            .json(&payload)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(StatementError::ProviderFailed {
                provider: self.name.to_string(),
                details: format!("status {}: {}", status, body),
            });
        }

        let body: ChatResponse = response.json().await?;
        body.choices
            .first()
            .and_then(|c| c.message.content.clone())
            .ok_or_else(|| StatementError::ProviderFailed {
                provider: self.name.to_string(),
                details: "empty choices in response".to_string(),
            })
    }
}

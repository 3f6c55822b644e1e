//! Delegated extraction via external inference providers.
//!
//! Each provider implements one capability behind [`InferenceProvider`]; the
//! chain in [`extractor`] tries them in a fixed priority order and advances
//! on any failure, so a provider's wire format never leaks outside its own
//! module.

pub mod anthropic;
pub mod extractor;
pub mod openai;
pub mod prompts;

use async_trait::async_trait;

use crate::config::ProviderCredentials;
use crate::error::Result;

/// Maximum characters of document text sent to a provider. Overflow is
/// truncated, never an error.
pub const MAX_PROMPT_CHARS: usize = 12_000;

/// Per-call timeout in seconds; a timeout is treated like any other provider
/// failure and the chain advances.
pub const REQUEST_TIMEOUT_SECS: u64 = 30;

#[derive(Debug, Clone)]
pub enum RequestContent {
    /// Bounded document text.
    Text(String),
    /// Raw binary content for image (or PDF-as-image) delegation.
    Binary { data: Vec<u8>, media_type: String },
}

#[derive(Debug, Clone)]
pub struct InferenceRequest {
    /// Fixed instruction template; forbids prose in the response.
    pub instructions: String,
    pub content: RequestContent,
}

impl InferenceRequest {
    pub fn text(instructions: impl Into<String>, text: impl Into<String>) -> Self {
        let mut text: String = text.into();
        if text.len() > MAX_PROMPT_CHARS {
            let mut cut = MAX_PROMPT_CHARS;
            while !text.is_char_boundary(cut) {
                cut -= 1;
            }
            text.truncate(cut);
        }
        Self {
            instructions: instructions.into(),
            content: RequestContent::Text(text),
        }
    }

    pub fn binary(instructions: impl Into<String>, data: Vec<u8>, media_type: &str) -> Self {
        Self {
            instructions: instructions.into(),
            content: RequestContent::Binary {
                data,
                media_type: media_type.to_string(),
            },
        }
    }
}

#[async_trait]
pub trait InferenceProvider: Send + Sync {
    fn name(&self) -> &str;

    /// Returns the raw response text on success. Any error advances the
    /// fallback chain; it is never surfaced to the pipeline caller directly.
    async fn generate(&self, request: &InferenceRequest) -> Result<String>;
}

/// Builds the provider chain in fixed priority order: Anthropic, Groq,
/// OpenAI. Providers without a credential are skipped, not an error.
pub fn build_provider_chain(credentials: &ProviderCredentials) -> Vec<Box<dyn InferenceProvider>> {
    let mut chain: Vec<Box<dyn InferenceProvider>> = Vec::new();

    if let Some(key) = &credentials.anthropic_api_key {
        chain.push(Box::new(anthropic::AnthropicProvider::new(key.clone())));
    }
    if let Some(key) = &credentials.groq_api_key {
        chain.push(Box::new(openai::OpenAiCompatProvider::groq(key.clone())));
    }
    if let Some(key) = &credentials.openai_api_key {
        chain.push(Box::new(openai::OpenAiCompatProvider::openai(key.clone())));
    }

    chain
}

/// Minimal content sniffing for in-memory documents; inputs arrive as bytes,
/// not paths, so extension-based guessing is unavailable.
pub fn sniff_media_type(bytes: &[u8]) -> &'static str {
    if bytes.starts_with(b"\x89PNG\r\n\x1a\n") {
        "image/png"
    } else if bytes.starts_with(&[0xFF, 0xD8, 0xFF]) {
        "image/jpeg"
    } else if bytes.starts_with(b"GIF8") {
        "image/gif"
    } else if bytes.starts_with(b"RIFF") && bytes.get(8..12) == Some(b"WEBP") {
        "image/webp"
    } else if bytes.starts_with(b"%PDF") {
        "application/pdf"
    } else {
        "application/octet-stream"
    }
}

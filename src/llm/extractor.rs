//! The delegated extraction fallback chain.

use log::{debug, info, warn};
use serde_json::Value;

use crate::error::{Result, StatementError};
use crate::llm::{InferenceProvider, InferenceRequest};

pub struct DelegatedExtractor {
    providers: Vec<Box<dyn InferenceProvider>>,
}

/// A syntactically valid payload plus the provider that produced it.
#[derive(Debug)]
pub struct DelegatedPayload {
    pub value: Value,
    pub provider: String,
}

impl DelegatedExtractor {
    pub fn new(providers: Vec<Box<dyn InferenceProvider>>) -> Self {
        Self { providers }
    }

    pub fn is_configured(&self) -> bool {
        !self.providers.is_empty()
    }

    /// Tries each provider in priority order; the first response containing
    /// a parsable JSON object wins. Provider-level failures (network,
    /// non-success status, unsupported modality, malformed JSON) only log a
    /// warning and advance the chain. Returns `ExtractionExhausted` when no
    /// provider is configured or all attempts fail.
    pub async fn extract(&self, request: &InferenceRequest) -> Result<DelegatedPayload> {
        if self.providers.is_empty() {
            debug!("no inference providers configured");
            return Err(StatementError::ExtractionExhausted);
        }

        for provider in &self.providers {
            debug!("attempting delegated extraction via {}", provider.name());
            let response = match provider.generate(request).await {
                Ok(text) => text,
                Err(e) => {
                    warn!("provider {} failed, advancing chain: {}", provider.name(), e);
                    continue;
                }
            };

            match scan_json_object(&response) {
                Some(value) => {
                    info!("delegated extraction succeeded via {}", provider.name());
                    return Ok(DelegatedPayload {
                        value,
                        provider: provider.name().to_string(),
                    });
                }
                None => {
                    warn!(
                        "provider {} returned no parsable JSON object, advancing chain",
                        provider.name()
                    );
                }
            }
        }

        Err(StatementError::ExtractionExhausted)
    }

    /// Plain-text variant of the chain for callers that want prose rather
    /// than a structured payload (advice generation). Same fallback
    /// semantics, no JSON requirement on the response.
    pub async fn generate_text(&self, request: &InferenceRequest) -> Result<String> {
        for provider in &self.providers {
            match provider.generate(request).await {
                Ok(text) if !text.trim().is_empty() => return Ok(text),
                Ok(_) => warn!("provider {} returned empty text", provider.name()),
                Err(e) => {
                    warn!("provider {} failed, advancing chain: {}", provider.name(), e);
                }
            }
        }
        Err(StatementError::ExtractionExhausted)
    }
}

/// Finds the first brace-delimited JSON object in a response, tolerating
/// providers that wrap JSON in explanatory prose or code fences.
pub fn scan_json_object(response: &str) -> Option<Value> {
    if let Some(fenced) = fenced_block(response) {
        if let Ok(value) = serde_json::from_str::<Value>(fenced) {
            if value.is_object() {
                return Some(value);
            }
        }
    }

    let start = response.find('{')?;
    let end = response.rfind('}')?;
    if end <= start {
        return None;
    }
    serde_json::from_str::<Value>(&response[start..=end])
        .ok()
        .filter(Value::is_object)
}

fn fenced_block(response: &str) -> Option<&str> {
    let after_open = response.split("```").nth(1)?;
    Some(after_open.strip_prefix("json").unwrap_or(after_open).trim())
}

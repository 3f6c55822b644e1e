//! Plain-language portfolio commentary over the same provider chain as
//! extraction. Advice is supplementary output: any failure degrades to a
//! fixed fallback sentence rather than an error.

use log::warn;

use crate::config::ProviderCredentials;
use crate::llm::extractor::DelegatedExtractor;
use crate::llm::prompts::{ADVICE_FALLBACK, ADVICE_INSTRUCTIONS};
use crate::llm::{build_provider_chain, InferenceProvider, InferenceRequest};
use crate::schema::{AssetSnapshot, PortfolioSummary};

pub struct AdviceGenerator {
    extractor: DelegatedExtractor,
}

impl AdviceGenerator {
    pub fn new(credentials: &ProviderCredentials) -> Self {
        Self {
            extractor: DelegatedExtractor::new(build_provider_chain(credentials)),
        }
    }

    pub fn with_providers(providers: Vec<Box<dyn InferenceProvider>>) -> Self {
        Self {
            extractor: DelegatedExtractor::new(providers),
        }
    }

    /// Generates a short commentary on the position. Infallible by contract:
    /// chain exhaustion or an empty response returns [`ADVICE_FALLBACK`].
    pub async fn generate(&self, snapshot: &AssetSnapshot, summary: &PortfolioSummary) -> String {
        let request = InferenceRequest::text(ADVICE_INSTRUCTIONS, render_position(snapshot, summary));

        match self.extractor.generate_text(&request).await {
            Ok(text) => text.trim().to_string(),
            Err(e) => {
                warn!("advice generation unavailable: {}", e);
                ADVICE_FALLBACK.to_string()
            }
        }
    }
}

/// Renders the position as compact labelled lines. Numbers are passed through
/// pre-rounded; the summary already carries two-decimal values.
fn render_position(snapshot: &AssetSnapshot, summary: &PortfolioSummary) -> String {
    let mut lines = vec![
        format!("Grand total: {:.2}", summary.grand_total),
        format!("Cash balance: {:.2}", summary.cash_balance),
        format!("Liquid assets: {:.2}", summary.total_liquid),
        format!("Illiquid assets: {:.2}", summary.total_illiquid),
        format!("Holdings value (at cost): {:.2}", summary.total_holdings_value),
        format!("Precious metals (at cost): {:.2}", summary.total_metal),
    ];

    if !snapshot.holdings_domestic.is_empty() || !snapshot.holdings_foreign.is_empty() {
        lines.push("Holdings:".to_string());
        for holding in snapshot.holdings() {
            lines.push(format!(
                "  {} ({}): {} units at {:.2}",
                holding.symbol, holding.name, holding.quantity, holding.average_cost
            ));
        }
    }

    for entry in snapshot
        .liquid_assets
        .iter()
        .chain(snapshot.illiquid_assets.iter())
    {
        lines.push(format!("  {}: {:.2}", entry.name, entry.value));
    }

    lines.join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{Result, StatementError};
    use crate::valuation::summarize;
    use async_trait::async_trait;

    struct EchoProvider;

    #[async_trait]
    impl InferenceProvider for EchoProvider {
        fn name(&self) -> &str {
            "echo"
        }

        async fn generate(&self, request: &InferenceRequest) -> Result<String> {
            match &request.content {
                crate::llm::RequestContent::Text(text) => Ok(format!("seen: {}", text)),
                _ => Err(StatementError::ProviderFailed {
                    provider: "echo".to_string(),
                    details: "text only".to_string(),
                }),
            }
        }
    }

    #[tokio::test]
    async fn test_advice_prompt_carries_position_figures() {
        let mut snapshot = AssetSnapshot::default();
        snapshot.cash_balance = 1234.5;
        let summary = summarize(&snapshot);

        let generator = AdviceGenerator::with_providers(vec![Box::new(EchoProvider)]);
        let advice = generator.generate(&snapshot, &summary).await;
        assert!(advice.contains("Cash balance: 1234.50"));
    }

    #[tokio::test]
    async fn test_exhausted_chain_degrades_to_fallback_text() {
        let snapshot = AssetSnapshot::default();
        let summary = summarize(&snapshot);

        let generator = AdviceGenerator::with_providers(vec![]);
        let advice = generator.generate(&snapshot, &summary).await;
        assert_eq!(advice, ADVICE_FALLBACK);
    }
}

//! Market quote lookups for revaluing extracted holdings at current prices.
//!
//! Quotes are best-effort enrichment: a failed lookup leaves the holding's
//! `current_price` at 0 and never fails the parse.

use log::warn;
use reqwest::Client;
use serde::Deserialize;
use serde_json::Value;
use std::time::Duration;

use crate::config::ProviderCredentials;
use crate::error::{Result, StatementError};
use crate::llm::REQUEST_TIMEOUT_SECS;
use crate::schema::{AssetSnapshot, Market};

const QUOTE_API_URL: &str = "https://www.alphavantage.co/query";
/// Domestic listing codes are resolved on the KLSE feed.
const DOMESTIC_SUFFIX: &str = ".KL";

#[derive(Debug, Clone, PartialEq)]
pub struct StockQuote {
    pub symbol: String,
    pub price: f64,
    pub change: f64,
    pub change_percent: String,
    pub volume: f64,
    pub latest_trading_day: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ForexRate {
    pub from: String,
    pub to: String,
    pub rate: f64,
    pub last_updated: String,
}

#[derive(Debug, Deserialize)]
struct GlobalQuoteResponse {
    #[serde(rename = "Global Quote")]
    global_quote: Option<RawQuote>,

    #[serde(rename = "Note")]
    note: Option<String>,

    #[serde(rename = "Error Message")]
    error_message: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RawQuote {
    #[serde(rename = "01. symbol", default)]
    symbol: String,

    #[serde(rename = "05. price", default)]
    price: String,

    #[serde(rename = "09. change", default)]
    change: String,

    #[serde(rename = "10. change percent", default)]
    change_percent: String,

    #[serde(rename = "06. volume", default)]
    volume: String,

    #[serde(rename = "07. latest trading day", default)]
    latest_trading_day: String,
}

pub struct QuoteClient {
    client: Client,
    api_key: String,
    base_url: String,
}

impl QuoteClient {
    pub fn new(api_key: String) -> Self {
        Self {
            client: Client::builder()
                .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
                .build()
                .unwrap_or_default(),
            api_key,
            base_url: QUOTE_API_URL.to_string(),
        }
    }

    /// `None` when no quote credential is configured; price enrichment is
    /// optional and simply skipped in that case.
    pub fn from_credentials(credentials: &ProviderCredentials) -> Option<Self> {
        credentials.quote_api_key.clone().map(Self::new)
    }

    /// Fetches the latest quote. Domestic symbols are suffixed for the
    /// exchange feed; foreign tickers pass through unchanged.
    pub async fn quote(&self, symbol: &str, market: Market) -> Result<StockQuote> {
        let feed_symbol = match market {
            Market::Domestic => format!("{}{}", symbol, DOMESTIC_SUFFIX),
            Market::Foreign => symbol.to_string(),
        };

        let response = self
            .client
            .get(&self.base_url)
            .query(&[
                ("function", "GLOBAL_QUOTE"),
                ("symbol", &feed_symbol),
                ("apikey", &self.api_key),
            ])
            .send()
            .await?;

        let body: GlobalQuoteResponse = response.json().await?;

        if let Some(note) = body.note {
            return Err(StatementError::QuoteFailed {
                symbol: symbol.to_string(),
                details: format!("rate limited: {}", note),
            });
        }
        if let Some(message) = body.error_message {
            return Err(StatementError::QuoteFailed {
                symbol: symbol.to_string(),
                details: message,
            });
        }

        let raw = body.global_quote.ok_or_else(|| StatementError::QuoteFailed {
            symbol: symbol.to_string(),
            details: "no quote in response".to_string(),
        })?;

        let price = parse_quote_field(&raw.price).ok_or_else(|| StatementError::QuoteFailed {
            symbol: symbol.to_string(),
            details: format!("unparsable price {:?}", raw.price),
        })?;

        Ok(StockQuote {
            symbol: if raw.symbol.is_empty() {
                feed_symbol
            } else {
                raw.symbol
            },
            price,
            change: parse_quote_field(&raw.change).unwrap_or(0.0),
            change_percent: raw.change_percent,
            volume: parse_quote_field(&raw.volume).unwrap_or(0.0),
            latest_trading_day: raw.latest_trading_day,
        })
    }

    /// Spot rate between two currencies, for converting foreign holdings into
    /// the reporting currency.
    pub async fn exchange_rate(&self, from: &str, to: &str) -> Result<ForexRate> {
        let response = self
            .client
            .get(&self.base_url)
            .query(&[
                ("function", "CURRENCY_EXCHANGE_RATE"),
                ("from_currency", from),
                ("to_currency", to),
                ("apikey", &self.api_key),
            ])
            .send()
            .await?;

        let body: Value = response.json().await?;

        if let Some(note) = body.get("Note").and_then(Value::as_str) {
            return Err(StatementError::QuoteFailed {
                symbol: format!("{}/{}", from, to),
                details: format!("rate limited: {}", note),
            });
        }

        let payload = body
            .get("Realtime Currency Exchange Rate")
            .ok_or_else(|| StatementError::QuoteFailed {
                symbol: format!("{}/{}", from, to),
                details: "no exchange rate in response".to_string(),
            })?;

        let rate = payload
            .get("5. Exchange Rate")
            .and_then(Value::as_str)
            .and_then(|s| s.parse::<f64>().ok())
            .ok_or_else(|| StatementError::QuoteFailed {
                symbol: format!("{}/{}", from, to),
                details: "unparsable exchange rate".to_string(),
            })?;

        Ok(ForexRate {
            from: from.to_string(),
            to: to.to_string(),
            rate,
            last_updated: payload
                .get("6. Last Refreshed")
                .and_then(Value::as_str)
                .unwrap_or_default()
                .to_string(),
        })
    }
}

fn parse_quote_field(raw: &str) -> Option<f64> {
    raw.trim().parse::<f64>().ok()
}

/// Fills `current_price` for every holding in place. Each failed lookup is
/// logged and leaves that holding's price at 0; the call itself never errors.
pub async fn fill_current_prices(client: &QuoteClient, snapshot: &mut AssetSnapshot) {
    for holding in snapshot
        .holdings_domestic
        .iter_mut()
        .chain(snapshot.holdings_foreign.iter_mut())
    {
        match client.quote(&holding.symbol, holding.market).await {
            Ok(quote) => holding.current_price = quote.price,
            Err(e) => warn!("quote lookup failed for {}: {}", holding.symbol, e),
        }
    }
}

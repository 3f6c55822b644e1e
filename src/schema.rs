use chrono::{DateTime, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum AssetCategory {
    #[schemars(description = "Cash in hand or in a bank account")]
    Cash,

    #[schemars(description = "Publicly traded equity not tracked as an individual holding")]
    Stocks,

    #[schemars(description = "Physical or paper gold not tracked as a metal lot")]
    Gold,

    #[schemars(description = "Funds, unit trusts and other unrestricted investments")]
    Investment,

    #[schemars(
        description = "Retirement or pension funds with withdrawal restrictions (e.g. EPF/KWSP)"
    )]
    Retirement,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum Market {
    #[schemars(description = "Domestic exchange; listing codes are exactly 4 digits (e.g. 1155)")]
    Domestic,

    #[schemars(
        description = "Foreign exchange; ticker symbols are 1-5 uppercase letters (e.g. TSLA)"
    )]
    Foreign,
}

impl Market {
    /// Derives the market from the symbol shape alone. Symbols matching
    /// neither shape yield `None` and the holding is dropped during
    /// normalization.
    pub fn classify(symbol: &str) -> Option<Market> {
        if symbol.len() == 4 && symbol.bytes().all(|b| b.is_ascii_digit()) {
            return Some(Market::Domestic);
        }
        if (1..=5).contains(&symbol.len()) && symbol.bytes().all(|b| b.is_ascii_uppercase()) {
            return Some(Market::Foreign);
        }
        None
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct AssetEntry {
    #[schemars(description = "Asset name as written in the statement")]
    pub name: String,

    #[schemars(description = "Monetary value, plain number without currency symbols or commas")]
    pub value: f64,

    #[schemars(description = "Asset classification")]
    pub category: AssetCategory,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct Holding {
    #[schemars(description = "Listing code or ticker symbol exactly as printed")]
    pub symbol: String,

    #[serde(default)]
    #[schemars(description = "Company or instrument display name; may repeat the symbol")]
    pub name: String,

    #[serde(alias = "shares")]
    #[schemars(description = "Number of units held; must be a positive number")]
    pub quantity: f64,

    #[serde(alias = "avgPrice", alias = "avg_cost")]
    #[schemars(description = "Average cost per unit, plain non-negative number")]
    pub average_cost: f64,

    #[serde(default, alias = "currentPrice")]
    #[schemars(description = "Latest market price per unit; 0 when unknown")]
    pub current_price: f64,

    #[schemars(description = "Listing market, derived from the symbol shape")]
    pub market: Market,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct MetalLot {
    #[serde(alias = "type")]
    #[schemars(description = "Metal type or product name (e.g. '916 gold')")]
    pub name: String,

    #[serde(alias = "weight")]
    #[schemars(description = "Lot weight in grams; must be a positive number")]
    pub weight_grams: f64,

    #[serde(alias = "purchasePrice")]
    #[schemars(description = "Purchase cost per gram, plain non-negative number")]
    pub unit_cost: f64,
}

/// Canonical output of every extraction strategy. Constructed fresh per parse
/// request and never mutated after normalization.
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
pub struct AssetSnapshot {
    #[serde(default)]
    #[schemars(description = "Readily accessible assets: cash, funds, unrestricted investments")]
    pub liquid_assets: Vec<AssetEntry>,

    #[serde(default)]
    #[schemars(description = "Assets with withdrawal restrictions, e.g. retirement funds")]
    pub illiquid_assets: Vec<AssetEntry>,

    #[serde(default, alias = "stocks_my")]
    #[schemars(description = "Equity holdings listed on the domestic exchange (4-digit codes)")]
    pub holdings_domestic: Vec<Holding>,

    #[serde(default, alias = "stocks_us")]
    #[schemars(description = "Equity holdings listed on foreign exchanges (letter tickers)")]
    pub holdings_foreign: Vec<Holding>,

    #[serde(default, alias = "gold")]
    #[schemars(description = "Discrete precious-metal purchases with weight and unit cost")]
    pub metal_lots: Vec<MetalLot>,

    #[serde(default)]
    #[schemars(description = "Cash account balance, plain non-negative number")]
    pub cash_balance: f64,
}

impl AssetSnapshot {
    pub fn is_empty(&self) -> bool {
        self.liquid_assets.is_empty()
            && self.illiquid_assets.is_empty()
            && self.holdings_domestic.is_empty()
            && self.holdings_foreign.is_empty()
            && self.metal_lots.is_empty()
            && self.cash_balance == 0.0
    }

    pub fn holdings(&self) -> impl Iterator<Item = &Holding> {
        self.holdings_domestic.iter().chain(self.holdings_foreign.iter())
    }

    pub fn generate_json_schema() -> schemars::schema::RootSchema {
        schemars::schema_for!(AssetSnapshot)
    }

    pub fn schema_as_json() -> crate::error::Result<String> {
        Ok(serde_json::to_string_pretty(&Self::generate_json_schema())?)
    }
}

/// Derived totals. Always recomputed from the snapshot, never trusted from an
/// upstream payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PortfolioSummary {
    pub total_holdings_value: f64,
    pub total_liquid: f64,
    pub total_illiquid: f64,
    pub total_metal: f64,
    pub cash_balance: f64,
    pub grand_total: f64,
}

/// How the structured payload was obtained. Callers are always told when the
/// pipeline had to fall back to heuristic matching.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case", tag = "method", content = "provider")]
pub enum ExtractionMethod {
    Tabular,
    Delegated(String),
    Heuristic,
}

/// JSON-serializable outcome contract. `success == false` always carries a
/// human-readable `error` and no data.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ParseOutcome {
    pub success: bool,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<AssetSnapshot>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub summary: Option<PortfolioSummary>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub extraction_method: Option<ExtractionMethod>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,

    pub timestamp: DateTime<Utc>,
}

impl ParseOutcome {
    pub fn success(
        data: AssetSnapshot,
        summary: PortfolioSummary,
        method: ExtractionMethod,
    ) -> Self {
        Self {
            success: true,
            data: Some(data),
            summary: Some(summary),
            extraction_method: Some(method),
            error: None,
            timestamp: Utc::now(),
        }
    }

    pub fn failure(error: impl Into<String>) -> Self {
        Self {
            success: false,
            data: None,
            summary: None,
            extraction_method: None,
            error: Some(error.into()),
            timestamp: Utc::now(),
        }
    }
}

//! Validation and reshaping of untrusted structured payloads.
//!
//! Whatever comes back from a delegated provider or the heuristic matcher is
//! treated as hostile input: every field is validated and coerced
//! individually, missing fields default to empty/zero, unknown fields are
//! ignored, and a single bad item drops only that item.

use log::debug;
use serde_json::Value;

use crate::schema::{AssetCategory, AssetEntry, AssetSnapshot, Holding, Market, MetalLot};

/// Reshapes a raw payload into a valid snapshot. Market classification is
/// re-derived from the symbol shape regardless of which array the source put
/// a holding in.
pub fn normalize(payload: &Value) -> AssetSnapshot {
    let mut snapshot = AssetSnapshot {
        liquid_assets: entries(payload, "liquid_assets", AssetCategory::Investment),
        illiquid_assets: entries(payload, "illiquid_assets", AssetCategory::Retirement),
        holdings_domestic: Vec::new(),
        holdings_foreign: Vec::new(),
        metal_lots: metal_lots(payload),
        cash_balance: field_number(payload, &["cash_balance", "cashBalance"])
            .unwrap_or(0.0)
            .max(0.0),
    };

    for key in ["holdings_domestic", "holdings_foreign", "stocks_my", "stocks_us"] {
        for item in array_items(payload, key) {
            match holding(item) {
                Some(h) => match h.market {
                    Market::Domestic => snapshot.holdings_domestic.push(h),
                    Market::Foreign => snapshot.holdings_foreign.push(h),
                },
                None => debug!("dropping invalid holding in '{}': {}", key, item),
            }
        }
    }

    snapshot
}

fn entries(payload: &Value, key: &str, default_category: AssetCategory) -> Vec<AssetEntry> {
    array_items(payload, key)
        .filter_map(|item| {
            let name = item.get("name")?.as_str()?.trim();
            if name.is_empty() {
                return None;
            }
            Some(AssetEntry {
                name: name.to_string(),
                value: field_number(item, &["value", "amount"])?.max(0.0),
                category: item
                    .get("category")
                    .and_then(Value::as_str)
                    .and_then(category_from_str)
                    .unwrap_or(default_category),
            })
        })
        .collect()
}

fn holding(item: &Value) -> Option<Holding> {
    let symbol = item.get("symbol").and_then(Value::as_str)?.trim().to_string();
    let market = Market::classify(&symbol)?;

    let quantity = field_number(item, &["quantity", "shares"])?;
    let average_cost = field_number(item, &["average_cost", "avgPrice", "avg_cost"]).unwrap_or(0.0);

    // Zero/negative quantities and negative costs exclude the holding
    // entirely rather than propagating.
    if quantity <= 0.0 || average_cost < 0.0 {
        return None;
    }

    Some(Holding {
        name: item
            .get("name")
            .and_then(Value::as_str)
            .map(str::to_string)
            .unwrap_or_else(|| symbol.clone()),
        symbol,
        quantity,
        average_cost,
        current_price: field_number(item, &["current_price", "currentPrice"])
            .unwrap_or(0.0)
            .max(0.0),
        market,
    })
}

fn metal_lots(payload: &Value) -> Vec<MetalLot> {
    ["metal_lots", "gold"]
        .iter()
        .flat_map(|key| array_items(payload, key))
        .filter_map(|item| {
            let weight_grams = field_number(item, &["weight_grams", "weight"])?;
            if weight_grams <= 0.0 {
                return None;
            }
            Some(MetalLot {
                name: item
                    .get("name")
                    .or_else(|| item.get("type"))
                    .and_then(Value::as_str)
                    .unwrap_or("gold")
                    .to_string(),
                weight_grams,
                unit_cost: field_number(item, &["unit_cost", "purchasePrice", "purchase_price"])
                    .unwrap_or(0.0)
                    .max(0.0),
            })
        })
        .collect()
}

fn category_from_str(raw: &str) -> Option<AssetCategory> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "cash" => Some(AssetCategory::Cash),
        "stocks" | "stock" => Some(AssetCategory::Stocks),
        "gold" => Some(AssetCategory::Gold),
        "investment" | "fund" => Some(AssetCategory::Investment),
        "retirement" | "pension" | "epf" | "kwsp" => Some(AssetCategory::Retirement),
        _ => None,
    }
}

fn array_items<'a>(payload: &'a Value, key: &str) -> impl Iterator<Item = &'a Value> {
    payload
        .get(key)
        .and_then(Value::as_array)
        .map(|a| a.iter())
        .unwrap_or_default()
}

/// First present field wins. Accepts JSON numbers and numeric strings with
/// commas or a currency prefix; anything else is a coercion failure.
fn field_number(item: &Value, keys: &[&str]) -> Option<f64> {
    keys.iter()
        .find_map(|key| item.get(*key))
        .and_then(coerce_number)
}

fn coerce_number(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => {
            let cleaned: String = s
                .chars()
                .filter(|c| c.is_ascii_digit() || *c == '.' || *c == '-')
                .collect();
            cleaned.parse::<f64>().ok()
        }
        _ => None,
    }
}

use crate::schema::{AssetSnapshot, PortfolioSummary};

/// Computes derived totals from a normalized snapshot. Pure and idempotent:
/// no I/O, and the same snapshot always yields bit-identical summary values.
/// Rounding to 2 decimal places is applied once at the end, never per term.
pub fn summarize(snapshot: &AssetSnapshot) -> PortfolioSummary {
    let total_holdings_value: f64 = snapshot
        .holdings()
        .map(|h| h.quantity * h.average_cost)
        .sum();

    let total_liquid: f64 = snapshot.liquid_assets.iter().map(|a| a.value).sum();
    let total_illiquid: f64 = snapshot.illiquid_assets.iter().map(|a| a.value).sum();

    let total_metal: f64 = snapshot
        .metal_lots
        .iter()
        .map(|lot| lot.weight_grams * lot.unit_cost)
        .sum();

    let grand_total = total_holdings_value
        + total_liquid
        + total_illiquid
        + total_metal
        + snapshot.cash_balance;

    PortfolioSummary {
        total_holdings_value: round2(total_holdings_value),
        total_liquid: round2(total_liquid),
        total_illiquid: round2(total_illiquid),
        total_metal: round2(total_metal),
        cash_balance: round2(snapshot.cash_balance),
        grand_total: round2(grand_total),
    }
}

pub(crate) fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

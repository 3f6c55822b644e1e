//! Last-resort structured extraction using deterministic string rules only.
//!
//! The rules are fixed and intentionally crude: a 4-digit token is treated as
//! a domestic listing code and a 1-5 uppercase token as a foreign ticker,
//! which will misclassify plain words. That imprecision is an accepted
//! tradeoff of last-resort mode; the normalizer re-validates everything and
//! callers are told (via `ExtractionMethod::Heuristic`) which mode produced
//! the data.

use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::{json, Value};

/// Upper bound on foreign-ticker candidates per document. Uppercase words in
/// prose match the ticker shape, so unbounded matching floods the result.
const MAX_FOREIGN_CANDIDATES: usize = 10;

static DOMESTIC_CODE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\d{4}$").unwrap());
static FOREIGN_CODE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[A-Z]{1,5}$").unwrap());
static NUMBER_TOKEN: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[\d,]+(?:\.\d+)?$").unwrap());

/// Balance keyword patterns in declaration order; the first match wins.
static BALANCE_PATTERNS: Lazy<Vec<Regex>> = Lazy::new(|| {
    [
        r"(?i)balance[^0-9]*([\d,]+(?:\.\d+)?)",
        r"(?i)cash[^0-9]*([\d,]+(?:\.\d+)?)",
        r"余额[^0-9]*([\d,]+(?:\.\d+)?)",
        r"现金[^0-9]*([\d,]+(?:\.\d+)?)",
    ]
    .iter()
    .map(|p| Regex::new(p).unwrap())
    .collect()
});

/// Scans free text for holdings and a cash balance. Never errors: unmatched
/// input yields an empty payload, which is a valid outcome.
pub fn extract_from_text(text: &str) -> Value {
    extract_from_lines(text.lines(), text)
}

/// Variant with separate sources: holdings are matched against `lines`, the
/// cash balance against `balance_text`. Page-oriented callers pass detected
/// table rows as the lines, keeping prose mentions of tickers out of the
/// holdings scan, while balance keywords usually sit outside tabular regions.
pub fn extract_from_lines<I, S>(lines: I, balance_text: &str) -> Value
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut domestic = Vec::new();
    let mut foreign = Vec::new();

    for line in lines {
        let tokens: Vec<&str> = line
            .as_ref()
            .split(|c: char| c.is_whitespace() || c == ':' || c == '|')
            .filter(|t| !t.is_empty())
            .collect();

        if let Some(holding) = match_holding(&tokens, &DOMESTIC_CODE) {
            domestic.push(holding);
            continue;
        }
        if foreign.len() < MAX_FOREIGN_CANDIDATES {
            if let Some(holding) = match_holding(&tokens, &FOREIGN_CODE) {
                foreign.push(holding);
            }
        }
    }

    json!({
        "holdings_domestic": domestic,
        "holdings_foreign": foreign,
        "cash_balance": extract_cash_balance(balance_text).unwrap_or(0.0),
    })
}

/// First keyword+number pattern that matches wins; no match is not an error.
pub fn extract_cash_balance(text: &str) -> Option<f64> {
    for pattern in BALANCE_PATTERNS.iter() {
        if let Some(caps) = pattern.captures(text) {
            if let Some(value) = parse_number(&caps[1]) {
                return Some(value);
            }
        }
    }
    None
}

/// A row qualifies as a holding only when a symbol-shaped token is followed
/// by at least two numeric tokens (quantity then cost). Rows yielding fewer
/// numbers are discarded.
fn match_holding(tokens: &[&str], symbol_pattern: &Regex) -> Option<Value> {
    let symbol_idx = tokens.iter().position(|t| symbol_pattern.is_match(t))?;

    let numbers: Vec<f64> = tokens[symbol_idx + 1..]
        .iter()
        .filter_map(|t| {
            if NUMBER_TOKEN.is_match(t) {
                parse_number(t)
            } else {
                None
            }
        })
        .collect();

    if numbers.len() < 2 {
        return None;
    }

    Some(json!({
        "symbol": tokens[symbol_idx],
        "name": tokens[symbol_idx],
        "quantity": numbers[0],
        "average_cost": numbers[1],
    }))
}

fn parse_number(raw: &str) -> Option<f64> {
    raw.replace(',', "").parse::<f64>().ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_balance_keyword_with_currency_prefix() {
        assert_eq!(extract_cash_balance("Balance: RM 5,000.00"), Some(5000.0));
    }

    #[test]
    fn test_balance_patterns_first_match_wins() {
        let text = "Cash 100.00\nBalance 200.00";
        // "balance" is listed before "cash", so 200 wins even though "Cash"
        // appears first in the document.
        assert_eq!(extract_cash_balance(text), Some(200.0));
    }

    #[test]
    fn test_chinese_balance_keyword() {
        assert_eq!(extract_cash_balance("账户余额 1,234.56"), Some(1234.56));
    }

    #[test]
    fn test_no_balance_is_not_an_error() {
        assert_eq!(extract_cash_balance("nothing to see here"), None);
        let payload = extract_from_text("nothing to see here");
        assert_eq!(payload["cash_balance"], 0.0);
    }

    #[test]
    fn test_domestic_holding_requires_two_numbers() {
        let payload = extract_from_text("1155 MAYBANK 100 9.20\n7113 TOPGLOV 50");
        let domestic = payload["holdings_domestic"].as_array().unwrap();
        assert_eq!(domestic.len(), 1);
        assert_eq!(domestic[0]["symbol"], "1155");
        assert_eq!(domestic[0]["quantity"], 100.0);
        assert_eq!(domestic[0]["average_cost"], 9.2);
    }

    #[test]
    fn test_foreign_holding_extraction() {
        let payload = extract_from_text("TSLA Tesla Inc 10 250.5");
        let foreign = payload["holdings_foreign"].as_array().unwrap();
        assert_eq!(foreign.len(), 1);
        assert_eq!(foreign[0]["symbol"], "TSLA");
        assert_eq!(foreign[0]["average_cost"], 250.5);
    }

    #[test]
    fn test_plain_words_can_misclassify_as_tickers() {
        // Known limitation of last-resort mode: an uppercase word followed by
        // two numbers qualifies. The cap bounds the damage.
        let payload = extract_from_text("TOTAL 12 34");
        let foreign = payload["holdings_foreign"].as_array().unwrap();
        assert_eq!(foreign.len(), 1);
    }

    #[test]
    fn test_foreign_candidates_are_capped() {
        let mut text = String::new();
        for i in 0..20 {
            text.push_str(&format!("TICK word 1{} 2.5\n", i));
        }
        let payload = extract_from_text(&text);
        let foreign = payload["holdings_foreign"].as_array().unwrap();
        assert_eq!(foreign.len(), MAX_FOREIGN_CANDIDATES);
    }

    #[test]
    fn test_lines_and_balance_text_scanned_independently() {
        let payload = extract_from_lines(["1155 MAYBANK 100 9.20"], "Balance: RM 5,000.00");
        let domestic = payload["holdings_domestic"].as_array().unwrap();
        assert_eq!(domestic.len(), 1);
        assert_eq!(domestic[0]["symbol"], "1155");
        assert_eq!(payload["cash_balance"], 5000.0);
    }

    #[test]
    fn test_comma_separated_quantities() {
        let payload = extract_from_text("1155 MAYBANK 1,000 9.20");
        let domestic = payload["holdings_domestic"].as_array().unwrap();
        assert_eq!(domestic[0]["quantity"], 1000.0);
    }
}

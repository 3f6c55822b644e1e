//! Fixed instruction templates for delegated extraction and advice.

use crate::schema::AssetSnapshot;

pub const EXTRACTION_INSTRUCTIONS: &str = r#"
You are a financial statement analyzer. Extract asset information from the
provided statement content and return it as a single JSON object.

## FIELDS TO EXTRACT
1. `liquid_assets`: readily accessible assets (cash, funds, unrestricted
   investments). Each entry: {"name", "value", "category"} where category is
   one of "cash", "stocks", "gold", "investment".
2. `illiquid_assets`: assets with withdrawal restrictions such as retirement
   funds (EPF/KWSP, pensions). Each entry: {"name", "value", "category"}
   with category "retirement".
3. `holdings_domestic`: equity holdings with 4-digit listing codes
   (e.g. 1155). Each entry: {"symbol", "name", "quantity", "average_cost"}.
4. `holdings_foreign`: equity holdings with 1-5 uppercase letter tickers
   (e.g. AAPL, TSLA). Same entry shape as holdings_domestic.
5. `metal_lots`: discrete precious-metal purchases. Each entry:
   {"name", "weight_grams", "unit_cost"}.
6. `cash_balance`: the cash account balance as a plain number.

## RULES
- Every numeric value must be a JSON number: strip currency symbols,
  thousands separators and units.
- Domestic listing codes are exactly 4 digits; foreign tickers are 1-5
  uppercase letters. Classify each holding by its symbol shape.
- When a category is absent from the statement, return an empty array (or 0
  for cash_balance). Never invent values.
- Return ONLY the JSON object. No explanations, no markdown, no code fences.
"#;

pub const ADVICE_INSTRUCTIONS: &str = r#"
You are a personal finance assistant. Given the portfolio position below,
write a short plain-language summary (3-5 sentences): overall size, the split
between liquid and locked assets, concentration worth noting, and one
practical observation. No financial guarantees, no markdown.
"#;

/// Returned whenever advice generation fails; advice is supplementary and
/// never an error.
pub const ADVICE_FALLBACK: &str =
    "Portfolio summary is available above; automated commentary is currently unavailable.";

/// Extraction instructions plus the generated response schema, so providers
/// see the exact field names and types the normalizer expects.
pub fn extraction_instructions_with_schema() -> String {
    match AssetSnapshot::schema_as_json() {
        Ok(schema) => format!(
            "{}\n## RESPONSE JSON SCHEMA\n{}",
            EXTRACTION_INSTRUCTIONS, schema
        ),
        Err(_) => EXTRACTION_INSTRUCTIONS.to_string(),
    }
}

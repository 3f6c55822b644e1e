use asset_statement_parser::*;
use async_trait::async_trait;

/// Provider test double that replays a fixed response.
struct FixedProvider {
    name: &'static str,
    response: String,
}

impl FixedProvider {
    fn boxed(name: &'static str, response: &str) -> Box<dyn InferenceProvider> {
        Box::new(Self {
            name,
            response: response.to_string(),
        })
    }
}

#[async_trait]
impl InferenceProvider for FixedProvider {
    fn name(&self) -> &str {
        self.name
    }

    async fn generate(&self, _request: &InferenceRequest) -> Result<String> {
        Ok(self.response.clone())
    }
}

/// Provider test double that always fails, for exercising chain fallback.
struct OfflineProvider;

#[async_trait]
impl InferenceProvider for OfflineProvider {
    fn name(&self) -> &str {
        "offline"
    }

    async fn generate(&self, _request: &InferenceRequest) -> Result<String> {
        Err(StatementError::ProviderFailed {
            provider: "offline".to_string(),
            details: "connection refused".to_string(),
        })
    }
}

const PORTFOLIO_WORKBOOK: &str = "\
=== Sheet: Stocks ===
Symbol,Company Name,Quantity,Avg Cost
1155,MAYBANK,100,9.20
TSLA,Tesla Inc,10,250.5
Total,,110,
=== Sheet: Liquid Assets ===
Fixed Deposit,20000
Unit Trust,5000
=== Sheet: Gold ===
Type,Weight (g),Price
916 gold,10,350
";

#[tokio::test]
async fn test_workbook_parses_without_any_provider() {
    let parser = StatementParser::with_providers(vec![]);
    let document = StatementDocument::new(
        PORTFOLIO_WORKBOOK.as_bytes().to_vec(),
        DocumentKind::Spreadsheet,
    );

    let outcome = parser.parse(&document).await;
    assert!(outcome.success);
    assert_eq!(outcome.extraction_method, Some(ExtractionMethod::Tabular));

    let data = outcome.data.unwrap();
    assert_eq!(data.holdings_domestic.len(), 1);
    assert_eq!(data.holdings_foreign.len(), 1);
    assert_eq!(data.liquid_assets.len(), 2);
    assert_eq!(data.metal_lots.len(), 1);

    // 100 * 9.20 + 10 * 250.5
    let summary = outcome.summary.unwrap();
    assert_eq!(summary.total_holdings_value, 3425.0);
    assert_eq!(summary.total_liquid, 25000.0);
    assert_eq!(summary.total_metal, 3500.0);
    assert_eq!(summary.grand_total, 31925.0);
}

#[tokio::test]
async fn test_delegated_extraction_with_prose_wrapped_json() {
    let response = r#"Here is the extracted data:
```json
{
    "liquid_assets": [{"name": "Money market", "value": 1500.0, "category": "investment"}],
    "holdings_foreign": [{"symbol": "AAPL", "quantity": 5, "average_cost": 180.0}],
    "cash_balance": "RM 2,000.00"
}
```
Hope that helps!"#;

    let parser = StatementParser::with_providers(vec![
        Box::new(OfflineProvider),
        FixedProvider::boxed("backup", response),
    ]);
    let document =
        StatementDocument::new(b"=== Sheet: Misc ===\nsome,opaque,rows\n".to_vec(), DocumentKind::Spreadsheet);

    let outcome = parser.parse(&document).await;
    assert!(outcome.success);
    assert_eq!(
        outcome.extraction_method,
        Some(ExtractionMethod::Delegated("backup".to_string()))
    );

    let data = outcome.data.unwrap();
    assert_eq!(data.liquid_assets[0].value, 1500.0);
    assert_eq!(data.holdings_foreign[0].symbol, "AAPL");
    assert_eq!(data.cash_balance, 2000.0);

    let summary = outcome.summary.unwrap();
    assert_eq!(summary.grand_total, 1500.0 + 5.0 * 180.0 + 2000.0);
}

#[tokio::test]
async fn test_delegated_payload_is_still_validated() {
    // Provider returns junk holdings; the normalizer must drop them.
    let response = r#"{
        "holdings_domestic": [
            {"symbol": "1155", "quantity": 100, "average_cost": 9.2},
            {"symbol": "not-a-symbol", "quantity": 5, "average_cost": 1.0},
            {"symbol": "AAPL", "quantity": -5, "average_cost": 180.0}
        ],
        "cash_balance": -999
    }"#;

    let parser = StatementParser::with_providers(vec![FixedProvider::boxed("only", response)]);
    let document =
        StatementDocument::new(b"=== Sheet: Misc ===\nrows\n".to_vec(), DocumentKind::Spreadsheet);

    let outcome = parser.parse(&document).await;
    assert!(outcome.success);
    let data = outcome.data.unwrap();
    assert_eq!(data.holdings_domestic.len(), 1);
    assert!(data.holdings_foreign.is_empty());
    assert_eq!(data.cash_balance, 0.0);
}

#[tokio::test]
async fn test_heuristic_fallback_finds_balance_and_holdings() {
    let parser = StatementParser::with_providers(vec![Box::new(OfflineProvider)]);
    let text = "\
=== Sheet: Statement ===
1155,MAYBANK,100,9.20
TSLA,Tesla Inc,10,250.5
Balance,\"RM 5,000.00\"
";
    let document = StatementDocument::new(text.as_bytes().to_vec(), DocumentKind::Spreadsheet);

    let outcome = parser.parse(&document).await;
    assert!(outcome.success);
    assert_eq!(outcome.extraction_method, Some(ExtractionMethod::Heuristic));

    let data = outcome.data.unwrap();
    assert_eq!(data.holdings_domestic.len(), 1);
    assert_eq!(data.holdings_foreign.len(), 1);
    assert_eq!(data.cash_balance, 5000.0);
}

#[tokio::test]
async fn test_heuristic_with_nothing_to_find_is_empty_success() {
    let parser = StatementParser::with_providers(vec![]);
    let document = StatementDocument::new(
        b"=== Sheet: Notes ===\nquarterly,commentary,only\n".to_vec(),
        DocumentKind::Spreadsheet,
    );

    let outcome = parser.parse(&document).await;
    assert!(outcome.success);
    assert_eq!(outcome.extraction_method, Some(ExtractionMethod::Heuristic));
    assert!(outcome.data.unwrap().is_empty());
    assert_eq!(outcome.summary.unwrap().grand_total, 0.0);
}

#[tokio::test]
async fn test_image_requires_a_working_provider() {
    let parser = StatementParser::with_providers(vec![Box::new(OfflineProvider)]);
    let jpeg_bytes = vec![0xFF, 0xD8, 0xFF, 0xE0, 0x00, 0x10];
    let document = StatementDocument::new(jpeg_bytes, DocumentKind::Image);

    let outcome = parser.parse(&document).await;
    assert!(!outcome.success);
    assert!(outcome.data.is_none());
    assert!(outcome.error.is_some());
}

#[tokio::test]
async fn test_image_delegation_succeeds_with_vision_provider() {
    let parser = StatementParser::with_providers(vec![FixedProvider::boxed(
        "vision",
        r#"{"cash_balance": 777.0}"#,
    )]);
    let png_bytes = b"\x89PNG\r\n\x1a\nfakepixels".to_vec();
    let document = StatementDocument::new(png_bytes, DocumentKind::Image);

    let outcome = parser.parse(&document).await;
    assert!(outcome.success);
    assert_eq!(
        outcome.extraction_method,
        Some(ExtractionMethod::Delegated("vision".to_string()))
    );
    assert_eq!(outcome.data.unwrap().cash_balance, 777.0);
}

#[tokio::test]
async fn test_outcome_serialization_contract() {
    let parser = StatementParser::with_providers(vec![]);
    let document = StatementDocument::new(
        PORTFOLIO_WORKBOOK.as_bytes().to_vec(),
        DocumentKind::Spreadsheet,
    );

    let outcome = parser.parse(&document).await;
    let json = serde_json::to_value(&outcome).unwrap();
    assert_eq!(json["success"], true);
    assert_eq!(json["extraction_method"]["method"], "tabular");
    assert!(json.get("error").is_none());
    assert!(json["timestamp"].is_string());

    let failure = ParseOutcome::failure("boom");
    let json = serde_json::to_value(&failure).unwrap();
    assert_eq!(json["success"], false);
    assert_eq!(json["error"], "boom");
    assert!(json.get("data").is_none());
    assert!(json.get("summary").is_none());
}

#[tokio::test]
async fn test_summary_recomputed_not_trusted_from_payload() {
    // The payload carries bogus precomputed totals; summarize must win.
    let response = r#"{
        "holdings_foreign": [{"symbol": "VOO", "quantity": 2, "average_cost": 400.0}],
        "grand_total": 9999999.0,
        "total_holdings_value": 12345.0
    }"#;

    let parser = StatementParser::with_providers(vec![FixedProvider::boxed("only", response)]);
    let document =
        StatementDocument::new(b"=== Sheet: Misc ===\nrows\n".to_vec(), DocumentKind::Spreadsheet);

    let outcome = parser.parse(&document).await;
    let summary = outcome.summary.unwrap();
    assert_eq!(summary.total_holdings_value, 800.0);
    assert_eq!(summary.grand_total, 800.0);
}

#[tokio::test]
async fn test_advice_degrades_to_fallback_without_providers() {
    let generator = AdviceGenerator::with_providers(vec![Box::new(OfflineProvider)]);
    let snapshot = AssetSnapshot::default();
    let summary = summarize(&snapshot);

    let advice = generator.generate(&snapshot, &summary).await;
    assert!(!advice.is_empty());
    assert!(advice.contains("unavailable"));
}

#[tokio::test]
async fn test_file_level_entrypoint_routes_by_extension() {
    let parser = StatementParser::with_providers(vec![]);

    let outcome = parse_statement_file(
        &parser,
        "portfolio.csv",
        PORTFOLIO_WORKBOOK.as_bytes().to_vec(),
    )
    .await;
    assert!(outcome.success);

    let outcome = parse_statement_file(&parser, "statement.exe", b"bytes".to_vec()).await;
    assert!(!outcome.success);
}

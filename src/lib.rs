//! # Asset Statement Parser
//!
//! A library for turning personal asset statements (spreadsheets, PDFs,
//! statement photos) into a structured, validated asset snapshot with
//! derived portfolio totals.
//!
//! ## Extraction strategies
//!
//! - **Tabular**: deterministic column-mapping over workbook sheets; free
//!   when the statement has a recognizable layout
//! - **Delegated**: an ordered chain of LLM providers (Anthropic, Groq,
//!   OpenAI) extracts JSON from text, PDFs or images; the first provider
//!   that returns a parsable payload wins
//! - **Heuristic**: fixed regex rules as the last resort when no provider
//!   is available or all of them fail
//!
//! Every strategy feeds the same normalizer, so downstream consumers see one
//! snapshot shape regardless of how the data was obtained, and the outcome
//! records which strategy produced it.
//!
//! ## Example
//!
//! ```rust,ignore
//! use asset_statement_parser::*;
//!
//! #[tokio::main]
//! async fn main() {
//!     let credentials = ProviderCredentials::from_env();
//!     let parser = StatementParser::new(&credentials);
//!
//!     let bytes = std::fs::read("statement.pdf").unwrap();
//!     let document = StatementDocument::new(bytes, DocumentKind::Pdf)
//!         .with_filename("statement.pdf");
//!
//!     let outcome = parser.parse(&document).await;
//!     if outcome.success {
//!         let summary = outcome.summary.unwrap();
//!         println!("grand total: {:.2}", summary.grand_total);
//!     }
//! }
//! ```

pub mod advice;
pub mod config;
pub mod error;
pub mod heuristic;
pub mod llm;
pub mod normalize;
pub mod pdf;
pub mod pipeline;
pub mod quotes;
pub mod schema;
pub mod tabular;
pub mod valuation;

pub use advice::AdviceGenerator;
pub use config::ProviderCredentials;
pub use error::{Result, StatementError};
pub use llm::{build_provider_chain, InferenceProvider, InferenceRequest, RequestContent};
pub use pipeline::{DocumentKind, StatementDocument, StatementParser};
pub use quotes::{fill_current_prices, ForexRate, QuoteClient, StockQuote};
pub use schema::{
    AssetCategory, AssetEntry, AssetSnapshot, ExtractionMethod, Holding, Market, MetalLot,
    ParseOutcome, PortfolioSummary,
};
pub use valuation::summarize;

/// Parses raw bytes with the document kind inferred from the filename
/// extension. Unknown extensions fail the parse without touching providers.
pub async fn parse_statement_file(
    parser: &StatementParser,
    filename: &str,
    content: Vec<u8>,
) -> ParseOutcome {
    match DocumentKind::from_extension(filename) {
        Some(kind) => {
            let document = StatementDocument::new(content, kind).with_filename(filename);
            parser.parse(&document).await
        }
        None => ParseOutcome::failure(
            StatementError::UnsupportedFormat(filename.to_string()).to_string(),
        ),
    }
}

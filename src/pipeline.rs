//! The statement parsing pipeline: document dispatch, the extraction
//! fallback chain, and the structured outcome boundary.
//!
//! One call to [`StatementParser::parse`] owns all of its intermediate
//! buffers; nothing is shared between invocations, so concurrent parses of
//! different documents need no coordination. Providers are tried strictly
//! one at a time to bound cost.

use log::{debug, info};
use serde_json::Value;

use crate::config::ProviderCredentials;
use crate::llm::extractor::DelegatedExtractor;
use crate::llm::prompts;
use crate::llm::{build_provider_chain, sniff_media_type, InferenceProvider, InferenceRequest};
use crate::schema::{ExtractionMethod, ParseOutcome};
use crate::{heuristic, normalize, pdf, tabular, valuation};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentKind {
    Spreadsheet,
    Pdf,
    Image,
}

impl DocumentKind {
    /// Extension-based inference for the boundary layer; the core only acts
    /// on the declared kind.
    pub fn from_extension(filename: &str) -> Option<DocumentKind> {
        let ext = filename.rsplit('.').next()?.to_lowercase();
        match ext.as_str() {
            "xlsx" | "xls" | "csv" => Some(DocumentKind::Spreadsheet),
            "pdf" => Some(DocumentKind::Pdf),
            "jpg" | "jpeg" | "png" | "webp" => Some(DocumentKind::Image),
            _ => None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct StatementDocument {
    pub content: Vec<u8>,
    pub kind: DocumentKind,
    pub filename: Option<String>,
}

impl StatementDocument {
    pub fn new(content: Vec<u8>, kind: DocumentKind) -> Self {
        Self {
            content,
            kind,
            filename: None,
        }
    }

    pub fn with_filename(mut self, filename: impl Into<String>) -> Self {
        self.filename = Some(filename.into());
        self
    }
}

pub struct StatementParser {
    extractor: DelegatedExtractor,
}

impl StatementParser {
    pub fn new(credentials: &ProviderCredentials) -> Self {
        Self {
            extractor: DelegatedExtractor::new(build_provider_chain(credentials)),
        }
    }

    /// Constructs the pipeline over an explicit provider chain; used by
    /// callers that bring their own providers and by tests.
    pub fn with_providers(providers: Vec<Box<dyn InferenceProvider>>) -> Self {
        Self {
            extractor: DelegatedExtractor::new(providers),
        }
    }

    /// Parses one document into a structured outcome. Never panics and never
    /// returns an error to the caller: every failure path terminates in
    /// `{success: false, error}`.
    pub async fn parse(&self, document: &StatementDocument) -> ParseOutcome {
        info!(
            "parsing statement ({:?}, {} bytes, file {:?})",
            document.kind,
            document.content.len(),
            document.filename
        );

        if document.content.is_empty() {
            return ParseOutcome::failure("document is empty");
        }

        match document.kind {
            DocumentKind::Spreadsheet => self.parse_spreadsheet(document).await,
            DocumentKind::Pdf => self.parse_pdf(document).await,
            DocumentKind::Image => self.parse_image(document).await,
        }
    }

    async fn parse_spreadsheet(&self, document: &StatementDocument) -> ParseOutcome {
        let sheets = match tabular::parse_workbook(&document.content) {
            Ok(sheets) => sheets,
            Err(e) => return ParseOutcome::failure(format!("workbook parse failed: {}", e)),
        };

        if let Some(payload) = tabular::extract_payload(&sheets) {
            let snapshot = normalize::normalize(&payload);
            if !snapshot.is_empty() {
                return finish(payload_outcome(&payload), ExtractionMethod::Tabular);
            }
            debug!("tabular extraction yielded an empty snapshot, trying delegation");
        }

        let text = tabular::render_text(&sheets);
        let fallback = heuristic::extract_from_text(&text);
        self.delegate_text(&text, fallback).await
    }

    async fn parse_pdf(&self, document: &StatementDocument) -> ParseOutcome {
        let text = pdf::extract_text(&document.content);

        if text.is_empty() {
            // No extractable text: scanned document. Delegate the raw bytes
            // to a vision-capable provider; with no text there is nothing
            // for the heuristic matcher to fall back on.
            debug!("pdf has no extractable text, delegating raw bytes");
            return self.delegate_binary(&document.content).await;
        }

        let fallback = page_heuristic_payload(&text);
        self.delegate_text(&text, fallback).await
    }

    async fn parse_image(&self, document: &StatementDocument) -> ParseOutcome {
        self.delegate_binary(&document.content).await
    }

    /// Text path: delegated chain first, the precomputed heuristic payload as
    /// the informed last resort. A heuristic fallback with zero candidates is
    /// still a success with an empty-but-valid snapshot.
    async fn delegate_text(&self, text: &str, heuristic_payload: Value) -> ParseOutcome {
        let request = InferenceRequest::text(prompts::extraction_instructions_with_schema(), text);

        match self.extractor.extract(&request).await {
            Ok(payload) => finish(
                payload_outcome(&payload.value),
                ExtractionMethod::Delegated(payload.provider),
            ),
            Err(e) => {
                debug!("delegated extraction unavailable ({}), using heuristic rules", e);
                finish(payload_outcome(&heuristic_payload), ExtractionMethod::Heuristic)
            }
        }
    }

    async fn delegate_binary(&self, bytes: &[u8]) -> ParseOutcome {
        let media_type = sniff_media_type(bytes);
        if media_type == "application/octet-stream" {
            return ParseOutcome::failure("unrecognized document content");
        }

        let request = InferenceRequest::binary(
            prompts::extraction_instructions_with_schema(),
            bytes.to_vec(),
            media_type,
        );

        match self.extractor.extract(&request).await {
            Ok(payload) => finish(
                payload_outcome(&payload.value),
                ExtractionMethod::Delegated(payload.provider),
            ),
            Err(e) => ParseOutcome::failure(format!("extraction failed: {}", e)),
        }
    }
}

/// Heuristic payload for page-oriented text. When tabular regions are
/// detected, holdings are matched against those rows only, so prose mentions
/// of tickers ("TSLA rose 12 percent over 2024") do not qualify; the cash
/// balance is always matched against the full text since balance lines
/// usually sit outside tables.
fn page_heuristic_payload(text: &str) -> Value {
    let tables = pdf::detect_tables(text);
    if tables.is_empty() {
        return heuristic::extract_from_text(text);
    }
    let rows: Vec<String> = tables
        .iter()
        .flat_map(|table| table.rows.iter())
        .map(|cells| cells.join(" "))
        .collect();
    heuristic::extract_from_lines(&rows, text)
}

fn payload_outcome(payload: &Value) -> (crate::schema::AssetSnapshot, crate::schema::PortfolioSummary) {
    let snapshot = normalize::normalize(payload);
    let summary = valuation::summarize(&snapshot);
    (snapshot, summary)
}

fn finish(
    (snapshot, summary): (crate::schema::AssetSnapshot, crate::schema::PortfolioSummary),
    method: ExtractionMethod,
) -> ParseOutcome {
    ParseOutcome::success(snapshot, summary, method)
}

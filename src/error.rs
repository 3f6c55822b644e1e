use thiserror::Error;

#[derive(Error, Debug)]
pub enum StatementError {
    #[error("Unsupported document format: {0}")]
    UnsupportedFormat(String),

    #[error("Document is empty or unreadable")]
    EmptyDocument,

    #[error("Malformed workbook: {0}")]
    MalformedWorkbook(String),

    #[error("Provider '{provider}' failed: {details}")]
    ProviderFailed { provider: String, details: String },

    #[error("All extraction providers exhausted without a valid response")]
    ExtractionExhausted,

    #[error("Quote lookup failed for {symbol}: {details}")]
    QuoteFailed { symbol: String, details: String },

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("HTTP error: {0}")]
    HttpError(#[from] reqwest::Error),
}

pub type Result<T> = std::result::Result<T, StatementError>;

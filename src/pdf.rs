//! Linear text and table extraction from page-oriented documents.

use log::debug;

/// Minimum extracted length before the text is considered usable. Scanned
/// PDFs typically produce nothing or a few stray glyphs; below this threshold
/// the caller should fall back to image-based delegated extraction.
const MIN_TEXT_LENGTH: usize = 10;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Table {
    /// Rows of cells; the first row is possibly a header.
    pub rows: Vec<Vec<String>>,
}

/// Pulls concatenated per-page text out of PDF bytes. Unreadable or purely
/// scanned content yields an empty string, NOT an error — that is the
/// caller's signal to delegate the raw bytes to a vision-capable provider.
pub fn extract_text(bytes: &[u8]) -> String {
    match pdf_extract::extract_text_from_mem(bytes) {
        Ok(text) if text.trim().len() >= MIN_TEXT_LENGTH => text,
        Ok(_) => {
            debug!("pdf produced below-threshold text, treating as scanned");
            String::new()
        }
        Err(e) => {
            debug!("pdf text extraction failed, treating as scanned: {}", e);
            String::new()
        }
    }
}

/// Detects tabular regions in linear text: consecutive lines that split into
/// two or more columns (runs of two or more spaces, or tabs) are grouped into
/// one table, in document order.
pub fn detect_tables(text: &str) -> Vec<Table> {
    let mut tables = Vec::new();
    let mut current: Vec<Vec<String>> = Vec::new();

    for line in text.lines() {
        let cells = split_columns(line);
        if cells.len() >= 2 {
            current.push(cells);
        } else if !current.is_empty() {
            // A table needs more than a single aligned line.
            if current.len() >= 2 {
                tables.push(Table {
                    rows: std::mem::take(&mut current),
                });
            } else {
                current.clear();
            }
        }
    }
    if current.len() >= 2 {
        tables.push(Table { rows: current });
    }

    tables
}

fn split_columns(line: &str) -> Vec<String> {
    let mut cells = Vec::new();
    for part in line.split('\t') {
        for cell in part.split("  ") {
            let cell = cell.trim();
            if !cell.is_empty() {
                cells.push(cell.to_string());
            }
        }
    }
    cells
}

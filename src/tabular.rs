//! Spreadsheet/CSV extraction with known or heuristically-detected layouts.
//!
//! A workbook is one or more named sheets. Multi-sheet documents use
//! `=== Sheet: <name> ===` separator lines (the flattened rendering exported
//! from spreadsheet software); a bare CSV document is a single unnamed sheet.

use serde_json::{json, Value};

use crate::error::{Result, StatementError};

/// Keyword candidates per field, matched case-insensitively against header
/// cells in the declared language set.
const SYMBOL_KEYWORDS: &[&str] = &["symbol", "ticker", "code", "代码", "股票"];
const NAME_KEYWORDS: &[&str] = &["name", "company", "名称", "公司"];
const QUANTITY_KEYWORDS: &[&str] = &["quantity", "shares", "qty", "数量", "持股"];
const COST_KEYWORDS: &[&str] = &["cost", "price", "avg", "成本", "价格"];
const VALUE_KEYWORDS: &[&str] = &["value", "amount", "市值", "金额", "总值"];
const WEIGHT_KEYWORDS: &[&str] = &["weight", "gram", "重量", "克数"];

/// Rows whose leading cell matches one of these are subtotal lines, not data.
const TOTAL_SENTINELS: &[&str] = &["total", "subtotal", "总计", "合计", "小计"];

#[derive(Debug, Clone)]
pub struct Sheet {
    pub name: String,
    pub rows: Vec<Vec<String>>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SheetCategory {
    LiquidAssets,
    IlliquidAssets,
    Holdings,
    MetalLots,
}

/// Splits workbook bytes into sheets and parses each body as CSV.
pub fn parse_workbook(bytes: &[u8]) -> Result<Vec<Sheet>> {
    if bytes.is_empty() {
        return Err(StatementError::EmptyDocument);
    }
    let text = String::from_utf8_lossy(bytes);

    let mut sheets = Vec::new();
    let mut current_name = String::new();
    let mut current_body = String::new();

    for line in text.lines() {
        if let Some(name) = sheet_marker(line) {
            if !current_body.trim().is_empty() {
                sheets.push(parse_sheet(&current_name, &current_body)?);
            }
            current_name = name.to_string();
            current_body.clear();
        } else {
            current_body.push_str(line);
            current_body.push('\n');
        }
    }
    if !current_body.trim().is_empty() {
        sheets.push(parse_sheet(&current_name, &current_body)?);
    }

    if sheets.is_empty() {
        return Err(StatementError::EmptyDocument);
    }
    Ok(sheets)
}

fn sheet_marker(line: &str) -> Option<&str> {
    let trimmed = line.trim();
    trimmed
        .strip_prefix("=== Sheet:")
        .and_then(|rest| rest.strip_suffix("==="))
        .map(str::trim)
}

fn parse_sheet(name: &str, body: &str) -> Result<Sheet> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_reader(body.as_bytes());

    let mut rows = Vec::new();
    for record in reader.records() {
        let record = record.map_err(|e| StatementError::MalformedWorkbook(e.to_string()))?;
        rows.push(record.iter().map(|c| c.trim().to_string()).collect());
    }

    Ok(Sheet {
        name: name.to_string(),
        rows,
    })
}

/// Category detection by sheet-name keywords. Illiquid keywords are checked
/// before the generic asset keywords because "illiquid assets" contains both.
pub fn detect_category(sheet_name: &str) -> Option<SheetCategory> {
    let name = sheet_name.to_lowercase();
    let has = |keywords: &[&str]| keywords.iter().any(|k| name.contains(k));

    if has(&["illiquid", "epf", "kwsp", "retirement", "公积金", "退休"]) {
        Some(SheetCategory::IlliquidAssets)
    } else if has(&["stock", "holding", "equity", "股票", "持仓"]) {
        Some(SheetCategory::Holdings)
    } else if has(&["gold", "metal", "黄金", "金条"]) {
        Some(SheetCategory::MetalLots)
    } else if has(&["asset", "资产"]) {
        Some(SheetCategory::LiquidAssets)
    } else {
        None
    }
}

/// Extracts a raw payload from categorized sheets. Returns `None` when no
/// sheet categorizes at all, which is the caller's signal to fall back to
/// text-based extraction.
pub fn extract_payload(sheets: &[Sheet]) -> Option<Value> {
    let mut liquid = Vec::new();
    let mut illiquid = Vec::new();
    let mut holdings = Vec::new();
    let mut metals = Vec::new();
    let mut categorized = false;

    for sheet in sheets {
        let Some(category) = detect_category(&sheet.name) else {
            continue;
        };
        categorized = true;
        match category {
            SheetCategory::LiquidAssets => liquid.extend(extract_asset_rows(sheet)),
            SheetCategory::IlliquidAssets => illiquid.extend(extract_asset_rows(sheet)),
            SheetCategory::Holdings => holdings.extend(extract_holding_rows(sheet)),
            SheetCategory::MetalLots => metals.extend(extract_metal_rows(sheet)),
        }
    }

    if !categorized {
        return None;
    }

    // Markets are re-derived from symbol shape during normalization, so all
    // holdings go through one array here.
    Some(json!({
        "liquid_assets": liquid,
        "illiquid_assets": illiquid,
        "holdings_domestic": holdings,
        "metal_lots": metals,
        "cash_balance": 0.0,
    }))
}

/// Renders sheets back to linear text for delegated extraction, mirroring the
/// workbook marker convention.
pub fn render_text(sheets: &[Sheet]) -> String {
    let mut out = String::new();
    for sheet in sheets {
        if !sheet.name.is_empty() {
            out.push_str(&format!("=== Sheet: {} ===\n", sheet.name));
        }
        for row in &sheet.rows {
            out.push_str(&row.join(" "));
            out.push('\n');
        }
        out.push('\n');
    }
    out
}

struct ColumnMap {
    header_row: Option<usize>,
    columns: Vec<(usize, &'static str)>,
}

impl ColumnMap {
    fn get(&self, field: &str, row: &[String]) -> Option<String> {
        self.columns
            .iter()
            .find(|(_, f)| *f == field)
            .and_then(|(idx, _)| row.get(*idx))
            .map(|c| c.to_string())
    }
}

/// Scans the first rows for header-like cells; the first row where at least
/// two cells match a keyword list becomes the header.
fn detect_columns(rows: &[Vec<String>], fields: &[(&'static str, &[&str])]) -> ColumnMap {
    for (row_idx, row) in rows.iter().take(5).enumerate() {
        let mut columns = Vec::new();
        for (field, keywords) in fields {
            let found = row.iter().position(|cell| {
                let cell = cell.to_lowercase();
                keywords.iter().any(|k| cell.contains(k))
            });
            if let Some(col_idx) = found {
                columns.push((col_idx, *field));
            }
        }
        if columns.len() >= 2 {
            return ColumnMap {
                header_row: Some(row_idx),
                columns,
            };
        }
    }
    ColumnMap {
        header_row: None,
        columns: Vec::new(),
    }
}

fn data_rows<'a>(rows: &'a [Vec<String>], map: &ColumnMap) -> impl Iterator<Item = &'a Vec<String>> {
    let skip = map.header_row.map(|idx| idx + 1).unwrap_or(0);
    rows.iter().skip(skip).filter(|row| {
        let lead = row.first().map(String::as_str).unwrap_or("");
        if lead.is_empty() {
            return false;
        }
        let lead = lead.to_lowercase();
        !TOTAL_SENTINELS.iter().any(|s| lead.starts_with(s))
    })
}

fn extract_asset_rows(sheet: &Sheet) -> Vec<Value> {
    let map = detect_columns(
        &sheet.rows,
        &[("name", NAME_KEYWORDS), ("value", VALUE_KEYWORDS)],
    );

    data_rows(&sheet.rows, &map)
        .filter_map(|row| {
            // Legacy fixed-offset layout: first column name, second value.
            let name = map.get("name", row).or_else(|| row.first().cloned())?;
            let value = map.get("value", row).or_else(|| row.get(1).cloned());
            Some(json!({
                "name": name,
                "value": parse_cell(value.as_deref()),
            }))
        })
        .collect()
}

fn extract_holding_rows(sheet: &Sheet) -> Vec<Value> {
    let map = detect_columns(
        &sheet.rows,
        &[
            ("symbol", SYMBOL_KEYWORDS),
            ("name", NAME_KEYWORDS),
            ("quantity", QUANTITY_KEYWORDS),
            ("cost", COST_KEYWORDS),
        ],
    );

    data_rows(&sheet.rows, &map)
        .filter_map(|row| {
            let symbol = map.get("symbol", row).or_else(|| row.first().cloned())?;
            let quantity = map.get("quantity", row).or_else(|| row.get(1).cloned());
            let cost = map.get("cost", row).or_else(|| row.get(2).cloned());
            Some(json!({
                "symbol": symbol,
                "name": map.get("name", row).unwrap_or_else(|| symbol.clone()),
                "quantity": parse_cell(quantity.as_deref()),
                "average_cost": parse_cell(cost.as_deref()),
            }))
        })
        .collect()
}

fn extract_metal_rows(sheet: &Sheet) -> Vec<Value> {
    let map = detect_columns(
        &sheet.rows,
        &[
            ("name", NAME_KEYWORDS),
            ("weight", WEIGHT_KEYWORDS),
            ("cost", COST_KEYWORDS),
        ],
    );

    data_rows(&sheet.rows, &map)
        .filter_map(|row| {
            let name = map.get("name", row).or_else(|| row.first().cloned())?;
            let weight = map.get("weight", row).or_else(|| row.get(1).cloned());
            let cost = map.get("cost", row).or_else(|| row.get(2).cloned());
            Some(json!({
                "name": name,
                "weight_grams": parse_cell(weight.as_deref()),
                "unit_cost": parse_cell(cost.as_deref()),
            }))
        })
        .collect()
}

/// Numeric cells that fail to coerce are treated as zero, never fatal.
fn parse_cell(cell: Option<&str>) -> f64 {
    cell.map(|c| c.replace([',', '$'], "").replace("RM", ""))
        .and_then(|c| c.trim().parse::<f64>().ok())
        .unwrap_or(0.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    const WORKBOOK: &str = "\
=== Sheet: Stocks ===
Symbol,Company Name,Quantity,Avg Cost
1155,MAYBANK,100,9.20
TSLA,Tesla Inc,10,250.5
Total,,110,
=== Sheet: Assets ===
Fixed Deposit,20000
Unit Trust,5000
=== Sheet: Gold ===
Type,Weight (g),Price
916 gold,10,350
";

    #[test]
    fn test_workbook_splits_into_named_sheets() {
        let sheets = parse_workbook(WORKBOOK.as_bytes()).unwrap();
        assert_eq!(sheets.len(), 3);
        assert_eq!(sheets[0].name, "Stocks");
        assert_eq!(sheets[2].name, "Gold");
    }

    #[test]
    fn test_bare_csv_is_single_unnamed_sheet() {
        let sheets = parse_workbook(b"a,b\nc,d\n").unwrap();
        assert_eq!(sheets.len(), 1);
        assert_eq!(sheets[0].name, "");
        assert_eq!(sheets[0].rows.len(), 2);
    }

    #[test]
    fn test_empty_workbook_is_an_input_error() {
        assert!(matches!(
            parse_workbook(b""),
            Err(StatementError::EmptyDocument)
        ));
    }

    #[test]
    fn test_category_detection() {
        assert_eq!(detect_category("My Stocks"), Some(SheetCategory::Holdings));
        assert_eq!(detect_category("资产"), Some(SheetCategory::LiquidAssets));
        assert_eq!(
            detect_category("EPF Statement"),
            Some(SheetCategory::IlliquidAssets)
        );
        assert_eq!(detect_category("Gold"), Some(SheetCategory::MetalLots));
        assert_eq!(detect_category("Notes"), None);
    }

    #[test]
    fn test_illiquid_wins_over_generic_asset_keyword() {
        assert_eq!(
            detect_category("Illiquid Assets"),
            Some(SheetCategory::IlliquidAssets)
        );
    }

    #[test]
    fn test_header_detection_and_row_extraction() {
        let sheets = parse_workbook(WORKBOOK.as_bytes()).unwrap();
        let payload = extract_payload(&sheets).unwrap();

        let holdings = payload["holdings_domestic"].as_array().unwrap();
        assert_eq!(holdings.len(), 2);
        assert_eq!(holdings[0]["symbol"], "1155");
        assert_eq!(holdings[0]["quantity"], 100.0);
        assert_eq!(holdings[1]["average_cost"], 250.5);

        let metals = payload["metal_lots"].as_array().unwrap();
        assert_eq!(metals[0]["weight_grams"], 10.0);
    }

    #[test]
    fn test_total_rows_and_empty_leads_skipped() {
        let sheets = parse_workbook(WORKBOOK.as_bytes()).unwrap();
        let payload = extract_payload(&sheets).unwrap();
        let holdings = payload["holdings_domestic"].as_array().unwrap();
        assert!(holdings.iter().all(|h| h["symbol"] != "Total"));
    }

    #[test]
    fn test_legacy_fixed_offset_layout() {
        // No header row: first column is the name, second the value.
        let sheets = parse_workbook(WORKBOOK.as_bytes()).unwrap();
        let payload = extract_payload(&sheets).unwrap();
        let liquid = payload["liquid_assets"].as_array().unwrap();
        assert_eq!(liquid.len(), 2);
        assert_eq!(liquid[0]["name"], "Fixed Deposit");
        assert_eq!(liquid[0]["value"], 20000.0);
    }

    #[test]
    fn test_uncategorized_workbook_yields_none() {
        let sheets = parse_workbook(b"=== Sheet: Notes ===\nhello,world\n").unwrap();
        assert!(extract_payload(&sheets).is_none());
    }

    #[test]
    fn test_bad_numeric_cell_is_zero_not_fatal() {
        let book = "=== Sheet: Stocks ===\nSymbol,Quantity,Cost\n1155,abc,9.20\n";
        let sheets = parse_workbook(book.as_bytes()).unwrap();
        let payload = extract_payload(&sheets).unwrap();
        let holdings = payload["holdings_domestic"].as_array().unwrap();
        assert_eq!(holdings[0]["quantity"], 0.0);
    }

    #[test]
    fn test_render_text_round_trips_markers() {
        let sheets = parse_workbook(WORKBOOK.as_bytes()).unwrap();
        let text = render_text(&sheets);
        assert!(text.contains("=== Sheet: Stocks ==="));
        assert!(text.contains("MAYBANK"));
    }
}

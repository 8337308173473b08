//! CSV extractor: renders each row as `header: value` lines.
//!
//! Parsing is delegated to the `csv` crate with flexible row lengths.

use std::path::Path;

use async_trait::async_trait;
use oraculo_core::extractor::FileExtractor;

use crate::text::read_lossy;

/// Turns a CSV table into one text block per row, blocks separated by a
/// blank line, so the model sees every value next to its column name.
pub struct CsvExtractor;

#[async_trait]
impl FileExtractor for CsvExtractor {
    fn name(&self) -> &str {
        "csv"
    }

    async fn extract_from_file(&self, path: &Path) -> Result<String, String> {
        let raw = read_lossy(path).await?;
        render_rows(&raw)
    }
}

fn render_rows(raw: &str) -> Result<String, String> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_reader(raw.as_bytes());
    let mut records = reader.records();

    let header = match records.next() {
        Some(record) => record.map_err(|e| format!("invalid CSV header: {e}"))?,
        None => return Ok(String::new()),
    };

    let mut blocks = Vec::new();
    for record in records {
        let row = record.map_err(|e| format!("invalid CSV row: {e}"))?;
        if row.iter().all(|field| field.trim().is_empty()) {
            continue;
        }

        let block = row
            .iter()
            .enumerate()
            .map(|(i, value)| {
                let column = header
                    .get(i)
                    .map(|h| h.trim().to_string())
                    .unwrap_or_else(|| format!("column_{}", i + 1));
                format!("{column}: {}", value.trim())
            })
            .collect::<Vec<_>>()
            .join("\n");
        blocks.push(block);
    }

    Ok(blocks.join("\n\n"))
}

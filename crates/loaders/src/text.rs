//! Plain-text extractor.

use std::path::Path;

use async_trait::async_trait;
use oraculo_core::extractor::FileExtractor;

/// Reads a file as UTF-8, replacing invalid sequences.
pub struct PlainTextExtractor;

/// Read a file as lossy UTF-8 without a leading byte-order mark.
pub(crate) async fn read_lossy(path: &Path) -> Result<String, String> {
    let bytes = tokio::fs::read(path)
        .await
        .map_err(|e| format!("Failed to read file: {e}"))?;
    let text = String::from_utf8_lossy(&bytes);
    Ok(text.trim_start_matches('\u{feff}').to_string())
}

#[async_trait]
impl FileExtractor for PlainTextExtractor {
    fn name(&self) -> &str {
        "text"
    }

    async fn extract_from_file(&self, path: &Path) -> Result<String, String> {
        read_lossy(path).await
    }
}

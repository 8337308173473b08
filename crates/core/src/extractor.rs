//! Extractor traits: the content-extraction collaborators.
//!
//! Extractors turn a source into plain text. URL-addressed sources (web pages,
//! videos) are fetched directly; uploaded files are handed over as a path on
//! disk because the underlying parsers need random access.
//!
//! Extractors report faults as plain strings; the loader dispatcher wraps them
//! into typed [`LoaderError`](crate::error::LoaderError)s with the source kind.

use std::path::Path;

use async_trait::async_trait;

/// Extracts text from a URL (web page fetch, video transcript, ...).
#[async_trait]
pub trait UrlExtractor: Send + Sync {
    /// A short name for logs (e.g., "web_page", "youtube_transcript").
    fn name(&self) -> &str;

    async fn extract_from_url(&self, url: &str) -> Result<String, String>;
}

/// Extracts text from a file on disk (PDF, CSV, plain text, ...).
#[async_trait]
pub trait FileExtractor: Send + Sync {
    /// A short name for logs (e.g., "pdf", "csv").
    fn name(&self) -> &str;

    async fn extract_from_file(&self, path: &Path) -> Result<String, String>;
}

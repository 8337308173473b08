//! Content loader dispatcher: routes a tagged source to its extractor.
//!
//! URL sources go straight to a [`UrlExtractor`]. Uploaded files arrive as a
//! one-shot byte stream, so they are first written to a scoped temporary file
//! (file parsers need random access) which is removed when the load finishes,
//! whether extraction succeeded or not.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use oraculo_core::error::LoaderError;
use oraculo_core::extractor::{FileExtractor, UrlExtractor};
use oraculo_core::source::{ExtractedDocument, SourceKind, SourcePayload, SourceSpec};
use tokio::io::{AsyncRead, AsyncWriteExt};
use tracing::{debug, info, warn};

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Dispatches sources to extractors and normalizes their failures.
pub struct ContentLoader {
    site: Arc<dyn UrlExtractor>,
    video: Arc<dyn UrlExtractor>,
    pdf: Arc<dyn FileExtractor>,
    csv: Arc<dyn FileExtractor>,
    text: Arc<dyn FileExtractor>,
    timeout: Duration,
}

impl ContentLoader {
    pub fn new(
        site: Arc<dyn UrlExtractor>,
        video: Arc<dyn UrlExtractor>,
        pdf: Arc<dyn FileExtractor>,
        csv: Arc<dyn FileExtractor>,
        text: Arc<dyn FileExtractor>,
    ) -> Self {
        Self {
            site,
            video,
            pdf,
            csv,
            text,
            timeout: DEFAULT_TIMEOUT,
        }
    }

    /// Set the time limit for a single extraction.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Load a source into an [`ExtractedDocument`].
    ///
    /// Bot-challenge pages are returned as ordinary documents; only empty
    /// output is treated as a failure.
    pub async fn load(&self, spec: SourceSpec) -> Result<ExtractedDocument, LoaderError> {
        let SourceSpec { kind, payload } = spec;
        debug!(kind = %kind, payload = ?payload, "Loading source");

        let text = match (kind, payload) {
            (SourceKind::Site, SourcePayload::Url(url)) => {
                self.extract_url(kind, self.site.as_ref(), &url).await?
            }
            (SourceKind::Video, SourcePayload::Url(url)) => {
                self.extract_url(kind, self.video.as_ref(), &url).await?
            }
            (SourceKind::Pdf, SourcePayload::Stream(reader)) => {
                self.extract_file(kind, self.pdf.as_ref(), reader).await?
            }
            (SourceKind::Csv, SourcePayload::Stream(reader)) => {
                self.extract_file(kind, self.csv.as_ref(), reader).await?
            }
            (SourceKind::Text, SourcePayload::Stream(reader)) => {
                self.extract_file(kind, self.text.as_ref(), reader).await?
            }
            (kind, _) => return Err(LoaderError::PayloadMismatch { kind }),
        };

        if text.trim().is_empty() {
            warn!(kind = %kind, "Extractor returned an empty document");
            return Err(LoaderError::EmptyDocument { kind });
        }

        let document = ExtractedDocument::new(kind, text);
        if document.looks_like_bot_challenge() {
            warn!(kind = %kind, "Source looks like a bot-challenge page; passing it through");
        }

        info!(kind = %kind, chars = document.text().len(), "Source loaded");
        Ok(document)
    }

    async fn extract_url(
        &self,
        kind: SourceKind,
        extractor: &dyn UrlExtractor,
        url: &str,
    ) -> Result<String, LoaderError> {
        let url = url.trim();
        if !(url.starts_with("http://") || url.starts_with("https://")) {
            return Err(LoaderError::PayloadMismatch { kind });
        }

        debug!(kind = %kind, extractor = extractor.name(), url = %url, "Extracting from URL");
        self.bounded(kind, extractor.extract_from_url(url)).await
    }

    async fn extract_file(
        &self,
        kind: SourceKind,
        extractor: &dyn FileExtractor,
        mut reader: Box<dyn AsyncRead + Send + Unpin>,
    ) -> Result<String, LoaderError> {
        // Removed on drop, so every early return below also cleans up.
        let temp = tempfile::Builder::new()
            .prefix("oraculo-")
            .suffix(kind.file_suffix().unwrap_or_default())
            .tempfile()
            .map_err(|e| LoaderError::TempFile(e.to_string()))?;

        let handle = temp
            .as_file()
            .try_clone()
            .map_err(|e| LoaderError::TempFile(e.to_string()))?;
        let mut file = tokio::fs::File::from_std(handle);

        let written = tokio::io::copy(&mut reader, &mut file)
            .await
            .map_err(|e| LoaderError::Extraction {
                kind,
                reason: format!("failed to read upload: {e}"),
            })?;
        file.flush()
            .await
            .map_err(|e| LoaderError::TempFile(e.to_string()))?;
        drop(file);

        if written == 0 {
            return Err(LoaderError::PayloadMismatch { kind });
        }

        debug!(
            kind = %kind,
            extractor = extractor.name(),
            bytes = written,
            path = %temp.path().display(),
            "Materialized upload"
        );

        let result = self.bounded(kind, extractor.extract_from_file(temp.path())).await;

        if let Err(e) = temp.close() {
            warn!(kind = %kind, error = %e, "Failed to remove temporary file");
        }

        result
    }

    async fn bounded(
        &self,
        kind: SourceKind,
        extraction: impl Future<Output = Result<String, String>>,
    ) -> Result<String, LoaderError> {
        match tokio::time::timeout(self.timeout, extraction).await {
            Ok(Ok(text)) => Ok(text),
            Ok(Err(reason)) => {
                warn!(kind = %kind, reason = %reason, "Extraction failed");
                Err(LoaderError::Extraction { kind, reason })
            }
            Err(_) => {
                warn!(kind = %kind, timeout_secs = self.timeout.as_secs(), "Extraction timed out");
                Err(LoaderError::Extraction {
                    kind,
                    reason: format!("timed out after {}s", self.timeout.as_secs()),
                })
            }
        }
    }
}

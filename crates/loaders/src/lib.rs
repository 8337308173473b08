//! Content loading for Oraculo.
//!
//! The [`ContentLoader`] maps a tagged source to the matching extractor and
//! normalizes every failure into a [`LoaderError`]. Built-in extractors cover
//! web pages, video transcripts, PDF, CSV, and plain-text files; any of them
//! can be swapped for another implementation of the core extractor traits.

pub mod dispatcher;
pub mod markup;
pub mod pdf;
pub mod tabular;
pub mod text;
pub mod web;
pub mod youtube;

use std::sync::Arc;
use std::time::Duration;

use oraculo_config::LoaderConfig;
use oraculo_core::error::LoaderError;

pub use dispatcher::ContentLoader;
pub use pdf::PdfTextExtractor;
pub use tabular::CsvExtractor;
pub use text::PlainTextExtractor;
pub use web::WebPageExtractor;
pub use youtube::YoutubeTranscriptExtractor;

/// Create a loader wired with all built-in extractors.
pub fn default_loader(config: &LoaderConfig) -> Result<ContentLoader, LoaderError> {
    let timeout = Duration::from_secs(config.request_timeout_secs);
    let site = WebPageExtractor::try_new(&config.user_agent, timeout)?;
    let video =
        YoutubeTranscriptExtractor::try_new(&config.user_agent, &config.transcript_language, timeout)?;

    Ok(ContentLoader::new(
        Arc::new(site),
        Arc::new(video),
        Arc::new(PdfTextExtractor::new(&config.pdf_command)),
        Arc::new(CsvExtractor),
        Arc::new(PlainTextExtractor),
    )
    .with_timeout(timeout))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_loader_builds_from_default_config() {
        let loader = default_loader(&LoaderConfig::default());
        assert!(loader.is_ok());
    }
}

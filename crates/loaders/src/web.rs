//! Web page extractor: fetch a URL and reduce the HTML to readable text.

use std::time::Duration;

use async_trait::async_trait;
use oraculo_core::error::LoaderError;
use oraculo_core::extractor::UrlExtractor;
use oraculo_core::source::SourceKind;
use tracing::debug;

use crate::markup::html_to_text;

pub struct WebPageExtractor {
    client: reqwest::Client,
}

impl WebPageExtractor {
    pub fn try_new(user_agent: &str, timeout: Duration) -> Result<Self, LoaderError> {
        let client = reqwest::Client::builder()
            .user_agent(user_agent)
            .timeout(timeout)
            .build()
            .map_err(|e| LoaderError::Extraction {
                kind: SourceKind::Site,
                reason: format!("failed to build HTTP client: {e}"),
            })?;
        Ok(Self { client })
    }
}

#[async_trait]
impl UrlExtractor for WebPageExtractor {
    fn name(&self) -> &str {
        "web_page"
    }

    async fn extract_from_url(&self, url: &str) -> Result<String, String> {
        let response = self
            .client
            .get(url)
            .header("Accept", "text/html,text/plain;q=0.9,*/*;q=0.5")
            .send()
            .await
            .map_err(|e| format!("request failed: {e}"))?;

        let status = response.status();
        let is_html = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .is_none_or(|ct| ct.contains("html"));

        // Challenge pages come back as 403/503 with a readable body
        let body = response
            .text()
            .await
            .map_err(|e| format!("failed to read body: {e}"))?;

        if !status.is_success() && !(status.as_u16() == 403 || status.as_u16() == 503) {
            return Err(format!("HTTP {status}"));
        }

        debug!(url = %url, status = status.as_u16(), bytes = body.len(), "Fetched page");

        Ok(if is_html { html_to_text(&body) } else { body })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builds_with_user_agent() {
        let extractor = WebPageExtractor::try_new("oraculo-test", Duration::from_secs(5)).unwrap();
        assert_eq!(extractor.name(), "web_page");
    }
}

//! PDF extractor: shells out to a `pdftotext`-compatible command.

use std::path::Path;

use async_trait::async_trait;
use oraculo_core::extractor::FileExtractor;
use tokio::process::Command;
use tracing::{debug, warn};

/// Runs `<command> -layout -enc UTF-8 <file> -` and returns its stdout.
pub struct PdfTextExtractor {
    command: String,
}

impl PdfTextExtractor {
    pub fn new(command: impl Into<String>) -> Self {
        Self {
            command: command.into(),
        }
    }
}

impl Default for PdfTextExtractor {
    fn default() -> Self {
        Self::new("pdftotext")
    }
}

#[async_trait]
impl FileExtractor for PdfTextExtractor {
    fn name(&self) -> &str {
        "pdf"
    }

    async fn extract_from_file(&self, path: &Path) -> Result<String, String> {
        debug!(command = %self.command, path = %path.display(), "Converting PDF");

        let output = Command::new(&self.command)
            .arg("-layout")
            .args(["-enc", "UTF-8"])
            .arg(path)
            .arg("-")
            .kill_on_drop(true)
            .output()
            .await
            .map_err(|e| format!("failed to run '{}': {e}", self.command))?;

        if !output.status.success() {
            let code = output.status.code().unwrap_or(-1);
            let stderr = String::from_utf8_lossy(&output.stderr);
            warn!(command = %self.command, exit_code = code, "PDF conversion failed");
            return Err(format!("[exit code: {code}] {}", stderr.trim()));
        }

        // Form feeds separate pages
        Ok(String::from_utf8_lossy(&output.stdout).replace('\u{c}', "\n"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn missing_command_is_reported() {
        let extractor = PdfTextExtractor::new("oraculo-no-such-pdf-tool");
        let err = extractor
            .extract_from_file(Path::new("/tmp/nothing.pdf"))
            .await
            .unwrap_err();
        assert!(err.contains("oraculo-no-such-pdf-tool"));
    }

    #[test]
    fn defaults_to_pdftotext() {
        assert_eq!(PdfTextExtractor::default().command, "pdftotext");
    }
}

//! Content sources: what the user hands us to ground a conversation on.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use tokio::io::AsyncRead;

use crate::error::LoaderError;

/// Markers of an anti-bot interstitial served instead of the real page.
const BOT_CHALLENGE_MARKERS: &[&str] = &[
    "just a moment",
    "enable javascript and cookies to continue",
];

/// The closed set of supported source types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SourceKind {
    /// A web page, fetched by URL
    Site,
    /// A video, transcribed by URL
    Video,
    /// An uploaded PDF document
    Pdf,
    /// An uploaded CSV table
    Csv,
    /// An uploaded plain-text file
    Text,
}

impl SourceKind {
    pub const ALL: [SourceKind; 5] = [
        SourceKind::Site,
        SourceKind::Video,
        SourceKind::Pdf,
        SourceKind::Csv,
        SourceKind::Text,
    ];

    /// Whether this kind is addressed by URL rather than uploaded bytes.
    pub fn is_url(&self) -> bool {
        matches!(self, SourceKind::Site | SourceKind::Video)
    }

    /// File extension used when an uploaded payload is materialized on disk.
    pub fn file_suffix(&self) -> Option<&'static str> {
        match self {
            SourceKind::Pdf => Some(".pdf"),
            SourceKind::Csv => Some(".csv"),
            SourceKind::Text => Some(".txt"),
            SourceKind::Site | SourceKind::Video => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            SourceKind::Site => "Site",
            SourceKind::Video => "Video",
            SourceKind::Pdf => "Pdf",
            SourceKind::Csv => "Csv",
            SourceKind::Text => "Text",
        }
    }
}

impl fmt::Display for SourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SourceKind {
    type Err = LoaderError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "site" | "web" | "url" => Ok(SourceKind::Site),
            "video" | "youtube" => Ok(SourceKind::Video),
            "pdf" => Ok(SourceKind::Pdf),
            "csv" => Ok(SourceKind::Csv),
            "text" | "txt" => Ok(SourceKind::Text),
            _ => Err(LoaderError::InvalidSourceKind(s.to_string())),
        }
    }
}

/// The raw material for a source: a URL or a one-shot byte stream.
pub enum SourcePayload {
    Url(String),
    Stream(Box<dyn AsyncRead + Send + Unpin>),
}

impl SourcePayload {
    /// Wrap an in-memory buffer as a byte stream.
    pub fn bytes(data: impl Into<Vec<u8>>) -> Self {
        SourcePayload::Stream(Box::new(std::io::Cursor::new(data.into())))
    }

    /// Wrap any async reader (an open file, an upload body) as a byte stream.
    pub fn reader(reader: impl AsyncRead + Send + Unpin + 'static) -> Self {
        SourcePayload::Stream(Box::new(reader))
    }
}

impl fmt::Debug for SourcePayload {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SourcePayload::Url(url) => f.debug_tuple("Url").field(url).finish(),
            SourcePayload::Stream(_) => f.write_str("Stream(..)"),
        }
    }
}

/// A tagged source handed to the loader.
#[derive(Debug)]
pub struct SourceSpec {
    pub kind: SourceKind,
    pub payload: SourcePayload,
}

impl SourceSpec {
    pub fn new(kind: SourceKind, payload: SourcePayload) -> Self {
        Self { kind, payload }
    }

    pub fn url(kind: SourceKind, url: impl Into<String>) -> Self {
        Self::new(kind, SourcePayload::Url(url.into()))
    }

    pub fn bytes(kind: SourceKind, data: impl Into<Vec<u8>>) -> Self {
        Self::new(kind, SourcePayload::bytes(data))
    }
}

/// Text produced by an extractor, tagged with the kind it came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractedDocument {
    kind: SourceKind,
    text: String,
}

impl ExtractedDocument {
    pub fn new(kind: SourceKind, text: impl Into<String>) -> Self {
        Self {
            kind,
            text: text.into(),
        }
    }

    pub fn kind(&self) -> SourceKind {
        self.kind
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn into_text(self) -> String {
        self.text
    }

    /// Whether the text is an anti-bot interstitial rather than real content.
    ///
    /// Such documents are still valid grounding text; the system instruction
    /// tells the assistant to suggest a reload when it sees one.
    pub fn looks_like_bot_challenge(&self) -> bool {
        let lower = self.text.to_lowercase();
        BOT_CHALLENGE_MARKERS.iter().any(|m| lower.contains(m))
    }
}

//! Video transcript extractor: pulls the caption track of a YouTube video.
//!
//! The watch page carries signed caption track URLs in its player response;
//! the timed-text endpoint answers empty without those signatures.

use std::time::Duration;

use async_trait::async_trait;
use oraculo_core::error::LoaderError;
use oraculo_core::extractor::UrlExtractor;
use oraculo_core::source::SourceKind;
use serde::Deserialize;
use tracing::debug;

use crate::markup::{collapse_whitespace, decode_entities};

const WATCH_URL: &str = "https://www.youtube.com/watch";

/// One entry of `captionTracks` in the watch page's player response.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CaptionTrack {
    base_url: String,
    language_code: String,
    #[serde(default)]
    kind: Option<String>,
}

pub struct YoutubeTranscriptExtractor {
    client: reqwest::Client,
    language: String,
}

impl YoutubeTranscriptExtractor {
    pub fn try_new(user_agent: &str, language: &str, timeout: Duration) -> Result<Self, LoaderError> {
        let client = reqwest::Client::builder()
            .user_agent(user_agent)
            .timeout(timeout)
            .build()
            .map_err(|e| LoaderError::Extraction {
                kind: SourceKind::Video,
                reason: format!("failed to build HTTP client: {e}"),
            })?;
        Ok(Self {
            client,
            language: language.to_string(),
        })
    }
}

#[async_trait]
impl UrlExtractor for YoutubeTranscriptExtractor {
    fn name(&self) -> &str {
        "youtube_transcript"
    }

    async fn extract_from_url(&self, url: &str) -> Result<String, String> {
        let video_id = video_id(url).ok_or_else(|| format!("not a YouTube video URL: {url}"))?;
        debug!(video_id = %video_id, language = %self.language, "Fetching transcript");

        let page = self
            .fetch(WATCH_URL, &[("v", video_id.as_str()), ("hl", self.language.as_str())])
            .await?;
        let tracks = caption_tracks(&page)?;
        let track = pick_track(&tracks, &self.language)
            .ok_or_else(|| format!("no captions available for video {video_id}"))?;
        debug!(
            video_id = %video_id,
            track_language = %track.language_code,
            generated = track.kind.as_deref() == Some("asr"),
            "Fetching caption track"
        );

        let xml = self.fetch(&track.base_url, &[]).await?;
        let transcript = captions_to_text(&xml);
        if transcript.is_empty() {
            return Err(format!(
                "caption track '{}' of video {video_id} is empty",
                track.language_code
            ));
        }
        Ok(transcript)
    }
}

impl YoutubeTranscriptExtractor {
    async fn fetch(&self, url: &str, query: &[(&str, &str)]) -> Result<String, String> {
        let mut request = self.client.get(url);
        if !query.is_empty() {
            request = request.query(query);
        }
        let response = request
            .send()
            .await
            .map_err(|e| format!("request failed: {e}"))?;

        if !response.status().is_success() {
            return Err(format!("HTTP {}", response.status()));
        }

        response
            .text()
            .await
            .map_err(|e| format!("failed to read response: {e}"))
    }
}

/// Read the `captionTracks` array embedded in a watch page.
fn caption_tracks(page: &str) -> Result<Vec<CaptionTrack>, String> {
    const KEY: &str = "\"captionTracks\":";
    let Some(start) = page.find(KEY) else {
        if page.contains("\"playabilityStatus\":{\"status\":\"OK\"") {
            return Ok(Vec::new());
        }
        return Err("video is unavailable or the watch page could not be read".into());
    };

    let array = json_array_prefix(&page[start + KEY.len()..])
        .ok_or("caption track list is truncated")?;
    serde_json::from_str(array).map_err(|e| format!("malformed caption track list: {e}"))
}

/// The balanced `[...]` at the start of `text`, skipping brackets in strings.
fn json_array_prefix(text: &str) -> Option<&str> {
    let text = text.trim_start();
    if !text.starts_with('[') {
        return None;
    }

    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;
    for (i, c) in text.char_indices() {
        match c {
            _ if escaped => escaped = false,
            '\\' if in_string => escaped = true,
            '"' => in_string = !in_string,
            '[' | '{' if !in_string => depth += 1,
            ']' | '}' if !in_string => {
                depth -= 1;
                if depth == 0 {
                    return Some(&text[..=i]);
                }
            }
            _ => {}
        }
    }
    None
}

/// Prefer a manual track in `language`, then a generated one, then any track.
fn pick_track<'a>(tracks: &'a [CaptionTrack], language: &str) -> Option<&'a CaptionTrack> {
    let matches = |t: &&CaptionTrack| {
        t.language_code == language || t.language_code.starts_with(&format!("{language}-"))
    };
    tracks
        .iter()
        .filter(matches)
        .find(|t| t.kind.as_deref() != Some("asr"))
        .or_else(|| tracks.iter().find(matches))
        .or_else(|| tracks.first())
}

/// Pull the 11-character video id out of the usual YouTube URL shapes.
fn video_id(url: &str) -> Option<String> {
    let without_scheme = url.split_once("://").map_or(url, |(_, rest)| rest);
    let (host, path) = without_scheme.split_once('/')?;
    let host = host.trim_start_matches("www.").trim_start_matches("m.");

    let candidate = match host {
        "youtu.be" => path.split(['?', '&', '#']).next(),
        "youtube.com" | "music.youtube.com" => {
            if let Some(query) = path.strip_prefix("watch?") {
                query
                    .split('&')
                    .find_map(|pair| pair.strip_prefix("v="))
                    .map(|v| v.split('#').next().unwrap_or(v))
            } else {
                ["shorts/", "embed/", "live/", "v/"]
                    .iter()
                    .find_map(|prefix| path.strip_prefix(prefix))
                    .and_then(|rest| rest.split(['?', '&', '/', '#']).next())
            }
        }
        _ => None,
    }?;

    let valid = candidate.len() == 11
        && candidate
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
    valid.then(|| candidate.to_string())
}

/// Join the `<text>` elements of a timed-text XML document.
fn captions_to_text(xml: &str) -> String {
    let mut parts = Vec::new();
    let mut rest = xml;

    while let Some(start) = rest.find("<text") {
        rest = &rest[start..];
        let Some(open_end) = rest.find('>') else {
            break;
        };
        if rest[..open_end].ends_with('/') {
            rest = &rest[open_end + 1..];
            continue;
        }
        let body = &rest[open_end + 1..];
        let Some(close) = body.find("</text>") else {
            break;
        };
        // Caption bodies are entity-encoded twice (`&amp;#39;`)
        parts.push(decode_entities(&decode_entities(&body[..close])));
        rest = &body[close + "</text>".len()..];
    }

    collapse_whitespace(&parts.join(" ").replace('\n', " "))
}

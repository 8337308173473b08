//! OpenAI-compatible provider implementation.
//!
//! Works with OpenAI and any endpoint exposing an OpenAI-compatible
//! `/v1/chat/completions` route (proxies, vLLM, Ollama).
//!
//! Only streaming chat completions are used by the session engine; the
//! non-streaming path comes from the trait's default `complete()`.

use async_trait::async_trait;
use futures::StreamExt;
use oraculo_core::error::ProviderError;
use oraculo_core::message::Message;
use oraculo_core::provider::*;
use reqwest::header::{AUTHORIZATION, HeaderMap, HeaderValue};
use serde::{Deserialize, Serialize};
use tracing::{debug, trace, warn};

/// Longest silence tolerated between two reads of the response.
const READ_TIMEOUT: std::time::Duration = std::time::Duration::from_secs(120);

/// An OpenAI-compatible LLM provider.
pub struct OpenAiCompatProvider {
    name: String,
    base_url: String,
    client: reqwest::Client,
}

impl OpenAiCompatProvider {
    /// Create a new OpenAI-compatible provider.
    ///
    /// Fails when the API key cannot be sent as an HTTP header or the HTTP
    /// client cannot be built.
    pub fn try_new(
        name: impl Into<String>,
        base_url: impl Into<String>,
        api_key: &str,
    ) -> Result<Self, ProviderError> {
        let mut auth = HeaderValue::from_str(&format!("Bearer {api_key}")).map_err(|_| {
            ProviderError::ClientInit("API key contains characters not allowed in a header".into())
        })?;
        auth.set_sensitive(true);

        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, auth);

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .connect_timeout(std::time::Duration::from_secs(15))
            .read_timeout(READ_TIMEOUT)
            .build()
            .map_err(|e| ProviderError::ClientInit(e.to_string()))?;

        Ok(Self {
            name: name.into(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            client,
        })
    }

    /// Create an OpenAI provider (convenience constructor).
    pub fn openai(api_key: &str) -> Result<Self, ProviderError> {
        Self::try_new("openai", "https://api.openai.com/v1", api_key)
    }

    /// Convert our Message types to OpenAI API format.
    fn to_api_messages(messages: &[Message]) -> Vec<ApiMessage> {
        messages
            .iter()
            .map(|m| ApiMessage {
                role: m.role.as_str().into(),
                content: m.content.clone(),
            })
            .collect()
    }

    fn request_body(request: &ProviderRequest) -> serde_json::Value {
        let mut body = serde_json::json!({
            "model": request.model,
            "messages": Self::to_api_messages(&request.messages),
            "stream": true,
            "stream_options": { "include_usage": true },
        });

        // o1-family models reject a non-default temperature
        if !request.model.starts_with("o1") {
            body["temperature"] = serde_json::json!(request.temperature);
        }

        if let Some(max_tokens) = request.max_tokens {
            body["max_completion_tokens"] = serde_json::json!(max_tokens);
        }

        body
    }
}

#[async_trait]
impl Provider for OpenAiCompatProvider {
    fn name(&self) -> &str {
        &self.name
    }

    async fn stream(&self, request: ProviderRequest) -> Result<ChunkReceiver, ProviderError> {
        let url = format!("{}/chat/completions", self.base_url);
        let body = Self::request_body(&request);

        debug!(provider = %self.name, model = %request.model, "Sending streaming request");

        let response = self
            .client
            .post(&url)
            .header("Content-Type", "application/json")
            .header("Accept", "text/event-stream")
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    ProviderError::Timeout(e.to_string())
                } else {
                    ProviderError::Network(e.to_string())
                }
            })?;

        let status = response.status().as_u16();

        if status == 429 {
            return Err(ProviderError::RateLimited {
                retry_after_secs: 5,
            });
        }

        if status == 401 || status == 403 {
            return Err(ProviderError::AuthenticationFailed(
                "Invalid API key or insufficient permissions".into(),
            ));
        }

        if status == 404 {
            return Err(ProviderError::ModelNotFound(request.model));
        }

        if status != 200 {
            let error_body = response.text().await.unwrap_or_default();
            warn!(status, body = %error_body, "Provider streaming error");
            return Err(ProviderError::ApiError {
                status_code: status,
                message: error_body,
            });
        }

        let (tx, rx) = tokio::sync::mpsc::channel(64);
        let provider_name = self.name.clone();

        // Spawn task to read the SSE byte stream and parse chunks
        tokio::spawn(async move {
            let mut byte_stream = response.bytes_stream();
            let mut buffer = LineBuffer::default();

            while let Some(chunk_result) = byte_stream.next().await {
                let bytes = match chunk_result {
                    Ok(b) => b,
                    Err(e) => {
                        let _ = tx
                            .send(Err(ProviderError::StreamInterrupted(e.to_string())))
                            .await;
                        return;
                    }
                };

                buffer.extend(&bytes);

                while let Some(line) = buffer.next_line() {
                    match decode_sse_line(&line) {
                        SseLine::Skip => {}
                        SseLine::Chunk(chunk) => {
                            let done = chunk.done;
                            if tx.send(Ok(chunk)).await.is_err() {
                                return; // receiver dropped
                            }
                            if done {
                                return;
                            }
                        }
                        SseLine::Done => {
                            let _ = tx.send(Ok(StreamChunk::done())).await;
                            return;
                        }
                        SseLine::Error(message) => {
                            let _ = tx.send(Err(ProviderError::StreamInterrupted(message))).await;
                            return;
                        }
                        SseLine::Unparseable(data) => {
                            trace!(
                                provider = %provider_name,
                                data = %data,
                                "Ignoring unparseable SSE chunk"
                            );
                        }
                    }
                }
            }

            // The body ended without [DONE]; the response may be truncated.
            let _ = tx
                .send(Err(ProviderError::StreamInterrupted(
                    "stream ended before completion".into(),
                )))
                .await;
        });

        Ok(rx)
    }
}

/// Accumulates raw body bytes and yields complete lines.
///
/// Decoding waits for the newline, so a multi-byte character split across
/// network chunks is reassembled before it becomes text.
#[derive(Debug, Default)]
struct LineBuffer {
    bytes: Vec<u8>,
}

impl LineBuffer {
    fn extend(&mut self, chunk: &[u8]) {
        self.bytes.extend_from_slice(chunk);
    }

    fn next_line(&mut self) -> Option<String> {
        let line_end = self.bytes.iter().position(|&b| b == b'\n')?;
        let raw: Vec<u8> = self.bytes.drain(..=line_end).collect();
        let line = String::from_utf8_lossy(&raw[..line_end]);
        Some(line.trim_end_matches('\r').to_string())
    }
}

/// What a single SSE line means for the chunk stream.
#[derive(Debug)]
enum SseLine {
    Skip,
    Chunk(StreamChunk),
    Done,
    Error(String),
    Unparseable(String),
}

fn decode_sse_line(line: &str) -> SseLine {
    // Skip empty lines and SSE comments
    if line.is_empty() || line.starts_with(':') {
        return SseLine::Skip;
    }

    let Some(data) = line.strip_prefix("data:") else {
        return SseLine::Skip;
    };
    let data = data.trim();

    if data == "[DONE]" {
        return SseLine::Done;
    }

    let resp = match serde_json::from_str::<StreamResponse>(data) {
        Ok(resp) => resp,
        Err(_) => return SseLine::Unparseable(data.to_string()),
    };

    if let Some(error) = resp.error {
        return SseLine::Error(error.message);
    }

    // Usage arrives in a final chunk with no choices (stream_options)
    if let Some(usage) = resp.usage {
        return SseLine::Chunk(StreamChunk {
            content: None,
            done: true,
            usage: Some(Usage {
                prompt_tokens: usage.prompt_tokens,
                completion_tokens: usage.completion_tokens,
                total_tokens: usage.total_tokens,
            }),
        });
    }

    match resp.choices.into_iter().next() {
        Some(choice) => match choice.delta.content {
            Some(content) if !content.is_empty() => SseLine::Chunk(StreamChunk::text(content)),
            _ => SseLine::Skip,
        },
        None => SseLine::Skip,
    }
}

// --- OpenAI API types (internal) ---

#[derive(Debug, Serialize, Deserialize)]
struct ApiMessage {
    role: String,
    content: String,
}

#[derive(Debug, Deserialize)]
struct ApiUsage {
    prompt_tokens: u32,
    completion_tokens: u32,
    total_tokens: u32,
}

/// A single SSE `data: {...}` chunk from a streaming response.
#[derive(Debug, Deserialize)]
struct StreamResponse {
    #[serde(default)]
    choices: Vec<StreamChoice>,
    #[serde(default)]
    usage: Option<ApiUsage>,
    #[serde(default)]
    error: Option<ApiErrorBody>,
}

#[derive(Debug, Deserialize)]
struct StreamChoice {
    delta: StreamDelta,
    #[serde(default)]
    #[allow(dead_code)]
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct StreamDelta {
    #[serde(default)]
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    message: String,
}

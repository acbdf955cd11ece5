//! Ollama chat client
//!
//! Streaming client for the Ollama `/api/chat` endpoint. A chat call posts the
//! full message log with `stream: true` and the reply arrives NDJSON-framed:
//! one JSON object per line, each carrying a content fragment, the final line
//! flagged `done: true`. This module exposes that reply as a [`TokenStream`]
//! the caller drains one fragment at a time.
//!
//! Dropping the stream mid-reply drops the underlying response, which closes
//! the connection; nothing here retries.

use crate::config::OllamaConfig;
use crate::error::{OlloquyError, Result};
use crate::session::Message;
use bytes::Bytes;
use futures::stream::{self, Stream, StreamExt};
use serde::{Deserialize, Serialize};
use std::pin::Pin;
use std::time::Duration;

/// Lazy sequence of reply fragments from one streaming call
///
/// Finite and not restartable: it ends when the backend signals completion,
/// or with one `Err` item when the connection fails mid-reply. Whatever
/// arrived before the error is the partial reply and remains valid.
pub type TokenStream = Pin<Box<dyn Stream<Item = Result<String>> + Send>>;

/// Request body for `/api/chat`
#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: &'a [Message],
    stream: bool,
    options: ChatOptions,
}

/// Decoding options passed through to the backend unchanged
#[derive(Debug, Serialize)]
struct ChatOptions {
    num_predict: u32,
}

/// One NDJSON line of a streaming reply
#[derive(Debug, Deserialize)]
struct ChatChunk {
    #[serde(default)]
    message: Option<ChunkMessage>,
    #[serde(default)]
    done: bool,
    #[serde(default)]
    error: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ChunkMessage {
    #[serde(default)]
    content: String,
}

/// Client for a single Ollama server
///
/// # Examples
///
/// ```no_run
/// use olloquy::config::OllamaConfig;
/// use olloquy::ollama::OllamaClient;
///
/// let client = OllamaClient::new(OllamaConfig::default())?;
/// assert_eq!(client.host(), "http://localhost:11434");
/// # anyhow::Ok(())
/// ```
pub struct OllamaClient {
    client: reqwest::Client,
    config: OllamaConfig,
}

impl OllamaClient {
    /// Create a new client from configuration
    ///
    /// The configured timeout bounds each chat call end to end, including the
    /// streamed body, so a stalled reply terminates instead of hanging.
    ///
    /// # Errors
    ///
    /// Returns `OlloquyError::Backend` if the HTTP client cannot be built.
    pub fn new(config: OllamaConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .user_agent("olloquy/0.1.0")
            .build()
            .map_err(|e| OlloquyError::Backend(format!("Failed to create HTTP client: {}", e)))?;

        tracing::info!(
            "Initialized Ollama client: host={}, model={}",
            config.host,
            config.model
        );

        Ok(Self { client, config })
    }

    /// The configured server address
    pub fn host(&self) -> &str {
        &self.config.host
    }

    /// The configured model identifier
    pub fn model(&self) -> &str {
        &self.config.model
    }

    /// Open one streaming chat call for `messages`
    ///
    /// The full log is sent as context, each message's role/content pair in
    /// order. Tokens come back in arrival order; the stream ends at the
    /// backend's completion marker. A connection drop, a timeout, or a reply
    /// that ends without the marker surfaces as a single
    /// `OlloquyError::StreamInterrupted` item after any tokens that already
    /// arrived.
    ///
    /// # Errors
    ///
    /// Returns `OlloquyError::Backend` if the server is unreachable or
    /// replies with a non-success status before any streaming begins.
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use olloquy::config::OllamaConfig;
    /// use olloquy::ollama::OllamaClient;
    /// use olloquy::session::Message;
    ///
    /// # tokio_test::block_on(async {
    /// let client = OllamaClient::new(OllamaConfig::default()).unwrap();
    /// let stream = client.stream_chat(&[Message::user("Hello")]).await;
    /// # });
    /// ```
    pub async fn stream_chat(&self, messages: &[Message]) -> Result<TokenStream> {
        let url = format!("{}/api/chat", self.config.host);
        let request = ChatRequest {
            model: &self.config.model,
            messages,
            stream: true,
            options: ChatOptions {
                num_predict: self.config.num_predict,
            },
        };

        tracing::debug!(
            "Opening chat stream: model={}, context={} messages",
            self.config.model,
            messages.len()
        );

        let response = self
            .client
            .post(&url)
            .json(&request)
            .send()
            .await
            .map_err(|e| {
                tracing::error!("Failed to reach Ollama at {}: {}", url, e);
                OlloquyError::Backend(format!("Failed to connect to Ollama server: {}", e))
            })?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            tracing::error!("Ollama API error {}: {}", status, error_text);
            return Err(
                OlloquyError::Backend(format!("Ollama API error {}: {}", status, error_text))
                    .into(),
            );
        }

        Ok(token_stream(response.bytes_stream()))
    }
}

/// What one NDJSON line means for the consumer
enum ChunkEvent {
    /// A content fragment; the reply continues
    Delta(String),
    /// The completion marker, with any final fragment it carried
    Done(String),
    /// The backend reported an error inside the stream
    Fault(String),
}

/// Parse one newline-framed chunk
///
/// Empty and malformed lines produce `None` and are skipped; a reply is never
/// abandoned over one bad line.
fn parse_chunk_line(line: &[u8]) -> Option<ChunkEvent> {
    if line.is_empty() {
        return None;
    }
    let chunk: ChatChunk = match serde_json::from_slice(line) {
        Ok(chunk) => chunk,
        Err(e) => {
            tracing::warn!("Skipping malformed stream line: {}", e);
            return None;
        }
    };
    if let Some(message) = chunk.error {
        return Some(ChunkEvent::Fault(message));
    }
    let content = chunk.message.map(|m| m.content).unwrap_or_default();
    if chunk.done {
        Some(ChunkEvent::Done(content))
    } else {
        Some(ChunkEvent::Delta(content))
    }
}

/// Build the single `Err` item a failed stream ends with
fn interrupted(message: impl Into<String>) -> Result<String> {
    Err(OlloquyError::StreamInterrupted(message.into()).into())
}

/// Turn a raw byte stream into a [`TokenStream`]
///
/// Bytes are buffered until a full line is available, so a UTF-8 sequence or
/// JSON object split across network chunks reassembles before parsing. The
/// state machine stops reading after the completion marker, a fault line, or
/// a transport error; end of input without the marker is reported as an
/// interruption so the caller can tell a partial reply from a complete one.
fn token_stream<S, E>(byte_stream: S) -> TokenStream
where
    S: Stream<Item = std::result::Result<Bytes, E>> + Send + Unpin + 'static,
    E: std::fmt::Display + Send + 'static,
{
    Box::pin(stream::unfold(
        (byte_stream, Vec::new(), false),
        |(mut stream, mut buf, finished)| async move {
            if finished {
                return None;
            }
            loop {
                while let Some(pos) = buf.iter().position(|&b| b == b'\n') {
                    let line: Vec<u8> = buf.drain(..=pos).collect();
                    match parse_chunk_line(&line[..line.len() - 1]) {
                        Some(ChunkEvent::Delta(token)) => {
                            if !token.is_empty() {
                                return Some((Ok(token), (stream, buf, false)));
                            }
                        }
                        Some(ChunkEvent::Done(token)) => {
                            if token.is_empty() {
                                return None;
                            }
                            return Some((Ok(token), (stream, buf, true)));
                        }
                        Some(ChunkEvent::Fault(message)) => {
                            return Some((interrupted(message), (stream, buf, true)));
                        }
                        None => {}
                    }
                }

                match stream.next().await {
                    Some(Ok(bytes)) => buf.extend_from_slice(&bytes),
                    Some(Err(e)) => {
                        tracing::warn!("Chat stream transport error: {}", e);
                        return Some((
                            interrupted(format!("Connection error: {}", e)),
                            (stream, buf, true),
                        ));
                    }
                    None => {
                        // A final line is valid without a trailing newline
                        let leftover = std::mem::take(&mut buf);
                        match parse_chunk_line(&leftover) {
                            Some(ChunkEvent::Done(token)) => {
                                if token.is_empty() {
                                    return None;
                                }
                                return Some((Ok(token), (stream, buf, true)));
                            }
                            Some(ChunkEvent::Fault(message)) => {
                                return Some((interrupted(message), (stream, buf, true)));
                            }
                            _ => {
                                tracing::warn!("Chat stream ended without completion marker");
                                return Some((
                                    interrupted("Response ended before completion"),
                                    (stream, buf, true),
                                ));
                            }
                        }
                    }
                }
            }
        },
    ))
}

//! Streaming chat-completion client.
//!
//! Sends the persona system prompt and the visitor's question to an
//! OpenAI-compatible `POST {base_url}/chat/completions` endpoint with
//! `stream: true`, and feeds content deltas to a callback as server-sent
//! events arrive.
//!
//! # Providers
//!
//! - **`openai`**: requires `OPENAI_API_KEY` in the environment.
//! - **`disabled`**: every call fails with a descriptive error.
//!
//! # Retry Strategy
//!
//! Retries happen only before any output was received:
//! - HTTP 429 (rate limited) and 5xx (server error) → retry
//! - HTTP 4xx (client error, not 429) → fail immediately
//! - Network errors while connecting → retry
//! - Backoff: 1s, 2s, 4s, 8s, 16s, 32s (capped at 2^5)
//!
//! Once streaming has started, a failure is returned to the caller along
//! with whatever was already delivered through the callback.

use anyhow::{anyhow, bail, Result};
use serde_json::Value;
use std::time::Duration;

use crate::config::LlmConfig;

/// Generate a reply, calling `on_delta` for every streamed content piece.
///
/// Returns the full reply text.
pub async fn complete_chat<F>(
    config: &LlmConfig,
    system_prompt: &str,
    user_message: &str,
    on_delta: F,
) -> Result<String>
where
    F: FnMut(&str) + Send,
{
    match config.provider.as_str() {
        "openai" => stream_openai(config, system_prompt, user_message, on_delta).await,
        "disabled" => bail!("LLM provider is disabled. Set [llm] provider in config."),
        other => bail!("Unknown llm provider: {}", other),
    }
}

async fn stream_openai<F>(
    config: &LlmConfig,
    system_prompt: &str,
    user_message: &str,
    mut on_delta: F,
) -> Result<String>
where
    F: FnMut(&str) + Send,
{
    let api_key =
        std::env::var("OPENAI_API_KEY").map_err(|_| anyhow!("OPENAI_API_KEY not set"))?;

    // Connect and per-read deadlines only; a long reply may stream past them.
    let client = reqwest::Client::builder()
        .connect_timeout(Duration::from_secs(config.timeout_secs))
        .read_timeout(Duration::from_secs(config.timeout_secs))
        .build()?;

    let mut body = serde_json::json!({
        "model": config.model,
        "stream": true,
        "messages": [
            { "role": "system", "content": system_prompt },
            { "role": "user", "content": user_message },
        ],
    });
    if let Some(t) = config.temperature {
        body["temperature"] = serde_json::json!(t);
    }

    let url = format!("{}/chat/completions", config.base_url.trim_end_matches('/'));
    let mut last_err = None;
    let mut response = None;

    for attempt in 0..=config.max_retries {
        if attempt > 0 {
            let delay = Duration::from_secs(1 << (attempt - 1).min(5));
            tracing::warn!(attempt, ?delay, "retrying chat completion");
            tokio::time::sleep(delay).await;
        }

        let resp = client
            .post(&url)
            .header("Authorization", format!("Bearer {}", api_key))
            .json(&body)
            .send()
            .await;

        match resp {
            Ok(r) => {
                let status = r.status();

                if status.is_success() {
                    response = Some(r);
                    break;
                }

                let body_text = r.text().await.unwrap_or_default();

                // Rate limited or server error, retry
                if status.as_u16() == 429 || status.is_server_error() {
                    last_err = Some(anyhow!("LLM API error {}: {}", status, body_text));
                    continue;
                }

                bail!("LLM API error {}: {}", status, body_text);
            }
            Err(e) => {
                last_err = Some(e.into());
                continue;
            }
        }
    }

    let mut response = match response {
        Some(r) => r,
        None => {
            return Err(
                last_err.unwrap_or_else(|| anyhow!("Chat completion failed after retries"))
            )
        }
    };

    let mut parser = SseParser::default();
    let mut reply = String::new();

    'stream: while let Some(bytes) = response.chunk().await? {
        for event in parser.push(&bytes)? {
            match event {
                StreamEvent::Delta(text) => {
                    on_delta(&text);
                    reply.push_str(&text);
                }
                StreamEvent::Done => break 'stream,
            }
        }
    }

    tracing::debug!(chars = reply.len(), "chat completion finished");
    Ok(reply)
}

/// One decoded server-sent event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StreamEvent {
    Delta(String),
    Done,
}

/// Incremental parser for the `data: {...}` lines of a streamed chat
/// completion. Bytes may arrive split anywhere, including inside a UTF-8
/// sequence.
#[derive(Debug, Default)]
pub struct SseParser {
    buf: Vec<u8>,
}

impl SseParser {
    /// Feed raw bytes; returns the events completed by them.
    pub fn push(&mut self, bytes: &[u8]) -> Result<Vec<StreamEvent>> {
        self.buf.extend_from_slice(bytes);
        let mut events = Vec::new();

        while let Some(pos) = self.buf.iter().position(|b| *b == b'\n') {
            let line: Vec<u8> = self.buf.drain(..=pos).collect();
            let line = String::from_utf8_lossy(&line);
            if let Some(event) = parse_line(line.trim_end())? {
                events.push(event);
            }
        }

        Ok(events)
    }
}

fn parse_line(line: &str) -> Result<Option<StreamEvent>> {
    let payload = match line.strip_prefix("data:") {
        Some(p) => p.trim(),
        None => return Ok(None),
    };

    if payload == "[DONE]" {
        return Ok(Some(StreamEvent::Done));
    }

    let json: Value = serde_json::from_str(payload)?;

    if let Some(err) = json.get("error") {
        let message = err
            .get("message")
            .and_then(Value::as_str)
            .unwrap_or("unknown error");
        bail!("LLM stream error: {}", message);
    }

    let delta = json
        .get("choices")
        .and_then(|c| c.get(0))
        .and_then(|c| c.get("delta"))
        .and_then(|d| d.get("content"))
        .and_then(Value::as_str)
        .filter(|s| !s.is_empty());

    Ok(delta.map(|s| StreamEvent::Delta(s.to_string())))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};

    fn delta_line(text: &str) -> String {
        format!(
            "data: {}\n\n",
            serde_json::json!({ "choices": [{ "delta": { "content": text } }] })
        )
    }

    #[test]
    fn test_parses_deltas_and_done() {
        let mut parser = SseParser::default();
        let mut input = delta_line("Hello");
        input.push_str(&delta_line(", world"));
        input.push_str("data: [DONE]\n\n");

        let events = parser.push(input.as_bytes()).unwrap();
        assert_eq!(
            events,
            vec![
                StreamEvent::Delta("Hello".to_string()),
                StreamEvent::Delta(", world".to_string()),
                StreamEvent::Done,
            ]
        );
    }

    #[test]
    fn test_line_split_across_chunks() {
        let mut parser = SseParser::default();
        let line = delta_line("Agency ✨");
        let bytes = line.as_bytes();
        // split inside the multi-byte sparkle
        let cut = line.find('✨').unwrap() + 1;

        assert!(parser.push(&bytes[..cut]).unwrap().is_empty());
        let events = parser.push(&bytes[cut..]).unwrap();
        assert_eq!(events, vec![StreamEvent::Delta("Agency ✨".to_string())]);
    }

    #[test]
    fn test_role_only_and_comment_lines_ignored() {
        let mut parser = SseParser::default();
        let role = "data: {\"choices\":[{\"delta\":{\"role\":\"assistant\"}}]}\n";
        let events = parser.push(format!(": keep-alive\n{role}\r\n").as_bytes()).unwrap();
        assert!(events.is_empty());
    }

    #[test]
    fn test_error_payload_fails() {
        let mut parser = SseParser::default();
        let err = parser
            .push(b"data: {\"error\":{\"message\":\"quota exceeded\"}}\n")
            .unwrap_err();
        assert!(err.to_string().contains("quota exceeded"));
    }

    #[tokio::test]
    async fn test_disabled_provider_errors() {
        let config = LlmConfig::default();
        let err = complete_chat(&config, "system", "hi", |_| {}).await.unwrap_err();
        assert!(err.to_string().contains("disabled"));
    }

    /// One-shot completion endpoint that streams `deltas` with `gap` before
    /// each one. Returns its base URL.
    async fn slow_completion_server(deltas: Vec<&'static str>, gap: Duration) -> String {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();

            // read the whole request so closing never resets the connection
            let mut request = Vec::new();
            let mut buf = [0u8; 4096];
            loop {
                let n = socket.read(&mut buf).await.unwrap();
                request.extend_from_slice(&buf[..n]);
                let text = String::from_utf8_lossy(&request).to_string();
                if let Some(end) = text.find("\r\n\r\n") {
                    let length = text[..end]
                        .lines()
                        .find_map(|l| {
                            let lower = l.to_ascii_lowercase();
                            lower
                                .strip_prefix("content-length:")
                                .map(|v| v.trim().parse::<usize>().unwrap())
                        })
                        .unwrap_or(0);
                    if request.len() >= end + 4 + length {
                        break;
                    }
                }
                if n == 0 {
                    break;
                }
            }

            socket
                .write_all(
                    b"HTTP/1.1 200 OK\r\ncontent-type: text/event-stream\r\nconnection: close\r\n\r\n",
                )
                .await
                .unwrap();
            for delta in deltas {
                tokio::time::sleep(gap).await;
                socket.write_all(delta_line(delta).as_bytes()).await.unwrap();
            }
            socket.write_all(b"data: [DONE]\n\n").await.unwrap();
            let _ = socket.shutdown().await;
        });

        format!("http://{}", addr)
    }

    #[tokio::test]
    async fn test_stream_may_outlast_timeout() {
        std::env::set_var("OPENAI_API_KEY", "test-key");
        let base_url = slow_completion_server(
            vec!["Economics ", "at X, ", "then ", "an MBA."],
            Duration::from_millis(400),
        )
        .await;

        let config = LlmConfig {
            provider: "openai".to_string(),
            base_url,
            timeout_secs: 1,
            max_retries: 0,
            ..LlmConfig::default()
        };

        let mut seen = Vec::new();
        let reply = complete_chat(&config, "system", "where did you study?", |d| {
            seen.push(d.to_string())
        })
        .await
        .unwrap();

        assert_eq!(reply, "Economics at X, then an MBA.");
        assert_eq!(seen.len(), 4);
    }
}

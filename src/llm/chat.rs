//! Streaming client for OpenAI-compatible chat completion APIs.

use std::time::Duration;

use futures::StreamExt;
use reqwest::header::CONTENT_TYPE;
use reqwest::Client;
use serde::Serialize;
use thiserror::Error;
use tracing::{debug, info};

use super::sse::{delta_text, SseDecoder, SseEvent};
use super::ChatConfig;
use crate::models::{Role, WireMessage};

/// Failure while talking to the chat API.
#[derive(Debug, Error)]
pub enum ChatError {
    #[error("no chat API key configured (set DEEPSEEK_API_KEY or chat.api_key)")]
    MissingApiKey,

    #[error("chat request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("chat API returned HTTP {status}: {body}")]
    Status { status: u16, body: String },

    #[error("failed to decode chat response: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("chat API returned no reply content")]
    EmptyReply,
}

#[derive(Debug, Serialize)]
struct CompletionRequest<'a> {
    model: &'a str,
    messages: Vec<WireMessage>,
    temperature: f32,
    max_tokens: u32,
    stream: bool,
}

/// Chat client that streams assistant replies.
pub struct ChatClient {
    config: ChatConfig,
    client: Client,
}

impl ChatClient {
    pub fn new(config: ChatConfig) -> Result<Self, ChatError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;
        Ok(Self { config, client })
    }

    pub fn config(&self) -> &ChatConfig {
        &self.config
    }

    /// Send `history` after the system prompt and stream the reply.
    ///
    /// `on_delta` sees every piece of text as it arrives; the full reply is
    /// returned once the stream ends.
    pub async fn stream_reply<F>(
        &self,
        history: &[WireMessage],
        mut on_delta: F,
    ) -> Result<String, ChatError>
    where
        F: FnMut(&str) + Send,
    {
        let api_key = self
            .config
            .api_key
            .as_deref()
            .ok_or(ChatError::MissingApiKey)?;

        let mut messages = Vec::with_capacity(history.len() + 1);
        messages.push(WireMessage {
            role: Role::System,
            content: self.config.get_system_prompt().to_string(),
        });
        messages.extend(history.iter().cloned());

        let request = CompletionRequest {
            model: &self.config.model,
            messages,
            temperature: self.config.temperature,
            max_tokens: self.config.max_tokens,
            stream: true,
        };

        let url = self.config.completions_url();
        info!("Sending chat request to {} ({} messages)", url, history.len());
        let response = self
            .client
            .post(&url)
            .bearer_auth(api_key)
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ChatError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let is_event_stream = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .is_some_and(|v| v.contains("text/event-stream"));

        let mut reply = String::new();
        if !is_event_stream {
            // Some gateways ignore `stream` and answer with one JSON body.
            let body = response.bytes().await?;
            if let Ok(value) = serde_json::from_slice::<serde_json::Value>(&body) {
                let text = delta_text(&value)
                    .filter(|t| !t.is_empty())
                    .ok_or(ChatError::EmptyReply)?;
                on_delta(text);
                return Ok(text.trim().to_string());
            }
            let mut decoder = SseDecoder::new();
            let mut events = decoder.push(&body);
            events.extend(decoder.finish());
            apply_events(events, &mut reply, &mut on_delta);
            return Ok(reply);
        }

        let mut decoder = SseDecoder::new();
        let mut stream = response.bytes_stream();
        while let Some(chunk) = stream.next().await {
            let events = decoder.push(&chunk?);
            apply_events(events, &mut reply, &mut on_delta);
            if decoder.is_done() {
                break;
            }
        }
        apply_events(decoder.finish(), &mut reply, &mut on_delta);
        debug!("Chat reply complete ({} chars)", reply.chars().count());
        Ok(reply)
    }
}

fn apply_events<F: FnMut(&str)>(events: Vec<SseEvent>, reply: &mut String, on_delta: &mut F) {
    for event in events {
        if let SseEvent::Delta(text) = event {
            on_delta(&text);
            reply.push_str(&text);
        }
    }
}

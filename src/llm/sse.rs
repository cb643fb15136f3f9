//! Incremental decoder for OpenAI-style `data:` event streams.

use serde_json::Value;

/// Something the stream told us.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SseEvent {
    /// A piece of assistant text.
    Delta(String),
    /// `data: [DONE]`.
    Done,
}

/// Buffers partial lines across chunks; a line is only handled once its
/// newline has arrived, or at `finish`.
#[derive(Debug, Default)]
pub struct SseDecoder {
    buffer: Vec<u8>,
    done: bool,
}

impl SseDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_done(&self) -> bool {
        self.done
    }

    /// Feed one network chunk.
    pub fn push(&mut self, chunk: &[u8]) -> Vec<SseEvent> {
        self.buffer.extend_from_slice(chunk);
        let mut events = Vec::new();
        while let Some(pos) = self.buffer.iter().position(|b| *b == b'\n') {
            let line: Vec<u8> = self.buffer.drain(..=pos).collect();
            self.handle_line(&line, &mut events);
        }
        events
    }

    /// Flush whatever is left once the body has ended.
    pub fn finish(&mut self) -> Vec<SseEvent> {
        let mut events = Vec::new();
        if !self.buffer.is_empty() {
            let line = std::mem::take(&mut self.buffer);
            self.handle_line(&line, &mut events);
        }
        events
    }

    fn handle_line(&mut self, raw: &[u8], events: &mut Vec<SseEvent>) {
        if self.done {
            return;
        }
        let line = String::from_utf8_lossy(raw);
        let Some(data) = line.trim().strip_prefix("data:") else {
            return;
        };
        let data = data.trim();
        if data == "[DONE]" {
            self.done = true;
            events.push(SseEvent::Done);
            return;
        }
        let Ok(value) = serde_json::from_str::<Value>(data) else {
            return;
        };
        if let Some(text) = delta_text(&value) {
            if !text.is_empty() {
                events.push(SseEvent::Delta(text.to_string()));
            }
        }
    }
}

/// `choices[0].delta.content`, falling back to `choices[0].message.content`.
pub fn delta_text(value: &Value) -> Option<&str> {
    let choice = value.get("choices")?.get(0)?;
    choice
        .pointer("/delta/content")
        .and_then(Value::as_str)
        .or_else(|| choice.pointer("/message/content").and_then(Value::as_str))
}

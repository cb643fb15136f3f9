//! LLM chat client: configuration, event-stream decoding and streaming requests.

mod chat;
mod config;
mod sse;

pub use chat::{ChatClient, ChatError};
pub use config::{ChatConfig, DEFAULT_SYSTEM_PROMPT};
pub use sse::{delta_text, SseDecoder, SseEvent};

//! Chat assistant conversations.
//!
//! Owns the persisted conversation list and the active conversation, and
//! streams replies into it. Emits events so the caller can render deltas as
//! they arrive.

use std::sync::Arc;

use tokio::sync::mpsc;
use tracing::{info, warn};

use crate::annotation::ValidationError;
use crate::llm::{ChatClient, ChatConfig};
use crate::models::{ChatMessage, Conversation, Role, WireMessage};
use crate::storage::{ConversationStore, KeyValueStore};

use super::ServiceError;

/// Events emitted while a reply streams in.
#[derive(Debug, Clone, PartialEq)]
pub enum ChatEvent {
    /// A piece of reply text
    Delta(String),
    /// The reply finished
    Finished { message_id: i64 },
    /// The reply failed; the message now carries the error
    Failed { message_id: i64, error: String },
}

pub struct ChatService {
    conversations: ConversationStore,
    client: ChatClient,
    list: Vec<Conversation>,
    active: String,
}

impl ChatService {
    /// Load saved conversations and make the most recent one active.
    pub fn open(store: Arc<dyn KeyValueStore>, config: ChatConfig) -> Result<Self, ServiceError> {
        let conversations =
            ConversationStore::new(store, config.max_history, config.max_conversations);
        let mut list = conversations.load()?;
        let active = match conversations
            .load_active()
            .filter(|id| list.iter().any(|c| &c.id == id))
        {
            Some(id) => id,
            None => match list.first() {
                Some(c) => c.id.clone(),
                None => conversations.create(&mut list),
            },
        };
        Ok(Self {
            conversations,
            client: ChatClient::new(config)?,
            list,
            active,
        })
    }

    /// Conversations, most recent first.
    pub fn conversations(&self) -> &[Conversation] {
        &self.list
    }

    pub fn active_id(&self) -> &str {
        &self.active
    }

    pub fn active(&self) -> Option<&Conversation> {
        self.list.iter().find(|c| c.id == self.active)
    }

    /// Switch to another conversation and remember the choice. Returns false
    /// for unknown ids.
    pub fn select(&mut self, id: &str) -> Result<bool, ServiceError> {
        if !self.list.iter().any(|c| c.id == id) {
            return Ok(false);
        }
        self.active = id.to_string();
        self.conversations.save_active(&self.active)?;
        Ok(true)
    }

    /// Start a conversation and make it active.
    pub fn new_conversation(&mut self) -> Result<String, ServiceError> {
        let id = self.conversations.create(&mut self.list);
        self.active = id.clone();
        self.conversations.save(&self.list)?;
        self.conversations.save_active(&self.active)?;
        Ok(id)
    }

    /// Reset the active conversation's history.
    pub fn clear(&mut self) -> Result<(), ServiceError> {
        let index = self.active_index();
        self.conversations.clear(&mut self.list[index]);
        self.conversations.save(&self.list)?;
        Ok(())
    }

    pub fn delete(&mut self, id: &str) -> Result<(), ServiceError> {
        self.active = self.conversations.delete(&mut self.list, id, &self.active);
        self.conversations.save(&self.list)?;
        self.conversations.save_active(&self.active)?;
        Ok(())
    }

    /// Send a user message in the active conversation and stream the reply.
    ///
    /// On failure the assistant message is kept, flagged as an error, and
    /// the error is returned after saving.
    pub async fn send(
        &mut self,
        text: &str,
        events: Option<mpsc::UnboundedSender<ChatEvent>>,
    ) -> Result<ChatMessage, ServiceError> {
        let text = text.trim();
        if text.is_empty() {
            return Err(ValidationError::EmptyField("message").into());
        }
        let index = self.active_index();

        let history: Vec<WireMessage> = {
            let conversation = &mut self.list[index];
            self.conversations.retitle_from(conversation, text);
            self.conversations.push(conversation, Role::User, text);
            conversation.messages.iter().map(WireMessage::from).collect()
        };
        let reply_id = self
            .conversations
            .push(&mut self.list[index], Role::Assistant, "");
        self.conversations.save(&self.list)?;

        let list = &mut self.list;
        let result = self
            .client
            .stream_reply(&history, |delta| {
                if let Some(message) = list[index].find_message_mut(reply_id) {
                    message.content.push_str(delta);
                }
                if let Some(tx) = &events {
                    let _ = tx.send(ChatEvent::Delta(delta.to_string()));
                }
            })
            .await;

        let outcome = match result {
            Ok(reply) => {
                if let Some(message) = self.list[index].find_message_mut(reply_id) {
                    message.content = reply;
                }
                info!("Chat reply received in conversation {}", self.active);
                Ok(ChatEvent::Finished {
                    message_id: reply_id,
                })
            }
            Err(e) => {
                warn!("Chat reply failed: {}", e);
                if let Some(message) = self.list[index].find_message_mut(reply_id) {
                    message.content = format!("failed: {}", e);
                    message.error = true;
                }
                Err(e)
            }
        };
        self.conversations.save(&self.list)?;

        match outcome {
            Ok(event) => {
                if let Some(tx) = &events {
                    let _ = tx.send(event);
                }
                self.list[index]
                    .messages
                    .iter()
                    .find(|m| m.id == reply_id)
                    .cloned()
                    .ok_or_else(|| ValidationError::EmptyField("reply").into())
            }
            Err(e) => {
                if let Some(tx) = &events {
                    let _ = tx.send(ChatEvent::Failed {
                        message_id: reply_id,
                        error: e.to_string(),
                    });
                }
                Err(e.into())
            }
        }
    }

    /// Position of the active conversation, repairing a dangling id.
    fn active_index(&mut self) -> usize {
        if let Some(index) = self.list.iter().position(|c| c.id == self.active) {
            return index;
        }
        if self.list.is_empty() {
            self.conversations.create(&mut self.list);
        }
        self.active = self.list[0].id.clone();
        0
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use axum::extract::State;
    use axum::http::{header, StatusCode};
    use axum::response::IntoResponse;
    use axum::routing::post;
    use axum::{Json, Router};
    use serde_json::Value;
    use tokio::net::TcpListener;

    use super::*;
    use crate::storage::{MemoryStore, RESET_MESSAGE, WELCOME_MESSAGE};

    async fn serve(router: Router) -> String {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, router).await.unwrap();
        });
        format!("http://{}", addr)
    }

    fn config(endpoint: &str) -> ChatConfig {
        ChatConfig {
            api_key: Some("sk-test".to_string()),
            ..ChatConfig::default()
        }
        .with_endpoint(endpoint)
    }

    async fn streaming_endpoint(seen: Arc<Mutex<Vec<Value>>>) -> String {
        let router = Router::new()
            .route(
                "/chat/completions",
                post(
                    |State(seen): State<Arc<Mutex<Vec<Value>>>>, Json(body): Json<Value>| async move {
                        seen.lock().unwrap().push(body);
                        (
                            [(header::CONTENT_TYPE, "text/event-stream")],
                            "data: {\"choices\":[{\"delta\":{\"content\":\"Par\"}}]}\n\n\
                             data: {\"choices\":[{\"delta\":{\"content\":\"is\"}}]}\n\n\
                             data: [DONE]\n\n",
                        )
                            .into_response()
                    },
                ),
            )
            .with_state(seen);
        serve(router).await
    }

    #[tokio::test]
    async fn test_send_streams_into_placeholder_and_persists() {
        let seen: Arc<Mutex<Vec<Value>>> = Arc::default();
        let endpoint = streaming_endpoint(seen.clone()).await;
        let store = Arc::new(MemoryStore::new());
        let mut chat = ChatService::open(store.clone(), config(&endpoint)).unwrap();

        let (tx, mut rx) = mpsc::unbounded_channel();
        let reply = chat
            .send("What is the capital of France?", Some(tx))
            .await
            .unwrap();
        assert_eq!(reply.content, "Paris");
        assert!(!reply.error);

        let mut deltas = Vec::new();
        while let Ok(event) = rx.try_recv() {
            deltas.push(event);
        }
        assert_eq!(
            deltas,
            vec![
                ChatEvent::Delta("Par".to_string()),
                ChatEvent::Delta("is".to_string()),
                ChatEvent::Finished {
                    message_id: reply.id
                },
            ]
        );

        // Welcome and user message, never the empty placeholder.
        let body = seen.lock().unwrap()[0].clone();
        let messages = body["messages"].as_array().unwrap();
        assert_eq!(messages.len(), 3);
        assert_eq!(messages[0]["role"], "system");
        assert_eq!(messages[1]["content"], WELCOME_MESSAGE);
        assert_eq!(messages[2]["content"], "What is the capital of France?");

        let active = chat.active().unwrap();
        assert_eq!(active.title, "What is the capital of F");
        assert_eq!(active.messages.len(), 3);

        let reopened = ChatService::open(store, config(&endpoint)).unwrap();
        assert_eq!(reopened.active().unwrap().messages[2].content, "Paris");
    }

    #[tokio::test]
    async fn test_failed_reply_is_marked_inline() {
        let router = Router::new().route(
            "/chat/completions",
            post(|| async { (StatusCode::BAD_GATEWAY, "upstream down") }),
        );
        let endpoint = serve(router).await;
        let mut chat = ChatService::open(Arc::new(MemoryStore::new()), config(&endpoint)).unwrap();

        let err = chat.send("hello", None).await.unwrap_err();
        assert!(matches!(err, ServiceError::Chat(_)));
        let last = chat.active().unwrap().messages.last().unwrap().clone();
        assert!(last.error);
        assert!(last.content.starts_with("failed: "));
        assert!(last.content.contains("upstream down"));
    }

    #[tokio::test]
    async fn test_empty_message_is_rejected() {
        let mut chat =
            ChatService::open(Arc::new(MemoryStore::new()), config("http://127.0.0.1:9")).unwrap();
        assert!(chat.send("   ", None).await.unwrap_err().is_validation());
        assert_eq!(chat.active().unwrap().messages.len(), 1);
    }

    #[test]
    fn test_active_conversation_survives_reopen() {
        let store = Arc::new(MemoryStore::new());
        let mut chat = ChatService::open(store.clone(), config("http://127.0.0.1:9")).unwrap();
        let first = chat.active_id().to_string();
        chat.new_conversation().unwrap();
        assert!(chat.select(&first).unwrap());

        let reopened = ChatService::open(store, config("http://127.0.0.1:9")).unwrap();
        assert_eq!(reopened.active_id(), first);
    }

    #[test]
    fn test_conversation_management() {
        let mut chat =
            ChatService::open(Arc::new(MemoryStore::new()), config("http://127.0.0.1:9")).unwrap();
        let first = chat.active_id().to_string();
        let second = chat.new_conversation().unwrap();
        assert_eq!(chat.conversations()[0].id, second);
        assert_eq!(chat.active_id(), second);

        assert!(chat.select(&first).unwrap());
        assert!(!chat.select("nope").unwrap());
        chat.clear().unwrap();
        assert_eq!(chat.active().unwrap().messages[0].content, RESET_MESSAGE);

        chat.delete(&first).unwrap();
        assert_eq!(chat.active_id(), second);
        chat.delete(&second).unwrap();
        assert_eq!(chat.conversations().len(), 1);
        assert_eq!(chat.active_id(), chat.conversations()[0].id);
    }
}

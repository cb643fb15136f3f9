//! Persisted chat conversations.

use std::sync::Arc;

use chrono::Utc;
use tracing::warn;

use super::{KeyValueStore, KeyValueStoreExt, StoreError};
use crate::models::{ChatMessage, Conversation, Role};

pub const CONVERSATIONS_KEY: &str = "agent-conversations-v2";
/// Id of the conversation last made active.
pub const ACTIVE_KEY: &str = "agent-active-conversation";
/// Older single-conversation history: a bare message array.
pub const LEGACY_HISTORY_KEY: &str = "agent-chat-history";

pub const DEFAULT_TITLE: &str = "New conversation";
pub const LEGACY_TITLE: &str = "Earlier conversation";
pub const WELCOME_MESSAGE: &str = "Hello, I'm your assistant. How can I help you?";
pub const RESET_MESSAGE: &str = "The conversation has been reset. Ask away.";

const TITLE_CHARS: usize = 24;

/// Conversation list with history limits, backed by a key-value store.
#[derive(Clone)]
pub struct ConversationStore {
    store: Arc<dyn KeyValueStore>,
    max_history: usize,
    max_conversations: usize,
}

impl ConversationStore {
    pub fn new(store: Arc<dyn KeyValueStore>, max_history: usize, max_conversations: usize) -> Self {
        Self {
            store,
            max_history: max_history.max(1),
            max_conversations: max_conversations.max(1),
        }
    }

    pub fn max_history(&self) -> usize {
        self.max_history
    }

    /// Load conversations, most recent first.
    ///
    /// Falls back to migrating the legacy history, then to a single fresh
    /// conversation. Never returns an empty list.
    pub fn load(&self) -> Result<Vec<Conversation>, StoreError> {
        match self.store.get_json::<Vec<Conversation>>(CONVERSATIONS_KEY) {
            Ok(Some(list)) if !list.is_empty() => return Ok(list),
            Ok(_) => {}
            Err(StoreError::Corrupt { key, source }) => {
                warn!("Ignoring unreadable conversations under '{}': {}", key, source);
            }
            Err(e) => return Err(e),
        }

        match self.store.get_json::<Vec<ChatMessage>>(LEGACY_HISTORY_KEY) {
            Ok(Some(messages)) => {
                let now = now_millis();
                let mut conversation = Conversation {
                    id: now.to_string(),
                    title: LEGACY_TITLE.to_string(),
                    updated_at: now,
                    messages,
                };
                self.trim(&mut conversation);
                return Ok(vec![conversation]);
            }
            Ok(None) => {}
            Err(StoreError::Corrupt { key, source }) => {
                warn!("Ignoring unreadable legacy history under '{}': {}", key, source);
            }
            Err(e) => return Err(e),
        }

        Ok(vec![self.fresh(&[])])
    }

    pub fn save(&self, conversations: &[Conversation]) -> Result<(), StoreError> {
        self.store.set_json(CONVERSATIONS_KEY, conversations)
    }

    /// The remembered active conversation id, if any.
    pub fn load_active(&self) -> Option<String> {
        self.store.get_json(ACTIVE_KEY).unwrap_or_else(|e| {
            warn!("Ignoring remembered active conversation: {}", e);
            None
        })
    }

    pub fn save_active(&self, id: &str) -> Result<(), StoreError> {
        self.store.set_json(ACTIVE_KEY, id)
    }

    /// Start a conversation at the front of the list and return its id.
    pub fn create(&self, conversations: &mut Vec<Conversation>) -> String {
        let conversation = self.fresh(conversations);
        let id = conversation.id.clone();
        conversations.insert(0, conversation);
        conversations.truncate(self.max_conversations);
        id
    }

    /// Append a message, dropping the oldest beyond the history limit.
    /// Returns the id given to the message.
    pub fn push(&self, conversation: &mut Conversation, role: Role, content: impl Into<String>) -> i64 {
        let id = next_message_id(conversation);
        conversation.messages.push(ChatMessage::new(id, role, content));
        self.trim(conversation);
        conversation.updated_at = now_millis();
        id
    }

    /// Title a conversation after its first user message while it still
    /// carries the default title.
    pub fn retitle_from(&self, conversation: &mut Conversation, user_text: &str) {
        if !conversation.title.is_empty() && conversation.title != DEFAULT_TITLE {
            return;
        }
        let title: String = user_text.trim().chars().take(TITLE_CHARS).collect();
        conversation.title = if title.is_empty() {
            DEFAULT_TITLE.to_string()
        } else {
            title
        };
        conversation.updated_at = now_millis();
    }

    /// Replace the history with a single reset notice.
    pub fn clear(&self, conversation: &mut Conversation) {
        conversation.messages.clear();
        let id = now_millis();
        conversation
            .messages
            .push(ChatMessage::new(id, Role::Assistant, RESET_MESSAGE));
        conversation.updated_at = id;
    }

    /// Remove a conversation and return the id that should be active next.
    ///
    /// Removing the last one leaves a fresh default conversation.
    pub fn delete(
        &self,
        conversations: &mut Vec<Conversation>,
        id: &str,
        active: &str,
    ) -> String {
        conversations.retain(|c| c.id != id);
        if conversations.is_empty() {
            let fresh = self.fresh(&[]);
            let fresh_id = fresh.id.clone();
            conversations.push(fresh);
            return fresh_id;
        }
        if id == active {
            conversations[0].id.clone()
        } else {
            active.to_string()
        }
    }

    fn trim(&self, conversation: &mut Conversation) {
        let len = conversation.messages.len();
        if len > self.max_history {
            conversation.messages.drain(..len - self.max_history);
        }
    }

    fn fresh(&self, existing: &[Conversation]) -> Conversation {
        let mut now = now_millis();
        while existing.iter().any(|c| c.id == now.to_string()) {
            now += 1;
        }
        Conversation {
            id: now.to_string(),
            title: DEFAULT_TITLE.to_string(),
            updated_at: now,
            messages: vec![ChatMessage::new(now, Role::Assistant, WELCOME_MESSAGE)],
        }
    }
}

fn now_millis() -> i64 {
    Utc::now().timestamp_millis()
}

/// Millisecond id, bumped past the newest existing id so ids stay unique.
fn next_message_id(conversation: &Conversation) -> i64 {
    let now = now_millis();
    match conversation.messages.iter().map(|m| m.id).max() {
        Some(last) if last >= now => last + 1,
        _ => now,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryStore;

    fn store(max_history: usize) -> (Arc<MemoryStore>, ConversationStore) {
        let backing = Arc::new(MemoryStore::new());
        let conversations = ConversationStore::new(backing.clone(), max_history, 50);
        (backing, conversations)
    }

    #[test]
    fn test_empty_store_yields_welcome_conversation() {
        let (_, store) = store(40);
        let list = store.load().unwrap();
        assert_eq!(list.len(), 1);
        assert_eq!(list[0].title, DEFAULT_TITLE);
        assert_eq!(list[0].messages.len(), 1);
        assert_eq!(list[0].messages[0].content, WELCOME_MESSAGE);
    }

    #[test]
    fn test_legacy_history_is_migrated_and_capped() {
        let (backing, store) = store(3);
        let legacy: Vec<ChatMessage> = (0..5)
            .map(|i| ChatMessage::new(i, Role::User, format!("m{}", i)))
            .collect();
        backing.set_json(LEGACY_HISTORY_KEY, &legacy).unwrap();

        let list = store.load().unwrap();
        assert_eq!(list.len(), 1);
        assert_eq!(list[0].title, LEGACY_TITLE);
        let contents: Vec<&str> = list[0].messages.iter().map(|m| m.content.as_str()).collect();
        assert_eq!(contents, vec!["m2", "m3", "m4"]);
    }

    #[test]
    fn test_history_keeps_most_recent_messages() {
        let (_, store) = store(4);
        let mut list = store.load().unwrap();
        let conversation = &mut list[0];
        for i in 0..10 {
            store.push(conversation, Role::User, format!("q{}", i));
            assert!(conversation.messages.len() <= 4);
        }
        let contents: Vec<&str> = conversation.messages.iter().map(|m| m.content.as_str()).collect();
        assert_eq!(contents, vec!["q6", "q7", "q8", "q9"]);

        let ids: Vec<i64> = conversation.messages.iter().map(|m| m.id).collect();
        assert!(ids.windows(2).all(|w| w[0] < w[1]));
    }

    #[test]
    fn test_title_from_first_user_message() {
        let (_, store) = store(40);
        let mut list = store.load().unwrap();
        store.retitle_from(&mut list[0], "  What is the capital of France and why?");
        assert_eq!(list[0].title, "What is the capital of F");
        store.retitle_from(&mut list[0], "second question");
        assert_eq!(list[0].title, "What is the capital of F");
    }

    #[test]
    fn test_create_caps_conversation_count() {
        let backing = Arc::new(MemoryStore::new());
        let store = ConversationStore::new(backing, 40, 3);
        let mut list = store.load().unwrap();
        let mut ids = Vec::new();
        for _ in 0..5 {
            ids.push(store.create(&mut list));
        }
        assert_eq!(list.len(), 3);
        assert_eq!(list[0].id, *ids.last().unwrap());
        let unique: std::collections::HashSet<&str> = list.iter().map(|c| c.id.as_str()).collect();
        assert_eq!(unique.len(), 3);
    }

    #[test]
    fn test_delete_and_clear() {
        let (_, store) = store(40);
        let mut list = store.load().unwrap();
        let first = list[0].id.clone();
        let second = store.create(&mut list);

        let active = store.delete(&mut list, &second, &second);
        assert_eq!(active, first);

        let active = store.delete(&mut list, &first, &first);
        assert_eq!(list.len(), 1);
        assert_eq!(list[0].id, active);
        assert_eq!(list[0].messages[0].content, WELCOME_MESSAGE);

        store.push(&mut list[0], Role::User, "hi");
        store.clear(&mut list[0]);
        assert_eq!(list[0].messages.len(), 1);
        assert_eq!(list[0].messages[0].content, RESET_MESSAGE);
    }

    #[test]
    fn test_save_then_load() {
        let (_, store) = store(40);
        let mut list = store.load().unwrap();
        store.push(&mut list[0], Role::User, "persist me");
        store.save(&list).unwrap();
        let loaded = store.load().unwrap();
        assert_eq!(loaded, list);
    }
}

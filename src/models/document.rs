//! Document and token models.
//!
//! Documents are owned by the backend. Tokens are produced once per document
//! version by the backend tokenizer and are only ever read on this side.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

/// A document stored by the backend.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Document {
    pub id: i64,
    pub title: String,
    /// Plain-text body. Older rows may have no content.
    #[serde(default)]
    pub content: Option<String>,
    #[serde(default)]
    pub created_at: Option<NaiveDateTime>,
}

impl Document {
    /// Content or the empty string.
    pub fn text(&self) -> &str {
        self.content.as_deref().unwrap_or("")
    }
}

/// Request body for creating or updating a document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DocumentPayload {
    pub title: String,
    pub content: String,
}

/// One backend-assigned token of a document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DocumentToken {
    #[serde(default)]
    pub id: Option<i64>,
    #[serde(default)]
    pub document_id: Option<i64>,
    /// Position in the token sequence.
    pub token_index: usize,
    /// The literal substring this token covers.
    pub token_text: String,
    #[serde(default)]
    pub is_entity: Option<bool>,
    #[serde(default)]
    pub entity_id: Option<i64>,
    #[serde(default)]
    pub created_at: Option<NaiveDateTime>,
}

impl DocumentToken {
    /// Build a bare token, mostly useful for tests and offline previews.
    pub fn new(token_index: usize, token_text: impl Into<String>) -> Self {
        Self {
            id: None,
            document_id: None,
            token_index,
            token_text: token_text.into(),
            is_entity: None,
            entity_id: None,
            created_at: None,
        }
    }

    /// Build an ordered token sequence from raw texts.
    pub fn sequence<I, S>(texts: I) -> Vec<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        texts
            .into_iter()
            .enumerate()
            .map(|(i, t)| Self::new(i, t))
            .collect()
    }
}

/// A document enriched with annotation counts for listing.
#[derive(Debug, Clone, PartialEq)]
pub struct DocumentSummary {
    pub document: Document,
    pub entity_count: usize,
    pub relation_count: usize,
}

impl DocumentSummary {
    /// A document counts as annotated once it has at least one entity.
    pub fn is_annotated(&self) -> bool {
        self.entity_count > 0
    }
}

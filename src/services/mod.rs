//! Service layer for annobench workflows.
//!
//! Services combine the pure annotation core with backend calls and local
//! state. They are separated from UI concerns so the CLI (or any other front
//! end) only renders what they return.
//!
//! Every mutation validates first, then awaits the backend, then refetches.
//! A failed mutation leaves local state untouched.

pub mod annotation;
pub mod chat;
pub mod documents;
pub mod graph;
pub mod relations;

use thiserror::Error;

use crate::annotation::ValidationError;
use crate::api::ApiError;
use crate::import::ImportError;
use crate::llm::ChatError;
use crate::storage::StoreError;

pub use annotation::{AnnotationSession, MatchReport};
pub use chat::{ChatEvent, ChatService};
pub use documents::{DocumentPage, DocumentService, PAGE_SIZE};
pub use graph::{EdgeDraft, GraphSession, NodeDraft};
pub use relations::{RelationSession, RelationView};

/// Failure of a service operation.
#[derive(Debug, Error)]
pub enum ServiceError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Api(#[from] ApiError),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Chat(#[from] ChatError),

    #[error(transparent)]
    Import(#[from] ImportError),
}

impl ServiceError {
    /// True when the request never left the process.
    pub fn is_validation(&self) -> bool {
        matches!(self, Self::Validation(_))
    }
}

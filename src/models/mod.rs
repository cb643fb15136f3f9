//! Data models for the annotation workbench.

mod annotation;
mod chat;
mod document;
mod graph;
mod prompt;

pub use annotation::{
    EntityItem, EntityItemPayload, EntityLabel, EntityLabelPayload, Relation, RelationLabel,
    RelationLabelPayload, RelationPayload,
};
pub use chat::{ChatMessage, Conversation, Role, WireMessage};
pub use document::{Document, DocumentPayload, DocumentSummary, DocumentToken};
pub use graph::{
    GraphLayout, KgEdge, KgEdgePayload, KgNode, KgNodePayload, KnowledgeGraph, NodePosition,
    Properties,
};
pub use prompt::{PromptFilter, PromptPayload, PromptTemplate};

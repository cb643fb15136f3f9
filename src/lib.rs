//! annobench - entity and relation annotation workbench.
//!
//! Client-side core of an annotation tool: maps text selections onto backend
//! tokens, guards and colors annotations, matches entity text across a
//! document, and talks to the annotation backend and a chat assistant.

pub mod annotation;
pub mod api;
pub mod cli;
pub mod config;
pub mod export;
pub mod import;
pub mod llm;
pub mod models;
pub mod services;
pub mod storage;

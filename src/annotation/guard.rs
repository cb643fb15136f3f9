//! Pre-submission checks run before any create or update call.

use thiserror::Error;

use crate::models::{EntityItem, EntityLabel};

use super::{Annotated, TokenRange};

/// A request rejected before it reached the backend.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("{0} must not be empty")]
    EmptyField(&'static str),

    #[error("no text is selected")]
    MissingSelection,

    #[error("an entity is already annotated at token range {0}")]
    DuplicateRange(TokenRange),

    #[error("a label named '{0}' already exists")]
    DuplicateLabel(String),

    #[error("head and tail must be different entities")]
    SameEndpoints,

    #[error("entity {0} is not annotated on this document")]
    UnknownEntity(i64),

    #[error("no entity label with id {0}")]
    UnknownLabel(i64),

    #[error("entity {entity_id} is already bound to node {node_id}")]
    EntityAlreadyBound { entity_id: i64, node_id: i64 },

    #[error("a node named '{0}' with the same label already exists")]
    DuplicateNode(String),

    #[error("token range {range} is outside the document ({tokens} tokens)")]
    RangeOutOfBounds { range: TokenRange, tokens: usize },
}

/// Reject a candidate range identical to an existing annotation's range.
///
/// Only exact `(start, end)` matches are refused; nested and partially
/// overlapping ranges are accepted. `editing` names the annotation being
/// updated so it does not collide with itself.
pub fn check_range<A: Annotated>(
    existing: &[A],
    candidate: TokenRange,
    editing: Option<i64>,
) -> Result<(), ValidationError> {
    let clash = existing.iter().any(|a| {
        let is_self = editing.is_some() && a.annotation_id() == editing;
        !is_self && a.range() == candidate
    });
    if clash {
        return Err(ValidationError::DuplicateRange(candidate));
    }
    Ok(())
}

/// Validate an entity label name and return it trimmed.
///
/// Names compare case-insensitively after trimming.
pub fn check_label_name(
    labels: &[EntityLabel],
    name: &str,
    editing: Option<i64>,
) -> Result<String, ValidationError> {
    let name = name.trim();
    if name.is_empty() {
        return Err(ValidationError::EmptyField("label name"));
    }
    let lowered = name.to_lowercase();
    let duplicate = labels
        .iter()
        .any(|l| Some(l.id) != editing && l.label_name.trim().to_lowercase() == lowered);
    if duplicate {
        return Err(ValidationError::DuplicateLabel(name.to_string()));
    }
    Ok(name.to_string())
}

/// Validate relation endpoints against the document's entities.
pub fn check_relation(
    entities: &[EntityItem],
    head: i64,
    tail: i64,
) -> Result<(), ValidationError> {
    if head == tail {
        return Err(ValidationError::SameEndpoints);
    }
    for id in [head, tail] {
        if !entities.iter().any(|e| e.id == id) {
            return Err(ValidationError::UnknownEntity(id));
        }
    }
    Ok(())
}

//! Entity, label and relation models.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use crate::annotation::{Annotated, TokenRange};

/// A labeled token range within a document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EntityItem {
    pub id: i64,
    pub document_id: i64,
    pub label_id: i64,
    pub text: String,
    /// First token, inclusive.
    pub token_start: usize,
    /// Last token, inclusive.
    pub token_end: usize,
    #[serde(default)]
    pub created_at: Option<NaiveDateTime>,
}

impl Annotated for EntityItem {
    /// Backend rows with swapped bounds are read as the range they span.
    fn range(&self) -> TokenRange {
        TokenRange::spanning(self.token_start, self.token_end)
    }

    fn label_id(&self) -> Option<i64> {
        Some(self.label_id)
    }

    fn annotation_id(&self) -> Option<i64> {
        Some(self.id)
    }
}

/// Request body for creating or updating an entity item.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EntityItemPayload {
    pub document_id: i64,
    pub label_id: i64,
    pub text: String,
    pub token_start: usize,
    pub token_end: usize,
}

impl EntityItemPayload {
    pub fn new(document_id: i64, label_id: i64, text: impl Into<String>, range: TokenRange) -> Self {
        Self {
            document_id,
            label_id,
            text: text.into(),
            token_start: range.start,
            token_end: range.end,
        }
    }

    pub fn range(&self) -> TokenRange {
        TokenRange::spanning(self.token_start, self.token_end)
    }
}

/// An entity label ("Person", "Organization", ...).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EntityLabel {
    pub id: i64,
    pub label_name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub created_at: Option<NaiveDateTime>,
}

/// Request body for creating or updating an entity label.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EntityLabelPayload {
    pub label_name: String,
    #[serde(default)]
    pub description: Option<String>,
}

/// A relation label ("located_in", "works_for", ...).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RelationLabel {
    pub id: i64,
    pub relation_name: String,
    #[serde(default)]
    pub description: Option<String>,
}

/// Request body for relation labels. Updates carry the id in the body.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RelationLabelPayload {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,
    pub relation_name: String,
    #[serde(default)]
    pub description: Option<String>,
}

/// A directed, labeled link between two entity items.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Relation {
    pub id: i64,
    pub document_id: i64,
    pub relation_label_id: i64,
    pub head_entity_id: i64,
    pub tail_entity_id: i64,
    #[serde(default)]
    pub created_at: Option<String>,
}

/// Request body for relations. Updates carry the id in the body.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RelationPayload {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,
    pub document_id: i64,
    pub relation_label_id: i64,
    pub head_entity_id: i64,
    pub tail_entity_id: i64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_entity_item_wire_names() {
        let json = r#"{"id":7,"documentId":1,"labelId":2,"text":"China","tokenStart":2,"tokenEnd":2}"#;
        let item: EntityItem = serde_json::from_str(json).unwrap();
        assert_eq!(item.range(), TokenRange::new(2, 2));
        assert_eq!(item.annotation_id(), Some(7));
    }

    #[test]
    fn test_swapped_backend_bounds_read_as_span() {
        let json = r#"{"id":8,"documentId":1,"labelId":2,"text":"x","tokenStart":5,"tokenEnd":3}"#;
        let item: EntityItem = serde_json::from_str(json).unwrap();
        assert_eq!(item.range(), TokenRange::new(3, 5));
    }

    #[test]
    fn test_relation_payload_omits_missing_id() {
        let payload = RelationPayload {
            id: None,
            document_id: 1,
            relation_label_id: 4,
            head_entity_id: 10,
            tail_entity_id: 11,
        };
        let json = serde_json::to_value(&payload).unwrap();
        assert!(json.get("id").is_none());
        assert_eq!(json["headEntityId"], 10);
    }
}

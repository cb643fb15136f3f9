//! Knowledge-graph node and edge models.

use std::collections::BTreeMap;

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

/// Free-form key/value properties attached to nodes and edges.
pub type Properties = BTreeMap<String, serde_json::Value>;

/// A knowledge-graph node, optionally bound to an entity item or a label.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct KgNode {
    pub id: i64,
    pub document_id: i64,
    #[serde(default)]
    pub entity_id: Option<i64>,
    #[serde(default)]
    pub label_id: Option<i64>,
    pub name: String,
    #[serde(default)]
    pub properties: Option<Properties>,
    #[serde(default)]
    pub created_at: Option<NaiveDateTime>,
}

/// Request body for creating or updating a node.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct KgNodePayload {
    pub document_id: i64,
    pub name: String,
    pub text: String,
    pub entity_id: Option<i64>,
    pub label_id: Option<i64>,
    pub properties: Option<Properties>,
}

/// A directed knowledge-graph edge.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct KgEdge {
    pub id: i64,
    pub document_id: i64,
    pub source_node_id: i64,
    pub target_node_id: i64,
    #[serde(default)]
    pub relation_label_id: Option<i64>,
    #[serde(default)]
    pub edge_name: Option<String>,
    #[serde(default)]
    pub properties: Option<Properties>,
    #[serde(default)]
    pub created_at: Option<NaiveDateTime>,
}

/// Request body for creating or updating an edge.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct KgEdgePayload {
    pub document_id: i64,
    pub source_node_id: i64,
    pub target_node_id: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub relation_label_id: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub edge_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub properties: Option<Properties>,
}

/// Nodes and edges of one document, as served by the full-graph endpoint.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct KnowledgeGraph {
    #[serde(default)]
    pub nodes: Vec<KgNode>,
    #[serde(default)]
    pub edges: Vec<KgEdge>,
}

/// A pinned node position in a saved graph layout.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct NodePosition {
    pub fx: Option<f64>,
    pub fy: Option<f64>,
}

impl NodePosition {
    pub fn fixed(x: f64, y: f64) -> Self {
        Self {
            fx: Some(x),
            fy: Some(y),
        }
    }
}

/// Saved layout of one document's graph, keyed by node id.
pub type GraphLayout = BTreeMap<String, NodePosition>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_node_with_properties() {
        let json = r#"{"id":1,"documentId":2,"name":"Paris","properties":{"population":2100000}}"#;
        let node: KgNode = serde_json::from_str(json).unwrap();
        assert_eq!(node.entity_id, None);
        let props = node.properties.unwrap();
        assert_eq!(props["population"], 2_100_000);
    }

    #[test]
    fn test_layout_round_trips_null_positions() {
        let json = r#"{"5":{"fx":10.5,"fy":null}}"#;
        let layout: GraphLayout = serde_json::from_str(json).unwrap();
        assert_eq!(layout["5"].fx, Some(10.5));
        assert_eq!(layout["5"].fy, None);
    }
}

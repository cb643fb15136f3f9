//! Knowledge-graph nodes and edges.

use reqwest::Method;

use super::{decode_item, decode_list, ApiError, BackendClient};
use crate::models::{KgEdge, KgEdgePayload, KgNode, KgNodePayload, KnowledgeGraph};

impl BackendClient {
    pub async fn list_nodes(&self, document_id: i64) -> Result<Vec<KgNode>, ApiError> {
        decode_list(
            &self
                .get_bytes(&format!("kg/nodes/document/{}", document_id))
                .await?,
        )
    }

    pub async fn post_node(&self, payload: &KgNodePayload) -> Result<KgNode, ApiError> {
        decode_item(&self.send_json(Method::POST, "kg/nodes", payload).await?)
    }

    pub async fn put_node(&self, id: i64, payload: &KgNodePayload) -> Result<KgNode, ApiError> {
        decode_item(
            &self
                .send_json(Method::PUT, &format!("kg/nodes/{}", id), payload)
                .await?,
        )
    }

    pub async fn remove_node(&self, id: i64) -> Result<(), ApiError> {
        self.delete(&format!("kg/nodes/{}", id)).await.map(|_| ())
    }

    pub async fn list_edges(&self, document_id: i64) -> Result<Vec<KgEdge>, ApiError> {
        decode_list(
            &self
                .get_bytes(&format!("kg/edges/document/{}", document_id))
                .await?,
        )
    }

    pub async fn post_edge(&self, payload: &KgEdgePayload) -> Result<KgEdge, ApiError> {
        decode_item(&self.send_json(Method::POST, "kg/edges", payload).await?)
    }

    pub async fn put_edge(&self, id: i64, payload: &KgEdgePayload) -> Result<KgEdge, ApiError> {
        decode_item(
            &self
                .send_json(Method::PUT, &format!("kg/edges/{}", id), payload)
                .await?,
        )
    }

    pub async fn remove_edge(&self, id: i64) -> Result<(), ApiError> {
        self.delete(&format!("kg/edges/{}", id)).await.map(|_| ())
    }

    /// Nodes and edges in one call.
    pub async fn full_graph(&self, document_id: i64) -> Result<KnowledgeGraph, ApiError> {
        decode_item(&self.get_bytes(&format!("kg/graph/{}", document_id)).await?)
    }
}

#[cfg(test)]
mod tests {
    use axum::http::StatusCode;
    use axum::routing::{delete, get};
    use axum::{Json, Router};
    use serde_json::json;

    use crate::api::testing::serve;

    #[tokio::test]
    async fn test_full_graph_and_delete() {
        let router = Router::new()
            .route(
                "/api/kg/graph/:id",
                get(|| async {
                    Json(json!({
                        "nodes": [
                            {"id": 1, "documentId": 4, "name": "Paris", "entityId": 7},
                            {"id": 2, "documentId": 4, "name": "France", "labelId": 3}
                        ],
                        "edges": [
                            {"id": 9, "documentId": 4, "sourceNodeId": 1, "targetNodeId": 2, "edgeName": "in"}
                        ]
                    }))
                }),
            )
            .route("/api/kg/nodes/:id", delete(|| async { StatusCode::NO_CONTENT }));
        let client = serve(router).await;

        let graph = client.full_graph(4).await.unwrap();
        assert_eq!(graph.nodes.len(), 2);
        assert_eq!(graph.nodes[0].entity_id, Some(7));
        assert_eq!(graph.edges[0].edge_name.as_deref(), Some("in"));

        client.remove_node(1).await.unwrap();
    }
}

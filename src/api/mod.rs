//! REST client for the annotation backend.
//!
//! Every resource lives in its own file as an `impl BackendClient` block.
//! Services talk to the backend through the traits at the bottom of this
//! module so they can be exercised against in-memory fakes.

mod ai;
mod decode;
mod documents;
mod entities;
mod error;
mod graph;
mod prompts;
mod relations;

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, Method, RequestBuilder, Response};
use serde::Serialize;
use tracing::debug;

pub use ai::AiReply;
pub use decode::{decode_ack, decode_item, decode_list};
pub use error::ApiError;

use crate::config::BackendConfig;
use crate::models::{
    Document, DocumentPayload, DocumentToken, EntityItem, EntityItemPayload, EntityLabel, EntityLabelPayload, KgEdge,
    KgEdgePayload, KgNode, KgNodePayload, Relation, RelationLabel, RelationPayload,
};

/// HTTP client bound to one backend base URL.
#[derive(Debug, Clone)]
pub struct BackendClient {
    base: String,
    http: Client,
}

impl BackendClient {
    pub fn new(config: &BackendConfig) -> Result<Self, ApiError> {
        url::Url::parse(&config.base_url)
            .map_err(|e| ApiError::Url(format!("{}: {}", config.base_url, e)))?;
        let http = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;
        Ok(Self {
            base: config.base_url.trim_end_matches('/').to_string(),
            http,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base, path.trim_start_matches('/'))
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        let url = self.url(path);
        debug!("{} {}", method, url);
        self.http.request(method, url)
    }

    /// Send and turn any non-2xx status into `ApiError::Status`.
    async fn execute(&self, request: RequestBuilder) -> Result<Response, ApiError> {
        let response = request.send().await?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            debug!("backend answered {}: {}", status, body);
            return Err(ApiError::Status {
                status: status.as_u16(),
                body,
            });
        }
        Ok(response)
    }

    async fn get_bytes(&self, path: &str) -> Result<Vec<u8>, ApiError> {
        let response = self.execute(self.request(Method::GET, path)).await?;
        Ok(response.bytes().await?.to_vec())
    }

    async fn send_json<B: Serialize + ?Sized>(
        &self,
        method: Method,
        path: &str,
        body: &B,
    ) -> Result<Vec<u8>, ApiError> {
        let response = self
            .execute(self.request(method, path).json(body))
            .await?;
        Ok(response.bytes().await?.to_vec())
    }

    /// DELETE; success is judged by status alone.
    async fn delete(&self, path: &str) -> Result<Vec<u8>, ApiError> {
        let response = self.execute(self.request(Method::DELETE, path)).await?;
        Ok(response.bytes().await?.to_vec())
    }
}

/// Backend operations on whole documents.
#[async_trait]
pub trait DocumentBackend: Send + Sync {
    async fn documents(&self) -> Result<Vec<Document>, ApiError>;
    async fn create_document(&self, payload: &DocumentPayload) -> Result<Document, ApiError>;
    async fn update_document(&self, id: i64, payload: &DocumentPayload) -> Result<(), ApiError>;
    async fn delete_document(&self, id: i64) -> Result<(), ApiError>;
}

/// Backend operations the annotation session needs.
#[async_trait]
pub trait AnnotationBackend: Send + Sync {
    async fn tokens(&self, document_id: i64) -> Result<Vec<DocumentToken>, ApiError>;
    async fn entity_items(&self, document_id: i64) -> Result<Vec<EntityItem>, ApiError>;
    async fn entity_labels(&self) -> Result<Vec<EntityLabel>, ApiError>;
    async fn create_entity_item(&self, payload: &EntityItemPayload) -> Result<(), ApiError>;
    async fn update_entity_item(&self, id: i64, payload: &EntityItemPayload) -> Result<(), ApiError>;
    async fn delete_entity_item(&self, id: i64) -> Result<(), ApiError>;
    async fn create_entity_label(&self, payload: &EntityLabelPayload) -> Result<(), ApiError>;
    async fn update_entity_label(&self, id: i64, payload: &EntityLabelPayload) -> Result<(), ApiError>;
    async fn delete_entity_label(&self, id: i64) -> Result<(), ApiError>;
}

/// Backend operations for relations between entity items.
#[async_trait]
pub trait RelationBackend: Send + Sync {
    async fn relations(&self, document_id: i64) -> Result<Vec<Relation>, ApiError>;
    async fn relation_labels(&self) -> Result<Vec<RelationLabel>, ApiError>;
    async fn create_relation(&self, payload: &RelationPayload) -> Result<(), ApiError>;
    async fn update_relation(&self, payload: &RelationPayload) -> Result<(), ApiError>;
    async fn delete_relation(&self, id: i64) -> Result<(), ApiError>;
}

/// Backend operations for the knowledge graph.
#[async_trait]
pub trait GraphBackend: Send + Sync {
    async fn nodes(&self, document_id: i64) -> Result<Vec<KgNode>, ApiError>;
    async fn edges(&self, document_id: i64) -> Result<Vec<KgEdge>, ApiError>;
    async fn create_node(&self, payload: &KgNodePayload) -> Result<(), ApiError>;
    async fn update_node(&self, id: i64, payload: &KgNodePayload) -> Result<(), ApiError>;
    async fn delete_node(&self, id: i64) -> Result<(), ApiError>;
    async fn create_edge(&self, payload: &KgEdgePayload) -> Result<(), ApiError>;
    async fn update_edge(&self, id: i64, payload: &KgEdgePayload) -> Result<(), ApiError>;
    async fn delete_edge(&self, id: i64) -> Result<(), ApiError>;
}

#[async_trait]
impl DocumentBackend for BackendClient {
    async fn documents(&self) -> Result<Vec<Document>, ApiError> {
        self.list_documents().await
    }
    async fn create_document(&self, payload: &DocumentPayload) -> Result<Document, ApiError> {
        BackendClient::create_document(self, payload).await
    }
    async fn update_document(&self, id: i64, payload: &DocumentPayload) -> Result<(), ApiError> {
        BackendClient::update_document(self, id, payload).await.map(|_| ())
    }
    async fn delete_document(&self, id: i64) -> Result<(), ApiError> {
        BackendClient::delete_document(self, id).await
    }
}

#[async_trait]
impl AnnotationBackend for BackendClient {
    async fn tokens(&self, document_id: i64) -> Result<Vec<DocumentToken>, ApiError> {
        self.document_tokens(document_id).await
    }
    async fn entity_items(&self, document_id: i64) -> Result<Vec<EntityItem>, ApiError> {
        self.list_entity_items(document_id).await
    }
    async fn entity_labels(&self) -> Result<Vec<EntityLabel>, ApiError> {
        self.list_entity_labels().await
    }
    async fn create_entity_item(&self, payload: &EntityItemPayload) -> Result<(), ApiError> {
        self.post_entity_item(payload).await.map(|_| ())
    }
    async fn update_entity_item(&self, id: i64, payload: &EntityItemPayload) -> Result<(), ApiError> {
        self.put_entity_item(id, payload).await.map(|_| ())
    }
    async fn delete_entity_item(&self, id: i64) -> Result<(), ApiError> {
        self.remove_entity_item(id).await
    }
    async fn create_entity_label(&self, payload: &EntityLabelPayload) -> Result<(), ApiError> {
        self.post_entity_label(payload).await.map(|_| ())
    }
    async fn update_entity_label(&self, id: i64, payload: &EntityLabelPayload) -> Result<(), ApiError> {
        self.put_entity_label(id, payload).await.map(|_| ())
    }
    async fn delete_entity_label(&self, id: i64) -> Result<(), ApiError> {
        self.remove_entity_label(id).await
    }
}

#[async_trait]
impl RelationBackend for BackendClient {
    async fn relations(&self, document_id: i64) -> Result<Vec<Relation>, ApiError> {
        self.list_relations(document_id).await
    }
    async fn relation_labels(&self) -> Result<Vec<RelationLabel>, ApiError> {
        self.list_relation_labels().await
    }
    async fn create_relation(&self, payload: &RelationPayload) -> Result<(), ApiError> {
        self.post_relation(payload).await
    }
    async fn update_relation(&self, payload: &RelationPayload) -> Result<(), ApiError> {
        self.put_relation(payload).await
    }
    async fn delete_relation(&self, id: i64) -> Result<(), ApiError> {
        self.remove_relation(id).await
    }
}

#[async_trait]
impl GraphBackend for BackendClient {
    async fn nodes(&self, document_id: i64) -> Result<Vec<KgNode>, ApiError> {
        self.list_nodes(document_id).await
    }
    async fn edges(&self, document_id: i64) -> Result<Vec<KgEdge>, ApiError> {
        self.list_edges(document_id).await
    }
    async fn create_node(&self, payload: &KgNodePayload) -> Result<(), ApiError> {
        self.post_node(payload).await.map(|_| ())
    }
    async fn update_node(&self, id: i64, payload: &KgNodePayload) -> Result<(), ApiError> {
        self.put_node(id, payload).await.map(|_| ())
    }
    async fn delete_node(&self, id: i64) -> Result<(), ApiError> {
        self.remove_node(id).await
    }
    async fn create_edge(&self, payload: &KgEdgePayload) -> Result<(), ApiError> {
        self.post_edge(payload).await.map(|_| ())
    }
    async fn update_edge(&self, id: i64, payload: &KgEdgePayload) -> Result<(), ApiError> {
        self.put_edge(id, payload).await.map(|_| ())
    }
    async fn delete_edge(&self, id: i64) -> Result<(), ApiError> {
        self.remove_edge(id).await
    }
}


#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::BackendConfig;

    #[test]
    fn test_url_joining() {
        let config = BackendConfig {
            base_url: "http://localhost:8080/api/".to_string(),
            timeout_secs: 5,
        };
        let client = BackendClient::new(&config).unwrap();
        assert_eq!(client.base_url(), "http://localhost:8080/api");
        assert_eq!(client.url("/documents/3"), "http://localhost:8080/api/documents/3");
        assert_eq!(client.url("entity-labels"), "http://localhost:8080/api/entity-labels");
    }

    #[test]
    fn test_invalid_base_url_is_rejected() {
        let config = BackendConfig {
            base_url: "not a url".to_string(),
            timeout_secs: 5,
        };
        assert!(matches!(BackendClient::new(&config), Err(ApiError::Url(_))));
    }
}

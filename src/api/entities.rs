//! Entity items and entity labels.

use reqwest::Method;

use super::{decode_item, decode_list, ApiError, BackendClient};
use crate::models::{EntityItem, EntityItemPayload, EntityLabel, EntityLabelPayload};

impl BackendClient {
    pub async fn list_entity_items(&self, document_id: i64) -> Result<Vec<EntityItem>, ApiError> {
        decode_list(
            &self
                .get_bytes(&format!("entity-items/document/{}", document_id))
                .await?,
        )
    }

    pub async fn get_entity_item(&self, id: i64) -> Result<EntityItem, ApiError> {
        decode_item(&self.get_bytes(&format!("entity-items/{}", id)).await?)
    }

    pub async fn post_entity_item(&self, payload: &EntityItemPayload) -> Result<EntityItem, ApiError> {
        decode_item(&self.send_json(Method::POST, "entity-items", payload).await?)
    }

    pub async fn put_entity_item(
        &self,
        id: i64,
        payload: &EntityItemPayload,
    ) -> Result<EntityItem, ApiError> {
        decode_item(
            &self
                .send_json(Method::PUT, &format!("entity-items/{}", id), payload)
                .await?,
        )
    }

    pub async fn remove_entity_item(&self, id: i64) -> Result<(), ApiError> {
        self.delete(&format!("entity-items/{}", id)).await.map(|_| ())
    }

    pub async fn list_entity_labels(&self) -> Result<Vec<EntityLabel>, ApiError> {
        decode_list(&self.get_bytes("entity-labels").await?)
    }

    pub async fn get_entity_label(&self, id: i64) -> Result<EntityLabel, ApiError> {
        decode_item(&self.get_bytes(&format!("entity-labels/{}", id)).await?)
    }

    pub async fn post_entity_label(
        &self,
        payload: &EntityLabelPayload,
    ) -> Result<EntityLabel, ApiError> {
        decode_item(&self.send_json(Method::POST, "entity-labels", payload).await?)
    }

    pub async fn put_entity_label(
        &self,
        id: i64,
        payload: &EntityLabelPayload,
    ) -> Result<EntityLabel, ApiError> {
        decode_item(
            &self
                .send_json(Method::PUT, &format!("entity-labels/{}", id), payload)
                .await?,
        )
    }

    pub async fn remove_entity_label(&self, id: i64) -> Result<(), ApiError> {
        self.delete(&format!("entity-labels/{}", id)).await.map(|_| ())
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use axum::extract::State;
    use axum::http::StatusCode;
    use axum::routing::{get, post, put};
    use axum::{Json, Router};
    use serde_json::{json, Value};

    use crate::annotation::TokenRange;
    use crate::api::testing::serve;
    use crate::models::{EntityItemPayload, EntityLabelPayload};

    #[tokio::test]
    async fn test_entity_items_accept_enveloped_lists() {
        let router = Router::new().route(
            "/api/entity-items/document/:id",
            get(|| async {
                Json(json!({"data": [
                    {"id": 7, "documentId": 1, "labelId": 2, "text": "China", "tokenStart": 2, "tokenEnd": 2}
                ]}))
            }),
        );
        let client = serve(router).await;
        let items = client.list_entity_items(1).await.unwrap();
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].text, "China");
    }

    #[tokio::test]
    async fn test_create_sends_camel_case_body() {
        let seen: Arc<Mutex<Option<Value>>> = Arc::default();
        let router = Router::new()
            .route(
                "/api/entity-items",
                post(
                    |State(seen): State<Arc<Mutex<Option<Value>>>>, Json(body): Json<Value>| async move {
                        *seen.lock().unwrap() = Some(body.clone());
                        let mut created = body;
                        created["id"] = json!(11);
                        Json(created)
                    },
                ),
            )
            .with_state(seen.clone());
        let client = serve(router).await;

        let payload = EntityItemPayload::new(1, 2, "China", TokenRange::single(2));
        let created = client.post_entity_item(&payload).await.unwrap();
        assert_eq!(created.id, 11);

        let body = seen.lock().unwrap().clone().unwrap();
        assert_eq!(body["documentId"], 1);
        assert_eq!(body["tokenStart"], 2);
        assert_eq!(body["tokenEnd"], 2);
    }

    #[tokio::test]
    async fn test_label_update_surfaces_backend_text() {
        let router = Router::new().route(
            "/api/entity-labels/:id",
            put(|| async { (StatusCode::CONFLICT, "label name already used") }),
        );
        let client = serve(router).await;
        let err = client
            .put_entity_label(
                4,
                &EntityLabelPayload {
                    label_name: "Person".to_string(),
                    description: None,
                },
            )
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "label name already used");
    }
}

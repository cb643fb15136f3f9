//! Relations and relation labels. These endpoints use the response envelope
//! and put the id of an update in the body.

use reqwest::Method;

use super::{decode_ack, decode_item, decode_list, ApiError, BackendClient};
use crate::models::{Relation, RelationLabel, RelationLabelPayload, RelationPayload};

impl BackendClient {
    pub async fn list_relations(&self, document_id: i64) -> Result<Vec<Relation>, ApiError> {
        decode_list(
            &self
                .get_bytes(&format!("relations/document/{}", document_id))
                .await?,
        )
    }

    pub async fn get_relation(&self, id: i64) -> Result<Relation, ApiError> {
        decode_item(&self.get_bytes(&format!("relations/{}", id)).await?)
    }

    pub async fn post_relation(&self, payload: &RelationPayload) -> Result<(), ApiError> {
        decode_ack(&self.send_json(Method::POST, "relations", payload).await?)
    }

    pub async fn put_relation(&self, payload: &RelationPayload) -> Result<(), ApiError> {
        decode_ack(&self.send_json(Method::PUT, "relations", payload).await?)
    }

    pub async fn remove_relation(&self, id: i64) -> Result<(), ApiError> {
        decode_ack(&self.delete(&format!("relations/{}", id)).await?)
    }

    pub async fn list_relation_labels(&self) -> Result<Vec<RelationLabel>, ApiError> {
        decode_list(&self.get_bytes("relation-labels").await?)
    }

    pub async fn get_relation_label(&self, id: i64) -> Result<RelationLabel, ApiError> {
        decode_item(&self.get_bytes(&format!("relation-labels/{}", id)).await?)
    }

    pub async fn create_relation_label(&self, payload: &RelationLabelPayload) -> Result<(), ApiError> {
        decode_ack(&self.send_json(Method::POST, "relation-labels", payload).await?)
    }

    pub async fn update_relation_label(&self, payload: &RelationLabelPayload) -> Result<(), ApiError> {
        decode_ack(&self.send_json(Method::PUT, "relation-labels", payload).await?)
    }

    pub async fn delete_relation_label(&self, id: i64) -> Result<(), ApiError> {
        decode_ack(&self.delete(&format!("relation-labels/{}", id)).await?)
    }
}

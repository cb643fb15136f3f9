//! Documents and their tokens.

use reqwest::Method;

use super::{decode_item, decode_list, ApiError, BackendClient};
use crate::models::{Document, DocumentPayload, DocumentToken};

impl BackendClient {
    pub async fn list_documents(&self) -> Result<Vec<Document>, ApiError> {
        decode_list(&self.get_bytes("documents").await?)
    }

    pub async fn get_document(&self, id: i64) -> Result<Document, ApiError> {
        decode_item(&self.get_bytes(&format!("documents/{}", id)).await?)
    }

    pub async fn create_document(&self, payload: &DocumentPayload) -> Result<Document, ApiError> {
        decode_item(&self.send_json(Method::POST, "documents", payload).await?)
    }

    pub async fn update_document(
        &self,
        id: i64,
        payload: &DocumentPayload,
    ) -> Result<Document, ApiError> {
        decode_item(
            &self
                .send_json(Method::PUT, &format!("documents/{}", id), payload)
                .await?,
        )
    }

    pub async fn delete_document(&self, id: i64) -> Result<(), ApiError> {
        self.delete(&format!("documents/{}", id)).await.map(|_| ())
    }

    /// Tokens of a document in index order.
    pub async fn document_tokens(&self, document_id: i64) -> Result<Vec<DocumentToken>, ApiError> {
        let mut tokens: Vec<DocumentToken> = decode_list(
            &self
                .get_bytes(&format!("document-tokens/document/{}", document_id))
                .await?,
        )?;
        tokens.sort_by_key(|t| t.token_index);
        Ok(tokens)
    }
}

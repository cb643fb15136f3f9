//! Prompt templates. All routes use the response envelope.

use reqwest::Method;

use super::{decode_ack, decode_item, decode_list, ApiError, BackendClient};
use crate::models::{PromptFilter, PromptPayload, PromptTemplate};

impl BackendClient {
    pub async fn list_prompts(&self, filter: &PromptFilter) -> Result<Vec<PromptTemplate>, ApiError> {
        let request = self
            .request(Method::GET, "prompts")
            .query(&filter.query_pairs());
        let response = self.execute(request).await?;
        decode_list(&response.bytes().await?)
    }

    pub async fn get_prompt(&self, id: i64) -> Result<PromptTemplate, ApiError> {
        decode_item(&self.get_bytes(&format!("prompts/{}", id)).await?)
    }

    pub async fn create_prompt(&self, payload: &PromptPayload) -> Result<(), ApiError> {
        decode_ack(&self.send_json(Method::POST, "prompts", payload).await?)
    }

    /// Update; the id travels in the payload.
    pub async fn update_prompt(&self, payload: &PromptPayload) -> Result<(), ApiError> {
        decode_ack(&self.send_json(Method::PUT, "prompts", payload).await?)
    }

    pub async fn delete_prompt(&self, id: i64) -> Result<(), ApiError> {
        decode_ack(&self.delete(&format!("prompts/{}", id)).await?)
    }

    pub async fn set_prompt_active(&self, id: i64, active: bool) -> Result<(), ApiError> {
        let action = if active { "activate" } else { "deactivate" };
        let response = self
            .execute(self.request(Method::POST, &format!("prompts/{}/{}", id, action)))
            .await?;
        decode_ack(&response.bytes().await?)
    }
}

//! AI-assisted operations. These answer with JSON or plain text depending on
//! the route and backend version, so replies are branched on content type.

use futures::future::{AbortRegistration, Abortable};
use reqwest::header::CONTENT_TYPE;
use reqwest::Method;
use serde::Serialize;
use serde_json::Value;
use tracing::info;

use super::{decode_list, ApiError, BackendClient};

/// Reply of an AI route.
#[derive(Debug, Clone, PartialEq)]
pub enum AiReply {
    Json(Value),
    Text(String),
}

impl AiReply {
    /// Human-readable rendering: text as is, JSON pretty-printed.
    pub fn to_display(&self) -> String {
        match self {
            Self::Text(text) => text.clone(),
            Self::Json(value) => match value {
                Value::String(s) => s.clone(),
                other => serde_json::to_string_pretty(other).unwrap_or_else(|_| other.to_string()),
            },
        }
    }
}

#[derive(Debug, Serialize)]
struct CsvAnalysisRequest<'a> {
    files: &'a [String],
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct BusinessReportRequest<'a> {
    document_id: i64,
    raw_analysis: &'a str,
}

impl BackendClient {
    /// Run automatic entity extraction on a document.
    pub async fn auto_extract(&self, document_id: i64) -> Result<AiReply, ApiError> {
        info!("Requesting automatic extraction for document {}", document_id);
        let response = self
            .execute(self.request(Method::POST, &format!("ai/extract/{}", document_id)))
            .await?;
        let is_json = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .is_some_and(|v| v.contains("json"));
        let body = response.bytes().await?;
        if is_json {
            Ok(AiReply::Json(serde_json::from_slice(&body)?))
        } else {
            Ok(AiReply::Text(String::from_utf8_lossy(&body).into_owned()))
        }
    }

    /// CSV files the backend can correlate with documents.
    pub async fn csv_files(&self) -> Result<Vec<String>, ApiError> {
        decode_list(&self.get_bytes("ai/csv-files").await?)
    }

    /// Analyse a document against CSV files.
    ///
    /// When `abort` is given, aborting its handle cancels this call only and
    /// yields `ApiError::Aborted`.
    pub async fn analyze_csv(
        &self,
        document_id: i64,
        files: &[String],
        abort: Option<AbortRegistration>,
    ) -> Result<String, ApiError> {
        let call = async {
            let response = self
                .execute(
                    self.request(Method::POST, &format!("ai/analyze-csv/{}", document_id))
                        .json(&CsvAnalysisRequest { files }),
                )
                .await?;
            Ok::<_, ApiError>(response.text().await?)
        };
        match abort {
            Some(registration) => Abortable::new(call, registration)
                .await
                .map_err(|_| ApiError::Aborted)?,
            None => call.await,
        }
    }

    /// Turn a raw analysis into a business report.
    pub async fn business_report(
        &self,
        document_id: i64,
        raw_analysis: &str,
    ) -> Result<String, ApiError> {
        let response = self
            .execute(
                self.request(Method::POST, "ai/generate-business-report")
                    .json(&BusinessReportRequest {
                        document_id,
                        raw_analysis,
                    }),
            )
            .await?;
        Ok(response.text().await?)
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use axum::http::StatusCode;
    use axum::routing::{get, post};
    use axum::{Json, Router};
    use futures::future::AbortHandle;
    use serde_json::{json, Value};

    use super::*;
    use crate::api::testing::serve;

    fn router() -> Router {
        Router::new()
            .route("/api/ai/extract/:id", post(|| async { "Success" }))
            .route(
                "/api/ai/csv-files",
                get(|| async { Json(json!(["sales.csv", "stores.csv"])) }),
            )
            .route(
                "/api/ai/analyze-csv/:id",
                post(|Json(body): Json<Value>| async move {
                    let files = body["files"].as_array().cloned().unwrap_or_default();
                    if files.is_empty() {
                        return (StatusCode::BAD_REQUEST, "select CSV files first".to_string());
                    }
                    if files[0] == "slow.csv" {
                        tokio::time::sleep(Duration::from_secs(3)).await;
                    }
                    (StatusCode::OK, format!("analysed {} files", files.len()))
                }),
            )
            .route(
                "/api/ai/generate-business-report",
                post(|Json(body): Json<Value>| async move {
                    format!("report for {}", body["documentId"])
                }),
            )
    }

    #[tokio::test]
    async fn test_extract_returns_text_reply() {
        let client = serve(router()).await;
        let reply = client.auto_extract(1).await.unwrap();
        assert_eq!(reply, AiReply::Text("Success".to_string()));
    }

    #[test]
    fn test_json_reply_display() {
        assert_eq!(AiReply::Json(json!("done")).to_display(), "done");
        assert!(AiReply::Json(json!({"count": 2})).to_display().contains("\"count\": 2"));
    }

    #[tokio::test]
    async fn test_csv_analysis_flow() {
        let client = serve(router()).await;
        let files = client.csv_files().await.unwrap();
        assert_eq!(files.len(), 2);

        let report = client.analyze_csv(1, &files, None).await.unwrap();
        assert_eq!(report, "analysed 2 files");

        let err = client.analyze_csv(1, &[], None).await.unwrap_err();
        assert_eq!(err.to_string(), "select CSV files first");

        let business = client.business_report(5, &report).await.unwrap();
        assert_eq!(business, "report for 5");
    }

    #[tokio::test]
    async fn test_csv_analysis_can_be_aborted() {
        let client = serve(router()).await;
        let (handle, registration) = AbortHandle::new_pair();
        let files = vec!["slow.csv".to_string()];
        let call = client.analyze_csv(1, &files, Some(registration));
        let aborter = async {
            tokio::time::sleep(Duration::from_millis(50)).await;
            handle.abort();
        };
        let (result, _) = tokio::join!(call, aborter);
        assert!(matches!(result, Err(ApiError::Aborted)));
    }
}

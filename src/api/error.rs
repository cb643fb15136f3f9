//! Errors returned by the backend client.

use thiserror::Error;

/// Failure talking to the backend.
#[derive(Debug, Error)]
pub enum ApiError {
    /// Transport failure: connection refused, timeout, TLS...
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// Non-2xx response; the body is the backend's own error text.
    #[error("{}", status_text(.status, .body))]
    Status { status: u16, body: String },

    /// Enveloped response with a non-zero code.
    #[error("{message}")]
    Backend { code: i64, message: String },

    /// Body that is neither the expected bare shape nor a `data` envelope.
    #[error("unexpected response shape: {0}")]
    Shape(String),

    #[error("failed to decode response: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("request was aborted")]
    Aborted,

    #[error("invalid backend url: {0}")]
    Url(String),
}

fn status_text(status: &u16, body: &str) -> String {
    let body = body.trim();
    if body.is_empty() {
        format!("HTTP {}", status)
    } else {
        body.to_string()
    }
}

impl ApiError {
    /// True for 404 responses.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::Status { status: 404, .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_error_shows_backend_text_verbatim() {
        let err = ApiError::Status {
            status: 400,
            body: "labelName is required".to_string(),
        };
        assert_eq!(err.to_string(), "labelName is required");

        let err = ApiError::Status {
            status: 502,
            body: "  ".to_string(),
        };
        assert_eq!(err.to_string(), "HTTP 502");
    }
}

use std::time::Duration;

use reqwest::{Client, StatusCode};
use serde::Deserialize;

use crate::config::DocumentsConfig;

use super::DocumentBundle;

/// Failure talking to the document service. Requests are single-attempt;
/// nothing here retries.
#[derive(Debug, thiserror::Error)]
pub enum DocumentsError {
    #[error("document service request failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("document service returned {0}")]
    Status(StatusCode),
    #[error("{0}")]
    Rejected(String),
}

/// Response envelope the document service wraps every payload in.
#[derive(Debug, Deserialize)]
pub struct DocumentsEnvelope {
    #[serde(default)]
    pub success: bool,
    pub data: Option<DocumentBundle>,
    pub error: Option<String>,
}

impl DocumentsEnvelope {
    /// Unwrap the envelope, folding `success: false` and a success with no
    /// body into a rejection carrying the service's own message.
    pub fn into_result(self) -> Result<DocumentBundle, DocumentsError> {
        if !self.success {
            let message = self
                .error
                .unwrap_or_else(|| "Failed to fetch documents".to_string());
            return Err(DocumentsError::Rejected(message));
        }
        self.data
            .ok_or_else(|| DocumentsError::Rejected("Failed to fetch documents".to_string()))
    }
}

/// HTTP client for the document upload service.
///
/// Cheap to clone, the inner [`reqwest::Client`] is `Arc`-based.
#[derive(Clone)]
pub struct DocumentsClient {
    client: Client,
    base_url: String,
}

impl DocumentsClient {
    pub fn new(config: &DocumentsConfig) -> Result<Self, DocumentsError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(30))
            .build()?;
        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }

    /// `GET /get-documents?uid=<id>`
    pub async fn fetch_bundle(&self, uid: &str) -> Result<DocumentBundle, DocumentsError> {
        let response = self
            .client
            .get(self.url("/get-documents"))
            .query(&[("uid", uid)])
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(DocumentsError::Status(response.status()));
        }

        let envelope: DocumentsEnvelope = response.json().await?;
        envelope.into_result()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn successful_envelope_yields_the_bundle() {
        let envelope: DocumentsEnvelope = serde_json::from_value(serde_json::json!({
            "success": true,
            "data": {
                "uid": "app-001",
                "firstName": "Thabo",
                "documents": { "studentIdCopy": "https://files.example/id.pdf" },
            },
        }))
        .expect("envelope decodes");

        let bundle = envelope.into_result().expect("bundle present");
        assert_eq!(bundle.uid.as_deref(), Some("app-001"));
    }

    #[test]
    fn rejection_carries_the_service_message() {
        let envelope: DocumentsEnvelope = serde_json::from_value(serde_json::json!({
            "success": false,
            "error": "not found",
        }))
        .expect("envelope decodes");

        let err = envelope.into_result().expect_err("rejected");
        assert_eq!(err.to_string(), "not found");
    }

    #[test]
    fn missing_success_flag_counts_as_rejection() {
        let envelope: DocumentsEnvelope =
            serde_json::from_value(serde_json::json!({ "data": null })).expect("envelope decodes");

        let err = envelope.into_result().expect_err("rejected");
        assert_eq!(err.to_string(), "Failed to fetch documents");
    }

    #[test]
    fn success_without_data_counts_as_rejection() {
        let envelope: DocumentsEnvelope =
            serde_json::from_value(serde_json::json!({ "success": true }))
                .expect("envelope decodes");

        assert!(envelope.into_result().is_err());
    }
}

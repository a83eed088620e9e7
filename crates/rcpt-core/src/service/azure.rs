//! Azure Document Intelligence client for the prebuilt receipt model.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{CONTENT_TYPE, HeaderMap};
use reqwest::{Client, Response, StatusCode};
use tracing::{debug, trace};

use crate::error::{ScanError, ServiceError};
use crate::input::DocumentUpload;
use crate::models::config::{Credentials, ServiceConfig};

use super::response::{AnalyzeOperation, ErrorResponse, OperationStatus};
use super::{AnalyzedDocument, DocumentAnalyzer, Result};

const KEY_HEADER: &str = "Ocp-Apim-Subscription-Key";
const OPERATION_LOCATION: &str = "Operation-Location";

/// Client for `{endpoint}/documentintelligence/documentModels/{model}:analyze`.
///
/// Cheap to share: the HTTP connection pool and credentials sit behind `Arc`.
#[derive(Clone)]
pub struct AzureReceiptClient {
    client: Client,
    credentials: Arc<Credentials>,
    model_id: String,
    api_version: String,
    poll_interval: Duration,
    max_polls: u32,
}

impl AzureReceiptClient {
    /// Create a client from shared credentials and service settings.
    pub fn new(credentials: Arc<Credentials>, config: &ServiceConfig) -> std::result::Result<Self, ScanError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()
            .map_err(|e| ScanError::Config(format!("failed to build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            credentials,
            model_id: config.model_id.clone(),
            api_version: config.api_version.clone(),
            poll_interval: Duration::from_millis(config.poll_interval_ms),
            max_polls: config.max_polls,
        })
    }

    /// URL of the analyze endpoint.
    pub fn analyze_url(&self) -> String {
        format!(
            "{}/documentintelligence/documentModels/{}:analyze?api-version={}",
            self.credentials.endpoint(),
            self.model_id,
            self.api_version
        )
    }

    async fn submit(&self, upload: &DocumentUpload) -> Result<String> {
        let response = self
            .client
            .post(self.analyze_url())
            .header(KEY_HEADER, self.credentials.key())
            .header(CONTENT_TYPE, upload.format.content_type())
            .body(upload.bytes.clone())
            .send()
            .await
            .map_err(transport_error)?;

        let response = check_status(response).await?;
        operation_location(response.headers())
    }

    async fn poll(&self, location: &str, file_name: &str) -> Result<AnalyzedDocument> {
        for attempt in 1..=self.max_polls {
            tokio::time::sleep(self.poll_interval).await;

            let response = self
                .client
                .get(location)
                .header(KEY_HEADER, self.credentials.key())
                .send()
                .await
                .map_err(transport_error)?;

            let response = check_status(response).await?;
            let operation: AnalyzeOperation = response
                .json()
                .await
                .map_err(|e| ServiceError::MalformedResponse(format!("invalid operation body: {}", e)))?;

            trace!(file = file_name, attempt, status = ?operation.status, "Polled analyze operation");

            match operation.status {
                OperationStatus::Succeeded => {
                    let result = operation.analyze_result.ok_or_else(|| {
                        ServiceError::MalformedResponse("succeeded without analyzeResult".to_string())
                    })?;
                    return Ok(result.into_document());
                }
                OperationStatus::Failed | OperationStatus::Canceled => {
                    let reason = operation
                        .error
                        .map(|e| e.describe())
                        .unwrap_or_else(|| format!("operation {:?}", operation.status));
                    return Err(ServiceError::AnalysisFailed(reason));
                }
                OperationStatus::NotStarted | OperationStatus::Running | OperationStatus::Unknown => {}
            }
        }

        Err(ServiceError::Timeout(format!(
            "analysis of {} not finished after {} polls",
            file_name, self.max_polls
        )))
    }
}

#[async_trait]
impl DocumentAnalyzer for AzureReceiptClient {
    fn name(&self) -> &str {
        "azure"
    }

    async fn analyze(&self, upload: &DocumentUpload) -> Result<AnalyzedDocument> {
        debug!(
            file = upload.file_name(),
            model = %self.model_id,
            bytes = upload.bytes.len(),
            "Submitting document for analysis"
        );

        let location = self.submit(upload).await?;
        self.poll(&location, upload.file_name()).await
    }
}

fn transport_error(e: reqwest::Error) -> ServiceError {
    if e.is_timeout() {
        ServiceError::Timeout(e.to_string())
    } else {
        ServiceError::Network(e.to_string())
    }
}

/// Pass success responses through; map everything else onto [`ServiceError`].
async fn check_status(response: Response) -> Result<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().await.unwrap_or_default();
    Err(classify_status(status, &body))
}

/// Map a non-success HTTP status and its body onto a [`ServiceError`].
pub(crate) fn classify_status(status: StatusCode, body: &str) -> ServiceError {
    let message = serde_json::from_str::<ErrorResponse>(body)
        .map(|r| r.error.describe())
        .unwrap_or_else(|_| {
            if body.trim().is_empty() {
                status
                    .canonical_reason()
                    .unwrap_or("no response body")
                    .to_string()
            } else {
                body.trim().to_string()
            }
        });
    let code = status.as_u16();

    match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => ServiceError::Authentication {
            status: code,
            message,
        },
        StatusCode::BAD_REQUEST | StatusCode::UNSUPPORTED_MEDIA_TYPE => {
            ServiceError::InvalidDocument {
                status: code,
                message,
            }
        }
        StatusCode::REQUEST_TIMEOUT | StatusCode::GATEWAY_TIMEOUT => ServiceError::Timeout(message),
        _ => ServiceError::Api {
            status: code,
            message,
        },
    }
}

fn operation_location(headers: &HeaderMap) -> Result<String> {
    headers
        .get(OPERATION_LOCATION)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string)
        .ok_or_else(|| ServiceError::MalformedResponse(format!("no {} header", OPERATION_LOCATION)))
}

use crate::analysis::{AnalysisRequest, AnalysisService};
use crate::config::AnalysisConfig;
use crate::errors::{FlowError, SubmitErrorKind};
use async_trait::async_trait;
use serde::Serialize;
use serde_json::Value;
use std::time::Duration;

/// reqwest-backed client for the face analysis endpoint.
#[derive(Debug, Clone)]
pub struct HttpAnalysisClient {
    client: reqwest::Client,
    endpoint: String,
}

impl HttpAnalysisClient {
    pub fn new(endpoint: impl Into<String>, timeout: Duration) -> Result<Self, FlowError> {
        Ok(Self {
            client: build_client(timeout)?,
            endpoint: endpoint.into(),
        })
    }

    pub fn from_config(config: &AnalysisConfig) -> Result<Self, FlowError> {
        Self::new(config.endpoint.clone(), config.request_timeout())
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

#[async_trait]
impl AnalysisService for HttpAnalysisClient {
    async fn analyze(&self, request: &AnalysisRequest) -> Result<Value, FlowError> {
        log::info!(
            "Submitting image {} ({} base64 chars) to {}",
            request.id,
            request.image.len(),
            self.endpoint
        );

        let payload = post_json(&self.client, &self.endpoint, request).await?;
        if payload.get("success").and_then(Value::as_bool) == Some(false) {
            let message = server_message(&payload)
                .unwrap_or_else(|| "The analysis service could not process the image.".to_string());
            log::warn!("Analysis {} rejected by server: {}", request.id, message);
            return Err(FlowError::submit(SubmitErrorKind::Server, message));
        }

        log::info!("Analysis {} completed", request.id);
        Ok(payload)
    }
}

pub(crate) fn build_client(timeout: Duration) -> Result<reqwest::Client, FlowError> {
    reqwest::Client::builder()
        .timeout(timeout)
        .build()
        .map_err(|e| FlowError::Config(format!("Failed to build HTTP client: {}", e)))
}

/// POST `body` as JSON and return the decoded JSON reply.
///
/// Non-2xx replies become `Server` errors carrying the body's `message` when
/// there is one; undecodable bodies become `MalformedPayload`.
pub(crate) async fn post_json<T: Serialize + ?Sized>(
    client: &reqwest::Client,
    endpoint: &str,
    body: &T,
) -> Result<Value, FlowError> {
    let response = client
        .post(endpoint)
        .json(body)
        .send()
        .await
        .map_err(transport_error)?;

    let status = response.status();
    let bytes = response.bytes().await.map_err(transport_error)?;
    let parsed: Result<Value, _> = serde_json::from_slice(&bytes);

    if !status.is_success() {
        let message = parsed
            .ok()
            .and_then(|v| server_message(&v))
            .unwrap_or_else(|| format!("Request failed with status code {}", status.as_u16()));
        return Err(FlowError::submit(SubmitErrorKind::Server, message));
    }

    parsed.map_err(|e| {
        log::warn!("Undecodable response from {}: {}", endpoint, e);
        FlowError::submit(
            SubmitErrorKind::MalformedPayload,
            "The service returned an unreadable response.",
        )
    })
}

fn server_message(payload: &Value) -> Option<String> {
    payload
        .get("message")
        .and_then(Value::as_str)
        .filter(|m| !m.is_empty())
        .map(str::to_string)
}

fn transport_error(error: reqwest::Error) -> FlowError {
    let message = if error.is_timeout() {
        "The request timed out. Please try again.".to_string()
    } else if error.is_connect() {
        "Could not reach the analysis service. Check your connection and try again.".to_string()
    } else {
        format!("Failed to upload image: {}", error)
    };
    FlowError::submit(SubmitErrorKind::Transport, message)
}

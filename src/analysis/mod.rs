//! Remote face analysis seam
//!
//! The session hands a base64 JPEG to an [`AnalysisService`] and forwards
//! whatever JSON document comes back, untouched, to the next screen.

pub mod http;
pub mod summary;

use crate::errors::{FlowError, SubmitErrorKind};
use crate::still::{strip_data_url, StillImage};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use uuid::Uuid;

pub use http::HttpAnalysisClient;
pub use summary::{Category, RankedItem, Selection};

/// One submission. Only `image` goes on the wire.
#[derive(Debug, Clone, Serialize)]
pub struct AnalysisRequest {
    pub image: String,
    #[serde(skip)]
    pub id: Uuid,
    #[serde(skip)]
    pub submitted_at: DateTime<Utc>,
}

impl AnalysisRequest {
    pub fn new(image: impl Into<String>) -> Self {
        Self {
            image: image.into(),
            id: Uuid::new_v4(),
            submitted_at: Utc::now(),
        }
    }

    pub fn from_still(still: &StillImage) -> Result<Self, FlowError> {
        let data_url = still.to_data_url();
        let payload = strip_data_url(&data_url)?;
        Ok(Self::new(payload))
    }
}

/// Label → probability distributions returned by the service.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AnalysisData {
    #[serde(default)]
    pub age: BTreeMap<String, f64>,
    #[serde(default)]
    pub gender: BTreeMap<String, f64>,
    #[serde(default)]
    pub race: BTreeMap<String, f64>,
}

/// Typed view of the service's reply.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisResponse {
    #[serde(default)]
    pub success: bool,
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub data: Option<AnalysisData>,
}

#[async_trait]
pub trait AnalysisService: Send + Sync {
    /// Submit one image and return the service's JSON document as-is.
    async fn analyze(&self, request: &AnalysisRequest) -> Result<serde_json::Value, FlowError>;
}

/// Serialize an analysis payload for handing to the next screen.
pub fn encode_handoff(payload: &serde_json::Value) -> Result<String, FlowError> {
    serde_json::to_string(payload).map_err(|e| {
        FlowError::submit(
            SubmitErrorKind::MalformedPayload,
            format!("Could not serialize analysis result: {}", e),
        )
    })
}

pub fn decode_handoff(data: &str) -> Result<serde_json::Value, FlowError> {
    serde_json::from_str(data).map_err(|e| {
        FlowError::submit(
            SubmitErrorKind::MalformedPayload,
            format!("Failed to load analysis data. It might be corrupted. ({})", e),
        )
    })
}

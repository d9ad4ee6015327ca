//! Intake form
//!
//! Two questions (name, then city) asked before the camera step. The answers
//! are posted once to the intake service; the user can only move on to the
//! camera after that post succeeds.

use crate::analysis::http::{build_client, post_json};
use crate::config::IntakeConfig;
use crate::errors::{FlowError, SubmitErrorKind};
use crate::navigation::{Navigator, Route};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;

/// Shown when the service answers without `success: true`.
pub const SUBMISSION_REJECTED: &str = "Submission failed. Please try again.";
/// Shown when the answers never reached the service or the reply was unusable.
pub const SUBMISSION_ERROR: &str = "An error occurred during submission.";

/// Check one free-text answer: letters, spaces, apostrophes and hyphens only.
pub fn validate_input(value: &str) -> Result<(), FlowError> {
    if value.trim().is_empty() {
        return Err(FlowError::Validation("Please enter a valid text.".to_string()));
    }
    if value.chars().any(|c| c.is_ascii_digit()) {
        return Err(FlowError::Validation(
            "Input should not contain numbers.".to_string(),
        ));
    }
    if !value
        .chars()
        .all(|c| c.is_ascii_alphabetic() || c.is_whitespace() || c == '\'' || c == '-')
    {
        return Err(FlowError::Validation(
            "Input contains invalid characters.".to_string(),
        ));
    }
    Ok(())
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IntakeSubmission {
    pub name: String,
    pub location: String,
}

#[async_trait]
pub trait IntakeService: Send + Sync {
    async fn submit(&self, submission: &IntakeSubmission) -> Result<(), FlowError>;
}

/// reqwest-backed client for the intake endpoint.
#[derive(Debug, Clone)]
pub struct HttpIntakeClient {
    client: reqwest::Client,
    endpoint: String,
}

impl HttpIntakeClient {
    pub fn from_config(config: &IntakeConfig) -> Result<Self, FlowError> {
        Ok(Self {
            client: build_client(config.request_timeout())?,
            endpoint: config.endpoint.clone(),
        })
    }
}

#[async_trait]
impl IntakeService for HttpIntakeClient {
    async fn submit(&self, submission: &IntakeSubmission) -> Result<(), FlowError> {
        log::info!("Submitting intake answers to {}", self.endpoint);
        let reply = post_json(&self.client, &self.endpoint, submission).await?;
        if reply.get("success").and_then(Value::as_bool) == Some(true) {
            Ok(())
        } else {
            Err(FlowError::submit(SubmitErrorKind::Server, SUBMISSION_REJECTED))
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IntakeStage {
    Name,
    Location,
}

pub struct IntakeForm {
    service: Arc<dyn IntakeService>,
    navigator: Arc<dyn Navigator>,
    stage: IntakeStage,
    name: String,
    location: String,
    error: Option<FlowError>,
    submitted: bool,
}

impl IntakeForm {
    pub fn new(service: Arc<dyn IntakeService>, navigator: Arc<dyn Navigator>) -> Self {
        Self {
            service,
            navigator,
            stage: IntakeStage::Name,
            name: String::new(),
            location: String::new(),
            error: None,
            submitted: false,
        }
    }

    pub fn stage(&self) -> IntakeStage {
        self.stage
    }

    pub fn error(&self) -> Option<&FlowError> {
        self.error.as_ref()
    }

    pub fn is_submitted(&self) -> bool {
        self.submitted
    }

    pub fn placeholder(&self) -> &'static str {
        match self.stage {
            IntakeStage::Name => "Introduce Yourself",
            IntakeStage::Location => "Your City Name",
        }
    }

    /// Update the field for the current stage.
    pub fn set_input(&mut self, value: impl Into<String>) {
        let value = value.into();
        match self.stage {
            IntakeStage::Name => self.name = value,
            IntakeStage::Location => self.location = value,
        }
        self.error = None;
        self.submitted = false;
    }

    /// Validate the current answer. At the name stage this advances to the
    /// location question; at the location stage it posts both answers.
    ///
    /// `&mut self` keeps submissions strictly one at a time.
    pub async fn submit(&mut self) -> Result<(), FlowError> {
        match self.stage {
            IntakeStage::Name => {
                if let Err(e) = validate_input(&self.name) {
                    self.error = Some(e.clone());
                    return Err(e);
                }
                self.stage = IntakeStage::Location;
                Ok(())
            }
            IntakeStage::Location => {
                if let Err(e) = validate_input(&self.location) {
                    self.error = Some(e.clone());
                    return Err(e);
                }
                let submission = IntakeSubmission {
                    name: self.name.trim().to_string(),
                    location: self.location.trim().to_string(),
                };
                match self.service.submit(&submission).await {
                    Ok(()) => {
                        log::info!("Intake answers accepted");
                        self.submitted = true;
                        Ok(())
                    }
                    Err(e) => {
                        log::error!("Intake submission failed: {}", e);
                        let shown = match &e {
                            FlowError::Submit { kind, message }
                                if message.as_str() != SUBMISSION_REJECTED =>
                            {
                                FlowError::submit(*kind, SUBMISSION_ERROR)
                            }
                            FlowError::Submit { .. } | FlowError::Validation(_) => e.clone(),
                            _ => FlowError::submit(SubmitErrorKind::Transport, SUBMISSION_ERROR),
                        };
                        self.error = Some(shown.clone());
                        Err(shown)
                    }
                }
            }
        }
    }

    /// Move on to the camera. Only allowed after a successful submission.
    pub fn proceed(&self) -> bool {
        if self.submitted {
            self.navigator.navigate(Route::Camera);
        }
        self.submitted
    }
}

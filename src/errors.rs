use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Classification of a failed camera acquisition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AcquireErrorKind {
    /// No camera is connected or enabled
    NoDevice,
    /// The camera exists but another application holds it, or it cannot be read
    DeviceBusy,
    /// The user or the system refused camera access
    PermissionDenied,
    /// The environment has no camera API at all
    UnsupportedEnvironment,
    Unknown,
}

impl AcquireErrorKind {
    /// Whether offering a "retry camera" action can ever help.
    pub fn retry_available(self) -> bool {
        !matches!(self, AcquireErrorKind::UnsupportedEnvironment)
    }

    pub fn user_message(self) -> &'static str {
        match self {
            AcquireErrorKind::NoDevice => {
                "No camera found. Please ensure a camera is connected and enabled."
            }
            AcquireErrorKind::DeviceBusy => {
                "Camera is already in use or cannot be accessed. Try closing other apps using the camera."
            }
            AcquireErrorKind::PermissionDenied => {
                "Camera permission denied. Please allow camera access and try again."
            }
            AcquireErrorKind::UnsupportedEnvironment => {
                "Camera API is not supported in this environment."
            }
            AcquireErrorKind::Unknown => "An unknown error occurred while accessing the camera.",
        }
    }
}

/// Classification of a failed analysis submission.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SubmitErrorKind {
    /// The request never produced a response (connection, DNS, timeout)
    Transport,
    /// The service answered but reported a failure
    Server,
    /// The outgoing image or the incoming response could not be decoded
    MalformedPayload,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FlowError {
    #[error("Camera acquisition error ({kind:?}): {detail}")]
    Acquire {
        kind: AcquireErrorKind,
        detail: String,
    },
    #[error("Capture error: {0}")]
    CaptureNotReady(String),
    #[error("Encoding error: {0}")]
    Encoding(String),
    #[error("Submission error ({kind:?}): {message}")]
    Submit {
        kind: SubmitErrorKind,
        message: String,
    },
    #[error("No captured image to submit")]
    NoStill,
    #[error("Busy: {0}")]
    Busy(String),
    #[error("Navigation blocked: {0}")]
    NavigationBlocked(String),
    #[error("Session is closed")]
    Closed,
    #[error("Configuration error: {0}")]
    Config(String),
    #[error("Validation error: {0}")]
    Validation(String),
}

impl FlowError {
    pub fn acquire(kind: AcquireErrorKind, detail: impl Into<String>) -> Self {
        FlowError::Acquire {
            kind,
            detail: detail.into(),
        }
    }

    pub fn submit(kind: SubmitErrorKind, message: impl Into<String>) -> Self {
        FlowError::Submit {
            kind,
            message: message.into(),
        }
    }

    pub fn capture_not_ready() -> Self {
        FlowError::CaptureNotReady(
            "Camera not ready or stream not available for capture.".to_string(),
        )
    }

    /// Text the UI shows for this error.
    pub fn user_message(&self) -> String {
        match self {
            FlowError::Acquire { kind, .. } => kind.user_message().to_string(),
            FlowError::CaptureNotReady(msg) => msg.clone(),
            FlowError::Encoding(_) => "Could not encode the captured image.".to_string(),
            FlowError::Submit { message, .. } => message.clone(),
            FlowError::NoStill => "Please take a photo first.".to_string(),
            FlowError::Busy(msg) | FlowError::NavigationBlocked(msg) => msg.clone(),
            FlowError::Closed => "The camera session has ended.".to_string(),
            FlowError::Config(msg) | FlowError::Validation(msg) => msg.clone(),
        }
    }

    /// Whether the UI should show a retry action next to the message.
    pub fn retry_available(&self) -> bool {
        match self {
            FlowError::Acquire { kind, .. } => kind.retry_available(),
            FlowError::Submit { .. } => true,
            _ => false,
        }
    }

    pub fn acquire_kind(&self) -> Option<AcquireErrorKind> {
        match self {
            FlowError::Acquire { kind, .. } => Some(*kind),
            _ => None,
        }
    }

    pub fn submit_kind(&self) -> Option<SubmitErrorKind> {
        match self {
            FlowError::Submit { kind, .. } => Some(*kind),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unsupported_environment_has_no_retry() {
        assert!(!AcquireErrorKind::UnsupportedEnvironment.retry_available());
        for kind in [
            AcquireErrorKind::NoDevice,
            AcquireErrorKind::DeviceBusy,
            AcquireErrorKind::PermissionDenied,
            AcquireErrorKind::Unknown,
        ] {
            assert!(kind.retry_available(), "{kind:?} should offer retry");
        }
    }

    #[test]
    fn test_acquire_messages_are_distinct() {
        let kinds = [
            AcquireErrorKind::NoDevice,
            AcquireErrorKind::DeviceBusy,
            AcquireErrorKind::PermissionDenied,
            AcquireErrorKind::UnsupportedEnvironment,
            AcquireErrorKind::Unknown,
        ];
        let messages: std::collections::HashSet<_> =
            kinds.iter().map(|k| k.user_message()).collect();
        assert_eq!(messages.len(), kinds.len());
    }

    #[test]
    fn test_submit_error_display() {
        let error = FlowError::submit(SubmitErrorKind::Server, "face not detected");
        assert_eq!(
            error.to_string(),
            "Submission error (Server): face not detected"
        );
        assert_eq!(error.user_message(), "face not detected");
        assert!(error.retry_available());
    }
}

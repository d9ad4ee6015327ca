use crate::errors::{AcquireErrorKind, FlowError};
use crate::permissions::{PermissionInfo, PermissionStatus};
use crate::still::StillImage;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub enum SessionState {
    /// Waiting for a stream, or acquisition failed (see the session error)
    Initializing,
    /// Stream bound and playing
    Live,
    /// A still is waiting for confirm or retake
    Previewing,
    /// The still is being analyzed
    Submitting,
    /// Session ended, all resources released
    Closed,
}

impl std::fmt::Display for SessionState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SessionState::Initializing => write!(f, "initializing"),
            SessionState::Live => write!(f, "live"),
            SessionState::Previewing => write!(f, "previewing"),
            SessionState::Submitting => write!(f, "submitting"),
            SessionState::Closed => write!(f, "closed"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AcquireOutcome {
    /// The stream is bound and the session is live
    Live,
    /// A newer acquisition or a close overtook this one; its stream was released
    Superseded,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmitOutcome {
    /// The result went to the navigator and the session closed
    Forwarded,
    /// Another submission was already pending; nothing was sent
    AlreadyInFlight,
    /// The session closed while the request was pending; the result was dropped
    Discarded,
}

/// What the UI needs to render the capture screen.
#[derive(Debug, Clone, PartialEq)]
pub struct SessionSnapshot {
    pub session_id: Uuid,
    pub state: SessionState,
    pub still: Option<StillImage>,
    pub error: Option<FlowError>,
    /// Live preview is shown flipped horizontally
    pub mirrored: bool,
    pub has_stream: bool,
}

impl SessionSnapshot {
    pub fn message(&self) -> Option<String> {
        self.error.as_ref().map(FlowError::user_message)
    }

    pub fn retry_available(&self) -> bool {
        self.error.as_ref().is_some_and(FlowError::retry_available)
    }

    /// The capture button is enabled. A capture-not-ready message does not
    /// disable it; the user just tries again.
    pub fn can_capture(&self) -> bool {
        self.state == SessionState::Live
            && self.has_stream
            && !matches!(self.error, Some(FlowError::Acquire { .. }))
    }

    /// Retake and confirm are enabled.
    pub fn can_confirm(&self) -> bool {
        self.state == SessionState::Previewing && self.still.is_some()
    }

    /// Guidance for re-enabling camera access after a permission refusal.
    pub fn permission_hint(&self) -> Option<PermissionInfo> {
        self.error
            .as_ref()
            .and_then(FlowError::acquire_kind)
            .filter(|kind| *kind == AcquireErrorKind::PermissionDenied)
            .map(|_| PermissionInfo::describe(PermissionStatus::Denied))
    }

    pub fn is_uploading(&self) -> bool {
        self.state == SessionState::Submitting
    }
}

//! Device media seam
//!
//! The capture session never talks to camera hardware directly. It goes through
//! [`MediaDevices`] to obtain a [`DeviceStream`], and holds that stream inside a
//! [`StreamLease`] so every exit path stops the hardware tracks.

use crate::config::CameraConfig;
use crate::errors::{AcquireErrorKind, FlowError};
use crate::permissions::PermissionStatus;
use async_trait::async_trait;
use image::RgbImage;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

/// Failure names reported by media backends.
pub mod failure_names {
    pub const NOT_FOUND: &str = "NotFoundError";
    pub const DEVICES_NOT_FOUND: &str = "DevicesNotFoundError";
    pub const OVERCONSTRAINED: &str = "OverconstrainedError";
    pub const NOT_READABLE: &str = "NotReadableError";
    pub const TRACK_START: &str = "TrackStartError";
    pub const ABORT: &str = "AbortError";
    pub const NOT_ALLOWED: &str = "NotAllowedError";
    pub const PERMISSION_DENIED: &str = "PermissionDeniedError";
    pub const SECURITY: &str = "SecurityError";
    pub const NOT_SUPPORTED: &str = "NotSupportedError";
    pub const UNKNOWN: &str = "UnknownError";
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FacingMode {
    /// Front camera, facing the user
    User,
    /// Rear camera
    Environment,
}

/// What the session asks the device layer for.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MediaConstraints {
    pub facing_mode: FacingMode,
    pub ideal_width: u32,
    pub ideal_height: u32,
    pub aspect_ratio: f64,
    pub audio: bool,
}

impl MediaConstraints {
    pub fn from_config(config: &CameraConfig) -> Self {
        Self {
            facing_mode: config.facing_mode,
            ideal_width: config.ideal_resolution[0],
            ideal_height: config.ideal_resolution[1],
            aspect_ratio: config.aspect_ratio,
            audio: false,
        }
    }
}

impl Default for MediaConstraints {
    fn default() -> Self {
        Self::from_config(&CameraConfig::default())
    }
}

/// Playback readiness of a stream, ordered from least to most ready.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ReadyState {
    HaveNothing,
    HaveMetadata,
    HaveCurrentData,
    HaveFutureData,
    HaveEnoughData,
}

impl ReadyState {
    /// Frame dimensions are known once metadata has loaded.
    pub fn can_capture(self) -> bool {
        self >= ReadyState::HaveMetadata
    }
}

/// Settings the device actually applied to the video track.
#[derive(Debug, Clone, PartialEq)]
pub struct TrackSettings {
    pub facing_mode: Option<FacingMode>,
    pub width: u32,
    pub height: u32,
}

/// Raw failure from a media backend, before classification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MediaFailure {
    pub name: String,
    pub message: String,
}

impl MediaFailure {
    pub fn new(name: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            message: message.into(),
        }
    }

    pub fn unsupported() -> Self {
        Self::new(
            failure_names::NOT_SUPPORTED,
            "camera API is not available in this environment",
        )
    }

    pub fn classify(&self) -> AcquireErrorKind {
        use failure_names::*;
        match self.name.as_str() {
            NOT_FOUND | DEVICES_NOT_FOUND | OVERCONSTRAINED => AcquireErrorKind::NoDevice,
            NOT_READABLE | TRACK_START | ABORT => AcquireErrorKind::DeviceBusy,
            NOT_ALLOWED | PERMISSION_DENIED | SECURITY => AcquireErrorKind::PermissionDenied,
            NOT_SUPPORTED => AcquireErrorKind::UnsupportedEnvironment,
            _ => AcquireErrorKind::Unknown,
        }
    }

    pub fn into_flow_error(self) -> FlowError {
        FlowError::acquire(self.classify(), self.to_string())
    }
}

impl fmt::Display for MediaFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.name, self.message)
    }
}

impl std::error::Error for MediaFailure {}

/// A live handle to camera hardware.
///
/// `stop` must be idempotent; it is called on every release path.
#[async_trait]
pub trait DeviceStream: Send + Sync {
    fn id(&self) -> &str;

    fn settings(&self) -> TrackSettings;

    fn ready_state(&self) -> ReadyState;

    /// Grab the frame currently shown by the stream.
    fn grab_frame(&self) -> Result<RgbImage, MediaFailure>;

    /// Start or resume playback.
    async fn play(&self) -> Result<(), MediaFailure>;

    fn is_paused(&self) -> bool;

    /// Stop every underlying hardware track.
    fn stop(&self);

    fn is_stopped(&self) -> bool;
}

/// Access point for camera devices.
#[async_trait]
pub trait MediaDevices: Send + Sync {
    /// Whether this environment exposes a camera API at all.
    fn is_supported(&self) -> bool {
        true
    }

    fn permission_status(&self) -> PermissionStatus {
        PermissionStatus::NotDetermined
    }

    async fn acquire(
        &self,
        constraints: &MediaConstraints,
    ) -> Result<Arc<dyn DeviceStream>, MediaFailure>;
}

/// Exclusive ownership of a device stream. Dropping the lease stops the stream.
pub struct StreamLease {
    stream: Arc<dyn DeviceStream>,
}

impl StreamLease {
    pub fn new(stream: Arc<dyn DeviceStream>) -> Self {
        Self { stream }
    }

    pub fn stream(&self) -> &Arc<dyn DeviceStream> {
        &self.stream
    }

    pub fn facing_mode(&self) -> Option<FacingMode> {
        self.stream.settings().facing_mode
    }
}

impl fmt::Debug for StreamLease {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StreamLease")
            .field("stream", &self.stream.id())
            .finish()
    }
}

impl Drop for StreamLease {
    fn drop(&mut self) {
        log::debug!("Releasing device stream {}", self.stream.id());
        self.stream.stop();
    }
}

//! capture-flow: camera capture and face-analysis submission flow
//!
//! This crate is the core behind a "take a selfie, get it analyzed" screen
//! sequence. It owns the camera stream, turns a frame into a JPEG still,
//! lets the user confirm or retake, and submits the still to a remote
//! analysis service, forwarding the reply to the results screen.
//!
//! # Features
//! - Explicit capture session state machine with supersession of stale work
//! - Guaranteed camera release on every exit path
//! - Mirror-aware still encoding
//! - Single-flight submission with a request timeout
//! - Result summaries for the demographics screens
//! - Native camera backend (`native` feature)
//!
//! # Usage
//! ```rust,ignore
//! use capture_flow::{CaptureSession, Collaborators, FlowConfig};
//!
//! let session = CaptureSession::open(FlowConfig::load_or_default(), collaborators).await;
//! session.capture()?;
//! session.submit().await?;
//! ```
pub mod analysis;
pub mod config;
pub mod errors;
pub mod intake;
pub mod media;
pub mod navigation;
pub mod permissions;
pub mod platform;
pub mod session;
pub mod still;

// Testing utilities - scripted collaborators for offline testing
pub mod testing;

// Re-exports for convenience
pub use analysis::{AnalysisRequest, AnalysisResponse, AnalysisService, HttpAnalysisClient};
pub use config::FlowConfig;
pub use errors::{AcquireErrorKind, FlowError, SubmitErrorKind};
pub use media::{DeviceStream, MediaConstraints, MediaDevices, MediaFailure, StreamLease};
pub use navigation::{Navigator, Route};
pub use session::{
    AcquireOutcome, CaptureSession, Collaborators, SessionSnapshot, SessionState, SubmitOutcome,
};
pub use still::StillImage;

/// Initialize logging for the capture flow
pub fn init_logging() {
    if std::env::var("RUST_LOG").is_err() {
        std::env::set_var("RUST_LOG", "capture_flow=info");
    }
    let _ = env_logger::try_init();
}

/// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
pub const NAME: &str = env!("CARGO_PKG_NAME");
pub const DESCRIPTION: &str = env!("CARGO_PKG_DESCRIPTION");

/// Get crate information
pub fn get_info() -> CrateInfo {
    CrateInfo {
        name: NAME.to_string(),
        version: VERSION.to_string(),
        description: DESCRIPTION.to_string(),
    }
}

/// Crate information structure
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct CrateInfo {
    pub name: String,
    pub version: String,
    pub description: String,
}

#[cfg(test)]
mod lib_tests {
    use super::*;

    #[test]
    fn test_crate_info() {
        let info = get_info();
        assert_eq!(info.name, "capture-flow");
        assert!(!info.version.is_empty());
        assert!(!info.description.is_empty());
    }

    #[test]
    fn test_init_logging_is_idempotent() {
        init_logging();
        init_logging();
    }
}

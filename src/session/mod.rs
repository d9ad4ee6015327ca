//! Capture session controller
//!
//! Drives one capture-to-submit interaction: camera acquisition, still
//! capture, confirm/retake, and submission to the analysis service.

pub mod controller;
pub mod state;

pub use controller::{CaptureSession, Collaborators};
pub use state::{AcquireOutcome, SessionSnapshot, SessionState, SubmitOutcome};

//! Testing utilities for the capture flow
//!
//! Synthetic frames and payloads, plus scripted stand-ins for the camera,
//! the analysis service, the intake service and the navigator.

pub mod fakes;
pub mod synthetic_data;

pub use fakes::{
    serve_once, FakeMediaDevices, FakeStream, RecordingNavigator, ScriptedAnalysis,
    ScriptedIntake,
};
pub use synthetic_data::{sample_analysis_payload, split_frame, synthetic_frame};

//! In-memory collaborators for driving the flow without hardware or network.

use crate::analysis::{AnalysisRequest, AnalysisService};
use crate::errors::FlowError;
use crate::intake::{IntakeService, IntakeSubmission};
use crate::media::{
    failure_names, DeviceStream, FacingMode, MediaConstraints, MediaDevices, MediaFailure,
    ReadyState, TrackSettings,
};
use crate::navigation::{Navigator, Route};
use crate::permissions::PermissionStatus;
use crate::testing::synthetic_data::{sample_analysis_payload, split_frame};
use async_trait::async_trait;
use image::RgbImage;
use serde_json::Value;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::sync::Semaphore;

/// Camera stream backed by a fixed frame.
pub struct FakeStream {
    id: String,
    facing: Option<FacingMode>,
    frame: Mutex<RgbImage>,
    ready: Mutex<ReadyState>,
    paused: AtomicBool,
    stopped: AtomicBool,
    fail_play: AtomicBool,
    play_calls: AtomicUsize,
}

impl FakeStream {
    pub fn new(id: impl Into<String>, facing: Option<FacingMode>, frame: RgbImage) -> Self {
        Self {
            id: id.into(),
            facing,
            frame: Mutex::new(frame),
            ready: Mutex::new(ReadyState::HaveEnoughData),
            paused: AtomicBool::new(true),
            stopped: AtomicBool::new(false),
            fail_play: AtomicBool::new(false),
            play_calls: AtomicUsize::new(0),
        }
    }

    pub fn front_facing(id: impl Into<String>) -> Self {
        Self::new(id, Some(FacingMode::User), split_frame(64, 36))
    }

    pub fn rear_facing(id: impl Into<String>) -> Self {
        Self::new(id, Some(FacingMode::Environment), split_frame(64, 36))
    }

    pub fn set_ready_state(&self, state: ReadyState) {
        *self.ready.lock().expect("lock poisoned") = state;
    }

    pub fn set_paused(&self, paused: bool) {
        self.paused.store(paused, Ordering::SeqCst);
    }

    pub fn set_frame(&self, frame: RgbImage) {
        *self.frame.lock().expect("lock poisoned") = frame;
    }

    /// Make `play` fail, as when autoplay is blocked.
    pub fn fail_playback(&self) {
        self.fail_play.store(true, Ordering::SeqCst);
    }

    pub fn play_calls(&self) -> usize {
        self.play_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl DeviceStream for FakeStream {
    fn id(&self) -> &str {
        &self.id
    }

    fn settings(&self) -> TrackSettings {
        let frame = self.frame.lock().expect("lock poisoned");
        TrackSettings {
            facing_mode: self.facing,
            width: frame.width(),
            height: frame.height(),
        }
    }

    fn ready_state(&self) -> ReadyState {
        if self.is_stopped() {
            ReadyState::HaveNothing
        } else {
            *self.ready.lock().expect("lock poisoned")
        }
    }

    fn grab_frame(&self) -> Result<RgbImage, MediaFailure> {
        if self.is_stopped() {
            return Err(MediaFailure::new("InvalidStateError", "stream has been stopped"));
        }
        Ok(self.frame.lock().expect("lock poisoned").clone())
    }

    async fn play(&self) -> Result<(), MediaFailure> {
        self.play_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_play.load(Ordering::SeqCst) {
            return Err(MediaFailure::new(
                failure_names::NOT_ALLOWED,
                "play() was prevented",
            ));
        }
        self.paused.store(false, Ordering::SeqCst);
        Ok(())
    }

    fn is_paused(&self) -> bool {
        self.paused.load(Ordering::SeqCst)
    }

    fn stop(&self) {
        self.stopped.store(true, Ordering::SeqCst);
    }

    fn is_stopped(&self) -> bool {
        self.stopped.load(Ordering::SeqCst)
    }
}

/// Scripted camera provider.
///
/// Acquisitions take scripted results in order, then fall back to fresh
/// front-facing streams. A gated provider holds every acquisition until
/// [`FakeMediaDevices::open_gate`] releases it.
#[derive(Default)]
pub struct FakeMediaDevices {
    script: Mutex<VecDeque<Result<Arc<FakeStream>, MediaFailure>>>,
    issued: Mutex<Vec<Arc<FakeStream>>>,
    calls: AtomicUsize,
    unsupported: AtomicBool,
    permission: Mutex<Option<PermissionStatus>>,
    last_constraints: Mutex<Option<MediaConstraints>>,
    gate: Option<Arc<Semaphore>>,
}

impl FakeMediaDevices {
    pub fn gated() -> Self {
        Self {
            gate: Some(Arc::new(Semaphore::new(0))),
            ..Self::default()
        }
    }

    /// Let `n` pending or future acquisitions complete.
    pub fn open_gate(&self, n: usize) {
        if let Some(gate) = &self.gate {
            gate.add_permits(n);
        }
    }

    pub fn push_stream(&self, stream: FakeStream) -> Arc<FakeStream> {
        let stream = Arc::new(stream);
        self.script
            .lock()
            .expect("lock poisoned")
            .push_back(Ok(stream.clone()));
        stream
    }

    pub fn push_failure(&self, name: &str, message: &str) {
        self.script
            .lock()
            .expect("lock poisoned")
            .push_back(Err(MediaFailure::new(name, message)));
    }

    pub fn set_unsupported(&self) {
        self.unsupported.store(true, Ordering::SeqCst);
    }

    pub fn set_permission(&self, status: PermissionStatus) {
        *self.permission.lock().expect("lock poisoned") = Some(status);
    }

    pub fn acquire_calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Every stream handed out so far, in order.
    pub fn issued(&self) -> Vec<Arc<FakeStream>> {
        self.issued.lock().expect("lock poisoned").clone()
    }

    pub fn last_constraints(&self) -> Option<MediaConstraints> {
        self.last_constraints.lock().expect("lock poisoned").clone()
    }
}

#[async_trait]
impl MediaDevices for FakeMediaDevices {
    fn is_supported(&self) -> bool {
        !self.unsupported.load(Ordering::SeqCst)
    }

    fn permission_status(&self) -> PermissionStatus {
        self.permission
            .lock()
            .expect("lock poisoned")
            .unwrap_or(PermissionStatus::NotDetermined)
    }

    async fn acquire(
        &self,
        constraints: &MediaConstraints,
    ) -> Result<Arc<dyn DeviceStream>, MediaFailure> {
        let call = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
        *self.last_constraints.lock().expect("lock poisoned") = Some(constraints.clone());

        let scripted = self.script.lock().expect("lock poisoned").pop_front();
        let result = scripted
            .unwrap_or_else(|| Ok(Arc::new(FakeStream::front_facing(format!("fake-{}", call)))));
        if let Ok(stream) = &result {
            self.issued
                .lock()
                .expect("lock poisoned")
                .push(stream.clone());
        }

        if let Some(gate) = &self.gate {
            gate.acquire()
                .await
                .map_err(|_| MediaFailure::new(failure_names::ABORT, "device gate closed"))?
                .forget();
        }

        result.map(|stream| stream as Arc<dyn DeviceStream>)
    }
}

/// Scripted analysis service that records every request it receives.
pub struct ScriptedAnalysis {
    script: Mutex<VecDeque<Result<Value, FlowError>>>,
    fallback: Value,
    requests: Mutex<Vec<String>>,
    gate: Option<Arc<Semaphore>>,
    delay: Option<Duration>,
}

impl ScriptedAnalysis {
    /// Answers every request with [`sample_analysis_payload`].
    pub fn succeeding() -> Self {
        Self {
            script: Mutex::new(VecDeque::new()),
            fallback: sample_analysis_payload(),
            requests: Mutex::new(Vec::new()),
            gate: None,
            delay: None,
        }
    }

    /// Holds every request until [`ScriptedAnalysis::open_gate`].
    pub fn gated() -> Self {
        Self {
            gate: Some(Arc::new(Semaphore::new(0))),
            ..Self::succeeding()
        }
    }

    /// Takes `delay` to answer each request.
    pub fn slow(delay: Duration) -> Self {
        Self {
            delay: Some(delay),
            ..Self::succeeding()
        }
    }

    pub fn push_response(&self, response: Result<Value, FlowError>) {
        self.script
            .lock()
            .expect("lock poisoned")
            .push_back(response);
    }

    pub fn open_gate(&self, n: usize) {
        if let Some(gate) = &self.gate {
            gate.add_permits(n);
        }
    }

    pub fn calls(&self) -> usize {
        self.requests.lock().expect("lock poisoned").len()
    }

    /// Base64 payloads received, in order.
    pub fn received_images(&self) -> Vec<String> {
        self.requests.lock().expect("lock poisoned").clone()
    }
}

#[async_trait]
impl AnalysisService for ScriptedAnalysis {
    async fn analyze(&self, request: &AnalysisRequest) -> Result<Value, FlowError> {
        self.requests
            .lock()
            .expect("lock poisoned")
            .push(request.image.clone());

        if let Some(gate) = &self.gate {
            if let Ok(permit) = gate.acquire().await {
                permit.forget();
            }
        }
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }

        let scripted = self.script.lock().expect("lock poisoned").pop_front();
        scripted.unwrap_or_else(|| Ok(self.fallback.clone()))
    }
}

/// Navigator that remembers where it was sent.
#[derive(Default)]
pub struct RecordingNavigator {
    routes: Mutex<Vec<Route>>,
}

impl RecordingNavigator {
    pub fn routes(&self) -> Vec<Route> {
        self.routes.lock().expect("lock poisoned").clone()
    }

    pub fn last(&self) -> Option<Route> {
        self.routes.lock().expect("lock poisoned").last().cloned()
    }
}

impl Navigator for RecordingNavigator {
    fn navigate(&self, route: Route) {
        self.routes.lock().expect("lock poisoned").push(route);
    }
}

/// Scripted intake service; succeeds once its script runs out.
#[derive(Default)]
pub struct ScriptedIntake {
    script: Mutex<VecDeque<Result<(), FlowError>>>,
    submissions: Mutex<Vec<IntakeSubmission>>,
}

impl ScriptedIntake {
    pub fn push_response(&self, response: Result<(), FlowError>) {
        self.script
            .lock()
            .expect("lock poisoned")
            .push_back(response);
    }

    pub fn submissions(&self) -> Vec<IntakeSubmission> {
        self.submissions.lock().expect("lock poisoned").clone()
    }
}

#[async_trait]
impl IntakeService for ScriptedIntake {
    async fn submit(&self, submission: &IntakeSubmission) -> Result<(), FlowError> {
        self.submissions
            .lock()
            .expect("lock poisoned")
            .push(submission.clone());
        let scripted = self.script.lock().expect("lock poisoned").pop_front();
        scripted.unwrap_or(Ok(()))
    }
}

/// Serve exactly one HTTP request on localhost with the given status and
/// body. Returns the URL and a handle resolving to the request body.
pub async fn serve_once(status: u16, body: String) -> (String, tokio::task::JoinHandle<String>) {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind test listener");
    let addr = listener.local_addr().expect("listener address");

    let handle = tokio::spawn(async move {
        let (mut socket, _) = listener.accept().await.expect("accept connection");
        let request_body = read_request_body(&mut socket).await;
        let response = format!(
            "HTTP/1.1 {} Test\r\ncontent-type: application/json\r\ncontent-length: {}\r\nconnection: close\r\n\r\n{}",
            status,
            body.len(),
            body
        );
        let _ = socket.write_all(response.as_bytes()).await;
        let _ = socket.shutdown().await;
        request_body
    });

    (format!("http://{}/", addr), handle)
}

async fn read_request_body(socket: &mut tokio::net::TcpStream) -> String {
    let mut buffer = Vec::new();
    let mut chunk = [0u8; 4096];
    loop {
        let n = socket.read(&mut chunk).await.unwrap_or(0);
        if n == 0 {
            return String::new();
        }
        buffer.extend_from_slice(&chunk[..n]);

        let Some(header_end) = buffer.windows(4).position(|w| w == b"\r\n\r\n") else {
            continue;
        };
        let headers = String::from_utf8_lossy(&buffer[..header_end]).to_lowercase();
        let length = headers
            .lines()
            .find_map(|line| line.strip_prefix("content-length:"))
            .and_then(|value| value.trim().parse::<usize>().ok())
            .unwrap_or(0);
        let body_start = header_end + 4;
        if buffer.len() >= body_start + length {
            return String::from_utf8_lossy(&buffer[body_start..body_start + length]).into_owned();
        }
    }
}

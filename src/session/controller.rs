use crate::analysis::{encode_handoff, AnalysisRequest, AnalysisService};
use crate::config::FlowConfig;
use crate::errors::{FlowError, SubmitErrorKind};
use crate::media::{
    DeviceStream, FacingMode, MediaConstraints, MediaDevices, MediaFailure, StreamLease,
};
use crate::navigation::{Navigator, Route, CONFIRM_BEFORE_LEAVING};
use crate::session::state::{AcquireOutcome, SessionSnapshot, SessionState, SubmitOutcome};
use crate::still::StillImage;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use uuid::Uuid;

/// External services the session drives.
#[derive(Clone)]
pub struct Collaborators {
    pub devices: Arc<dyn MediaDevices>,
    pub analysis: Arc<dyn AnalysisService>,
    pub navigator: Arc<dyn Navigator>,
}

struct Core {
    state: SessionState,
    stream: Option<StreamLease>,
    still: Option<StillImage>,
    error: Option<FlowError>,
    /// Bumped by every acquisition and by close; async results carrying an
    /// older value are stale.
    generation: u64,
}

impl Core {
    fn fail(&mut self, error: FlowError) -> FlowError {
        self.error = Some(error.clone());
        error
    }

    fn teardown(&mut self) {
        self.generation = self.generation.wrapping_add(1);
        self.stream = None;
        self.still = None;
        self.error = None;
        self.state = SessionState::Closed;
    }
}

struct Inner {
    id: Uuid,
    config: FlowConfig,
    constraints: MediaConstraints,
    collaborators: Collaborators,
    core: Mutex<Core>,
}

impl Inner {
    fn lock(&self) -> MutexGuard<'_, Core> {
        self.core.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn mirrors(&self, lease: &StreamLease) -> bool {
        self.config.capture.mirror_front_camera && lease.facing_mode() == Some(FacingMode::User)
    }
}

/// Handle to one capture session. Clones share the same session.
///
/// The session mutex is never held across an await, so any clone may call
/// any operation from any task; the state machine decides what is allowed.
#[derive(Clone)]
pub struct CaptureSession {
    inner: Arc<Inner>,
}

impl CaptureSession {
    /// Create a session in `Initializing` without touching the camera.
    pub fn new(config: FlowConfig, collaborators: Collaborators) -> Self {
        let constraints = MediaConstraints::from_config(&config.camera);
        Self {
            inner: Arc::new(Inner {
                id: Uuid::new_v4(),
                config,
                constraints,
                collaborators,
                core: Mutex::new(Core {
                    state: SessionState::Initializing,
                    stream: None,
                    still: None,
                    error: None,
                    generation: 0,
                }),
            }),
        }
    }

    /// Create a session and start the camera, as when the capture screen opens.
    ///
    /// An acquisition failure does not fail the call; it is visible in the
    /// session snapshot.
    pub async fn open(config: FlowConfig, collaborators: Collaborators) -> Self {
        let session = Self::new(config, collaborators);
        if let Err(e) = session.acquire().await {
            log::warn!("Camera unavailable for session {}: {}", session.id(), e);
        }
        session
    }

    pub fn id(&self) -> Uuid {
        self.inner.id
    }

    pub fn state(&self) -> SessionState {
        self.inner.lock().state
    }

    pub fn error(&self) -> Option<FlowError> {
        self.inner.lock().error.clone()
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        let core = self.inner.lock();
        SessionSnapshot {
            session_id: self.inner.id,
            state: core.state,
            still: core.still.clone(),
            error: core.error.clone(),
            mirrored: core
                .stream
                .as_ref()
                .is_some_and(|lease| self.inner.mirrors(lease)),
            has_stream: core.stream.is_some(),
        }
    }

    /// Request a camera stream, releasing any stream already held first.
    ///
    /// A later `acquire` or `close` supersedes this one: when the device
    /// answers, the stream is stopped and nothing visible changes.
    pub async fn acquire(&self) -> Result<AcquireOutcome, FlowError> {
        let generation = {
            let mut core = self.inner.lock();
            match core.state {
                SessionState::Closed => return Err(FlowError::Closed),
                SessionState::Submitting => {
                    return Err(core.fail(FlowError::Busy(
                        "Please wait for the current upload to finish.".to_string(),
                    )))
                }
                _ => {}
            }
            core.generation = core.generation.wrapping_add(1);
            if let Some(previous) = core.stream.take() {
                log::info!("Releasing stream before reacquiring: {:?}", previous);
                drop(previous);
            }
            core.still = None;
            core.error = None;
            core.state = SessionState::Initializing;
            core.generation
        };

        log::info!(
            "Session {} requesting camera (attempt generation {})",
            self.inner.id,
            generation
        );
        let result = self.request_stream().await;

        let mut core = self.inner.lock();
        if core.state == SessionState::Closed || core.generation != generation {
            log::debug!(
                "Discarding superseded acquisition {} for session {}",
                generation,
                self.inner.id
            );
            drop(result);
            return Ok(AcquireOutcome::Superseded);
        }

        match result {
            Ok(lease) => {
                log::info!("Session {} is live on {:?}", self.inner.id, lease);
                core.stream = Some(lease);
                core.state = SessionState::Live;
                Ok(AcquireOutcome::Live)
            }
            Err(failure) => {
                log::error!("Error accessing camera: {}", failure);
                Err(core.fail(failure.into_flow_error()))
            }
        }
    }

    async fn request_stream(&self) -> Result<StreamLease, MediaFailure> {
        let devices = &self.inner.collaborators.devices;
        if !devices.is_supported() {
            return Err(MediaFailure::unsupported());
        }
        if let Some(failure) = devices.permission_status().blocking_failure() {
            return Err(failure);
        }

        let lease = StreamLease::new(devices.acquire(&self.inner.constraints).await?);
        if let Err(e) = lease.stream().play().await {
            log::warn!("Video playback was prevented: {}", e);
        }
        Ok(lease)
    }

    /// Snapshot the current frame into a still and move to `Previewing`.
    ///
    /// Before the stream reports metadata this records a capture error and
    /// leaves the state alone.
    pub fn capture(&self) -> Result<(), FlowError> {
        let mut core = self.inner.lock();
        if core.state == SessionState::Closed {
            return Err(FlowError::Closed);
        }

        let target = core
            .stream
            .as_ref()
            .filter(|lease| lease.stream().ready_state().can_capture())
            .filter(|_| core.state == SessionState::Live)
            .map(|lease| (lease.stream().clone(), self.inner.mirrors(lease)));
        let (stream, mirror) = match target {
            Some(target) => target,
            None => {
                log::warn!("Capture requested before the video source was ready");
                return Err(core.fail(FlowError::capture_not_ready()));
            }
        };

        let still = stream
            .grab_frame()
            .map_err(|e| FlowError::CaptureNotReady(format!("Could not read a frame: {}", e)))
            .and_then(|frame| {
                StillImage::encode(&frame, self.inner.config.capture.jpeg_quality, mirror)
            });

        match still {
            Ok(still) => {
                log::info!(
                    "Captured {}x{} still for session {}",
                    still.width(),
                    still.height(),
                    self.inner.id
                );
                core.still = Some(still);
                core.error = None;
                core.state = SessionState::Previewing;
                Ok(())
            }
            Err(e) => {
                log::error!("Capture failed: {}", e);
                Err(core.fail(e))
            }
        }
    }

    /// Drop the still and go back to the live preview, reacquiring the camera
    /// when no stream is held.
    pub async fn retake(&self) -> Result<AcquireOutcome, FlowError> {
        let resume: Option<Arc<dyn DeviceStream>> = {
            let mut core = self.inner.lock();
            match core.state {
                SessionState::Closed => return Err(FlowError::Closed),
                SessionState::Submitting => {
                    return Err(core.fail(FlowError::Busy(
                        "Please wait for the current upload to finish.".to_string(),
                    )))
                }
                _ => {}
            }
            core.still = None;
            core.error = None;
            let resume = core.stream.as_ref().map(|lease| lease.stream().clone());
            if resume.is_some() {
                core.state = SessionState::Live;
            }
            resume
        };

        match resume {
            Some(stream) => {
                if stream.is_paused() {
                    if let Err(e) = stream.play().await {
                        log::error!("Error re-playing video: {}", e);
                    }
                }
                Ok(AcquireOutcome::Live)
            }
            None => self.acquire().await,
        }
    }

    /// Send the still for analysis.
    ///
    /// At most one request is in flight: calling again while `Submitting`
    /// returns [`SubmitOutcome::AlreadyInFlight`] without a second request.
    /// On success the result is forwarded to the navigator and the session
    /// closes; on failure the session returns to `Previewing` with the still.
    pub async fn submit(&self) -> Result<SubmitOutcome, FlowError> {
        let (request, generation) = {
            let mut core = self.inner.lock();
            match core.state {
                SessionState::Closed => return Err(FlowError::Closed),
                SessionState::Submitting => {
                    log::debug!("Submission already in flight, ignoring");
                    return Ok(SubmitOutcome::AlreadyInFlight);
                }
                _ => {}
            }
            let request = core.still.as_ref().map(AnalysisRequest::from_still);
            match request {
                None => return Err(core.fail(FlowError::NoStill)),
                Some(Ok(request)) => {
                    core.state = SessionState::Submitting;
                    core.error = None;
                    (request, core.generation)
                }
                Some(Err(e)) => {
                    core.state = SessionState::Previewing;
                    return Err(core.fail(e));
                }
            }
        };

        log::info!(
            "Session {} submitting analysis request {}",
            self.inner.id,
            request.id
        );
        let mut in_flight = InFlight {
            inner: &self.inner,
            generation,
            armed: true,
        };
        let timeout = self.inner.config.analysis.request_timeout();
        let analysis = self.inner.collaborators.analysis.analyze(&request);
        let result = match tokio::time::timeout(timeout, analysis).await {
            Ok(result) => result,
            Err(_) => Err(FlowError::submit(
                SubmitErrorKind::Transport,
                "The analysis request timed out. Please try again.",
            )),
        };
        in_flight.armed = false;
        let handoff = result.and_then(|payload| encode_handoff(&payload));

        let data = {
            let mut core = self.inner.lock();
            if core.state != SessionState::Submitting || core.generation != generation {
                log::debug!(
                    "Discarding analysis result {} for closed session {}",
                    request.id,
                    self.inner.id
                );
                return Ok(SubmitOutcome::Discarded);
            }
            match handoff {
                Ok(data) => {
                    core.teardown();
                    data
                }
                Err(e) => {
                    log::error!("Error uploading image: {}", e);
                    core.state = SessionState::Previewing;
                    return Err(core.fail(e));
                }
            }
        };

        log::info!("Analysis {} forwarded to results", request.id);
        self.inner
            .collaborators
            .navigator
            .navigate(Route::Select { data });
        Ok(SubmitOutcome::Forwarded)
    }

    /// Leave the capture screen.
    ///
    /// Refused while a still awaits confirm/retake or is uploading; the photo
    /// is never discarded silently.
    pub fn go_back(&self) -> Result<(), FlowError> {
        {
            let mut core = self.inner.lock();
            if matches!(
                core.state,
                SessionState::Previewing | SessionState::Submitting
            ) {
                return Err(core.fail(FlowError::NavigationBlocked(
                    CONFIRM_BEFORE_LEAVING.to_string(),
                )));
            }
            core.teardown();
        }
        self.inner.collaborators.navigator.navigate(Route::Back);
        Ok(())
    }

    /// End the session and release the camera. Pending acquisitions and
    /// submissions become stale. Calling it again does nothing.
    pub fn close(&self) {
        let mut core = self.inner.lock();
        if core.state != SessionState::Closed {
            log::info!("Closing capture session {}", self.inner.id);
        }
        core.teardown();
    }
}

/// Returns the session to `Previewing` if a submission is dropped before
/// the service answers, so the still can be sent again.
struct InFlight<'a> {
    inner: &'a Inner,
    generation: u64,
    armed: bool,
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        if !self.armed {
            return;
        }
        let mut core = self.inner.lock();
        if core.state == SessionState::Submitting && core.generation == self.generation {
            log::warn!(
                "Analysis request for session {} was cancelled before completing",
                self.inner.id
            );
            core.state = SessionState::Previewing;
            core.fail(FlowError::submit(
                SubmitErrorKind::Transport,
                "The upload was interrupted. Please try again.",
            ));
        }
    }
}

impl std::fmt::Debug for CaptureSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CaptureSession")
            .field("id", &self.inner.id)
            .field("state", &self.state())
            .finish()
    }
}

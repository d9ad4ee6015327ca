use crate::media::{
    failure_names, DeviceStream, FacingMode, MediaConstraints, MediaDevices, MediaFailure,
    ReadyState, TrackSettings,
};
use async_trait::async_trait;
use image::RgbImage;
use nokhwa::{
    pixel_format::RgbFormat,
    query,
    utils::{
        ApiBackend, CameraFormat, CameraIndex, FrameFormat, RequestedFormat, RequestedFormatType,
        Resolution,
    },
    CallbackCamera, NokhwaError,
};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

/// A camera as reported by the system.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NativeDeviceInfo {
    pub index: String,
    pub name: String,
    pub description: String,
}

/// List cameras visible to the native backend
pub fn list_devices() -> Result<Vec<NativeDeviceInfo>, MediaFailure> {
    let cameras = query(ApiBackend::Auto).map_err(classify_nokhwa)?;
    Ok(cameras
        .into_iter()
        .map(|info| NativeDeviceInfo {
            index: info.index().to_string(),
            name: info.human_name(),
            description: info.description().to_string(),
        })
        .collect())
}

/// System camera provider. Desktop webcams face the user.
#[derive(Debug, Clone)]
pub struct NativeMediaDevices {
    device_index: u32,
}

impl NativeMediaDevices {
    pub fn new(device_index: u32) -> Self {
        Self { device_index }
    }
}

impl Default for NativeMediaDevices {
    fn default() -> Self {
        Self::new(0)
    }
}

#[async_trait]
impl MediaDevices for NativeMediaDevices {
    fn is_supported(&self) -> bool {
        cfg!(any(
            target_os = "windows",
            target_os = "macos",
            target_os = "linux"
        ))
    }

    async fn acquire(
        &self,
        constraints: &MediaConstraints,
    ) -> Result<Arc<dyn DeviceStream>, MediaFailure> {
        let index = self.device_index;
        let constraints = constraints.clone();
        let stream = tokio::task::spawn_blocking(move || open_stream(index, &constraints))
            .await
            .map_err(|e| {
                MediaFailure::new(failure_names::UNKNOWN, format!("camera task failed: {}", e))
            })??;
        Ok(Arc::new(stream))
    }
}

fn open_stream(index: u32, constraints: &MediaConstraints) -> Result<NativeStream, MediaFailure> {
    log::info!(
        "Opening camera {} near {}x{}",
        index,
        constraints.ideal_width,
        constraints.ideal_height
    );

    let closest = CameraFormat::new(
        Resolution::new(constraints.ideal_width, constraints.ideal_height),
        FrameFormat::MJPEG,
        30,
    );
    let requested = RequestedFormat::new::<RgbFormat>(RequestedFormatType::Closest(closest));

    let mut camera = CallbackCamera::new(CameraIndex::Index(index), requested, |_| {})
        .map_err(classify_nokhwa)?;
    camera.open_stream().map_err(classify_nokhwa)?;

    Ok(NativeStream {
        camera: Mutex::new(camera),
        id: format!("native-{}", index),
        facing: Some(constraints.facing_mode).filter(|mode| *mode == FacingMode::User),
        paused: AtomicBool::new(false),
        stopped: AtomicBool::new(false),
    })
}

/// Map a nokhwa error onto a media failure name.
fn classify_nokhwa(error: NokhwaError) -> MediaFailure {
    let message = error.to_string();
    let lower = message.to_lowercase();

    let name = if matches!(
        error,
        NokhwaError::UnsupportedOperationError(_) | NokhwaError::NotImplementedError(_)
    ) {
        failure_names::NOT_SUPPORTED
    } else if lower.contains("permission") || lower.contains("denied") || lower.contains("not authorized")
    {
        failure_names::NOT_ALLOWED
    } else if lower.contains("busy") || lower.contains("in use") {
        failure_names::NOT_READABLE
    } else if lower.contains("not found") || lower.contains("no such") || lower.contains("no device")
    {
        failure_names::NOT_FOUND
    } else {
        failure_names::UNKNOWN
    };

    MediaFailure::new(name, message)
}

struct NativeStream {
    camera: Mutex<CallbackCamera>,
    id: String,
    facing: Option<FacingMode>,
    paused: AtomicBool,
    stopped: AtomicBool,
}

impl NativeStream {
    fn with_camera<T>(
        &self,
        f: impl FnOnce(&mut CallbackCamera) -> Result<T, NokhwaError>,
    ) -> Result<T, MediaFailure> {
        let mut camera = self
            .camera
            .lock()
            .map_err(|_| MediaFailure::new(failure_names::NOT_READABLE, "camera lock poisoned"))?;
        f(&mut camera).map_err(classify_nokhwa)
    }
}

#[async_trait]
impl DeviceStream for NativeStream {
    fn id(&self) -> &str {
        &self.id
    }

    fn settings(&self) -> TrackSettings {
        let (width, height) = self
            .with_camera(|camera| camera.resolution())
            .map(|r| (r.width_x, r.height_y))
            .unwrap_or((0, 0));
        TrackSettings {
            facing_mode: self.facing,
            width,
            height,
        }
    }

    fn ready_state(&self) -> ReadyState {
        if self.is_stopped() {
            return ReadyState::HaveNothing;
        }
        let open = self
            .camera
            .lock()
            .map(|camera| camera.is_stream_open())
            .unwrap_or(false);
        if open {
            ReadyState::HaveEnoughData
        } else {
            ReadyState::HaveNothing
        }
    }

    fn grab_frame(&self) -> Result<RgbImage, MediaFailure> {
        let buffer = self.with_camera(|camera| camera.poll_frame())?;
        let decoded = buffer
            .decode_image::<RgbFormat>()
            .map_err(classify_nokhwa)?;
        let (width, height) = (decoded.width(), decoded.height());
        RgbImage::from_raw(width, height, decoded.into_raw()).ok_or_else(|| {
            MediaFailure::new(
                failure_names::UNKNOWN,
                format!("frame buffer does not match {}x{}", width, height),
            )
        })
    }

    async fn play(&self) -> Result<(), MediaFailure> {
        if self.is_stopped() {
            return Err(MediaFailure::new("InvalidStateError", "stream has been stopped"));
        }
        self.with_camera(|camera| {
            if camera.is_stream_open() {
                Ok(())
            } else {
                camera.open_stream()
            }
        })?;
        self.paused.store(false, Ordering::SeqCst);
        Ok(())
    }

    fn is_paused(&self) -> bool {
        self.paused.load(Ordering::SeqCst)
    }

    fn stop(&self) {
        if self.stopped.swap(true, Ordering::SeqCst) {
            return;
        }
        if let Err(e) = self.with_camera(|camera| camera.stop_stream()) {
            log::warn!("Failed to stop camera stream {}: {}", self.id, e);
        }
        log::info!("Stopped camera stream {}", self.id);
    }

    fn is_stopped(&self) -> bool {
        self.stopped.load(Ordering::SeqCst)
    }
}

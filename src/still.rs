//! Still image encoding
//!
//! A still is the JPEG encoding of one frame, oriented the way the live
//! preview showed it at capture time.

use crate::errors::{FlowError, SubmitErrorKind};
use base64::Engine as _;
use bytes::Bytes;
use chrono::{DateTime, Utc};
use image::codecs::jpeg::JpegEncoder;
use image::RgbImage;

pub const JPEG_DATA_URL_PREFIX: &str = "data:image/jpeg;base64,";

#[derive(Debug, Clone, PartialEq)]
pub struct StillImage {
    jpeg: Bytes,
    width: u32,
    height: u32,
    mirrored: bool,
    captured_at: DateTime<Utc>,
}

impl StillImage {
    /// Encode `frame` as JPEG, flipping it horizontally first when the
    /// preview is mirrored.
    pub fn encode(frame: &RgbImage, quality: u8, mirror: bool) -> Result<Self, FlowError> {
        let (width, height) = frame.dimensions();
        if width == 0 || height == 0 {
            return Err(FlowError::Encoding("frame has no pixels".to_string()));
        }

        let mut buffer = Vec::new();
        let mut encoder = JpegEncoder::new_with_quality(&mut buffer, quality.clamp(1, 100));
        let result = if mirror {
            encoder.encode_image(&image::imageops::flip_horizontal(frame))
        } else {
            encoder.encode_image(frame)
        };
        result.map_err(|e| FlowError::Encoding(format!("JPEG encoding failed: {}", e)))?;

        log::debug!(
            "Encoded {}x{} still ({} bytes, quality {}, mirrored: {})",
            width,
            height,
            buffer.len(),
            quality,
            mirror
        );

        Ok(Self {
            jpeg: Bytes::from(buffer),
            width,
            height,
            mirrored: mirror,
            captured_at: Utc::now(),
        })
    }

    pub fn jpeg_bytes(&self) -> &Bytes {
        &self.jpeg
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    /// Whether the pixels were flipped to match a mirrored preview.
    pub fn was_mirrored(&self) -> bool {
        self.mirrored
    }

    pub fn captured_at(&self) -> DateTime<Utc> {
        self.captured_at
    }

    pub fn to_base64(&self) -> String {
        base64::engine::general_purpose::STANDARD.encode(&self.jpeg)
    }

    /// Data URL suitable for an `<img src>` preview.
    pub fn to_data_url(&self) -> String {
        format!("{}{}", JPEG_DATA_URL_PREFIX, self.to_base64())
    }
}

/// Strip the `data:<mime>;base64,` header, returning the raw base64 payload.
pub fn strip_data_url(data_url: &str) -> Result<&str, FlowError> {
    match data_url.split_once(',') {
        Some((_, payload)) if !payload.is_empty() => Ok(payload),
        _ => Err(FlowError::submit(
            SubmitErrorKind::MalformedPayload,
            "Could not extract base64 string from image data.",
        )),
    }
}

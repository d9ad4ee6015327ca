//! Synthetic frames and analysis payloads
//!
//! Deterministic stand-ins for camera output and service replies, so the
//! flow can be exercised offline without hardware or network.

use image::{Rgb, RgbImage};
use serde_json::{json, Value};

/// Gradient frame that changes with `frame_number`.
pub fn synthetic_frame(frame_number: u64, width: u32, height: u32) -> RgbImage {
    let base = (frame_number % 256) as u8;
    RgbImage::from_fn(width, height, |x, y| {
        Rgb([
            base.wrapping_add((x % 256) as u8),
            base.wrapping_add((y % 256) as u8),
            base.wrapping_add(((x + y) % 256) as u8),
        ])
    })
}

/// Left half pure red, right half pure blue. Makes horizontal flips obvious.
pub fn split_frame(width: u32, height: u32) -> RgbImage {
    RgbImage::from_fn(width, height, |x, _| {
        if x < width / 2 {
            Rgb([255, 0, 0])
        } else {
            Rgb([0, 0, 255])
        }
    })
}

/// A successful reply shaped like the face analysis service's.
pub fn sample_analysis_payload() -> Value {
    json!({
        "success": true,
        "message": "Image analyzed successfully",
        "data": {
            "age": {
                "3-9": 0.01,
                "10-19": 0.07,
                "20-29": 0.58,
                "30-39": 0.31,
                "70+": 0.03
            },
            "gender": {
                "female": 0.83,
                "male": 0.17
            },
            "race": {
                "black": 0.04,
                "east asian": 0.62,
                "latino hispanic": 0.09,
                "middle eastern": 0.02,
                "south asian": 0.05,
                "southeast asian": 0.11,
                "white": 0.07
            }
        }
    })
}

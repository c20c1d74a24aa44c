//! Rotation of sensor-oriented camera frames into the current device orientation.
//!
//! The camera delivers frames in landscape-left orientation; after rotation
//! the frame matches what the user sees on screen.

use crate::frame::{RGBA_CHANNELS, RgbaFrame};
use crate::PreprocessError;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DeviceOrientation {
    #[default]
    LandscapeLeft,
    LandscapeRight,
    Portrait,
    PortraitUpsideDown,
}

impl DeviceOrientation {
    pub fn as_str(&self) -> &'static str {
        match self {
            DeviceOrientation::LandscapeLeft => "landscape-left",
            DeviceOrientation::LandscapeRight => "landscape-right",
            DeviceOrientation::Portrait => "portrait",
            DeviceOrientation::PortraitUpsideDown => "portrait-upside-down",
        }
    }

    /// Rotate a sensor frame so that it matches this orientation.
    pub fn apply(&self, frame: RgbaFrame) -> Result<RgbaFrame, PreprocessError> {
        let _s = common::span_debug!("fit_device_orientation");

        // (i, j, w, h) -> (destination pixel, source pixel)
        let index: fn(usize, usize, usize, usize) -> (usize, usize) = match self {
            DeviceOrientation::LandscapeLeft => return Ok(frame),
            DeviceOrientation::LandscapeRight => {
                |i, j, w, h| (j * w + i, (h - 1 - j) * w + (w - 1 - i))
            }
            DeviceOrientation::Portrait => |i, j, w, h| (i * h + j, (h - 1 - j) * w + i),
            DeviceOrientation::PortraitUpsideDown => |i, j, w, h| (i * h + j, j * w + (w - 1 - i)),
        };

        let (width, height) = (frame.width() as usize, frame.height() as usize);
        let (out_width, out_height) = match self {
            DeviceOrientation::LandscapeRight => (width, height),
            _ => (height, width),
        };
        let src = frame.pixels();

        let mut rotated = vec![0u8; src.len()];
        for j in 0..height {
            for i in 0..width {
                let (dst, from) = index(i, j, width, height);
                rotated[dst * RGBA_CHANNELS..(dst + 1) * RGBA_CHANNELS]
                    .copy_from_slice(&src[from * RGBA_CHANNELS..(from + 1) * RGBA_CHANNELS]);
            }
        }

        RgbaFrame::new(out_width as u32, out_height as u32, rotated)
    }
}

impl FromStr for DeviceOrientation {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().replace('_', "-").as_str() {
            "landscape-left" | "landscape" => Ok(DeviceOrientation::LandscapeLeft),
            "landscape-right" => Ok(DeviceOrientation::LandscapeRight),
            "portrait" => Ok(DeviceOrientation::Portrait),
            "portrait-upside-down" => Ok(DeviceOrientation::PortraitUpsideDown),
            other => anyhow::bail!("Unsupported device orientation: {}", other),
        }
    }
}

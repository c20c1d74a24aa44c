use crate::PreprocessError;

pub const RGBA_CHANNELS: usize = 4;

/// Camera frame as handed over by the AR camera: RGBA, row-major, top row first.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RgbaFrame {
    width: u32,
    height: u32,
    pixels: Vec<u8>,
}

impl RgbaFrame {
    pub fn new(width: u32, height: u32, pixels: Vec<u8>) -> Result<Self, PreprocessError> {
        if width == 0 || height == 0 {
            return Err(PreprocessError::EmptyFrame { width, height });
        }

        let expected = width as usize * height as usize * RGBA_CHANNELS;
        if pixels.len() != expected {
            return Err(PreprocessError::SizeMismatch {
                expected,
                actual: pixels.len(),
            });
        }

        Ok(Self {
            width,
            height,
            pixels,
        })
    }

    /// Frame filled with a single color
    pub fn filled(width: u32, height: u32, rgba: [u8; 4]) -> Result<Self, PreprocessError> {
        let count = width as usize * height as usize;
        let pixels = rgba.iter().copied().cycle().take(count * RGBA_CHANNELS).collect();
        Self::new(width, height, pixels)
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn size(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    pub fn pixels(&self) -> &[u8] {
        &self.pixels
    }

    pub fn pixel(&self, x: u32, y: u32) -> Option<[u8; 4]> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let idx = (y as usize * self.width as usize + x as usize) * RGBA_CHANNELS;
        let px = &self.pixels[idx..idx + RGBA_CHANNELS];
        Some([px[0], px[1], px[2], px[3]])
    }

    pub fn into_pixels(self) -> Vec<u8> {
        self.pixels
    }
}

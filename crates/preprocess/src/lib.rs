pub mod config;
pub mod cpu;
pub mod error;
pub mod frame;
pub mod orientation;

use ndarray::{Array, IxDyn};

pub use config::DEFAULT_INPUT_SIZE;
pub use cpu::CpuPreProcessor;
pub use error::PreprocessError;
pub use frame::RgbaFrame;
pub use orientation::DeviceOrientation;

/// Square region of the source frame that was fed to the scaler.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CropWindow {
    pub x: u32,
    pub y: u32,
    pub side: u32,
}

/// Result of preprocessing including the crop that produced it
#[derive(Debug)]
pub struct PreprocessResult {
    /// NHWC tensor `(1, side, side, 3)`, RGB in `[0, 1]`
    pub tensor: Array<f32, IxDyn>,
    /// Center crop taken from the source frame
    pub crop: CropWindow,
    /// Dimensions of the source frame
    pub source_size: (u32, u32),
}

/// Trait for image preprocessing implementations
pub trait Preprocess {
    /// Crop, scale and normalize a frame for inference
    fn preprocess(&mut self, frame: &RgbaFrame) -> Result<PreprocessResult, PreprocessError>;

    /// Get the input size this preprocessor targets
    fn input_size(&self) -> (u32, u32);
}

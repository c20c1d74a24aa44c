pub mod backend;
pub mod config;
pub mod detection;
pub mod detector;
pub mod logging;
pub mod model;
pub mod processing;
pub mod source;

// Re-export commonly used types for convenience
pub use backend::{InferenceBackend, InferenceExecution, InferenceOutput, ModelIo};
pub use config::InferenceConfig;
pub use detection::{BoundingBox, Detection};
pub use detector::{DetectionPoll, Detector, DetectorConfig};
pub use model::{Labels, YoloHead};
pub use source::{FrameSource, ImageFileSource};

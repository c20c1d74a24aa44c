use crate::backend::{ModelIo, TensorLayout};
use crate::detector::DetectorConfig;
use crate::model::{Labels, YoloHead};
use common::{env_optional, env_or};
use preprocess::DeviceOrientation;
use std::env;
use std::path::PathBuf;

pub use common::Environment;

#[derive(Debug, Clone)]
pub struct InferenceConfig {
    pub environment: Environment,
    pub log_level: Option<String>,
    pub model_path: String,
    pub labels_path: Option<PathBuf>,
    pub input_size: u32,
    pub score_threshold: f32,
    pub iou_threshold: f32,
    pub bbox_limit: usize,
    pub layers_per_poll: usize,
    pub flush_every: usize,
    pub screen_size: (u32, u32),
    pub orientation: DeviceOrientation,
    pub model_io: ModelIo,
    pub image_path: Option<PathBuf>,
}

impl InferenceConfig {
    /// Load configuration from environment variables with sensible defaults
    pub fn from_env() -> anyhow::Result<Self> {
        let environment = Environment::from_env();
        let log_level = env::var("LOG_LEVEL").ok();

        let model_path =
            env::var("MODEL_PATH").unwrap_or_else(|_| "models/stolpersteine.onnx".to_string());
        let labels_path = env_optional::<PathBuf>("LABELS_PATH");

        let orientation = match env_optional::<String>("DEVICE_ORIENTATION") {
            Some(raw) => raw.parse()?,
            None => DeviceOrientation::default(),
        };

        let defaults = ModelIo::default();
        let layout = match env_optional::<String>("TENSOR_LAYOUT") {
            Some(raw) => raw.parse()?,
            None => TensorLayout::default(),
        };
        let model_io = ModelIo {
            input_name: env_or("INPUT_NAME", defaults.input_name),
            coarse_output: env_or("OUTPUT_COARSE", defaults.coarse_output),
            fine_output: env_or("OUTPUT_FINE", defaults.fine_output),
            layout,
        };

        let input_size: u32 = env_or("INPUT_SIZE", 416);
        if input_size == 0 || input_size % 32 != 0 {
            anyhow::bail!("INPUT_SIZE must be a positive multiple of 32, got {}", input_size);
        }

        Ok(Self {
            environment,
            log_level,
            model_path,
            labels_path,
            input_size,
            score_threshold: env_or("SCORE_THRESHOLD", 0.5),
            iou_threshold: env_or("IOU_THRESHOLD", 0.4),
            bbox_limit: env_or("BBOX_LIMIT", 10),
            layers_per_poll: env_or("LAYERS_PER_POLL", 16),
            flush_every: env_or("FLUSH_EVERY", 4),
            screen_size: (env_or("SCREEN_WIDTH", 1920), env_or("SCREEN_HEIGHT", 1080)),
            orientation,
            model_io,
            image_path: env_optional("IMAGE_PATH"),
        })
    }

    /// Runtime description of the model for this configuration
    pub fn detector_config(&self, labels: Labels) -> DetectorConfig {
        let head = YoloHead::yolov4_tiny(labels).with_input_side(self.input_size);

        DetectorConfig {
            head,
            score_threshold: self.score_threshold,
            iou_threshold: self.iou_threshold,
            bbox_limit: self.bbox_limit,
            layers_per_poll: self.layers_per_poll,
            flush_every: self.flush_every,
        }
    }

    /// Create default configuration for testing
    #[cfg(test)]
    pub fn test_default() -> Self {
        Self {
            environment: Environment::Development,
            log_level: None,
            model_path: "/models/model.onnx".to_string(),
            labels_path: None,
            input_size: 416,
            score_threshold: 0.5,
            iou_threshold: 0.4,
            bbox_limit: 10,
            layers_per_poll: 16,
            flush_every: 4,
            screen_size: (1920, 1080),
            orientation: DeviceOrientation::LandscapeLeft,
            model_io: ModelIo::default(),
            image_path: None,
        }
    }
}

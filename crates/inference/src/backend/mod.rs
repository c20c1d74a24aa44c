use ndarray::{Array, ArrayD, IxDyn};

#[cfg(feature = "ort-backend")]
pub mod ort;

/// Memory layout of the image tensor and the two output feature maps
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TensorLayout {
    /// `(1, height, width, channels)`, as produced by the preprocessor
    #[default]
    Nhwc,
    /// `(1, channels, height, width)`; tensors are permuted at the backend boundary
    Nchw,
}

impl std::str::FromStr for TensorLayout {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "nhwc" => Ok(TensorLayout::Nhwc),
            "nchw" => Ok(TensorLayout::Nchw),
            other => anyhow::bail!("Unsupported tensor layout: {}", other),
        }
    }
}

/// Names of the graph input and the two YOLO head outputs
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModelIo {
    pub input_name: String,
    pub coarse_output: String,
    pub fine_output: String,
    pub layout: TensorLayout,
}

impl Default for ModelIo {
    fn default() -> Self {
        Self {
            input_name: "input_1".to_string(),
            coarse_output: "conv2d_17".to_string(),
            fine_output: "conv2d_20".to_string(),
            layout: TensorLayout::Nhwc,
        }
    }
}

pub trait InferenceBackend {
    type Execution: InferenceExecution;

    fn load_model(path: &str, io: &ModelIo) -> anyhow::Result<Self>
    where
        Self: Sized;

    /// Start inference on an NHWC image tensor; the returned execution is
    /// advanced by the caller until it reports no more work.
    fn schedule(&mut self, images: &Array<f32, IxDyn>) -> anyhow::Result<Self::Execution>;
}

/// A resumable inference run
pub trait InferenceExecution {
    /// Run the next layer. Returns `false` once the graph has been fully evaluated.
    fn step(&mut self) -> anyhow::Result<bool>;

    /// Submit queued work to the device.
    fn flush(&mut self) {}

    /// Consume the finished execution and read both head outputs.
    fn finish(self) -> anyhow::Result<InferenceOutput>;
}

/// Raw head outputs, each `(1, rows, cols, channels)`
#[derive(Debug, Clone)]
pub struct InferenceOutput {
    pub coarse: ArrayD<f32>,
    pub fine: ArrayD<f32>,
}

/// Execution for backends that evaluate the whole graph in `schedule`
pub struct CompletedExecution {
    output: InferenceOutput,
}

impl CompletedExecution {
    pub fn new(output: InferenceOutput) -> Self {
        Self { output }
    }
}

impl InferenceExecution for CompletedExecution {
    fn step(&mut self) -> anyhow::Result<bool> {
        Ok(false)
    }

    fn finish(self) -> anyhow::Result<InferenceOutput> {
        Ok(self.output)
    }
}

use super::{
    CompletedExecution, InferenceBackend, InferenceOutput, ModelIo, TensorLayout,
};
use ndarray::{Array, ArrayD, IxDyn};
use ort::{
    session::{Session, builder::GraphOptimizationLevel},
    value::TensorRef,
};

#[derive(Debug, Clone, Copy, Default)]
pub enum ExecutionProvider {
    #[default]
    Cpu,
    #[cfg(feature = "cuda")]
    Cuda,
}

/// ONNX Runtime backend. The session evaluates the whole graph at once, so
/// every execution it hands out is already complete.
pub struct OrtBackend {
    session: Session,
    io: ModelIo,
}

impl OrtBackend {
    /// Load model with specified execution provider
    pub fn load_model_with_provider(
        path: &str,
        io: &ModelIo,
        provider: ExecutionProvider,
    ) -> anyhow::Result<Self> {
        // Initialize ORT environment (idempotent)
        let _ = ort::init().commit();

        #[allow(unused_mut)]
        let mut builder = Session::builder()?
            .with_optimization_level(GraphOptimizationLevel::Level3)?
            .with_intra_threads(4)?;

        match provider {
            #[cfg(feature = "cuda")]
            ExecutionProvider::Cuda => {
                tracing::info!("Initializing ONNX Runtime with CUDA execution provider");
                builder = builder.with_execution_providers([
                    ort::execution_providers::CUDAExecutionProvider::default()
                        .with_device_id(0)
                        .build()
                        .error_on_failure(),
                ])?;
            }
            ExecutionProvider::Cpu => {
                tracing::info!("Initializing ONNX Runtime with CPU execution provider");
            }
        }

        let session = builder.commit_from_file(path)?;

        tracing::info!(
            input = %io.input_name,
            coarse = %io.coarse_output,
            fine = %io.fine_output,
            layout = ?io.layout,
            "Model loaded from {}",
            path
        );
        Ok(Self {
            session,
            io: io.clone(),
        })
    }
}

impl InferenceBackend for OrtBackend {
    type Execution = CompletedExecution;

    fn load_model(path: &str, io: &ModelIo) -> anyhow::Result<Self> {
        Self::load_model_with_provider(path, io, ExecutionProvider::default())
    }

    fn schedule(&mut self, images: &Array<f32, IxDyn>) -> anyhow::Result<CompletedExecution> {
        let layout = self.io.layout;
        if images.ndim() != 4 {
            anyhow::bail!("Expected a 4-D image tensor, got shape {:?}", images.shape());
        }
        let input = match layout {
            TensorLayout::Nhwc => images.view(),
            TensorLayout::Nchw => images.view().permuted_axes(IxDyn(&[0, 3, 1, 2])),
        };
        // ort needs a standard-layout view
        let input = input.as_standard_layout();

        let outputs = self.session.run(ort::inputs![
            self.io.input_name.as_str() => TensorRef::from_array_view(input.view())?
        ])?;

        let coarse = outputs[self.io.coarse_output.as_str()].try_extract_array::<f32>()?;
        let fine = outputs[self.io.fine_output.as_str()].try_extract_array::<f32>()?;

        Ok(CompletedExecution::new(InferenceOutput {
            coarse: to_nhwc(coarse.into_owned(), layout),
            fine: to_nhwc(fine.into_owned(), layout),
        }))
    }
}

fn to_nhwc(output: ArrayD<f32>, layout: TensorLayout) -> ArrayD<f32> {
    match layout {
        // the decoder reports the shape mismatch
        TensorLayout::Nchw if output.ndim() != 4 => output,
        TensorLayout::Nhwc => output,
        TensorLayout::Nchw => output
            .permuted_axes(IxDyn(&[0, 2, 3, 1]))
            .as_standard_layout()
            .into_owned(),
    }
}

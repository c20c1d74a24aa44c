use crate::{
    backend::{InferenceBackend, InferenceExecution, InferenceOutput},
    detection::Detection,
    model::YoloHead,
    processing::{ScreenMapping, TensorDecoder, suppress},
    source::FrameSource,
};
use common::span;
use preprocess::{CpuPreProcessor, DeviceOrientation, Preprocess};
use std::time::Instant;

/// Immutable description of a detection run
#[derive(Debug, Clone, PartialEq)]
pub struct DetectorConfig {
    pub head: YoloHead,
    pub score_threshold: f32,
    pub iou_threshold: f32,
    pub bbox_limit: usize,
    /// Maximum layers run per `poll`
    pub layers_per_poll: usize,
    /// Flush the execution every this many layers; 0 never flushes
    pub flush_every: usize,
}

impl DetectorConfig {
    pub fn new(head: YoloHead) -> Self {
        Self {
            head,
            score_threshold: 0.5,
            iou_threshold: 0.4,
            bbox_limit: 10,
            layers_per_poll: 16,
            flush_every: 4,
        }
    }
}

/// Result of advancing the in-flight execution
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DetectionPoll {
    /// Nothing scheduled
    Idle,
    /// Still running; total layers evaluated so far
    Pending { layers: usize },
    /// Finished; number of detections now available through `latest`
    Ready(usize),
}

struct InFlight<E> {
    execution: E,
    frame_size: (u32, u32),
    layers: usize,
    started: Instant,
}

enum Progress {
    Running,
    Done,
}

/// Drives capture, stepped inference and post-processing from a host loop.
///
/// `detect_latest` starts a run and hands back the previous result; `poll`
/// advances the running execution a bounded amount per call.
pub struct Detector<B: InferenceBackend, P: Preprocess = CpuPreProcessor> {
    backend: B,
    preprocessor: P,
    decoder: TensorDecoder,
    config: DetectorConfig,
    orientation: DeviceOrientation,
    screen_size: (u32, u32),
    in_flight: Option<InFlight<B::Execution>>,
    latest: Option<Vec<Detection>>,
}

impl<B: InferenceBackend> Detector<B> {
    pub fn new(backend: B, config: DetectorConfig, screen_size: (u32, u32)) -> anyhow::Result<Self> {
        let side = config.head.input_side;
        let preprocessor = CpuPreProcessor::new((side, side))?;
        Ok(Self::with_preprocessor(backend, preprocessor, config, screen_size))
    }
}

impl<B: InferenceBackend, P: Preprocess> Detector<B, P> {
    pub fn with_preprocessor(
        backend: B,
        preprocessor: P,
        config: DetectorConfig,
        screen_size: (u32, u32),
    ) -> Self {
        let decoder = TensorDecoder::new(config.head.clone());
        Self {
            backend,
            preprocessor,
            decoder,
            config,
            orientation: DeviceOrientation::default(),
            screen_size,
            in_flight: None,
            latest: None,
        }
    }

    pub fn config(&self) -> &DetectorConfig {
        &self.config
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn orientation(&self) -> DeviceOrientation {
        self.orientation
    }

    /// Applies to frames captured from now on.
    pub fn set_orientation(&mut self, orientation: DeviceOrientation) {
        if orientation != self.orientation {
            tracing::info!(orientation = orientation.as_str(), "Device orientation changed");
        }
        self.orientation = orientation;
    }

    /// Applies to the next completed run, including one already in flight.
    pub fn set_screen_size(&mut self, screen_size: (u32, u32)) {
        self.screen_size = screen_size;
    }

    pub fn is_busy(&self) -> bool {
        self.in_flight.is_some()
    }

    /// Detections of the most recently completed run
    pub fn latest(&self) -> Option<&[Detection]> {
        self.latest.as_deref()
    }

    /// Start a run on the next frame of `source` and return the previous result.
    ///
    /// While a run is in flight the source is not touched. Returns `None` when
    /// the source has no frame.
    pub fn detect_latest<S>(&mut self, source: &mut S) -> anyhow::Result<Option<&[Detection]>>
    where
        S: FrameSource + ?Sized,
    {
        if self.in_flight.is_some() {
            tracing::trace!("Detection in flight, returning previous result");
            return Ok(self.latest());
        }

        let Some(frame) = source.acquire_frame() else {
            tracing::trace!("No frame available");
            return Ok(None);
        };

        let _s = span!("detect_latest");

        let frame = self.orientation.apply(frame)?;
        let frame_size = frame.size();
        let preprocessed = self.preprocessor.preprocess(&frame)?;

        let execution = {
            let _s = span!("schedule");
            self.backend.schedule(&preprocessed.tensor)?
        };

        tracing::debug!(
            width = frame_size.0,
            height = frame_size.1,
            orientation = self.orientation.as_str(),
            "Scheduled inference"
        );

        self.in_flight = Some(InFlight {
            execution,
            frame_size,
            layers: 0,
            started: Instant::now(),
        });

        Ok(self.latest())
    }

    /// Advance the in-flight run by at most `layers_per_poll` layers.
    ///
    /// A failing run is dropped and the error returned; the previous result is kept.
    pub fn poll(&mut self) -> anyhow::Result<DetectionPoll> {
        let Some(in_flight) = self.in_flight.as_mut() else {
            return Ok(DetectionPoll::Idle);
        };

        let progress = advance(in_flight, &self.config);
        let layers = in_flight.layers;
        match progress {
            Ok(Progress::Running) => Ok(DetectionPoll::Pending { layers }),
            Ok(Progress::Done) => self.complete(),
            Err(e) => {
                self.in_flight = None;
                Err(e)
            }
        }
    }

    /// Poll until the in-flight run completes.
    pub fn run_to_completion(&mut self) -> anyhow::Result<Option<&[Detection]>> {
        loop {
            match self.poll()? {
                DetectionPoll::Pending { .. } => continue,
                DetectionPoll::Idle | DetectionPoll::Ready(_) => return Ok(self.latest()),
            }
        }
    }

    fn complete(&mut self) -> anyhow::Result<DetectionPoll> {
        let Some(in_flight) = self.in_flight.take() else {
            return Ok(DetectionPoll::Idle);
        };

        let inference_time = in_flight.started.elapsed();
        let output = in_flight.execution.finish()?;

        let post_start = Instant::now();
        let detections = self.postprocess(&output, in_flight.frame_size)?;
        let count = detections.len();

        tracing::debug!(
            layers = in_flight.layers,
            inference_ms = inference_time.as_secs_f64() * 1000.0,
            postprocess_ms = post_start.elapsed().as_secs_f64() * 1000.0,
            detections = count,
            "Detection completed"
        );

        self.latest = Some(detections);
        Ok(DetectionPoll::Ready(count))
    }

    fn postprocess(
        &self,
        output: &InferenceOutput,
        frame_size: (u32, u32),
    ) -> anyhow::Result<Vec<Detection>> {
        let _s = span!("postprocess");
        let head = self.decoder.head();
        let threshold = self.config.score_threshold;

        let mut candidates = self
            .decoder
            .decode(&output.coarse.view(), threshold, &head.coarse)?;
        candidates.extend(
            self.decoder
                .decode(&output.fine.view(), threshold, &head.fine)?,
        );

        let mut detections = suppress(candidates, self.config.bbox_limit, self.config.iou_threshold);

        let mapping = ScreenMapping::new(
            frame_size,
            self.preprocessor.input_size(),
            self.screen_size,
        );
        for detection in &mut detections {
            detection.bbox = mapping.to_screen(&detection.bbox);
        }

        Ok(detections)
    }
}

fn advance<E: InferenceExecution>(
    in_flight: &mut InFlight<E>,
    config: &DetectorConfig,
) -> anyhow::Result<Progress> {
    for _ in 0..config.layers_per_poll.max(1) {
        if !in_flight.execution.step()? {
            return Ok(Progress::Done);
        }
        in_flight.layers += 1;
        if config.flush_every > 0 && in_flight.layers % config.flush_every == 0 {
            in_flight.execution.flush();
        }
    }
    Ok(Progress::Running)
}

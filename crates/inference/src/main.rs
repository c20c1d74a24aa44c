use inference::{
    Detector, ImageFileSource, InferenceConfig, Labels, backend::InferenceBackend,
    backend::ort::OrtBackend, logging::setup_logging,
};

fn main() -> anyhow::Result<()> {
    let config = InferenceConfig::from_env()?;

    setup_logging(&config);

    tracing::info!(
        config = ?config,
        "Loaded configuration"
    );

    let image_path = config
        .image_path
        .clone()
        .ok_or_else(|| anyhow::anyhow!("IMAGE_PATH must point to a still image"))?;
    let mut source = ImageFileSource::open(&image_path)?;

    let labels = Labels::load(config.labels_path.as_deref())?;

    tracing::info!("Loading inference model");
    let backend = OrtBackend::load_model(&config.model_path, &config.model_io)?;
    tracing::info!("Model loaded successfully");

    let mut detector = Detector::new(backend, config.detector_config(labels), config.screen_size)?;
    detector.set_orientation(config.orientation);

    detector.detect_latest(&mut source)?;
    let detections = detector.run_to_completion()?.unwrap_or_default();

    tracing::info!(count = detections.len(), "Detections");
    for detection in detections {
        tracing::info!("{}", detection);
    }

    Ok(())
}

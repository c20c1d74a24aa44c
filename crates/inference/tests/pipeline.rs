use approx::assert_relative_eq;
use inference::{
    BoundingBox, DetectionPoll, Detector, DetectorConfig, InferenceBackend, InferenceOutput,
    Labels, ModelIo, YoloHead,
    backend::CompletedExecution,
    processing::map_box,
};
use ndarray::{Array, ArrayD, IxDyn};
use preprocess::{DeviceOrientation, RgbaFrame};

/// logit of p
fn logit(p: f32) -> f32 {
    (p / (1.0 - p)).ln()
}

/// Backend returning fixed head outputs, evaluated in `schedule`
struct FixedBackend {
    output: InferenceOutput,
}

impl InferenceBackend for FixedBackend {
    type Execution = CompletedExecution;

    fn load_model(_path: &str, _io: &ModelIo) -> anyhow::Result<Self> {
        anyhow::bail!("FixedBackend is built directly")
    }

    fn schedule(&mut self, images: &Array<f32, IxDyn>) -> anyhow::Result<CompletedExecution> {
        anyhow::ensure!(images.shape() == [1, 416, 416, 3], "unexpected input shape");
        Ok(CompletedExecution::new(self.output.clone()))
    }
}

/// Head outputs with background everywhere
fn background() -> InferenceOutput {
    let mut coarse = ArrayD::<f32>::zeros(IxDyn(&[1, 13, 13, 18]));
    let mut fine = ArrayD::<f32>::zeros(IxDyn(&[1, 26, 26, 18]));
    for slot in 0..3 {
        coarse
            .slice_mut(ndarray::s![0, .., .., slot * 6 + 4])
            .fill(-20.0);
        fine.slice_mut(ndarray::s![0, .., .., slot * 6 + 4]).fill(-20.0);
    }
    InferenceOutput { coarse, fine }
}

fn detector(output: InferenceOutput, screen: (u32, u32)) -> Detector<FixedBackend> {
    let labels = Labels::from_text("stolperstein\n");
    let config = DetectorConfig::new(YoloHead::yolov4_tiny(labels));
    Detector::new(FixedBackend { output }, config, screen).unwrap()
}

#[test]
fn test_coarse_and_fine_boxes_reach_the_screen() {
    let mut output = background();
    // coarse cell (column 3, row 2), fine cell (column 20, row 10)
    output.coarse[[0, 2, 3, 4]] = logit(0.9);
    output.fine[[0, 10, 20, 4]] = logit(0.8);

    let screen = (1920, 1080);
    let mut detector = detector(output, screen);
    let mut source = || RgbaFrame::filled(1280, 720, [50, 60, 70, 255]).ok();

    assert!(detector.detect_latest(&mut source).unwrap().is_none());
    assert_eq!(detector.poll().unwrap(), DetectionPoll::Ready(2));

    let detections = detector.latest().unwrap();
    assert_eq!(detections[0].label, "stolperstein");
    assert_relative_eq!(detections[0].confidence, 0.9, epsilon = 1e-5);
    assert_relative_eq!(detections[1].confidence, 0.8, epsilon = 1e-5);

    let expected = map_box(
        &BoundingBox::new(3.5 * 32.0, 2.5 * 32.0, 81.0, 82.0),
        (1280, 720),
        (416, 416),
        screen,
    );
    assert_relative_eq!(detections[0].bbox.x, expected.x, epsilon = 1e-2);
    assert_relative_eq!(detections[0].bbox.y, expected.y, epsilon = 1e-2);
    assert_relative_eq!(detections[0].bbox.width, expected.width, epsilon = 1e-2);
}

#[test]
fn test_duplicate_boxes_across_scales_are_suppressed() {
    let mut output = background();
    // both centers land on (176, 176) with similar anchors
    output.coarse[[0, 5, 5, 4]] = logit(0.9);
    output.fine[[0, 10, 10, 6 + 4]] = logit(0.7);
    output.fine[[0, 10, 10, 6]] = 20.0;
    output.fine[[0, 10, 10, 6 + 1]] = 20.0;
    output.fine[[0, 10, 10, 6 + 2]] = (81.0f32 / 23.0).ln();
    output.fine[[0, 10, 10, 6 + 3]] = (82.0f32 / 27.0).ln();

    let mut detector = detector(output, (416, 416));
    let mut source = || RgbaFrame::filled(416, 416, [0, 0, 0, 255]).ok();

    detector.detect_latest(&mut source).unwrap();
    let detections = detector.run_to_completion().unwrap().unwrap();
    assert_eq!(detections.len(), 1);
    assert_relative_eq!(detections[0].confidence, 0.9, epsilon = 1e-5);
}

#[test]
fn test_portrait_frames_map_with_rotated_dimensions() {
    let mut output = background();
    output.coarse[[0, 6, 6, 4]] = logit(0.9);

    let screen = (1080, 1920);
    let mut detector = detector(output, screen);
    detector.set_orientation(DeviceOrientation::Portrait);
    let mut source = || RgbaFrame::filled(1280, 720, [0, 0, 0, 255]).ok();

    detector.detect_latest(&mut source).unwrap();
    let detections = detector.run_to_completion().unwrap().unwrap();

    // the center cell of the model input lands on the screen center
    assert_relative_eq!(detections[0].bbox.x, 540.0, epsilon = 1e-2);
    assert_relative_eq!(detections[0].bbox.y, 960.0, epsilon = 1e-2);
}

#[test]
fn test_empty_scene_yields_empty_result() {
    let mut detector = detector(background(), (416, 416));
    let mut source = || RgbaFrame::filled(300, 500, [0, 0, 0, 255]).ok();

    detector.detect_latest(&mut source).unwrap();
    assert_eq!(detector.poll().unwrap(), DetectionPoll::Ready(0));
    assert_eq!(detector.latest().map(<[_]>::len), Some(0));
}

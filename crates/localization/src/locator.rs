use crate::config::LocalizationConfig;
use crate::ordering::order;
use crate::sanity::SanityRejection;
use crate::types::{LocalizedObject, Observer, Pose, SurfaceHit, SurfaceProvider, facing_rotation};
use inference::Detection;
use nalgebra::{Point2, Unit, Vector3};
use std::time::Instant;
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LocationMethod {
    #[default]
    Touch,
    ObjectDetection,
}

impl LocationMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            LocationMethod::Touch => "touch",
            LocationMethod::ObjectDetection => "object-detection",
        }
    }

    pub fn toggled(self) -> Self {
        match self {
            LocationMethod::Touch => LocationMethod::ObjectDetection,
            LocationMethod::ObjectDetection => LocationMethod::Touch,
        }
    }
}

impl std::str::FromStr for LocationMethod {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().replace('_', "-").as_str() {
            "touch" => Ok(LocationMethod::Touch),
            "object-detection" | "detection" => Ok(LocationMethod::ObjectDetection),
            other => anyhow::bail!("Unsupported location method: {}", other),
        }
    }
}

/// Reasons a detection batch is discarded; the caller retries on a later frame.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum LocalizationRejected {
    #[error("Expected {expected} objects, detected {found}")]
    CountMismatch { expected: usize, found: usize },

    #[error("Detection {index} does not hit a tracked surface")]
    OffSurface { index: usize },

    #[error("Implausible localization: {0}")]
    Implausible(#[from] SanityRejection),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TouchPhase {
    Began,
    Moved,
    Stationary,
    Ended,
}

/// Primary touch; position in screen pixels, bottom-left origin
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Touch {
    pub position: Point2<f32>,
    pub phase: TouchPhase,
}

#[derive(Debug, Clone, PartialEq)]
pub enum TouchOutcome {
    NoTouch,
    /// The touch does not hit a surface
    Miss,
    /// Touch still held over a surface
    Preview(Pose),
    /// A hit was recorded, more are needed
    Recorded { count: usize, expected: usize },
    /// All expected objects were placed by touch
    Complete(Vec<LocalizedObject>),
}

/// An ordered object together with its anchor
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Placement {
    pub order: usize,
    pub object: LocalizedObject,
    /// Object position, rotated to face along the observer's flattened view direction
    pub anchor: Pose,
}

/// Turns detections or touches into localized, ordered objects.
pub struct Localizer {
    config: LocalizationConfig,
    method: LocationMethod,
    last_detection: Option<Instant>,
    touch_hits: Vec<LocalizedObject>,
}

impl Localizer {
    pub fn new(config: LocalizationConfig) -> Self {
        let method = config.method;
        Self {
            config,
            method,
            last_detection: None,
            touch_hits: Vec::new(),
        }
    }

    pub fn config(&self) -> &LocalizationConfig {
        &self.config
    }

    pub fn method(&self) -> LocationMethod {
        self.method
    }

    pub fn toggle_method(&mut self) -> LocationMethod {
        self.method = self.method.toggled();
        tracing::info!(method = self.method.as_str(), "Location method changed");
        self.method
    }

    /// Objects recorded by touch so far
    pub fn touch_hits(&self) -> &[LocalizedObject] {
        &self.touch_hits
    }

    /// Forget touch hits and the detection throttle.
    pub fn reset(&mut self) {
        self.touch_hits.clear();
        self.last_detection = None;
    }

    /// Whether a detection attempt may run at `now`; marks the attempt when it may.
    pub fn detection_due(&mut self, now: Instant) -> bool {
        if let Some(last) = self.last_detection
            && now.saturating_duration_since(last) < self.config.detection_interval
        {
            return false;
        }
        self.last_detection = Some(now);
        true
    }

    /// Project screen-space detections (top-left origin) onto tracked surfaces.
    pub fn locate_detections<S>(
        &self,
        detections: &[Detection],
        expected: usize,
        observer: &Observer,
        screen_height: f32,
        surfaces: &S,
    ) -> Result<Vec<LocalizedObject>, LocalizationRejected>
    where
        S: SurfaceProvider + ?Sized,
    {
        if detections.len() != expected {
            tracing::debug!(expected, found = detections.len(), "Detection count mismatch");
            return Err(LocalizationRejected::CountMismatch {
                expected,
                found: detections.len(),
            });
        }

        let mut located = Vec::with_capacity(detections.len());
        for (index, detection) in detections.iter().enumerate() {
            let point = Point2::new(detection.bbox.x, screen_height - detection.bbox.y);
            let Some(hit) = surfaces.raycast(point) else {
                tracing::debug!(index, x = point.x, y = point.y, "Detection off surface");
                return Err(LocalizationRejected::OffSurface { index });
            };
            located.push(facing_observer(hit, observer));
        }

        if let Err(rejection) = self.config.sanity.check(&located) {
            tracing::debug!(%rejection, "Localization batch rejected");
            return Err(rejection.into());
        }

        tracing::info!(count = located.len(), "Objects localized by detection");
        Ok(located)
    }

    /// Advance touch localization by one host frame.
    pub fn locate_touch<S>(
        &mut self,
        touch: Option<Touch>,
        expected: usize,
        surfaces: &S,
    ) -> TouchOutcome
    where
        S: SurfaceProvider + ?Sized,
    {
        let Some(touch) = touch else {
            return TouchOutcome::NoTouch;
        };
        let Some(hit) = surfaces.raycast(touch.position) else {
            return TouchOutcome::Miss;
        };

        if touch.phase != TouchPhase::Ended {
            return TouchOutcome::Preview(hit.pose);
        }

        self.touch_hits.push(hit.into());
        let count = self.touch_hits.len();
        tracing::debug!(count, expected, "Touch hit recorded");

        if count >= expected {
            tracing::info!(count, "Objects localized by touch");
            return TouchOutcome::Complete(std::mem::take(&mut self.touch_hits));
        }
        TouchOutcome::Recorded { count, expected }
    }

    /// Order objects spatially and anchor each one facing the observer's view direction.
    pub fn place(
        &self,
        objects: Vec<LocalizedObject>,
        observer: &Observer,
        normal: &Unit<Vector3<f32>>,
    ) -> Vec<Placement> {
        let anchor_rotation = facing_rotation(&observer.forward, normal);

        order(objects, observer, normal, self.config.row_tolerance)
            .into_iter()
            .enumerate()
            .map(|(order, object)| Placement {
                order,
                object,
                anchor: Pose::new(
                    object.pose.position,
                    anchor_rotation.unwrap_or(object.pose.rotation),
                ),
            })
            .collect()
    }
}

/// Pair placements with the entries of an ordered content list.
///
/// Entry `i` goes to the placement with `order == i`, whatever order the
/// placements are passed in.
pub fn assign_contents<C>(
    mut placements: Vec<Placement>,
    contents: Vec<C>,
) -> anyhow::Result<Vec<(Placement, C)>> {
    anyhow::ensure!(
        placements.len() == contents.len(),
        "{} placements but {} content entries",
        placements.len(),
        contents.len()
    );

    placements.sort_by_key(|placement| placement.order);
    Ok(placements.into_iter().zip(contents).collect())
}

/// Replace the hit rotation with one facing along the observer's flattened
/// view direction, keeping the surface normal as up.
fn facing_observer(hit: SurfaceHit, observer: &Observer) -> LocalizedObject {
    let mut object = LocalizedObject::from(hit);
    if let Some(rotation) = facing_rotation(&observer.forward, &hit.normal) {
        object.pose.rotation = rotation;
    }
    object
}

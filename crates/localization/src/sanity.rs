use crate::types::{LocalizedObject, SurfaceId};
use nalgebra::distance;
use thiserror::Error;

pub const DEFAULT_MAX_NEIGHBOR_DISTANCE: f32 = 0.3;

/// Plausibility rules for a batch of localized objects. Both distance rules
/// are optional and independent.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SanityPolicy {
    /// Reject when an object's nearest neighbour is further away than this
    pub max_neighbor_distance: Option<f32>,
    /// Reject when two objects are closer than this
    pub min_separation: Option<f32>,
}

impl Default for SanityPolicy {
    fn default() -> Self {
        Self {
            max_neighbor_distance: Some(DEFAULT_MAX_NEIGHBOR_DISTANCE),
            min_separation: None,
        }
    }
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum SanityRejection {
    #[error("No objects were localized")]
    Empty,

    #[error("Objects {first} and {second} lie on different surfaces ({a:?} and {b:?})")]
    DifferentSurfaces {
        first: usize,
        second: usize,
        a: SurfaceId,
        b: SurfaceId,
    },

    #[error("Object {index} is {distance:.3} from its nearest neighbour, limit {limit}")]
    Isolated {
        index: usize,
        distance: f32,
        limit: f32,
    },

    #[error("Objects {first} and {second} are only {distance:.3} apart, minimum {limit}")]
    TooClose {
        first: usize,
        second: usize,
        distance: f32,
        limit: f32,
    },
}

impl SanityPolicy {
    pub fn check(&self, objects: &[LocalizedObject]) -> Result<(), SanityRejection> {
        let Some(reference) = objects.first() else {
            return Err(SanityRejection::Empty);
        };

        if let Some(second) = objects.iter().position(|o| o.surface != reference.surface) {
            return Err(SanityRejection::DifferentSurfaces {
                first: 0,
                second,
                a: reference.surface,
                b: objects[second].surface,
            });
        }

        // batches are a handful of objects, so pairwise is fine
        for (i, object) in objects.iter().enumerate() {
            let mut nearest = f32::INFINITY;
            for (j, other) in objects.iter().enumerate() {
                if i == j {
                    continue;
                }
                let d = distance(&object.pose.position, &other.pose.position);

                if let Some(limit) = self.min_separation
                    && j > i
                    && d < limit
                {
                    return Err(SanityRejection::TooClose {
                        first: i,
                        second: j,
                        distance: d,
                        limit,
                    });
                }
                nearest = nearest.min(d);
            }

            if let Some(limit) = self.max_neighbor_distance
                && nearest.is_finite()
                && nearest > limit
            {
                return Err(SanityRejection::Isolated {
                    index: i,
                    distance: nearest,
                    limit,
                });
            }
        }

        Ok(())
    }

    pub fn is_plausible(&self, objects: &[LocalizedObject]) -> bool {
        match self.check(objects) {
            Ok(()) => true,
            Err(rejection) => {
                tracing::debug!(%rejection, "Localization batch rejected");
                false
            }
        }
    }
}

pub mod config;
pub mod locator;
pub mod ordering;
pub mod sanity;
pub mod types;

pub use config::LocalizationConfig;
pub use locator::{
    LocalizationRejected, LocationMethod, Localizer, Placement, Touch, TouchOutcome, TouchPhase,
    assign_contents,
};
pub use ordering::{ObserverFrame, order};
pub use sanity::{SanityPolicy, SanityRejection};
pub use types::{LocalizedObject, Observer, Pose, SurfaceHit, SurfaceId, SurfaceProvider};

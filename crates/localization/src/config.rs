use crate::locator::LocationMethod;
use crate::ordering::DEFAULT_ROW_TOLERANCE;
use crate::sanity::{DEFAULT_MAX_NEIGHBOR_DISTANCE, SanityPolicy};
use common::{env_duration_ms, env_optional, env_or};
use std::env;
use std::time::Duration;

#[derive(Debug, Clone, PartialEq)]
pub struct LocalizationConfig {
    pub method: LocationMethod,
    pub detection_interval: Duration,
    pub row_tolerance: f32,
    pub sanity: SanityPolicy,
}

impl Default for LocalizationConfig {
    fn default() -> Self {
        Self {
            method: LocationMethod::Touch,
            detection_interval: Duration::from_millis(300),
            row_tolerance: DEFAULT_ROW_TOLERANCE,
            sanity: SanityPolicy::default(),
        }
    }
}

impl LocalizationConfig {
    /// Load configuration from environment variables with sensible defaults
    pub fn from_env() -> anyhow::Result<Self> {
        let method = match env_optional::<String>("LOCATION_METHOD") {
            Some(raw) => raw.parse()?,
            None => LocationMethod::default(),
        };

        // unset keeps the default, "none" disables the rule
        let max_neighbor_distance = match env::var("MAX_NEIGHBOR_DISTANCE") {
            Ok(_) => env_optional("MAX_NEIGHBOR_DISTANCE"),
            Err(_) => Some(DEFAULT_MAX_NEIGHBOR_DISTANCE),
        };

        Ok(Self {
            method,
            detection_interval: env_duration_ms("DETECTION_INTERVAL_MS", 300),
            row_tolerance: env_or("ROW_TOLERANCE", DEFAULT_ROW_TOLERANCE),
            sanity: SanityPolicy {
                max_neighbor_distance,
                min_separation: env_optional("MIN_SEPARATION"),
            },
        })
    }
}

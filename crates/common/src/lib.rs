pub mod config;
pub mod logging;
pub mod macros;

pub use config::{Environment, env_duration_ms, env_optional, env_or};
pub use logging::setup_logging;

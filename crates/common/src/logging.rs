use crate::config::Environment;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

/// Initialize tracing subscriber with pretty formatting for development
/// and JSON formatting for production.
///
/// `RUST_LOG` takes precedence; otherwise `log_level` is used, and "info" when
/// neither is set or parseable.
pub fn setup_logging(log_level: Option<String>, environment: Environment) {
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| match log_level.as_deref() {
            Some(level) => EnvFilter::try_new(level),
            None => EnvFilter::try_new("info"),
        })
        .unwrap_or_else(|_| EnvFilter::new("info"));

    let registry = tracing_subscriber::registry().with(env_filter);

    // try_init so that hosts embedding the pipeline may install their own subscriber first
    let result = match environment {
        Environment::Production => registry
            .with(tracing_subscriber::fmt::layer().json().with_level(true))
            .try_init(),
        Environment::Development => registry
            .with(tracing_subscriber::fmt::layer().pretty().with_ansi(true))
            .try_init(),
    };

    if let Err(e) = result {
        tracing::debug!(error = %e, "Global subscriber already installed");
    }
}

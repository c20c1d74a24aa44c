use std::env;
use std::str::FromStr;
use std::time::Duration;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Environment {
    Development,
    Production,
}

impl Environment {
    pub fn as_str(&self) -> &'static str {
        match self {
            Environment::Development => "development",
            Environment::Production => "production",
        }
    }

    pub fn from_env() -> Self {
        match env::var("ENVIRONMENT")
            .unwrap_or_else(|_| "development".to_string())
            .to_lowercase()
            .as_str()
        {
            "production" | "prod" => Environment::Production,
            _ => Environment::Development,
        }
    }
}

/// Read and parse an environment variable, falling back to `default` when it is
/// missing or does not parse.
pub fn env_or<T: FromStr>(key: &str, default: T) -> T {
    env::var(key)
        .ok()
        .and_then(|s| s.trim().parse().ok())
        .unwrap_or(default)
}

/// Like [`env_or`] but without a default. Empty values and the literal `none`
/// count as unset.
pub fn env_optional<T: FromStr>(key: &str) -> Option<T> {
    let raw = env::var(key).ok()?;
    let raw = raw.trim();
    if raw.is_empty() || raw.eq_ignore_ascii_case("none") {
        return None;
    }
    raw.parse().ok()
}

pub fn env_duration_ms(key: &str, default_ms: u64) -> Duration {
    Duration::from_millis(env_or(key, default_ms))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    #[test]
    #[serial]
    fn test_environment_defaults_to_development() {
        unsafe { env::remove_var("ENVIRONMENT") };
        assert_eq!(Environment::from_env(), Environment::Development);
    }

    #[test]
    #[serial]
    fn test_environment_accepts_prod_alias() {
        unsafe { env::set_var("ENVIRONMENT", "PROD") };
        assert_eq!(Environment::from_env(), Environment::Production);
        assert_eq!(Environment::from_env().as_str(), "production");
        unsafe { env::remove_var("ENVIRONMENT") };
    }

    #[test]
    #[serial]
    fn test_env_or_falls_back_on_garbage() {
        unsafe { env::set_var("COMMON_TEST_THRESHOLD", "not-a-number") };
        assert_eq!(env_or("COMMON_TEST_THRESHOLD", 0.5f32), 0.5);

        unsafe { env::set_var("COMMON_TEST_THRESHOLD", " 0.25 ") };
        assert_eq!(env_or("COMMON_TEST_THRESHOLD", 0.5f32), 0.25);
        unsafe { env::remove_var("COMMON_TEST_THRESHOLD") };
    }

    #[test]
    #[serial]
    fn test_env_optional_treats_none_as_unset() {
        unsafe { env::set_var("COMMON_TEST_OPTIONAL", "none") };
        assert_eq!(env_optional::<f32>("COMMON_TEST_OPTIONAL"), None);

        unsafe { env::set_var("COMMON_TEST_OPTIONAL", "0.3") };
        assert_eq!(env_optional::<f32>("COMMON_TEST_OPTIONAL"), Some(0.3));

        unsafe { env::remove_var("COMMON_TEST_OPTIONAL") };
        assert_eq!(env_optional::<f32>("COMMON_TEST_OPTIONAL"), None);
    }

    #[test]
    #[serial]
    fn test_env_duration_reads_milliseconds() {
        unsafe { env::set_var("COMMON_TEST_INTERVAL_MS", "300") };
        assert_eq!(
            env_duration_ms("COMMON_TEST_INTERVAL_MS", 10),
            Duration::from_millis(300)
        );
        unsafe { env::remove_var("COMMON_TEST_INTERVAL_MS") };
    }
}

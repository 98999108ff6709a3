use crate::shared::config::{AppConfig, AppConfigBuilder, ConfigError, Platform};
use std::time::Duration;

/// Default server URL when nothing else is configured
const DEFAULT_SERVER_URL: &str = "http://localhost:8000";

/// Loopback host the Android emulator uses to reach the host machine
const ANDROID_EMULATOR_HOST: &str = "10.0.2.2";

/// Default HTTP request timeout
const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Default connectivity probe timeout. Kept short so the UI stays
/// responsive while deciding whether to work offline.
const DEFAULT_PROBE_TIMEOUT: Duration = Duration::from_secs(3);

/// Runtime client configuration.
///
/// Wraps [`AppConfig`] and applies the base-URL resolution policy: the
/// URL is resolved once, at construction, and every request uses it.
#[derive(Debug, Clone)]
pub struct Config {
    app: AppConfig,
    base_url: String,
    request_timeout: Duration,
    probe_timeout: Duration,
}

impl Default for Config {
    fn default() -> Self {
        let mut builder = AppConfig::builder();
        if let Ok(url) = std::env::var("LIFTLOG_API_URL") {
            builder = builder.dev_url(url);
        }
        let app = builder.build().expect("default app config is valid");
        Self::from_app(app)
    }
}

impl Config {
    /// Create a new configuration with default values
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_builder(builder: AppConfigBuilder) -> Result<Self, ConfigError> {
        Ok(Self::from_app(builder.build()?))
    }

    fn from_app(app: AppConfig) -> Self {
        let base_url = Self::resolve_base_url(&app);
        Self {
            app,
            base_url,
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
            probe_timeout: DEFAULT_PROBE_TIMEOUT,
        }
    }

    /// Resolve the base URL once for this configuration.
    ///
    /// Production builds use the production URL. Development builds use
    /// the configured dev URL (or `LIFTLOG_API_URL`), falling back to
    /// localhost with a warning when nothing is configured. On Android
    /// the loopback host is rewritten to the emulator gateway, since
    /// `localhost` inside the emulator is the emulator itself.
    fn resolve_base_url(app: &AppConfig) -> String {
        let raw = if app.is_production {
            match &app.production_url {
                Some(url) => url.clone(),
                None => {
                    // validate() rejects this combination; kept as a
                    // defensive fallback for hand-built configs.
                    tracing::warn!("production build without production_url, using {DEFAULT_SERVER_URL}");
                    DEFAULT_SERVER_URL.to_string()
                }
            }
        } else if let Some(url) = &app.dev_url {
            url.clone()
        } else if let Some(url) = &app.production_url {
            url.clone()
        } else {
            tracing::warn!(
                "no server URL configured, falling back to {DEFAULT_SERVER_URL}; \
                 set LIFTLOG_API_URL to silence this"
            );
            DEFAULT_SERVER_URL.to_string()
        };

        let rewritten = Self::rewrite_for_platform(&raw, app.platform);
        rewritten.trim_end_matches('/').to_string()
    }

    fn rewrite_for_platform(url: &str, platform: Platform) -> String {
        if platform == Platform::Android {
            return url
                .replacen("://localhost", &format!("://{ANDROID_EMULATOR_HOST}"), 1)
                .replacen("://127.0.0.1", &format!("://{ANDROID_EMULATOR_HOST}"), 1);
        }
        url.to_string()
    }

    /// Get the full URL for an API endpoint
    pub fn api_url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// HTTP request timeout (default 10s)
    pub fn request_timeout(&self) -> Duration {
        self.request_timeout
    }

    /// Connectivity probe timeout (default 3s)
    pub fn probe_timeout(&self) -> Duration {
        self.probe_timeout
    }

    /// Override the request timeout
    pub fn set_request_timeout(&mut self, timeout: Duration) {
        self.request_timeout = timeout;
    }

    /// Override the probe timeout
    pub fn set_probe_timeout(&mut self, timeout: Duration) {
        self.probe_timeout = timeout;
    }

    /// Platform this client runs on
    pub fn platform(&self) -> Platform {
        self.app.platform
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    #[test]
    #[serial]
    fn test_config_default_falls_back_to_localhost() {
        std::env::remove_var("LIFTLOG_API_URL");
        let config = Config::new();
        assert_eq!(config.base_url(), "http://localhost:8000");
    }

    #[test]
    #[serial]
    fn test_env_override() {
        std::env::set_var("LIFTLOG_API_URL", "http://192.168.1.20:8000");
        let config = Config::new();
        assert_eq!(config.base_url(), "http://192.168.1.20:8000");
        std::env::remove_var("LIFTLOG_API_URL");
    }

    #[test]
    #[serial]
    fn test_production_url_wins_in_production() {
        let config = Config::with_builder(
            AppConfig::builder()
                .is_production(true)
                .production_url("https://api.liftlog.app")
                .dev_url("http://localhost:8000"),
        )
        .unwrap();
        assert_eq!(config.base_url(), "https://api.liftlog.app");
    }

    #[test]
    #[serial]
    fn test_android_loopback_rewrite() {
        let config = Config::with_builder(
            AppConfig::builder()
                .dev_url("http://localhost:8000")
                .platform(Platform::Android),
        )
        .unwrap();
        assert_eq!(config.base_url(), "http://10.0.2.2:8000");
    }

    #[test]
    #[serial]
    fn test_non_android_keeps_loopback() {
        let config = Config::with_builder(
            AppConfig::builder()
                .dev_url("http://127.0.0.1:8000")
                .platform(Platform::Ios),
        )
        .unwrap();
        assert_eq!(config.base_url(), "http://127.0.0.1:8000");
    }

    #[test]
    #[serial]
    fn test_api_url() {
        let config =
            Config::with_builder(AppConfig::builder().dev_url("http://localhost:8000/")).unwrap();
        assert_eq!(
            config.api_url("/workouts"),
            "http://localhost:8000/workouts"
        );
    }
}

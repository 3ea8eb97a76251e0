use std::time::Duration;

use crate::liveness::DEFAULT_PROBE_TTL;

/// Environment flag that opts a process into monitoring.
pub const ENABLE_ENV: &str = "WFMON_MONITOR";

/// Environment override for the monitor's base URL.
pub const URL_ENV: &str = "WFMON_URL";

pub const DEFAULT_URL: &str = "http://localhost:8000";

pub const DEFAULT_PROBE_TIMEOUT: Duration = Duration::from_millis(500);
pub const DEFAULT_EMIT_TIMEOUT: Duration = Duration::from_secs(1);

const TRUTHY: [&str; 4] = ["1", "true", "yes", "on"];

/// Case-insensitive check against the fixed set of "on" values.
pub fn is_truthy(value: Option<&str>) -> bool {
    value.is_some_and(|v| TRUTHY.iter().any(|t| v.eq_ignore_ascii_case(t)))
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmitterConfig {
    pub base_url: String,
    pub enabled: bool,
    pub probe_timeout: Duration,
    pub emit_timeout: Duration,
    pub probe_ttl: Duration,
}

impl Default for EmitterConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_URL.to_string(),
            enabled: false,
            probe_timeout: DEFAULT_PROBE_TIMEOUT,
            emit_timeout: DEFAULT_EMIT_TIMEOUT,
            probe_ttl: DEFAULT_PROBE_TTL,
        }
    }
}

impl EmitterConfig {
    /// Read the gate and the URL override from the environment.
    pub fn from_env() -> Self {
        Self::from_vars(
            std::env::var(ENABLE_ENV).ok().as_deref(),
            std::env::var(URL_ENV).ok().as_deref(),
        )
    }

    fn from_vars(enable: Option<&str>, url: Option<&str>) -> Self {
        let mut config = Self {
            enabled: is_truthy(enable),
            ..Self::default()
        };
        if let Some(url) = url.filter(|u| !u.trim().is_empty()) {
            config.base_url = url.trim().to_string();
        }
        config
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub fn with_enabled(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self
    }

    pub(crate) fn endpoint(&self, path: &str) -> String {
        format!("{}{}", self.base_url.trim_end_matches('/'), path)
    }
}

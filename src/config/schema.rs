/// Configuration schema and defaults for lms-console.
///
/// Defines the TOML-serializable configuration structure with the
/// `[server]`, `[dashboard]` and `[logging]` sections.
///
/// Every field has a built-in default. Users only set what they want to
/// override.
use std::time::Duration;

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Top-level config
// ---------------------------------------------------------------------------

/// Top-level console configuration.
///
/// Maps directly to `~/.lms-console/config.toml` and `.lms-console.toml`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConsoleConfig {
    pub server: ServerConfig,
    pub dashboard: DashboardConfig,
    pub logging: LoggingConfig,
}

// ---------------------------------------------------------------------------
// [server]
// ---------------------------------------------------------------------------

/// Connection settings for the LMS Manager backend.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Base URL of the backend, without a trailing slash.
    pub base_url: String,
    /// Per-request timeout (milliseconds).
    pub timeout_ms: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            base_url: "http://127.0.0.1:8080".to_string(),
            timeout_ms: 10_000,
        }
    }
}

impl ServerConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

// ---------------------------------------------------------------------------
// [dashboard]
// ---------------------------------------------------------------------------

/// Shortest poll period the dashboard will run with (milliseconds).
pub const MIN_REFRESH_INTERVAL_MS: u64 = 1_000;

/// Timing and sizing of the interactive dashboard.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DashboardConfig {
    /// Poll period for stats, alerts and logs (milliseconds).
    pub refresh_interval_ms: u64,
    /// Number of log entries requested per refresh.
    pub log_limit: u32,
    /// How long each toast stays on screen (milliseconds).
    pub toast_ttl_ms: u64,
    /// Delay before re-reading stats after a start (milliseconds).
    pub start_settle_ms: u64,
    /// Delay before re-reading stats after a stop (milliseconds).
    pub stop_settle_ms: u64,
    /// Delay before re-reading stats after a restart (milliseconds).
    pub restart_settle_ms: u64,
    /// Delay between a successful login and the switch to the dashboard.
    pub login_redirect_ms: u64,
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            refresh_interval_ms: 30_000,
            log_limit: 50,
            toast_ttl_ms: 5_000,
            start_settle_ms: 2_000,
            stop_settle_ms: 2_000,
            restart_settle_ms: 3_000,
            login_redirect_ms: 1_000,
        }
    }
}

impl DashboardConfig {
    /// Poll period, never shorter than [`MIN_REFRESH_INTERVAL_MS`].
    pub fn refresh_interval(&self) -> Duration {
        Duration::from_millis(self.refresh_interval_ms.max(MIN_REFRESH_INTERVAL_MS))
    }

    pub fn toast_ttl(&self) -> Duration {
        Duration::from_millis(self.toast_ttl_ms)
    }

    pub fn login_redirect(&self) -> Duration {
        Duration::from_millis(self.login_redirect_ms)
    }
}

// ---------------------------------------------------------------------------
// [logging]
// ---------------------------------------------------------------------------

/// Activity log settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Append every API call to `~/.lms-console/activity.jsonl`.
    pub activity_log: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self { activity_log: true }
    }
}

// ---------------------------------------------------------------------------
// Annotated default file
// ---------------------------------------------------------------------------

impl ConsoleConfig {
    /// The annotated default config written by `lms-console config init`.
    pub fn default_toml() -> String {
        r#"# lms-console configuration
#
# Configuration hierarchy (highest precedence wins):
#   1. Environment variables (LMS_CONSOLE_*)
#   2. Project config (.lms-console.toml in current directory)
#   3. User global config (~/.lms-console/config.toml)
#   4. Built-in defaults

[server]
base_url = "http://127.0.0.1:8080"   # or LMS_CONSOLE_URL
timeout_ms = 10000

[dashboard]
refresh_interval_ms = 30000          # stats / alerts / logs poll period (min 1000)
log_limit = 50
toast_ttl_ms = 5000
start_settle_ms = 2000
stop_settle_ms = 2000
restart_settle_ms = 3000
login_redirect_ms = 1000

[logging]
activity_log = true                  # ~/.lms-console/activity.jsonl
"#
        .to_string()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_has_expected_values() {
        let config = ConsoleConfig::default();
        assert_eq!(config.server.base_url, "http://127.0.0.1:8080");
        assert_eq!(config.server.timeout_ms, 10_000);
        assert_eq!(config.dashboard.refresh_interval_ms, 30_000);
        assert_eq!(config.dashboard.log_limit, 50);
        assert_eq!(config.dashboard.toast_ttl_ms, 5_000);
        assert_eq!(config.dashboard.start_settle_ms, 2_000);
        assert_eq!(config.dashboard.stop_settle_ms, 2_000);
        assert_eq!(config.dashboard.restart_settle_ms, 3_000);
        assert!(config.logging.activity_log);
    }

    #[test]
    fn deserialize_minimal_toml() {
        let toml_str = r#"
[server]
base_url = "http://lms.internal:9000"
"#;
        let config: ConsoleConfig = toml::from_str(toml_str).unwrap();
        assert_eq!(config.server.base_url, "http://lms.internal:9000");
        // Everything else falls back to defaults
        assert_eq!(config.server.timeout_ms, 10_000);
        assert_eq!(config.dashboard.log_limit, 50);
    }

    #[test]
    fn default_toml_parses_back() {
        let config: ConsoleConfig = toml::from_str(&ConsoleConfig::default_toml()).unwrap();
        assert_eq!(config, ConsoleConfig::default());
    }

    #[test]
    fn durations_convert_from_millis() {
        let config = ConsoleConfig::default();
        assert_eq!(config.server.timeout(), Duration::from_secs(10));
        assert_eq!(config.dashboard.refresh_interval(), Duration::from_secs(30));
        assert_eq!(config.dashboard.toast_ttl(), Duration::from_secs(5));
        assert_eq!(config.dashboard.login_redirect(), Duration::from_secs(1));
    }

    #[test]
    fn refresh_interval_has_a_floor() {
        let mut dashboard = DashboardConfig {
            refresh_interval_ms: 0,
            ..DashboardConfig::default()
        };
        assert_eq!(dashboard.refresh_interval(), Duration::from_secs(1));

        dashboard.refresh_interval_ms = 5;
        assert_eq!(dashboard.refresh_interval(), Duration::from_secs(1));

        dashboard.refresh_interval_ms = 2_500;
        assert_eq!(dashboard.refresh_interval(), Duration::from_millis(2_500));
    }
}

//! Gate Configuration
//!
//! Loaded from a YAML file, then overridden from the environment:
//!
//! ```yaml
//! endpoint: "https://example.com/offer"
//! timeout_secs: 5
//! browser_headers: true
//! follow_redirects: false
//! effective_from: "2025-11-01T00:00:00Z"
//! reprobe_on_launch: true
//! state_path: "dailywell-state.json"
//! ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::error::ConfigError;

pub const ENV_ENDPOINT: &str = "DAILYWELL_GATE_ENDPOINT";
pub const ENV_TIMEOUT_SECS: &str = "DAILYWELL_GATE_TIMEOUT_SECS";
pub const ENV_STATE_PATH: &str = "DAILYWELL_STATE_PATH";

const DEFAULT_TIMEOUT_SECS: u64 = 5;
const DEFAULT_STATE_FILE: &str = "dailywell-state.json";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GateConfig {
    /// URL probed at launch. Kept as a raw string: a malformed value is
    /// not a config error, it locks the gate.
    #[serde(default)]
    pub endpoint: String,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    /// Send User-Agent / Accept / Accept-Language / Accept-Encoding like a mobile browser.
    #[serde(default = "default_true")]
    pub browser_headers: bool,
    /// When false, a 3xx is observed directly (and unlocks).
    #[serde(default)]
    pub follow_redirects: bool,
    /// Before this instant the probe is skipped and the gate stays locked.
    #[serde(default)]
    pub effective_from: Option<DateTime<Utc>>,
    /// When false, a decision persisted by an earlier launch is reused.
    #[serde(default = "default_true")]
    pub reprobe_on_launch: bool,
    #[serde(default = "default_state_path")]
    pub state_path: PathBuf,
}

fn default_timeout_secs() -> u64 {
    DEFAULT_TIMEOUT_SECS
}

fn default_true() -> bool {
    true
}

fn default_state_path() -> PathBuf {
    PathBuf::from(DEFAULT_STATE_FILE)
}

impl GateConfig {
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            browser_headers: true,
            follow_redirects: false,
            effective_from: None,
            reprobe_on_launch: true,
            state_path: default_state_path(),
        }
    }

    /// Load from a YAML file
    pub fn load_from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::Io {
            path: path.to_path_buf(),
            source: e,
        })?;

        Self::load_from_str(&content)
    }

    /// Load from a YAML string
    pub fn load_from_str(yaml: &str) -> Result<Self, ConfigError> {
        serde_yaml::from_str(yaml).map_err(|e| ConfigError::Parse(e.to_string()))
    }

    /// Build from environment variables only.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from any key lookup, as [`from_env`](Self::from_env) does for the environment.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::new(String::new());
        config.apply_overrides_from(lookup)?;
        config.validate()?;
        Ok(config)
    }

    /// Full start-up load: the file plus environment overrides, or the
    /// environment alone.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let Some(path) = path else {
            return Self::from_env();
        };
        let mut config = Self::load_from_file(path)?;
        config.apply_env_overrides()?;
        config.validate()?;
        Ok(config)
    }

    pub fn apply_env_overrides(&mut self) -> Result<(), ConfigError> {
        self.apply_overrides_from(|key| std::env::var(key).ok())
    }

    /// Apply overrides from any key lookup. Non-empty values win over file values.
    pub fn apply_overrides_from<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(endpoint) = get(ENV_ENDPOINT) {
            self.endpoint = endpoint;
        }
        if let Some(raw) = get(ENV_TIMEOUT_SECS) {
            self.timeout_secs = raw
                .trim()
                .parse()
                .map_err(|_| ConfigError::InvalidValue {
                    key: ENV_TIMEOUT_SECS.to_string(),
                    value: raw.clone(),
                })?;
        }
        if let Some(path) = get(ENV_STATE_PATH) {
            self.state_path = PathBuf::from(path);
        }
        Ok(())
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.endpoint.trim().is_empty() {
            return Err(ConfigError::MissingEndpoint);
        }
        if self.timeout_secs == 0 {
            return Err(ConfigError::InvalidValue {
                key: "timeout_secs".to_string(),
                value: "0".to_string(),
            });
        }
        Ok(())
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// False only while `now` is strictly before `effective_from`.
    pub fn probe_allowed_at(&self, now: DateTime<Utc>) -> bool {
        match self.effective_from {
            Some(cutoff) => now >= cutoff,
            None => true,
        }
    }

    /// State path from the environment, or the default file name.
    pub fn state_path_from_env() -> PathBuf {
        std::env::var(ENV_STATE_PATH)
            .ok()
            .filter(|v| !v.trim().is_empty())
            .map(PathBuf::from)
            .unwrap_or_else(default_state_path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use std::collections::HashMap;

    #[test]
    fn minimal_yaml_uses_defaults() {
        let config = GateConfig::load_from_str("endpoint: https://example.com/gate\n").unwrap();
        assert_eq!(config, GateConfig::new("https://example.com/gate"));
        assert_eq!(config.timeout(), Duration::from_secs(5));
        assert!(config.browser_headers);
        assert!(!config.follow_redirects);
        assert!(config.reprobe_on_launch);
    }

    #[test]
    fn full_yaml_round_trips_fields() {
        let yaml = r#"
endpoint: "https://example.com/gate"
timeout_secs: 2
browser_headers: false
follow_redirects: true
effective_from: "2025-11-01T00:00:00Z"
reprobe_on_launch: false
state_path: "/tmp/gate.json"
"#;
        let config = GateConfig::load_from_str(yaml).unwrap();
        assert_eq!(config.timeout_secs, 2);
        assert!(!config.browser_headers);
        assert!(config.follow_redirects);
        assert!(!config.reprobe_on_launch);
        assert_eq!(
            config.effective_from,
            Some(Utc.with_ymd_and_hms(2025, 11, 1, 0, 0, 0).unwrap())
        );
        assert_eq!(config.state_path, PathBuf::from("/tmp/gate.json"));
    }

    #[test]
    fn bad_yaml_is_parse_error() {
        let err = GateConfig::load_from_str("timeout_secs: [not, a, number]").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn overrides_win_over_file_values() {
        let mut config = GateConfig::new("https://file.example/gate");
        let env: HashMap<&str, &str> = [
            (ENV_ENDPOINT, "https://env.example/gate"),
            (ENV_TIMEOUT_SECS, "9"),
            (ENV_STATE_PATH, ""),
        ]
        .into_iter()
        .collect();

        config
            .apply_overrides_from(|key| env.get(key).map(|v| v.to_string()))
            .unwrap();

        assert_eq!(config.endpoint, "https://env.example/gate");
        assert_eq!(config.timeout_secs, 9);
        assert_eq!(config.state_path, PathBuf::from(DEFAULT_STATE_FILE));
    }

    #[test]
    fn unparseable_timeout_override_is_rejected() {
        let mut config = GateConfig::new("https://example.com");
        let err = config
            .apply_overrides_from(|key| (key == ENV_TIMEOUT_SECS).then(|| "soon".to_string()))
            .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue { .. }));
    }

    #[test]
    fn lookup_only_config() {
        let env: HashMap<&str, &str> = [
            (ENV_ENDPOINT, "https://env.example/gate"),
            (ENV_STATE_PATH, "/var/lib/dailywell/state.json"),
        ]
        .into_iter()
        .collect();

        let config = GateConfig::from_lookup(|key| env.get(key).map(|v| v.to_string())).unwrap();
        assert_eq!(config.endpoint, "https://env.example/gate");
        assert_eq!(config.timeout_secs, DEFAULT_TIMEOUT_SECS);
        assert_eq!(
            config.state_path,
            PathBuf::from("/var/lib/dailywell/state.json")
        );

        assert!(matches!(
            GateConfig::from_lookup(|_| None),
            Err(ConfigError::MissingEndpoint)
        ));
    }

    #[test]
    fn load_reports_missing_file() {
        let err = GateConfig::load(Some(Path::new("/nonexistent/dailywell/gate.yaml"))).unwrap_err();
        assert!(matches!(err, ConfigError::Io { .. }));
    }

    #[test]
    fn validation_requires_endpoint_and_timeout() {
        assert!(matches!(
            GateConfig::new("  ").validate(),
            Err(ConfigError::MissingEndpoint)
        ));
        let mut config = GateConfig::new("https://example.com");
        config.timeout_secs = 0;
        assert!(config.validate().is_err());
        // A malformed URL is still a valid config.
        assert!(GateConfig::new("not a url").validate().is_ok());
    }

    #[test]
    fn cutoff_blocks_probe_until_reached() {
        let cutoff = Utc.with_ymd_and_hms(2025, 11, 1, 0, 0, 0).unwrap();
        let mut config = GateConfig::new("https://example.com");
        assert!(config.probe_allowed_at(cutoff - chrono::Duration::days(365)));

        config.effective_from = Some(cutoff);
        assert!(!config.probe_allowed_at(cutoff - chrono::Duration::seconds(1)));
        assert!(config.probe_allowed_at(cutoff));
        assert!(config.probe_allowed_at(cutoff + chrono::Duration::days(1)));
    }
}

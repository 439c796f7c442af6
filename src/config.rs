//! Dialer configuration.
//!
//! All sections use `#[serde(default)]` so a partial TOML file is valid.
//! Durations are milliseconds.

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{DialerError, Result};
use crate::{
    DIAGNOSTIC_EVERY, DIAGNOSTIC_NAME_PATTERN, INDICATOR_REVERT_MS, MAX_CAPABILITY_ATTEMPTS,
    MAX_SUB_CAPABILITY_ATTEMPTS, POLL_INTERVAL_MS,
};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct DialerConfig {
    pub discovery: DiscoveryConfig,
    pub session: SessionConfig,
    pub feed: FeedConfig,
}

/// Bounded polling for the host SDK
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DiscoveryConfig {
    pub poll_interval_ms: u64,
    /// Retries allowed while looking for the SDK object
    pub max_capability_attempts: u32,
    /// Retries allowed while looking for the registration API
    pub max_sub_capability_attempts: u32,
    /// Log a diagnostic every N attempts (0 disables)
    pub diagnostic_every: u32,
    /// Case-insensitive pattern for host names worth listing in diagnostics
    pub name_pattern: String,
}

impl Default for DiscoveryConfig {
    fn default() -> Self {
        Self {
            poll_interval_ms: POLL_INTERVAL_MS,
            max_capability_attempts: MAX_CAPABILITY_ATTEMPTS,
            max_sub_capability_attempts: MAX_SUB_CAPABILITY_ATTEMPTS,
            diagnostic_every: DIAGNOSTIC_EVERY,
            name_pattern: DIAGNOSTIC_NAME_PATTERN.to_string(),
        }
    }
}

impl DiscoveryConfig {
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    pub indicator_revert_ms: u64,
    /// Initial value of the "use default campaign" toggle
    pub use_default_campaign: bool,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            indicator_revert_ms: INDICATOR_REVERT_MS,
            use_default_campaign: true,
        }
    }
}

impl SessionConfig {
    pub fn indicator_revert(&self) -> Duration {
        Duration::from_millis(self.indicator_revert_ms)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FeedConfig {
    /// Agent event feed (websocket)
    pub url: Option<String>,
    /// Address for the feed server in `--serve` mode
    pub listen_addr: String,
}

impl Default for FeedConfig {
    fn default() -> Self {
        Self {
            url: None,
            listen_addr: "127.0.0.1:3000".to_string(),
        }
    }
}

impl DialerConfig {
    /// Parse a TOML document
    pub fn from_toml(contents: &str) -> Result<Self> {
        toml::from_str(contents).map_err(|e| DialerError::Config(e.to_string()))
    }

    /// Load from a file; a missing file yields defaults
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            tracing::debug!("Config file not found at {:?}, using defaults", path);
            return Ok(Self::default());
        }
        let contents = std::fs::read_to_string(path)?;
        let config = Self::from_toml(&contents)?;
        tracing::info!("Loaded config from {:?}", path);
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_constants() {
        let config = DialerConfig::default();
        assert_eq!(config.discovery.poll_interval(), Duration::from_millis(250));
        assert_eq!(config.discovery.max_capability_attempts, 1200);
        assert_eq!(config.discovery.max_sub_capability_attempts, 360);
        assert_eq!(config.session.indicator_revert(), Duration::from_millis(1200));
        assert!(config.session.use_default_campaign);
    }

    #[test]
    fn test_partial_toml_keeps_other_defaults() {
        let config = DialerConfig::from_toml(
            r#"
            [discovery]
            max_capability_attempts = 720
            max_sub_capability_attempts = 240
            diagnostic_every = 20
            "#,
        )
        .unwrap();
        assert_eq!(config.discovery.max_capability_attempts, 720);
        assert_eq!(config.discovery.max_sub_capability_attempts, 240);
        assert_eq!(config.discovery.diagnostic_every, 20);
        assert_eq!(config.discovery.poll_interval_ms, 250);
        assert_eq!(config.session.indicator_revert_ms, 1200);
    }

    #[test]
    fn test_invalid_toml_is_config_error() {
        let err = DialerConfig::from_toml("[discovery]\nmax_capability_attempts = \"lots\"")
            .unwrap_err();
        assert!(matches!(err, DialerError::Config(_)));
    }

    #[test]
    fn test_missing_file_yields_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = DialerConfig::load(&dir.path().join("absent.toml")).unwrap();
        assert_eq!(config.feed.listen_addr, "127.0.0.1:3000");
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("dialer.toml");
        std::fs::write(&path, "[feed]\nurl = \"ws://localhost:3000/ws\"\n").unwrap();
        let config = DialerConfig::load(&path).unwrap();
        assert_eq!(config.feed.url.as_deref(), Some("ws://localhost:3000/ws"));
    }
}

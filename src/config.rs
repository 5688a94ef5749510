//! Configuration for the avatar
//!
//! Timing constants drive the crossfade controller, media settings shape the
//! simulated playback surfaces. Values are read once at startup.

use crate::{AvatarError, Result};
use serde::Deserialize;
use std::fs;
use std::path::Path;
use std::time::Duration;
use tracing::warn;

/// Artificial wait standing in for response generation
pub const SYNTHESIS_DELAY_MS: u64 = 1000;
/// Length of one opacity transition
pub const CROSSFADE_MS: u64 = 300;
/// Remaining response playback at which the return crossfade starts
pub const CROSSFADE_LEAD_MS: u64 = 600;

/// Complete avatar configuration
#[derive(Clone, Debug, Default, Deserialize, PartialEq)]
#[serde(default)]
pub struct AvatarConfig {
    /// Crossfade timing
    pub timing: TimingConfig,

    /// Simulated media surfaces
    pub media: MediaConfig,

    /// Failure policy
    pub recovery: RecoveryConfig,
}

/// Crossfade timing constants
#[derive(Clone, Debug, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct TimingConfig {
    pub synthesis_delay_ms: u64,
    pub crossfade_ms: u64,
    pub crossfade_lead_ms: u64,
}

impl Default for TimingConfig {
    fn default() -> Self {
        Self {
            synthesis_delay_ms: SYNTHESIS_DELAY_MS,
            crossfade_ms: CROSSFADE_MS,
            crossfade_lead_ms: CROSSFADE_LEAD_MS,
        }
    }
}

impl TimingConfig {
    pub fn synthesis_delay(&self) -> Duration {
        Duration::from_millis(self.synthesis_delay_ms)
    }

    pub fn crossfade(&self) -> Duration {
        Duration::from_millis(self.crossfade_ms)
    }

    pub fn crossfade_lead(&self) -> Duration {
        Duration::from_millis(self.crossfade_lead_ms)
    }
}

/// Settings for the simulated idle and response surfaces
#[derive(Clone, Debug, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct MediaConfig {
    /// Length of the idle loop
    pub idle_duration_ms: u64,

    /// Length of the response clip
    pub response_duration_ms: u64,

    /// Time the response surface needs to buffer after a reload
    pub response_load_latency_ms: u64,

    /// Make every response load fail
    pub fail_response_load: bool,

    /// Reject play requests the way a strict autoplay policy would
    pub reject_autoplay: bool,
}

impl Default for MediaConfig {
    fn default() -> Self {
        Self {
            idle_duration_ms: 8000,
            response_duration_ms: 5000,
            response_load_latency_ms: 250,
            fail_response_load: false,
            reject_autoplay: false,
        }
    }
}

impl MediaConfig {
    pub fn idle_duration(&self) -> Duration {
        Duration::from_millis(self.idle_duration_ms)
    }

    pub fn response_duration(&self) -> Duration {
        Duration::from_millis(self.response_duration_ms)
    }

    pub fn response_load_latency(&self) -> Duration {
        Duration::from_millis(self.response_load_latency_ms)
    }
}

/// What the controller does when the response never becomes playable
#[derive(Clone, Debug, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct RecoveryConfig {
    /// Return to idle and re-enable send after a load failure.
    /// When false the cycle stalls with send disabled.
    pub reset_on_load_failure: bool,
}

impl Default for RecoveryConfig {
    fn default() -> Self {
        Self {
            reset_on_load_failure: true,
        }
    }
}

impl AvatarConfig {
    /// Load a configuration from a TOML file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|e| {
            AvatarError::IOError(format!("Failed to read '{}': {}", path.display(), e))
        })?;
        Self::from_toml(&content).map_err(|e| match e {
            AvatarError::ConfigError(message) => {
                AvatarError::ConfigError(format!("{}: {}", path.display(), message))
            }
            other => other,
        })
    }

    /// Parse and validate a configuration from TOML text
    pub fn from_toml(content: &str) -> Result<Self> {
        let config: AvatarConfig = toml::from_str(content)
            .map_err(|e| AvatarError::ConfigError(format!("Failed to parse config: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    /// Set the timing constants
    pub fn with_timing(mut self, synthesis_delay_ms: u64, crossfade_ms: u64, lead_ms: u64) -> Self {
        self.timing = TimingConfig {
            synthesis_delay_ms,
            crossfade_ms,
            crossfade_lead_ms: lead_ms,
        };
        self
    }

    /// Set the length of the response clip
    pub fn with_response_duration(mut self, duration_ms: u64) -> Self {
        self.media.response_duration_ms = duration_ms;
        self
    }

    /// Set the length of the idle loop
    pub fn with_idle_duration(mut self, duration_ms: u64) -> Self {
        self.media.idle_duration_ms = duration_ms;
        self
    }

    /// Keep the cycle stalled after a response load failure
    pub fn without_load_recovery(mut self) -> Self {
        self.recovery.reset_on_load_failure = false;
        self
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        if self.timing.crossfade_ms == 0 {
            return Err(AvatarError::ConfigError(
                "crossfade_ms must be greater than zero".to_string(),
            ));
        }

        if self.timing.crossfade_lead_ms < self.timing.crossfade_ms {
            return Err(AvatarError::ConfigError(format!(
                "crossfade_lead_ms ({}) must cover crossfade_ms ({})",
                self.timing.crossfade_lead_ms, self.timing.crossfade_ms
            )));
        }

        if self.media.idle_duration_ms == 0 || self.media.response_duration_ms == 0 {
            return Err(AvatarError::ConfigError(
                "media durations must be greater than zero".to_string(),
            ));
        }

        // Content constraint only: the return crossfade may never trigger.
        if self.media.response_duration_ms <= self.timing.crossfade_lead_ms {
            warn!(
                response_ms = self.media.response_duration_ms,
                lead_ms = self.timing.crossfade_lead_ms,
                "Response clip is not longer than the crossfade lead time"
            );
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = AvatarConfig::default();
        assert_eq!(config.timing.synthesis_delay_ms, 1000);
        assert_eq!(config.timing.crossfade_ms, 300);
        assert_eq!(config.timing.crossfade_lead_ms, 600);
        assert!(config.recovery.reset_on_load_failure);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_builder() {
        let config = AvatarConfig::default()
            .with_timing(500, 200, 400)
            .with_response_duration(3000)
            .without_load_recovery();

        assert_eq!(config.timing.synthesis_delay(), Duration::from_millis(500));
        assert_eq!(config.media.response_duration(), Duration::from_secs(3));
        assert!(!config.recovery.reset_on_load_failure);
    }

    #[test]
    fn test_partial_toml_uses_defaults() {
        let config = AvatarConfig::from_toml(
            r#"
            [timing]
            synthesis_delay_ms = 1500

            [media]
            fail_response_load = true
            "#,
        )
        .unwrap();

        assert_eq!(config.timing.synthesis_delay_ms, 1500);
        assert_eq!(config.timing.crossfade_ms, CROSSFADE_MS);
        assert!(config.media.fail_response_load);
        assert_eq!(config.media.idle_duration_ms, 8000);
    }

    #[test]
    fn test_lead_shorter_than_crossfade_is_rejected() {
        let config = AvatarConfig::default().with_timing(1000, 300, 200);
        assert!(matches!(config.validate(), Err(AvatarError::ConfigError(_))));
    }

    #[test]
    fn test_load_prefixes_path_once() {
        let path = std::env::temp_dir().join(format!("avatar-config-{}.toml", std::process::id()));
        fs::write(&path, "[timing]\ncrossfade_ms = \"fast\"").unwrap();

        let message = AvatarConfig::load(&path).unwrap_err().to_string();
        fs::remove_file(&path).unwrap();

        assert!(message.starts_with("Configuration error: "));
        assert!(message.contains(&path.display().to_string()));
        assert_eq!(message.matches("Configuration error").count(), 1);
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let result = AvatarConfig::load("/nonexistent/avatar.toml");
        assert!(matches!(result, Err(AvatarError::IOError(_))));
    }

    #[test]
    fn test_malformed_toml_is_config_error() {
        let result = AvatarConfig::from_toml("[timing]\ncrossfade_ms = \"fast\"");
        assert!(matches!(result, Err(AvatarError::ConfigError(_))));
    }
}

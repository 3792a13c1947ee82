//! Application configuration value object

use serde::{Deserialize, Serialize};

use crate::domain::recording::Duration;

/// Application configuration.
/// All fields are optional to support partial configs and merging.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    pub limit: Option<String>,
    pub encoder: Option<String>,
    pub output_dir: Option<String>,
    pub flush_every: Option<String>,
    pub cue: Option<bool>,
}

impl AppConfig {
    /// Create config with default values
    pub fn defaults() -> Self {
        Self {
            limit: Some("30s".to_string()),
            encoder: Some("wav".to_string()),
            output_dir: None,
            flush_every: None,
            cue: Some(false),
        }
    }

    /// Create an empty config (all None)
    pub fn empty() -> Self {
        Self::default()
    }

    /// Merge this config with another, where other takes precedence.
    /// Only non-None values from other will override this.
    pub fn merge(self, other: Self) -> Self {
        Self {
            limit: other.limit.or(self.limit),
            encoder: other.encoder.or(self.encoder),
            output_dir: other.output_dir.or(self.output_dir),
            flush_every: other.flush_every.or(self.flush_every),
            cue: other.cue.or(self.cue),
        }
    }

    /// Get limit as parsed Duration, or default if not set/invalid
    pub fn limit_or_default(&self) -> Duration {
        self.limit
            .as_ref()
            .and_then(|s| s.parse().ok())
            .unwrap_or_else(Duration::default_limit)
    }

    /// Get encoder name, or "wav" if not set
    pub fn encoder_or_default(&self) -> &str {
        self.encoder.as_deref().unwrap_or("wav")
    }

    /// Get flush interval as parsed Duration, if set and valid
    pub fn flush_every_duration(&self) -> Option<Duration> {
        self.flush_every.as_ref().and_then(|s| s.parse().ok())
    }

    /// Get cue setting, or false if not set
    pub fn cue_or_default(&self) -> bool {
        self.cue.unwrap_or(false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_have_expected_values() {
        let config = AppConfig::defaults();
        assert_eq!(config.limit, Some("30s".to_string()));
        assert_eq!(config.encoder, Some("wav".to_string()));
        assert!(config.output_dir.is_none());
        assert!(config.flush_every.is_none());
        assert_eq!(config.cue, Some(false));
    }

    #[test]
    fn empty_has_all_none() {
        let config = AppConfig::empty();
        assert!(config.limit.is_none());
        assert!(config.encoder.is_none());
        assert!(config.output_dir.is_none());
        assert!(config.flush_every.is_none());
        assert!(config.cue.is_none());
    }

    #[test]
    fn merge_other_takes_precedence() {
        let base = AppConfig {
            limit: Some("30s".to_string()),
            encoder: Some("wav".to_string()),
            ..Default::default()
        };

        let other = AppConfig {
            limit: Some("2m".to_string()),
            encoder: None, // Should not override
            ..Default::default()
        };

        let merged = base.merge(other);

        assert_eq!(merged.limit, Some("2m".to_string()));
        assert_eq!(merged.encoder, Some("wav".to_string())); // Kept from base
    }

    #[test]
    fn merge_preserves_base_when_other_is_none() {
        let base = AppConfig {
            output_dir: Some("/tmp/takes".to_string()),
            cue: Some(true),
            ..Default::default()
        };

        let other = AppConfig::empty();
        let merged = base.merge(other);

        assert_eq!(merged.output_dir, Some("/tmp/takes".to_string()));
        assert_eq!(merged.cue, Some(true));
    }

    #[test]
    fn limit_or_default_parses() {
        let config = AppConfig {
            limit: Some("45s".to_string()),
            ..Default::default()
        };
        assert_eq!(config.limit_or_default().as_secs(), 45);
    }

    #[test]
    fn limit_or_default_uses_default_on_invalid() {
        let config = AppConfig {
            limit: Some("invalid".to_string()),
            ..Default::default()
        };
        assert_eq!(config.limit_or_default().as_secs(), 30);
    }

    #[test]
    fn limit_or_default_uses_default_on_none() {
        let config = AppConfig::empty();
        assert_eq!(config.limit_or_default().as_secs(), 30);
    }

    #[test]
    fn encoder_or_default_returns_wav() {
        let config = AppConfig::empty();
        assert_eq!(config.encoder_or_default(), "wav");
    }

    #[test]
    fn encoder_or_default_returns_configured() {
        let config = AppConfig {
            encoder: Some("flac".to_string()),
            ..Default::default()
        };
        assert_eq!(config.encoder_or_default(), "flac");
    }

    #[test]
    fn flush_every_none_when_unset() {
        let config = AppConfig::empty();
        assert!(config.flush_every_duration().is_none());
    }

    #[test]
    fn flush_every_parses() {
        let config = AppConfig {
            flush_every: Some("5s".to_string()),
            ..Default::default()
        };
        assert_eq!(config.flush_every_duration().map(|d| d.as_secs()), Some(5));
    }

    #[test]
    fn boolean_defaults() {
        let config = AppConfig::empty();
        assert!(!config.cue_or_default());
    }
}

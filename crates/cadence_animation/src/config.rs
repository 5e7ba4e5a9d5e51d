//! Scheduler configuration
//!
//! The scheduler can be configured from a TOML file:
//!
//! ```toml
//! tick_interval_ms = 16
//! thread_name = "cadence-animation"
//! auto_start = true
//! ```
//!
//! Every key is optional.

use crate::error::{AnimationError, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use std::time::Duration;

/// Settings for an [`AnimationScheduler`](crate::AnimationScheduler)
#[derive(Clone, Debug, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct SchedulerConfig {
    /// Period of the shared ticker in milliseconds (~60fps by default)
    pub tick_interval_ms: u64,
    /// Name of the background ticker thread
    pub thread_name: String,
    /// Start the background ticker on the first registration
    pub auto_start: bool,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            tick_interval_ms: 16,
            thread_name: "cadence-animation".to_string(),
            auto_start: false,
        }
    }
}

impl SchedulerConfig {
    /// Parse and validate a TOML document
    pub fn from_toml_str(source: &str) -> Result<Self> {
        let config: SchedulerConfig = toml::from_str(source)?;
        config.validate()?;
        Ok(config)
    }

    /// Load from a TOML file
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let source = fs::read_to_string(path)?;
        let config = Self::from_toml_str(&source)?;
        tracing::debug!(path = %path.display(), ?config, "Loaded scheduler configuration");
        Ok(config)
    }

    pub fn with_tick_interval(mut self, interval: Duration) -> Self {
        self.tick_interval_ms = interval.as_millis().max(1) as u64;
        self
    }

    pub fn with_auto_start(mut self, auto_start: bool) -> Self {
        self.auto_start = auto_start;
        self
    }

    pub fn tick_interval(&self) -> Duration {
        Duration::from_millis(self.tick_interval_ms)
    }

    pub fn validate(&self) -> Result<()> {
        if self.tick_interval_ms == 0 {
            return Err(AnimationError::InvalidArgument(
                "tick_interval_ms must be greater than zero".to_string(),
            ));
        }
        if self.thread_name.is_empty() {
            return Err(AnimationError::InvalidArgument(
                "thread_name must not be empty".to_string(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = SchedulerConfig::default();
        assert_eq!(config.tick_interval(), Duration::from_millis(16));
        assert!(!config.auto_start);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_empty_document_uses_defaults() {
        let config = SchedulerConfig::from_toml_str("").unwrap();
        assert_eq!(config, SchedulerConfig::default());
    }

    #[test]
    fn test_partial_document() {
        let config = SchedulerConfig::from_toml_str(
            r#"
            tick_interval_ms = 8
            auto_start = true
            "#,
        )
        .unwrap();
        assert_eq!(config.tick_interval(), Duration::from_millis(8));
        assert!(config.auto_start);
        assert_eq!(config.thread_name, "cadence-animation");
    }

    #[test]
    fn test_rejects_zero_interval() {
        let result = SchedulerConfig::from_toml_str("tick_interval_ms = 0");
        assert!(matches!(result, Err(AnimationError::InvalidArgument(_))));
    }

    #[test]
    fn test_rejects_malformed_toml() {
        let result = SchedulerConfig::from_toml_str("tick_interval_ms = \"fast\"");
        assert!(matches!(result, Err(AnimationError::Config(_))));
    }

    #[test]
    fn test_load_from_file() {
        let path = std::env::temp_dir().join(format!(
            "cadence-scheduler-{}.toml",
            std::process::id()
        ));
        fs::write(&path, "thread_name = \"ticker\"\n").unwrap();

        let config = SchedulerConfig::load(&path).unwrap();
        assert_eq!(config.thread_name, "ticker");
        fs::remove_file(&path).unwrap();

        assert!(matches!(
            SchedulerConfig::load(&path),
            Err(AnimationError::Io(_))
        ));
    }

    #[test]
    fn test_builders() {
        let config = SchedulerConfig::default()
            .with_tick_interval(Duration::from_millis(5))
            .with_auto_start(true);
        assert_eq!(config.tick_interval_ms, 5);
        assert!(config.auto_start);
    }
}

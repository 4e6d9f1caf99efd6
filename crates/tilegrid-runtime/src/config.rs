#![forbid(unsafe_code)]

//! Engine configuration as data.
//!
//! Every tunable of the session loads from one [`EngineConfig`], either TOML
//! or JSON. Missing tables and fields take their defaults, so an empty
//! document is a valid config.
//!
//! ```toml
//! [grid]
//! gap_px = 16.0
//!
//! [gesture]
//! cancel_policy = "revert"
//! skip_unchanged_commit = true
//!
//! [commit]
//! max_retries = 1
//! retry_delay_ms = 250
//!
//! [logging]
//! filter = "tilegrid=info"
//! format = "plain"
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tilegrid_core::{CancelPolicy, DEFAULT_GAP_PX};

use crate::logging::LogFormat;
use crate::retry::RetryPolicy;

/// Top-level configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub grid: GridConfig,
    pub gesture: GestureConfig,
    pub commit: CommitConfig,
    pub logging: LoggingConfig,
}

/// Grid spacing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GridConfig {
    /// Fixed gap between boxes of full rows, in pixels.
    pub gap_px: f64,
}

impl Default for GridConfig {
    fn default() -> Self {
        Self {
            gap_px: DEFAULT_GAP_PX,
        }
    }
}

/// Gesture behavior.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GestureConfig {
    /// What an abandoned drag does to the order.
    pub cancel_policy: CancelPolicy,
    /// Skip the store call when a gesture ends with the order unchanged.
    pub skip_unchanged_commit: bool,
}

impl Default for GestureConfig {
    fn default() -> Self {
        Self {
            cancel_policy: CancelPolicy::Revert,
            skip_unchanged_commit: true,
        }
    }
}

/// Commit retry budget.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CommitConfig {
    pub max_retries: u32,
    pub retry_delay_ms: u64,
}

impl Default for CommitConfig {
    fn default() -> Self {
        Self {
            max_retries: 1,
            retry_delay_ms: 250,
        }
    }
}

/// Subscriber settings used by `logging::init_subscriber`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// `EnvFilter` directive; `RUST_LOG` overrides it when set.
    pub filter: String,
    pub format: LogFormat,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            filter: "tilegrid=info".into(),
            format: LogFormat::Plain,
        }
    }
}

/// Loading a config failed.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("invalid config: {}", .0.join("; "))]
    Validation(Vec<String>),
}

impl EngineConfig {
    /// Parse from a TOML string.
    pub fn from_toml_str(s: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(s)?)
    }

    /// Parse from a TOML file on disk.
    pub fn from_toml_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path.as_ref())?;
        Self::from_toml_str(&content)
    }

    /// Parse from a JSON string.
    pub fn from_json_str(s: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(s)?)
    }

    /// Parse from a JSON file on disk.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path.as_ref())?;
        Self::from_json_str(&content)
    }

    /// Validate all parameters are within acceptable ranges.
    ///
    /// An empty list means the config is valid.
    #[must_use]
    pub fn validate(&self) -> Vec<String> {
        let mut errors = Vec::new();

        if !self.grid.gap_px.is_finite() || self.grid.gap_px < 0.0 {
            errors.push(format!(
                "grid.gap_px must be finite and >= 0, got {}",
                self.grid.gap_px
            ));
        }

        // Keeps a commit from blocking the worker for minutes.
        if self.commit.retry_delay_ms > 60_000 {
            errors.push(format!(
                "commit.retry_delay_ms must be <= 60000, got {}",
                self.commit.retry_delay_ms
            ));
        }

        if self.logging.filter.trim().is_empty() {
            errors.push("logging.filter must not be empty".into());
        }

        errors
    }

    /// Like [`validate`](Self::validate), but as a `Result`.
    pub fn validated(self) -> Result<Self, ConfigError> {
        let errors = self.validate();
        if errors.is_empty() {
            Ok(self)
        } else {
            Err(ConfigError::Validation(errors))
        }
    }

    /// Retry policy for the commit worker.
    #[must_use]
    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy::new(
            self.commit.max_retries,
            crate::retry::BackoffStrategy::Fixed {
                delay_ms: self.commit.retry_delay_ms,
            },
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_toml_is_default() {
        let config = EngineConfig::from_toml_str("").unwrap();
        assert_eq!(config, EngineConfig::default());
        assert!(config.validate().is_empty());
        assert_eq!(config.grid.gap_px, 16.0);
        assert_eq!(config.retry_policy(), RetryPolicy::single_retry(250));
    }

    #[test]
    fn partial_toml_overrides() {
        let config = EngineConfig::from_toml_str(
            r#"
            [gesture]
            cancel_policy = "commit_last_resolved"

            [commit]
            max_retries = 3
            "#,
        )
        .unwrap();
        assert_eq!(config.gesture.cancel_policy, CancelPolicy::CommitLastResolved);
        assert!(config.gesture.skip_unchanged_commit);
        assert_eq!(config.commit.max_retries, 3);
        assert_eq!(config.commit.retry_delay_ms, 250);
    }

    #[test]
    fn json_loads() {
        let config = EngineConfig::from_json_str(
            r#"{"grid":{"gap_px":8.0},"logging":{"format":"json"}}"#,
        )
        .unwrap();
        assert_eq!(config.grid.gap_px, 8.0);
        assert_eq!(config.logging.format, LogFormat::Json);
        assert_eq!(config.logging.filter, "tilegrid=info");
    }

    #[test]
    fn validate_reports_every_problem() {
        let mut config = EngineConfig::default();
        config.grid.gap_px = -1.0;
        config.commit.retry_delay_ms = 120_000;
        config.logging.filter = "  ".into();
        let errors = config.validate();
        assert_eq!(errors.len(), 3, "{errors:?}");
        assert!(errors[0].contains("grid.gap_px"));

        let err = config.validated().unwrap_err();
        assert!(matches!(err, ConfigError::Validation(ref e) if e.len() == 3));
        assert!(err.to_string().starts_with("invalid config: grid.gap_px"));
    }

    #[test]
    fn bad_toml_is_toml_error() {
        assert!(matches!(
            EngineConfig::from_toml_str("[grid\ngap_px = 1"),
            Err(ConfigError::Toml(_))
        ));
        assert!(matches!(
            EngineConfig::from_toml_str("[gesture]\ncancel_policy = \"explode\""),
            Err(ConfigError::Toml(_))
        ));
    }

    #[test]
    fn file_loading() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tilegrid.toml");
        std::fs::write(&path, "[grid]\ngap_px = 4.0\n").unwrap();
        assert_eq!(EngineConfig::from_toml_file(&path).unwrap().grid.gap_px, 4.0);
        assert!(matches!(
            EngineConfig::from_json_file(dir.path().join("missing.json")),
            Err(ConfigError::Io(_))
        ));
    }
}

//! Config - hub / scheduler / logging の設定
//!
//! JSON ファイルから読み込み、`COURIER_*` 環境変数で上書きし、最後に
//! `validate()` で検証します。全フィールドに default があるので空の `{}` でも可。

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::impls::DEFAULT_MAX_THROUGHPUT;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config: {0}")]
    Json(#[from] serde_json::Error),

    #[error("invalid config: {0}")]
    Invalid(String),
}

/// What `acquire` does when every allocated worker is busy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OverflowPolicy {
    /// Wait for a worker once `capacity` workers exist.
    #[default]
    Block,
    /// Allocate another worker.
    Grow,
}

/// `min(3, cores / 4) + 1`: one worker on small machines, at most four.
pub fn default_capacity() -> usize {
    let cores = std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1);
    (cores / 4).min(3) + 1
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct HubConfig {
    pub capacity: usize,
    pub overflow: OverflowPolicy,
}

impl Default for HubConfig {
    fn default() -> Self {
        Self {
            capacity: default_capacity(),
            overflow: OverflowPolicy::Block,
        }
    }
}

impl HubConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.capacity == 0 {
            return Err(ConfigError::Invalid("hub.capacity must be at least 1".into()));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SchedulerConfig {
    /// Upper bound handed to `Resumable::resume`.
    pub max_throughput: usize,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            max_throughput: DEFAULT_MAX_THROUGHPUT,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CourierConfig {
    pub hub: HubConfig,
    pub scheduler: SchedulerConfig,
    /// Default `EnvFilter` directive; `RUST_LOG` wins when set.
    pub log_level: String,
}

impl Default for CourierConfig {
    fn default() -> Self {
        Self {
            hub: HubConfig::default(),
            scheduler: SchedulerConfig::default(),
            log_level: "info".to_string(),
        }
    }
}

impl CourierConfig {
    pub fn from_json_str(s: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(s)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json_str(&raw)
    }

    /// Apply `COURIER_HUB_CAPACITY`, `COURIER_HUB_OVERFLOW`,
    /// `COURIER_MAX_THROUGHPUT` and `COURIER_LOG` from `lookup`.
    pub fn apply_overrides(
        mut self,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<Self, ConfigError> {
        if let Some(raw) = lookup("COURIER_HUB_CAPACITY") {
            self.hub.capacity = parse_number("COURIER_HUB_CAPACITY", &raw)?;
        }
        if let Some(raw) = lookup("COURIER_HUB_OVERFLOW") {
            self.hub.overflow = match raw.trim() {
                "block" => OverflowPolicy::Block,
                "grow" => OverflowPolicy::Grow,
                other => {
                    return Err(ConfigError::Invalid(format!(
                        "COURIER_HUB_OVERFLOW: expected block or grow, got {other:?}"
                    )));
                }
            };
        }
        if let Some(raw) = lookup("COURIER_MAX_THROUGHPUT") {
            self.scheduler.max_throughput = parse_number("COURIER_MAX_THROUGHPUT", &raw)?;
        }
        if let Some(level) = lookup("COURIER_LOG") {
            self.log_level = level;
        }
        self.validate()?;
        Ok(self)
    }

    /// `apply_overrides` against the process environment.
    pub fn from_env(self) -> Result<Self, ConfigError> {
        self.apply_overrides(|key| std::env::var(key).ok())
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.hub.validate()?;
        if self.scheduler.max_throughput == 0 {
            return Err(ConfigError::Invalid(
                "scheduler.max_throughput must be at least 1".into(),
            ));
        }
        if self.log_level.trim().is_empty() {
            return Err(ConfigError::Invalid("log_level must not be empty".into()));
        }
        Ok(())
    }
}

fn parse_number(key: &str, raw: &str) -> Result<usize, ConfigError> {
    raw.trim()
        .parse()
        .map_err(|e| ConfigError::Invalid(format!("{key}: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use std::collections::HashMap;

    #[test]
    fn default_capacity_is_between_one_and_four() {
        let capacity = default_capacity();
        assert!((1..=4).contains(&capacity));
        assert_eq!(HubConfig::default().capacity, capacity);
    }

    #[test]
    fn empty_object_yields_defaults() {
        let config = CourierConfig::from_json_str("{}").unwrap();
        assert_eq!(config, CourierConfig::default());
        assert_eq!(config.scheduler.max_throughput, DEFAULT_MAX_THROUGHPUT);
    }

    #[test]
    fn partial_config_keeps_other_defaults() {
        let config =
            CourierConfig::from_json_str(r#"{"hub": {"overflow": "grow"}, "log_level": "debug"}"#)
                .unwrap();
        assert_eq!(config.hub.overflow, OverflowPolicy::Grow);
        assert_eq!(config.hub.capacity, default_capacity());
        assert_eq!(config.log_level, "debug");
    }

    #[rstest]
    #[case::zero_capacity(r#"{"hub": {"capacity": 0}}"#)]
    #[case::zero_throughput(r#"{"scheduler": {"max_throughput": 0}}"#)]
    #[case::blank_log_level(r#"{"log_level": " "}"#)]
    fn invalid_values_are_rejected(#[case] json: &str) {
        assert!(matches!(
            CourierConfig::from_json_str(json),
            Err(ConfigError::Invalid(_))
        ));
    }

    #[test]
    fn malformed_json_is_a_json_error() {
        assert!(matches!(
            CourierConfig::from_json_str("{"),
            Err(ConfigError::Json(_))
        ));
    }

    #[test]
    fn unknown_overflow_policy_is_a_json_error() {
        assert!(matches!(
            CourierConfig::from_json_str(r#"{"hub": {"overflow": "drop"}}"#),
            Err(ConfigError::Json(_))
        ));
    }

    #[test]
    fn missing_file_reports_path() {
        let err = CourierConfig::from_path("/nonexistent/courier.json").unwrap_err();
        assert!(matches!(err, ConfigError::Io { ref path, .. } if path.ends_with("courier.json")));
    }

    #[test]
    fn overrides_replace_file_values() {
        let env: HashMap<&str, &str> = HashMap::from([
            ("COURIER_HUB_CAPACITY", "8"),
            ("COURIER_HUB_OVERFLOW", "grow"),
            ("COURIER_MAX_THROUGHPUT", "16"),
            ("COURIER_LOG", "courier_core=trace"),
        ]);
        let config = CourierConfig::default()
            .apply_overrides(|key| env.get(key).map(|v| v.to_string()))
            .unwrap();
        assert_eq!(config.hub.capacity, 8);
        assert_eq!(config.hub.overflow, OverflowPolicy::Grow);
        assert_eq!(config.scheduler.max_throughput, 16);
        assert_eq!(config.log_level, "courier_core=trace");
    }

    #[rstest]
    #[case::not_a_number("COURIER_HUB_CAPACITY", "many")]
    #[case::zero("COURIER_HUB_CAPACITY", "0")]
    #[case::bad_policy("COURIER_HUB_OVERFLOW", "spill")]
    fn bad_overrides_are_rejected(#[case] key: &str, #[case] value: &str) {
        let result = CourierConfig::default()
            .apply_overrides(|k| (k == key).then(|| value.to_string()));
        assert!(matches!(result, Err(ConfigError::Invalid(_))));
    }
}

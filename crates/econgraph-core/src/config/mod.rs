//! Configuration Management
//!
//! Unified configuration for an analysis service:
//! - Detection thresholds (the fraud model)
//! - Runtime parameters (timeouts, compute offloading)
//! - Logging
//!
//! # Example
//!
//! ```rust,ignore
//! use econgraph_core::config::AnalysisConfig;
//!
//! // Load from environment
//! let config = AnalysisConfig::from_env()?;
//!
//! // Or load from file
//! let config = AnalysisConfig::from_file("config/analysis.toml")?;
//! config.validate()?;
//! ```

mod thresholds;

pub use thresholds::{
    ClusterRules, CommunityRules, CycleRules, DetectionThresholds, GuildRules, NetworkLimits,
    PageRankParams, StrengthWeights, THRESHOLDS_VERSION,
};

use crate::error::{AnalysisError, Result};
use crate::logging::{LogConfig, LogLevel};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// Longest day window accepted for activity and account-age rules.
pub const MAX_WINDOW_DAYS: u32 = 36_500;

/// Runtime configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RuntimeConfig {
    /// Upper bound for one analysis (fetch plus compute), in milliseconds.
    pub analysis_timeout_ms: u64,
    /// Run graph computation on the blocking thread pool.
    pub offload_compute: bool,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            analysis_timeout_ms: 30_000,
            offload_compute: true,
        }
    }
}

impl RuntimeConfig {
    /// Development configuration
    pub fn development() -> Self {
        Self {
            analysis_timeout_ms: 300_000,
            ..Default::default()
        }
    }

    /// Production configuration
    pub fn production() -> Self {
        Self {
            analysis_timeout_ms: 15_000,
            offload_compute: true,
        }
    }

    /// Analysis timeout as a `Duration`.
    pub fn analysis_timeout(&self) -> Duration {
        Duration::from_millis(self.analysis_timeout_ms)
    }
}

/// Unified analysis configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisConfig {
    /// Detection thresholds
    pub thresholds: DetectionThresholds,
    /// Runtime configuration
    pub runtime: RuntimeConfig,
    /// Logging configuration
    pub logging: LogConfig,
    /// Environment name
    pub environment: String,
    /// Service name
    pub service_name: String,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            thresholds: DetectionThresholds::default(),
            runtime: RuntimeConfig::default(),
            logging: LogConfig::default(),
            environment: "development".to_string(),
            service_name: "econgraph".to_string(),
        }
    }
}

impl AnalysisConfig {
    /// Create development configuration
    pub fn development() -> Self {
        Self {
            runtime: RuntimeConfig::development(),
            logging: LogConfig::development(),
            environment: "development".to_string(),
            ..Default::default()
        }
    }

    /// Create production configuration
    pub fn production() -> Self {
        Self {
            runtime: RuntimeConfig::production(),
            logging: LogConfig::production(),
            environment: "production".to_string(),
            ..Default::default()
        }
    }

    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        let mut config = match std::env::var("ECONGRAPH_ENV")
            .as_deref()
            .unwrap_or("development")
        {
            "production" | "prod" => Self::production(),
            _ => Self::development(),
        };

        if let Ok(name) = std::env::var("ECONGRAPH_SERVICE_NAME") {
            config.service_name = name;
        }

        if let Ok(val) = std::env::var("ECONGRAPH_ANALYSIS_TIMEOUT_MS") {
            config.runtime.analysis_timeout_ms = val.parse().map_err(|e| {
                AnalysisError::config(format!("ECONGRAPH_ANALYSIS_TIMEOUT_MS: {}", e))
            })?;
        }

        if let Ok(val) = std::env::var("ECONGRAPH_LOG_LEVEL") {
            config.logging.level = val
                .parse::<LogLevel>()
                .map_err(|e| AnalysisError::config(format!("ECONGRAPH_LOG_LEVEL: {}", e)))?;
        }

        if let Ok(val) = std::env::var("ECONGRAPH_MAX_CYCLE_LENGTH") {
            config.thresholds.cycles.max_cycle_length = val.parse().map_err(|e| {
                AnalysisError::config(format!("ECONGRAPH_MAX_CYCLE_LENGTH: {}", e))
            })?;
        }

        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a TOML file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref())
            .map_err(|e| AnalysisError::config(format!("Failed to read config: {}", e)))?;

        let config: Self = toml::from_str(&content)
            .map_err(|e| AnalysisError::config(format!("Failed to parse config: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    /// Serialize to TOML.
    pub fn to_toml(&self) -> Result<String> {
        toml::to_string_pretty(self)
            .map_err(|e| AnalysisError::config(format!("Failed to serialize config: {}", e)))
    }

    /// Save configuration to a TOML file
    pub fn to_file(&self, path: impl AsRef<Path>) -> Result<()> {
        let content = self.to_toml()?;
        std::fs::write(path.as_ref(), content)
            .map_err(|e| AnalysisError::config(format!("Failed to write config: {}", e)))?;
        Ok(())
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        let t = &self.thresholds;

        if !(t.pagerank.damping > 0.0 && t.pagerank.damping < 1.0) {
            return Err(AnalysisError::config(format!(
                "pagerank.damping must be in (0, 1), got {}",
                t.pagerank.damping
            )));
        }
        if t.pagerank.iterations == 0 {
            return Err(AnalysisError::config("pagerank.iterations must be > 0"));
        }
        if !(3..=8).contains(&t.cycles.max_cycle_length) {
            return Err(AnalysisError::config(format!(
                "cycles.max_cycle_length must be in 3..=8, got {}",
                t.cycles.max_cycle_length
            )));
        }
        if t.community.max_passes == 0 {
            return Err(AnalysisError::config("community.max_passes must be > 0"));
        }
        if t.community.min_size < 2 {
            return Err(AnalysisError::config("community.min_size must be >= 2"));
        }
        if t.network.direct_limit == 0 || t.network.indirect_limit == 0 {
            return Err(AnalysisError::config("network limits must be > 0"));
        }
        if t.guild.member_limit == 0 {
            return Err(AnalysisError::config("guild.member_limit must be > 0"));
        }
        if !(1..=MAX_WINDOW_DAYS).contains(&t.guild.window_days) {
            return Err(AnalysisError::config(format!(
                "guild.window_days must be in 1..={}, got {}",
                MAX_WINDOW_DAYS, t.guild.window_days
            )));
        }
        if !(1..=i64::from(MAX_WINDOW_DAYS)).contains(&t.clusters.new_account_max_age_days) {
            return Err(AnalysisError::config(format!(
                "clusters.new_account_max_age_days must be in 1..={}, got {}",
                MAX_WINDOW_DAYS, t.clusters.new_account_max_age_days
            )));
        }
        for (name, value) in [
            ("community.high_density_ratio", t.community.high_density_ratio),
            ("community.isolation_ratio", t.community.isolation_ratio),
            ("guild.circular_max_imbalance", t.guild.circular_max_imbalance),
            ("guild.suspicious_ratio_major", t.guild.suspicious_ratio_major),
            ("guild.suspicious_ratio_minor", t.guild.suspicious_ratio_minor),
        ] {
            if !(0.0..=1.0).contains(&value) {
                return Err(AnalysisError::config(format!(
                    "{} must be in [0, 1], got {}",
                    name, value
                )));
            }
        }
        if self.runtime.analysis_timeout_ms == 0 {
            return Err(AnalysisError::config("runtime.analysis_timeout_ms must be > 0"));
        }

        if t.version != THRESHOLDS_VERSION {
            tracing::warn!(
                configured = t.version,
                built_in = THRESHOLDS_VERSION,
                "Threshold set version differs from built-in defaults"
            );
        }

        Ok(())
    }

    /// Set environment
    pub fn with_environment(mut self, env: impl Into<String>) -> Self {
        self.environment = env.into();
        self
    }

    /// Replace the threshold set
    pub fn with_thresholds(mut self, thresholds: DetectionThresholds) -> Self {
        self.thresholds = thresholds;
        self
    }

    /// Set analysis timeout
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.runtime.analysis_timeout_ms = u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_validates() {
        assert!(AnalysisConfig::default().validate().is_ok());
        assert!(AnalysisConfig::production().validate().is_ok());
        assert!(AnalysisConfig::development().validate().is_ok());
    }

    #[test]
    fn test_invalid_damping_rejected() {
        let mut config = AnalysisConfig::default();
        config.thresholds.pagerank.damping = 1.0;
        assert!(matches!(config.validate(), Err(AnalysisError::ConfigError(_))));
    }

    #[test]
    fn test_invalid_cycle_length_rejected() {
        let mut config = AnalysisConfig::default();
        config.thresholds.cycles.max_cycle_length = 2;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_day_windows_bounded() {
        let mut config = AnalysisConfig::default();
        config.thresholds.guild.window_days = 1_000_000_000;
        assert!(matches!(config.validate(), Err(AnalysisError::ConfigError(_))));

        let mut config = AnalysisConfig::default();
        config.thresholds.clusters.new_account_max_age_days = 100_000_000;
        assert!(config.validate().is_err());

        config.thresholds.clusters.new_account_max_age_days = -1;
        assert!(config.validate().is_err());

        config.thresholds.clusters.new_account_max_age_days = MAX_WINDOW_DAYS as i64;
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_toml_roundtrip_through_file() {
        let path = std::env::temp_dir().join(format!(
            "econgraph-config-test-{}.toml",
            std::process::id()
        ));
        let config = AnalysisConfig::production().with_timeout(Duration::from_secs(7));
        config.to_file(&path).unwrap();

        let loaded = AnalysisConfig::from_file(&path).unwrap();
        std::fs::remove_file(&path).ok();

        assert_eq!(loaded, config);
        assert_eq!(loaded.runtime.analysis_timeout(), Duration::from_secs(7));
    }

    #[test]
    fn test_missing_file_is_config_error() {
        let err = AnalysisConfig::from_file("/nonexistent/econgraph.toml").unwrap_err();
        assert!(matches!(err, AnalysisError::ConfigError(_)));
    }
}

//! Configuration management for the fraud risk scorer

use crate::error::ScoringError;
use crate::types::alert::RiskLevelThresholds;
use anyhow::{Context, Result};
use config::{Config, File};
use serde::Deserialize;
use std::path::Path;

/// Which scoring policy the application builds
#[derive(Debug, Clone, Copy, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum PolicyKind {
    /// Fixed amount threshold (rule-based)
    #[default]
    Threshold,
    /// Random forest trained on labelled transactions
    Trained,
}

/// Main application configuration
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub scoring: ScoringConfig,
    #[serde(default)]
    pub forest: ForestConfig,
    #[serde(default)]
    pub features: FeatureConfig,
    #[serde(default)]
    pub pipeline: PipelineConfig,
    #[serde(default)]
    pub demo: DemoConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Scoring policy configuration
#[derive(Debug, Clone, Deserialize)]
pub struct ScoringConfig {
    /// Policy used for batch scoring
    #[serde(default)]
    pub policy: PolicyKind,
    /// Amount above which a transaction is flagged by the threshold policy
    #[serde(default = "default_threshold")]
    pub threshold: f64,
    /// Risk level classification thresholds for alerts
    #[serde(default)]
    pub risk_levels: RiskLevelThresholds,
}

fn default_threshold() -> f64 {
    10_000.0
}

/// Random forest hyper-parameters
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct ForestConfig {
    /// Number of trees in the forest
    #[serde(default = "default_n_trees")]
    pub n_trees: usize,
    /// Maximum tree depth
    #[serde(default = "default_max_depth")]
    pub max_depth: usize,
    /// Minimum samples required to split a node
    #[serde(default = "default_min_samples_split")]
    pub min_samples_split: usize,
    /// Seed for bootstrap sampling and feature selection
    #[serde(default = "default_seed")]
    pub seed: u64,
}

fn default_n_trees() -> usize {
    100
}

fn default_max_depth() -> usize {
    16
}

fn default_min_samples_split() -> usize {
    2
}

fn default_seed() -> u64 {
    42
}

impl ForestConfig {
    pub fn validate(&self) -> std::result::Result<(), ScoringError> {
        if self.n_trees == 0 {
            return Err(ScoringError::InvalidConfiguration(
                "forest.n_trees must be at least 1".to_string(),
            ));
        }
        if self.max_depth == 0 {
            return Err(ScoringError::InvalidConfiguration(
                "forest.max_depth must be at least 1".to_string(),
            ));
        }
        if self.min_samples_split < 2 {
            return Err(ScoringError::InvalidConfiguration(
                "forest.min_samples_split must be at least 2".to_string(),
            ));
        }
        Ok(())
    }
}

impl Default for ForestConfig {
    fn default() -> Self {
        Self {
            n_trees: default_n_trees(),
            max_depth: default_max_depth(),
            min_samples_split: default_min_samples_split(),
            seed: default_seed(),
        }
    }
}

/// Feature engineering options for transaction-trained policies
#[derive(Debug, Clone, Copy, Deserialize, PartialEq, Eq, Default)]
pub struct FeatureConfig {
    /// Standard-scale the amount (zero mean, unit variance)
    #[serde(default)]
    pub scale_amount: bool,
    /// Append a label-encoded location feature
    #[serde(default)]
    pub encode_location: bool,
}

/// Batch pipeline configuration
#[derive(Debug, Clone, Deserialize)]
pub struct PipelineConfig {
    /// Maximum number of transactions scored concurrently
    #[serde(default = "default_workers")]
    pub workers: usize,
}

fn default_workers() -> usize {
    4
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            workers: default_workers(),
        }
    }
}

/// Synthetic demo data configuration
#[derive(Debug, Clone, Deserialize)]
pub struct DemoConfig {
    /// Number of synthetic transactions to generate
    #[serde(default = "default_demo_transactions")]
    pub transactions: usize,
    /// Fraction of generated transactions labelled fraudulent
    #[serde(default = "default_fraud_rate")]
    pub fraud_rate: f64,
    /// Generator seed
    #[serde(default = "default_seed")]
    pub seed: u64,
}

fn default_demo_transactions() -> usize {
    1000
}

fn default_fraud_rate() -> f64 {
    0.05
}

impl Default for DemoConfig {
    fn default() -> Self {
        Self {
            transactions: default_demo_transactions(),
            fraud_rate: default_fraud_rate(),
            seed: default_seed(),
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub level: String,
    /// Log format (json, pretty)
    #[serde(default = "default_log_format")]
    pub format: String,
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "pretty".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
        }
    }
}

impl AppConfig {
    /// Load configuration from file
    pub fn load() -> Result<Self> {
        Self::load_from_path("config/config.toml")
    }

    /// Load configuration from a specific path
    pub fn load_from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let config = Config::builder()
            .add_source(File::from(path.as_ref()))
            .build()
            .context("Failed to build configuration")?;

        let app: AppConfig = config
            .try_deserialize()
            .context("Failed to deserialize configuration")?;

        app.validate().context("Invalid configuration")?;
        Ok(app)
    }

    /// Check value ranges that serde cannot express
    pub fn validate(&self) -> std::result::Result<(), ScoringError> {
        if !self.scoring.threshold.is_finite() || self.scoring.threshold < 0.0 {
            return Err(ScoringError::InvalidConfiguration(format!(
                "scoring.threshold must be a non-negative number, got {}",
                self.scoring.threshold
            )));
        }
        self.scoring.risk_levels.validate()?;
        self.forest.validate()?;
        if self.pipeline.workers == 0 {
            return Err(ScoringError::InvalidConfiguration(
                "pipeline.workers must be at least 1".to_string(),
            ));
        }
        if !(0.0..=1.0).contains(&self.demo.fraud_rate) {
            return Err(ScoringError::InvalidConfiguration(format!(
                "demo.fraud_rate must be within [0, 1], got {}",
                self.demo.fraud_rate
            )));
        }
        Ok(())
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            scoring: ScoringConfig {
                policy: PolicyKind::Threshold,
                threshold: default_threshold(),
                risk_levels: RiskLevelThresholds::default(),
            },
            forest: ForestConfig::default(),
            features: FeatureConfig::default(),
            pipeline: PipelineConfig::default(),
            demo: DemoConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_config(contents: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::Builder::new()
            .suffix(".toml")
            .tempfile()
            .unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        file
    }

    #[test]
    fn test_default_config() {
        let config = AppConfig::default();
        assert_eq!(config.scoring.threshold, 10_000.0);
        assert_eq!(config.scoring.policy, PolicyKind::Threshold);
        assert_eq!(config.forest.n_trees, 100);
        assert_eq!(config.pipeline.workers, 4);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_load_from_path() {
        let file = write_config(
            r#"
[scoring]
policy = "trained"
threshold = 2500.0

[forest]
n_trees = 10
seed = 7

[features]
scale_amount = true
encode_location = true
"#,
        );

        let config = AppConfig::load_from_path(file.path()).unwrap();
        assert_eq!(config.scoring.policy, PolicyKind::Trained);
        assert_eq!(config.scoring.threshold, 2500.0);
        assert_eq!(config.forest.n_trees, 10);
        assert_eq!(config.forest.seed, 7);
        assert_eq!(config.forest.max_depth, 16);
        assert!(config.features.scale_amount);
        assert!(config.features.encode_location);
        assert_eq!(config.logging.level, "info");
    }

    #[test]
    fn test_load_rejects_negative_threshold() {
        let file = write_config(
            r#"
[scoring]
threshold = -1.0
"#,
        );

        assert!(AppConfig::load_from_path(file.path()).is_err());
    }

    #[test]
    fn test_forest_validation() {
        let forest = ForestConfig {
            n_trees: 0,
            ..ForestConfig::default()
        };
        assert!(matches!(
            forest.validate(),
            Err(ScoringError::InvalidConfiguration(_))
        ));

        let forest = ForestConfig {
            min_samples_split: 1,
            ..ForestConfig::default()
        };
        assert!(forest.validate().is_err());
    }

    #[test]
    fn test_zero_workers_rejected() {
        let mut config = AppConfig::default();
        config.pipeline.workers = 0;
        assert!(config.validate().is_err());
    }
}

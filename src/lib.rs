//! Fraud Risk Scorer Library
//!
//! Decides whether a transaction is fraudulent under a configurable policy:
//! a fixed amount threshold or a trained random-forest classifier.

pub mod config;
pub mod error;
pub mod feature_extractor;
pub mod metrics;
pub mod models;
pub mod pipeline;
pub mod scorer;
pub mod synthetic;
pub mod types;

pub use config::AppConfig;
pub use error::ScoringError;
pub use feature_extractor::FeatureExtractor;
pub use models::{Classifier, RandomForest};
pub use pipeline::{BatchReport, ScoringPipeline};
pub use scorer::{RiskScorer, ScoringInput, ScoringPolicy};
pub use types::{alert::FraudAlert, transaction::Transaction, verdict::Verdict};

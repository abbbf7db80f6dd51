//! Statistical classifiers behind trained scoring policies

pub mod aggregator;
pub mod forest;
pub mod tree;

pub use aggregator::ScoreAggregator;
pub use forest::RandomForest;
pub use tree::DecisionTree;

use crate::error::{Result, ScoringError};

/// Capability interface for a fraud classifier backend.
///
/// `fit` is called exactly once before the classifier is shared; after that
/// it is only read through `&self`, so implementations must be `Send + Sync`.
pub trait Classifier: Send + Sync + std::fmt::Debug {
    /// Backend name used in logs and verdict explanations
    fn name(&self) -> &str;

    /// Fit on labelled feature vectors (`true` = fraud).
    fn fit(&mut self, features: &[Vec<f64>], labels: &[bool]) -> Result<()>;

    /// Predicted label for one feature vector.
    fn predict(&self, features: &[f64]) -> bool;

    /// Fraud probability for one feature vector, if the backend provides one.
    fn fraud_probability(&self, _features: &[f64]) -> Option<f64> {
        None
    }
}

/// Check training data and return its dimensionality.
///
/// Rejects empty input, mismatched lengths, ragged or zero-length vectors,
/// non-finite values, and labels that contain only one class.
pub fn validate_training_data(features: &[Vec<f64>], labels: &[bool]) -> Result<usize> {
    if features.is_empty() || labels.is_empty() {
        return Err(ScoringError::InsufficientData(
            "training data is empty".to_string(),
        ));
    }
    if features.len() != labels.len() {
        return Err(ScoringError::InsufficientData(format!(
            "{} feature vectors but {} labels",
            features.len(),
            labels.len()
        )));
    }

    let dimension = features[0].len();
    if dimension == 0 {
        return Err(ScoringError::InsufficientData(
            "feature vectors are empty".to_string(),
        ));
    }
    if let Some(row) = features.iter().position(|f| f.len() != dimension) {
        return Err(ScoringError::InsufficientData(format!(
            "feature vector {} has {} values, expected {}",
            row,
            features[row].len(),
            dimension
        )));
    }
    if features.iter().flatten().any(|v| !v.is_finite()) {
        return Err(ScoringError::InsufficientData(
            "feature vectors contain non-finite values".to_string(),
        ));
    }

    let frauds = labels.iter().filter(|&&l| l).count();
    if frauds == 0 || frauds == labels.len() {
        return Err(ScoringError::InsufficientData(
            "labels must contain both fraud and legitimate examples".to_string(),
        ));
    }

    Ok(dimension)
}

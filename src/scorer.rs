//! Risk scorer: builds scoring policies and turns transactions into verdicts

use crate::config::{AppConfig, FeatureConfig, ForestConfig, PolicyKind};
use crate::error::{Result, ScoringError};
use crate::feature_extractor::FeatureExtractor;
use crate::models::forest::RandomForest;
use crate::models::{validate_training_data, Classifier};
use crate::types::transaction::Transaction;
use crate::types::verdict::Verdict;
use tracing::{debug, info};

/// What a policy is asked to score: a transaction or a raw feature vector.
#[derive(Debug, Clone, Copy)]
pub enum ScoringInput<'a> {
    Transaction(&'a Transaction),
    Features(&'a [f64]),
}

impl<'a> From<&'a Transaction> for ScoringInput<'a> {
    fn from(tx: &'a Transaction) -> Self {
        ScoringInput::Transaction(tx)
    }
}

impl<'a> From<&'a [f64]> for ScoringInput<'a> {
    fn from(features: &'a [f64]) -> Self {
        ScoringInput::Features(features)
    }
}

impl<'a> From<&'a Vec<f64>> for ScoringInput<'a> {
    fn from(features: &'a Vec<f64>) -> Self {
        ScoringInput::Features(features.as_slice())
    }
}

impl<'a, const N: usize> From<&'a [f64; N]> for ScoringInput<'a> {
    fn from(features: &'a [f64; N]) -> Self {
        ScoringInput::Features(features.as_slice())
    }
}

/// Flags transactions whose amount is strictly greater than a cutoff.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ThresholdPolicy {
    threshold: f64,
}

impl ThresholdPolicy {
    pub fn threshold(&self) -> f64 {
        self.threshold
    }

    fn evaluate(&self, amount: f64) -> Verdict {
        if amount > self.threshold {
            Verdict::fraud().with_explanation(format!(
                "amount {:.2} exceeds threshold {:.2}",
                amount, self.threshold
            ))
        } else {
            Verdict::legitimate().with_explanation(format!(
                "amount {:.2} is within threshold {:.2}",
                amount, self.threshold
            ))
        }
    }
}

/// A fitted classifier plus the feature layout it was trained on.
#[derive(Debug)]
pub struct TrainedPolicy {
    classifier: Box<dyn Classifier>,
    dimension: usize,
    extractor: FeatureExtractor,
}

impl TrainedPolicy {
    pub fn classifier_name(&self) -> &str {
        self.classifier.name()
    }

    pub fn extractor(&self) -> &FeatureExtractor {
        &self.extractor
    }

    fn evaluate(&self, features: &[f64]) -> Verdict {
        let fraud = self.classifier.predict(features);
        let probability = self.classifier.fraud_probability(features);
        let label = if fraud { "fraud" } else { "legitimate" };

        let verdict = if fraud {
            Verdict::fraud()
        } else {
            Verdict::legitimate()
        };
        match probability {
            Some(p) => verdict.with_probability(p).with_explanation(format!(
                "{} predicts {} (fraud probability {:.2})",
                self.classifier.name(),
                label,
                p
            )),
            None => verdict.with_explanation(format!(
                "{} predicts {}",
                self.classifier.name(),
                label
            )),
        }
    }
}

/// Decision rule used to classify transactions.
///
/// A policy only exists once it is fully configured or trained, and is
/// read-only afterwards. Share it behind an `Arc` for concurrent scoring.
#[derive(Debug)]
pub enum ScoringPolicy {
    Threshold(ThresholdPolicy),
    Trained(TrainedPolicy),
}

impl ScoringPolicy {
    /// Fixed-threshold policy. Negative or non-finite thresholds are rejected.
    pub fn threshold(threshold: f64) -> Result<Self> {
        if !threshold.is_finite() {
            return Err(ScoringError::InvalidConfiguration(format!(
                "threshold must be a finite number, got {}",
                threshold
            )));
        }
        if threshold < 0.0 {
            return Err(ScoringError::InvalidConfiguration(format!(
                "threshold must be non-negative, got {}",
                threshold
            )));
        }
        Ok(ScoringPolicy::Threshold(ThresholdPolicy { threshold }))
    }

    pub fn kind(&self) -> PolicyKind {
        match self {
            ScoringPolicy::Threshold(_) => PolicyKind::Threshold,
            ScoringPolicy::Trained(_) => PolicyKind::Trained,
        }
    }

    /// Number of features a raw feature vector must have.
    ///
    /// A threshold policy reads a single value, the amount.
    pub fn dimension(&self) -> usize {
        match self {
            ScoringPolicy::Threshold(_) => 1,
            ScoringPolicy::Trained(trained) => trained.dimension,
        }
    }

    /// Score one transaction or feature vector.
    pub fn score<'a>(&self, input: impl Into<ScoringInput<'a>>) -> Result<Verdict> {
        match (self, input.into()) {
            (ScoringPolicy::Threshold(policy), ScoringInput::Transaction(tx)) => {
                Ok(policy.evaluate(tx.amount()))
            }
            (ScoringPolicy::Threshold(policy), ScoringInput::Features(features)) => {
                check_features(features, 1)?;
                let amount = features[0];
                if amount < 0.0 {
                    return Err(ScoringError::InvalidTransaction(format!(
                        "amount must be non-negative, got {}",
                        amount
                    )));
                }
                Ok(policy.evaluate(amount))
            }
            (ScoringPolicy::Trained(policy), ScoringInput::Transaction(tx)) => {
                let features = policy.extractor.extract(tx);
                check_features(&features, policy.dimension)?;
                Ok(policy.evaluate(&features))
            }
            (ScoringPolicy::Trained(policy), ScoringInput::Features(features)) => {
                check_features(features, policy.dimension)?;
                Ok(policy.evaluate(features))
            }
        }
    }
}

fn check_features(features: &[f64], expected: usize) -> Result<()> {
    if features.len() != expected {
        return Err(ScoringError::DimensionMismatch {
            expected,
            actual: features.len(),
        });
    }
    if features.iter().any(|v| !v.is_finite()) {
        return Err(ScoringError::InvalidTransaction(
            "feature vector contains non-finite values".to_string(),
        ));
    }
    Ok(())
}

/// Builds scoring policies and scores transactions against them.
///
/// Holds only the training configuration; every policy it produces is
/// independent of the scorer and of other policies.
#[derive(Debug, Clone, Default)]
pub struct RiskScorer {
    forest: ForestConfig,
    features: FeatureConfig,
}

impl RiskScorer {
    pub fn new(forest: ForestConfig, features: FeatureConfig) -> Result<Self> {
        forest.validate()?;
        Ok(Self { forest, features })
    }

    pub fn from_config(config: &AppConfig) -> Result<Self> {
        Self::new(config.forest.clone(), config.features)
    }

    /// Construct a fixed-threshold policy.
    pub fn configure_threshold(&self, threshold: f64) -> Result<ScoringPolicy> {
        let policy = ScoringPolicy::threshold(threshold)?;
        info!(threshold = threshold, "Threshold policy configured");
        Ok(policy)
    }

    /// Train the default random forest backend on raw feature vectors.
    pub fn train(&self, features: &[Vec<f64>], labels: &[bool]) -> Result<ScoringPolicy> {
        let forest = RandomForest::new(self.forest.clone())?;
        self.train_with(forest, features, labels)
    }

    /// Train any classifier backend on raw feature vectors.
    ///
    /// Transactions scored against the resulting policy use the amount as
    /// their only feature.
    pub fn train_with<C: Classifier + 'static>(
        &self,
        classifier: C,
        features: &[Vec<f64>],
        labels: &[bool],
    ) -> Result<ScoringPolicy> {
        self.fit_policy(classifier, features, labels, FeatureExtractor::amount_only())
    }

    /// Fit the configured feature extractor on transactions, then train on
    /// the extracted vectors.
    pub fn train_on_transactions(
        &self,
        transactions: &[Transaction],
        labels: &[bool],
    ) -> Result<ScoringPolicy> {
        let extractor = FeatureExtractor::fit(transactions, self.features);
        let features: Vec<Vec<f64>> = transactions.iter().map(|tx| extractor.extract(tx)).collect();
        let forest = RandomForest::new(self.forest.clone())?;
        self.fit_policy(forest, &features, labels, extractor)
    }

    fn fit_policy<C: Classifier + 'static>(
        &self,
        mut classifier: C,
        features: &[Vec<f64>],
        labels: &[bool],
        extractor: FeatureExtractor,
    ) -> Result<ScoringPolicy> {
        let dimension = validate_training_data(features, labels)?;
        classifier.fit(features, labels)?;

        let frauds = labels.iter().filter(|&&l| l).count();
        info!(
            classifier = classifier.name(),
            samples = labels.len(),
            fraud_samples = frauds,
            dimension = dimension,
            features = ?extractor.feature_names(),
            "Trained policy ready"
        );

        Ok(ScoringPolicy::Trained(TrainedPolicy {
            classifier: Box::new(classifier),
            dimension,
            extractor,
        }))
    }

    /// Score one transaction or feature vector against a policy.
    pub fn score<'a>(
        &self,
        input: impl Into<ScoringInput<'a>>,
        policy: &ScoringPolicy,
    ) -> Result<Verdict> {
        let input = input.into();
        let verdict = policy.score(input)?;

        if let ScoringInput::Transaction(tx) = input {
            debug!(
                transaction_id = %tx.transaction_id(),
                fraud = verdict.fraud,
                policy = ?policy.kind(),
                "Transaction scored"
            );
        }
        Ok(verdict)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scorer() -> RiskScorer {
        RiskScorer::new(
            ForestConfig {
                n_trees: 25,
                ..ForestConfig::default()
            },
            FeatureConfig::default(),
        )
        .unwrap()
    }

    fn training_data() -> (Vec<Vec<f64>>, Vec<bool>) {
        (
            vec![vec![5000.0], vec![15000.0], vec![300.0], vec![7000.0]],
            vec![false, true, false, false],
        )
    }

    #[test]
    fn test_threshold_is_strict() {
        let scorer = scorer();
        let policy = scorer.configure_threshold(100.0).unwrap();

        assert!(!scorer.score(&[100.0], &policy).unwrap().fraud);
        assert!(scorer.score(&[100.01], &policy).unwrap().fraud);
        assert!(!scorer.score(&[0.0], &policy).unwrap().fraud);
    }

    #[test]
    fn test_zero_threshold() {
        let scorer = scorer();
        let policy = scorer.configure_threshold(0.0).unwrap();
        assert!(!scorer.score(&[0.0], &policy).unwrap().fraud);
        assert!(scorer.score(&[0.01], &policy).unwrap().fraud);
    }

    #[test]
    fn test_configure_threshold_rejects_invalid() {
        let scorer = scorer();
        for bad in [-1.0, -0.0001, f64::NAN, f64::INFINITY] {
            assert!(matches!(
                scorer.configure_threshold(bad),
                Err(ScoringError::InvalidConfiguration(_))
            ));
        }
    }

    #[test]
    fn test_threshold_policy_explanation() {
        let scorer = scorer();
        let policy = scorer.configure_threshold(10000.0).unwrap();
        let verdict = scorer.score(&[15000.0], &policy).unwrap();
        assert_eq!(
            verdict.explanation.as_deref(),
            Some("amount 15000.00 exceeds threshold 10000.00")
        );
        assert_eq!(verdict.fraud_probability, None);
    }

    #[test]
    fn test_threshold_policy_feature_dimension() {
        let scorer = scorer();
        let policy = scorer.configure_threshold(10.0).unwrap();
        assert_eq!(policy.dimension(), 1);
        assert_eq!(
            scorer.score(&[1.0, 2.0], &policy).unwrap_err(),
            ScoringError::DimensionMismatch {
                expected: 1,
                actual: 2
            }
        );
        assert!(matches!(
            scorer.score(&[-5.0], &policy),
            Err(ScoringError::InvalidTransaction(_))
        ));
    }

    #[test]
    fn test_train_rejects_mismatched_lengths() {
        let features = vec![vec![1.0], vec![2.0], vec![3.0], vec![4.0]];
        let labels = vec![false, true, false];
        assert!(matches!(
            scorer().train(&features, &labels),
            Err(ScoringError::InsufficientData(_))
        ));
    }

    #[test]
    fn test_train_rejects_single_class() {
        let (features, _) = training_data();
        assert!(matches!(
            scorer().train(&features, &[false; 4]),
            Err(ScoringError::InsufficientData(_))
        ));
        assert!(matches!(
            scorer().train(&features, &[true; 4]),
            Err(ScoringError::InsufficientData(_))
        ));
    }

    #[test]
    fn test_train_rejects_empty() {
        assert!(matches!(
            scorer().train(&[], &[]),
            Err(ScoringError::InsufficientData(_))
        ));
    }

    #[test]
    fn test_trained_scoring_is_deterministic() {
        let scorer = scorer();
        let (features, labels) = training_data();
        let policy = scorer.train(&features, &labels).unwrap();

        assert_eq!(policy.kind(), PolicyKind::Trained);
        assert_eq!(policy.dimension(), 1);

        let first = scorer.score(&[12000.0], &policy).unwrap();
        for _ in 0..10 {
            assert_eq!(scorer.score(&[12000.0], &policy).unwrap(), first);
        }
        assert!(first.fraud_probability.is_some());
    }

    #[test]
    fn test_trained_dimension_mismatch() {
        let scorer = scorer();
        let (features, labels) = training_data();
        let policy = scorer.train(&features, &labels).unwrap();

        assert_eq!(
            scorer.score(&[12000.0, 1.0], &policy).unwrap_err(),
            ScoringError::DimensionMismatch {
                expected: 1,
                actual: 2
            }
        );
    }

    #[test]
    fn test_trained_policy_scores_transactions() {
        let scorer = scorer();
        let (features, labels) = training_data();
        let policy = scorer.train(&features, &labels).unwrap();

        let tx = Transaction::new(12000.0).unwrap();
        assert_eq!(
            scorer.score(&tx, &policy).unwrap(),
            scorer.score(&[12000.0], &policy).unwrap()
        );
    }

    #[test]
    fn test_train_on_transactions_with_location() {
        let scorer = RiskScorer::new(
            ForestConfig {
                n_trees: 25,
                ..ForestConfig::default()
            },
            FeatureConfig {
                scale_amount: true,
                encode_location: true,
            },
        )
        .unwrap();

        let mut transactions = Vec::new();
        let mut labels = Vec::new();
        for i in 0..10 {
            transactions.push(
                Transaction::builder(100.0 + i as f64 * 50.0)
                    .location("Chicago")
                    .build()
                    .unwrap(),
            );
            labels.push(false);
            transactions.push(
                Transaction::builder(20000.0 + i as f64 * 500.0)
                    .location("Berlin")
                    .build()
                    .unwrap(),
            );
            labels.push(true);
        }

        let policy = scorer.train_on_transactions(&transactions, &labels).unwrap();
        assert_eq!(policy.dimension(), 2);

        let suspicious = Transaction::builder(22000.0)
            .location("Berlin")
            .build()
            .unwrap();
        let normal = Transaction::builder(150.0)
            .location("Chicago")
            .build()
            .unwrap();
        assert!(scorer.score(&suspicious, &policy).unwrap().fraud);
        assert!(!scorer.score(&normal, &policy).unwrap().fraud);

        // Raw vectors must match the extracted layout
        assert!(matches!(
            scorer.score(&[1.0], &policy),
            Err(ScoringError::DimensionMismatch { expected: 2, actual: 1 })
        ));
    }

    #[derive(Debug, Default)]
    struct AlwaysFraud {
        fitted: bool,
    }

    impl Classifier for AlwaysFraud {
        fn name(&self) -> &str {
            "always_fraud"
        }

        fn fit(&mut self, _features: &[Vec<f64>], _labels: &[bool]) -> Result<()> {
            self.fitted = true;
            Ok(())
        }

        fn predict(&self, _features: &[f64]) -> bool {
            self.fitted
        }
    }

    #[test]
    fn test_custom_classifier_backend() {
        let scorer = scorer();
        let (features, labels) = training_data();
        let policy = scorer
            .train_with(AlwaysFraud::default(), &features, &labels)
            .unwrap();

        let verdict = scorer.score(&[1.0], &policy).unwrap();
        assert!(verdict.fraud);
        assert_eq!(verdict.fraud_probability, None);
        assert_eq!(verdict.explanation.as_deref(), Some("always_fraud predicts fraud"));
    }

    #[test]
    fn test_custom_backend_still_validates_data() {
        let scorer = scorer();
        assert!(matches!(
            scorer.train_with(AlwaysFraud::default(), &[vec![1.0]], &[true]),
            Err(ScoringError::InsufficientData(_))
        ));
    }

    #[test]
    fn test_policy_is_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<ScoringPolicy>();
        assert_send_sync::<RiskScorer>();
    }
}

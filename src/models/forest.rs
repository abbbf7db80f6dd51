//! Random forest classifier

use crate::config::ForestConfig;
use crate::error::Result;
use crate::models::aggregator::ScoreAggregator;
use crate::models::tree::{DecisionTree, TreeParams};
use crate::models::{validate_training_data, Classifier};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::debug;

/// Bagged ensemble of CART trees.
///
/// All randomness (bootstrap rows and per-split feature subsets) is drawn
/// from a `StdRng` seeded from the configuration, so fitting the same data
/// with the same config always yields the same forest. Prediction is the
/// mean of per-tree leaf fraud fractions; a mean of exactly 0.5 counts as
/// legitimate.
#[derive(Debug, Clone)]
pub struct RandomForest {
    config: ForestConfig,
    trees: Vec<DecisionTree>,
    aggregator: ScoreAggregator,
}

impl RandomForest {
    pub fn new(config: ForestConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            config,
            trees: Vec::new(),
            aggregator: ScoreAggregator::equal_weights(),
        })
    }

    pub fn tree_count(&self) -> usize {
        self.trees.len()
    }

    pub fn is_fitted(&self) -> bool {
        !self.trees.is_empty()
    }

    /// Per-tree fraud probabilities for one feature vector.
    pub fn tree_probabilities(&self, features: &[f64]) -> Vec<f64> {
        self.trees
            .iter()
            .map(|tree| tree.fraud_probability(features))
            .collect()
    }

    /// Fraction of trees voting fraud for one feature vector.
    pub fn vote_fraction(&self, features: &[f64]) -> f64 {
        ScoreAggregator::voting_score(&self.tree_probabilities(features), 0.5)
    }
}

impl Default for RandomForest {
    fn default() -> Self {
        Self {
            config: ForestConfig::default(),
            trees: Vec::new(),
            aggregator: ScoreAggregator::equal_weights(),
        }
    }
}

impl Classifier for RandomForest {
    fn name(&self) -> &str {
        "random_forest"
    }

    fn fit(&mut self, features: &[Vec<f64>], labels: &[bool]) -> Result<()> {
        let dimension = validate_training_data(features, labels)?;
        let n = features.len();

        let params = TreeParams {
            max_depth: self.config.max_depth,
            min_samples_split: self.config.min_samples_split,
            max_features: ((dimension as f64).sqrt().ceil() as usize).max(1),
        };
        let mut rng = StdRng::seed_from_u64(self.config.seed);

        let trees: Vec<DecisionTree> = (0..self.config.n_trees)
            .map(|_| {
                let rows: Vec<usize> = (0..n).map(|_| rng.gen_range(0..n)).collect();
                DecisionTree::fit(features, labels, &rows, params, &mut rng)
            })
            .collect();

        let max_depth = trees.iter().map(DecisionTree::depth).max().unwrap_or(0);
        debug!(
            trees = trees.len(),
            samples = n,
            dimension = dimension,
            max_depth = max_depth,
            "Random forest fitted"
        );

        self.trees = trees;
        Ok(())
    }

    fn predict(&self, features: &[f64]) -> bool {
        self.fraud_probability(features)
            .map(|p| p > 0.5)
            .unwrap_or(false)
    }

    fn fraud_probability(&self, features: &[f64]) -> Option<f64> {
        if self.trees.is_empty() {
            return None;
        }
        Some(self.aggregator.aggregate(&self.tree_probabilities(features)))
    }
}

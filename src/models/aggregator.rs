//! Score aggregation for tree ensembles

/// Combines per-tree fraud probabilities into a single score.
#[derive(Debug, Clone)]
pub struct ScoreAggregator {
    /// Optional per-member weights; members without a weight use `default_weight`
    weights: Vec<f64>,
    default_weight: f64,
}

impl ScoreAggregator {
    /// Create an aggregator with explicit per-member weights.
    pub fn new(weights: Vec<f64>) -> Self {
        Self {
            weights,
            default_weight: 1.0,
        }
    }

    /// Create aggregator with equal weights for all members.
    pub fn equal_weights() -> Self {
        Self::new(Vec::new())
    }

    /// Weighted average of member probabilities, clamped to [0, 1].
    ///
    /// Returns 0.5 (neutral) when there are no members.
    pub fn aggregate(&self, scores: &[f64]) -> f64 {
        if scores.is_empty() {
            return 0.5;
        }

        let mut weighted_sum = 0.0;
        let mut total_weight = 0.0;

        for (i, &score) in scores.iter().enumerate() {
            let weight = self.weights.get(i).copied().unwrap_or(self.default_weight);
            weighted_sum += score * weight;
            total_weight += weight;
        }

        if total_weight > 0.0 {
            (weighted_sum / total_weight).clamp(0.0, 1.0)
        } else {
            0.5
        }
    }

    /// Fraction of members whose probability is strictly above `threshold`.
    pub fn voting_score(scores: &[f64], threshold: f64) -> f64 {
        if scores.is_empty() {
            return 0.0;
        }

        let votes_for_fraud = scores.iter().filter(|&&score| score > threshold).count();
        votes_for_fraud as f64 / scores.len() as f64
    }
}

impl Default for ScoreAggregator {
    fn default() -> Self {
        Self::equal_weights()
    }
}

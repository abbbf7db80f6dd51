//! Feature extraction for trained scoring policies.
//!
//! Turns a [`Transaction`] into the numeric feature vector a classifier was
//! trained on. The extractor is fitted once on the training transactions and
//! is immutable afterwards, so the same vector layout is produced at
//! inference time.

use crate::config::FeatureConfig;
use crate::types::transaction::Transaction;

/// Mean/std normalisation learned from training amounts.
#[derive(Debug, Clone, PartialEq)]
struct AmountScaler {
    mean: f64,
    std: f64,
}

impl AmountScaler {
    fn fit(amounts: &[f64]) -> Self {
        if amounts.is_empty() {
            return Self {
                mean: 0.0,
                std: 1.0,
            };
        }

        let n = amounts.len() as f64;
        let mean = amounts.iter().sum::<f64>() / n;
        let variance = amounts.iter().map(|a| (a - mean).powi(2)).sum::<f64>() / n;
        let std = variance.sqrt();

        Self {
            mean,
            // A constant column scales to zero rather than dividing by zero
            std: if std > 0.0 { std } else { 1.0 },
        }
    }

    fn transform(&self, amount: f64) -> f64 {
        (amount - self.mean) / self.std
    }
}

/// Sorted location vocabulary; codes are indices into it.
#[derive(Debug, Clone, PartialEq)]
struct LocationEncoder {
    vocabulary: Vec<String>,
}

impl LocationEncoder {
    fn fit<'a>(locations: impl Iterator<Item = &'a str>) -> Self {
        let mut vocabulary: Vec<String> = locations.map(str::to_string).collect();
        vocabulary.sort();
        vocabulary.dedup();
        Self { vocabulary }
    }

    /// Unseen locations share the code one past the last known location.
    fn encode(&self, location: &str) -> f64 {
        let code = self
            .vocabulary
            .binary_search_by(|known| known.as_str().cmp(location))
            .unwrap_or(self.vocabulary.len());
        code as f64
    }
}

/// Feature extractor that transforms transactions into model input features.
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureExtractor {
    scaler: Option<AmountScaler>,
    locations: Option<LocationEncoder>,
}

impl FeatureExtractor {
    /// Raw amount as the single feature.
    pub fn amount_only() -> Self {
        Self {
            scaler: None,
            locations: None,
        }
    }

    /// Fit scaling and encoding parameters on training transactions.
    pub fn fit(transactions: &[Transaction], config: FeatureConfig) -> Self {
        let scaler = config.scale_amount.then(|| {
            let amounts: Vec<f64> = transactions.iter().map(Transaction::amount).collect();
            AmountScaler::fit(&amounts)
        });
        let locations = config
            .encode_location
            .then(|| LocationEncoder::fit(transactions.iter().map(Transaction::location)));

        Self { scaler, locations }
    }

    /// Extract the feature vector for a transaction.
    pub fn extract(&self, tx: &Transaction) -> Vec<f64> {
        let mut features = Vec::with_capacity(self.feature_count());

        let amount = match &self.scaler {
            Some(scaler) => scaler.transform(tx.amount()),
            None => tx.amount(),
        };
        features.push(amount);

        if let Some(encoder) = &self.locations {
            features.push(encoder.encode(tx.location()));
        }

        features
    }

    /// Get the number of features produced.
    pub fn feature_count(&self) -> usize {
        1 + usize::from(self.locations.is_some())
    }

    /// Get feature names in vector order.
    pub fn feature_names(&self) -> Vec<&'static str> {
        let mut names = vec![if self.scaler.is_some() {
            "amount_scaled"
        } else {
            "amount"
        }];
        if self.locations.is_some() {
            names.push("location_encoded");
        }
        names
    }
}

impl Default for FeatureExtractor {
    fn default() -> Self {
        Self::amount_only()
    }
}

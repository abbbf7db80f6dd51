//! Fraud alert data structures

use crate::error::{Result, ScoringError};
use crate::types::transaction::Transaction;
use crate::types::verdict::Verdict;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Risk level classification
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RiskLevel {
    Low,
    Medium,
    High,
    Critical,
}

impl RiskLevel {
    /// Determine risk level from a fraud probability and thresholds
    pub fn from_probability(probability: f64, thresholds: &RiskLevelThresholds) -> Self {
        if probability >= thresholds.critical {
            RiskLevel::Critical
        } else if probability >= thresholds.high {
            RiskLevel::High
        } else if probability >= thresholds.medium {
            RiskLevel::Medium
        } else {
            RiskLevel::Low
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            RiskLevel::Low => "low",
            RiskLevel::Medium => "medium",
            RiskLevel::High => "high",
            RiskLevel::Critical => "critical",
        }
    }
}

/// Configurable risk level thresholds
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RiskLevelThresholds {
    pub low: f64,
    pub medium: f64,
    pub high: f64,
    pub critical: f64,
}

impl RiskLevelThresholds {
    /// Thresholds must lie in [0, 1] and be non-decreasing.
    pub fn validate(&self) -> Result<()> {
        let levels = [self.low, self.medium, self.high, self.critical];
        if levels.iter().any(|l| !(0.0..=1.0).contains(l)) {
            return Err(ScoringError::InvalidConfiguration(
                "risk level thresholds must be within [0, 1]".to_string(),
            ));
        }
        if levels.windows(2).any(|w| w[0] > w[1]) {
            return Err(ScoringError::InvalidConfiguration(
                "risk level thresholds must be ordered low <= medium <= high <= critical"
                    .to_string(),
            ));
        }
        Ok(())
    }
}

impl Default for RiskLevelThresholds {
    fn default() -> Self {
        Self {
            low: 0.3,
            medium: 0.5,
            high: 0.7,
            critical: 0.9,
        }
    }
}

/// Alert emitted for a transaction judged fraudulent
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FraudAlert {
    /// Unique alert identifier
    pub alert_id: String,

    /// Associated transaction ID
    pub transaction_id: String,

    pub account_id: String,

    pub merchant_id: String,

    pub amount: f64,

    /// When the transaction happened
    pub transaction_time: DateTime<Utc>,

    /// Fraud probability if the policy reports one
    pub fraud_probability: Option<f64>,

    /// Risk level classification
    pub risk_level: RiskLevel,

    /// Explanation carried over from the verdict
    pub analysis: String,

    /// Alert generation timestamp
    pub timestamp: DateTime<Utc>,
}

impl FraudAlert {
    /// Build an alert from a fraud verdict.
    ///
    /// Threshold policies report no probability; their alerts are `High`.
    pub fn from_verdict(
        transaction: &Transaction,
        verdict: &Verdict,
        thresholds: &RiskLevelThresholds,
    ) -> Self {
        let risk_level = verdict
            .fraud_probability
            .map(|p| RiskLevel::from_probability(p, thresholds))
            .unwrap_or(RiskLevel::High);

        Self {
            alert_id: uuid::Uuid::new_v4().to_string(),
            transaction_id: transaction.transaction_id().to_string(),
            account_id: transaction.account_id().to_string(),
            merchant_id: transaction.merchant_id().to_string(),
            amount: transaction.amount(),
            transaction_time: transaction.timestamp(),
            fraud_probability: verdict.fraud_probability,
            risk_level,
            analysis: verdict.explanation.clone().unwrap_or_default(),
            timestamp: Utc::now(),
        }
    }
}

//! Scoring outcome

use serde::{Deserialize, Serialize};

/// Fraud/legitimate outcome of scoring one transaction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Verdict {
    /// True when the transaction is judged fraudulent
    pub fraud: bool,
    /// Human-readable reason for the decision
    pub explanation: Option<String>,
    /// Fraud probability (0.0 - 1.0), only reported by trained policies
    pub fraud_probability: Option<f64>,
}

impl Verdict {
    pub fn fraud() -> Self {
        Self {
            fraud: true,
            explanation: None,
            fraud_probability: None,
        }
    }

    pub fn legitimate() -> Self {
        Self {
            fraud: false,
            explanation: None,
            fraud_probability: None,
        }
    }

    pub fn with_explanation(mut self, explanation: impl Into<String>) -> Self {
        self.explanation = Some(explanation.into());
        self
    }

    pub fn with_probability(mut self, probability: f64) -> Self {
        self.fraud_probability = Some(probability);
        self
    }

    /// Whether the transaction is legitimate
    pub fn is_legitimate(&self) -> bool {
        !self.fraud
    }
}

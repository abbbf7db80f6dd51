//! Transaction data structures for fraud risk scoring

use crate::error::{Result, ScoringError};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A financial transaction to be scored for fraud risk.
///
/// Fields are private so a `Transaction` can only exist in a validated state:
/// the amount is always finite and non-negative. Deserialization goes through
/// the same validation as [`Transaction::new`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawTransaction")]
pub struct Transaction {
    transaction_id: String,
    amount: f64,
    timestamp: DateTime<Utc>,
    account_id: String,
    merchant_id: String,
    location: String,
}

/// Unvalidated wire form of a transaction.
#[derive(Debug, Deserialize)]
struct RawTransaction {
    #[serde(default, alias = "TransactionID")]
    transaction_id: Option<String>,
    #[serde(alias = "Amount")]
    amount: f64,
    #[serde(default = "Utc::now", alias = "Date")]
    timestamp: DateTime<Utc>,
    #[serde(default)]
    account_id: String,
    #[serde(default, alias = "Merchant", alias = "merchant_name")]
    merchant_id: String,
    #[serde(default, alias = "Location")]
    location: String,
}

impl TryFrom<RawTransaction> for Transaction {
    type Error = ScoringError;

    fn try_from(raw: RawTransaction) -> Result<Self> {
        let mut builder = Transaction::builder(raw.amount)
            .timestamp(raw.timestamp)
            .account_id(raw.account_id)
            .merchant_id(raw.merchant_id)
            .location(raw.location);
        if let Some(id) = raw.transaction_id {
            builder = builder.transaction_id(id);
        }
        builder.build()
    }
}

impl Transaction {
    /// Create a transaction with only an amount; all other fields take defaults.
    pub fn new(amount: f64) -> Result<Self> {
        Self::builder(amount).build()
    }

    /// Start building a transaction with the given amount.
    pub fn builder(amount: f64) -> TransactionBuilder {
        TransactionBuilder {
            transaction_id: None,
            amount,
            timestamp: None,
            account_id: String::new(),
            merchant_id: String::new(),
            location: String::new(),
        }
    }

    pub fn transaction_id(&self) -> &str {
        &self.transaction_id
    }

    pub fn amount(&self) -> f64 {
        self.amount
    }

    pub fn timestamp(&self) -> DateTime<Utc> {
        self.timestamp
    }

    pub fn account_id(&self) -> &str {
        &self.account_id
    }

    pub fn merchant_id(&self) -> &str {
        &self.merchant_id
    }

    pub fn location(&self) -> &str {
        &self.location
    }
}

/// Builder for [`Transaction`]. Validation happens in [`TransactionBuilder::build`].
#[derive(Debug, Clone)]
pub struct TransactionBuilder {
    transaction_id: Option<String>,
    amount: f64,
    timestamp: Option<DateTime<Utc>>,
    account_id: String,
    merchant_id: String,
    location: String,
}

impl TransactionBuilder {
    pub fn transaction_id(mut self, id: impl Into<String>) -> Self {
        self.transaction_id = Some(id.into());
        self
    }

    pub fn timestamp(mut self, timestamp: DateTime<Utc>) -> Self {
        self.timestamp = Some(timestamp);
        self
    }

    pub fn account_id(mut self, account_id: impl Into<String>) -> Self {
        self.account_id = account_id.into();
        self
    }

    pub fn merchant_id(mut self, merchant_id: impl Into<String>) -> Self {
        self.merchant_id = merchant_id.into();
        self
    }

    pub fn location(mut self, location: impl Into<String>) -> Self {
        self.location = location.into();
        self
    }

    /// Validate and produce the transaction.
    pub fn build(self) -> Result<Transaction> {
        if !self.amount.is_finite() {
            return Err(ScoringError::InvalidTransaction(format!(
                "amount must be a finite number, got {}",
                self.amount
            )));
        }
        if self.amount < 0.0 {
            return Err(ScoringError::InvalidTransaction(format!(
                "amount must be non-negative, got {}",
                self.amount
            )));
        }

        Ok(Transaction {
            transaction_id: self
                .transaction_id
                .unwrap_or_else(|| format!("tx_{}", uuid::Uuid::new_v4().simple())),
            amount: self.amount,
            timestamp: self.timestamp.unwrap_or_else(Utc::now),
            account_id: self.account_id,
            merchant_id: self.merchant_id,
            location: self.location,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder_sets_fields() {
        let tx = Transaction::builder(15000.0)
            .transaction_id("tx_1")
            .account_id("12345")
            .merchant_id("Amazon")
            .location("Berlin")
            .build()
            .unwrap();

        assert_eq!(tx.transaction_id(), "tx_1");
        assert_eq!(tx.amount(), 15000.0);
        assert_eq!(tx.account_id(), "12345");
        assert_eq!(tx.merchant_id(), "Amazon");
        assert_eq!(tx.location(), "Berlin");
    }

    #[test]
    fn test_rejects_negative_amount() {
        let err = Transaction::new(-1.0).unwrap_err();
        assert!(matches!(err, ScoringError::InvalidTransaction(_)));
    }

    #[test]
    fn test_rejects_non_finite_amount() {
        assert!(Transaction::new(f64::NAN).is_err());
        assert!(Transaction::new(f64::INFINITY).is_err());
    }

    #[test]
    fn test_zero_amount_allowed() {
        assert!(Transaction::new(0.0).is_ok());
    }

    #[test]
    fn test_generated_ids_are_unique() {
        let a = Transaction::new(1.0).unwrap();
        let b = Transaction::new(1.0).unwrap();
        assert_ne!(a.transaction_id(), b.transaction_id());
    }

    #[test]
    fn test_deserialization_validates() {
        let json = r#"{"transaction_id": "tx_9", "amount": 42.5, "account_id": "a1", "merchant_name": "Nike"}"#;
        let tx: Transaction = serde_json::from_str(json).unwrap();
        assert_eq!(tx.transaction_id(), "tx_9");
        assert_eq!(tx.merchant_id(), "Nike");

        let bad = r#"{"amount": -5.0}"#;
        assert!(serde_json::from_str::<Transaction>(bad).is_err());
    }

    #[test]
    fn test_serialization_preserves_fields() {
        let tx = Transaction::builder(99.0)
            .transaction_id("tx_123")
            .location("Paris")
            .build()
            .unwrap();

        let json = serde_json::to_string(&tx).unwrap();
        let deserialized: Transaction = serde_json::from_str(&json).unwrap();

        assert_eq!(tx, deserialized);
    }
}

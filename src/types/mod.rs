//! Type definitions for fraud risk scoring

pub mod alert;
pub mod transaction;
pub mod verdict;

pub use alert::{FraudAlert, RiskLevel, RiskLevelThresholds};
pub use transaction::{Transaction, TransactionBuilder};
pub use verdict::Verdict;

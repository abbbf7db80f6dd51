//! Synthetic labelled transactions for demos and tests.

use crate::error::Result;
use crate::types::transaction::Transaction;
use chrono::{DateTime, Duration, TimeZone, Utc};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

const LOCATIONS: [&str; 8] = [
    "New York",
    "Los Angeles",
    "San Francisco",
    "Miami",
    "Chicago",
    "London",
    "Berlin",
    "Paris",
];

const MERCHANTS: [&str; 8] = [
    "Amazon",
    "Walmart",
    "Target",
    "Starbucks",
    "eBay",
    "Apple",
    "Nike",
    "BestBuy",
];

/// Seeded transaction generator. The same seed yields the same sequence.
pub struct TransactionGenerator {
    rng: StdRng,
    transaction_counter: u64,
    start: DateTime<Utc>,
}

impl TransactionGenerator {
    pub fn new(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
            transaction_counter: 0,
            start: Utc
                .with_ymd_and_hms(2022, 1, 1, 0, 0, 0)
                .single()
                .unwrap_or_default(),
        }
    }

    /// Generate a legitimate transaction
    pub fn generate_legitimate(&mut self) -> Result<Transaction> {
        let amount = round_cents(self.rng.gen_range(10.0..10_000.0));
        self.build(amount)
    }

    /// Generate a fraudulent transaction (elevated amount)
    pub fn generate_fraudulent(&mut self) -> Result<Transaction> {
        let amount = round_cents(self.rng.gen_range(8_000.0..25_000.0));
        self.build(amount)
    }

    /// Generate `count` labelled transactions, each fraudulent with
    /// probability `fraud_rate` (clamped to [0, 1]).
    pub fn generate_labelled(
        &mut self,
        count: usize,
        fraud_rate: f64,
    ) -> Result<(Vec<Transaction>, Vec<bool>)> {
        let fraud_rate = fraud_rate.clamp(0.0, 1.0);
        let mut transactions = Vec::with_capacity(count);
        let mut labels = Vec::with_capacity(count);

        for _ in 0..count {
            let fraud = self.rng.gen_bool(fraud_rate);
            let tx = if fraud {
                self.generate_fraudulent()?
            } else {
                self.generate_legitimate()?
            };
            transactions.push(tx);
            labels.push(fraud);
        }

        Ok((transactions, labels))
    }

    fn build(&mut self, amount: f64) -> Result<Transaction> {
        let day = self.transaction_counter;
        self.transaction_counter += 1;

        Transaction::builder(amount)
            .transaction_id(format!("tx_{:012}", self.transaction_counter))
            .timestamp(self.start + Duration::days(day as i64))
            .account_id(format!("acct_{}", self.rng.gen_range(1..3650)))
            .merchant_id(self.random_choice(&MERCHANTS))
            .location(self.random_choice(&LOCATIONS))
            .build()
    }

    fn random_choice<'a>(&mut self, choices: &[&'a str]) -> &'a str {
        choices[self.rng.gen_range(0..choices.len())]
    }
}

fn round_cents(amount: f64) -> f64 {
    (amount * 100.0).round() / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_same_seed_same_transactions() {
        let (a, labels_a) = TransactionGenerator::new(7).generate_labelled(50, 0.2).unwrap();
        let (b, labels_b) = TransactionGenerator::new(7).generate_labelled(50, 0.2).unwrap();

        assert_eq!(a, b);
        assert_eq!(labels_a, labels_b);
    }

    #[test]
    fn test_amount_ranges() {
        let mut generator = TransactionGenerator::new(1);
        for _ in 0..100 {
            let legit = generator.generate_legitimate().unwrap();
            assert!((10.0..=10_000.0).contains(&legit.amount()));
            let fraud = generator.generate_fraudulent().unwrap();
            assert!((8_000.0..=25_000.0).contains(&fraud.amount()));
        }
    }

    #[test]
    fn test_fraud_rate_extremes() {
        let mut generator = TransactionGenerator::new(3);
        let (_, labels) = generator.generate_labelled(20, 0.0).unwrap();
        assert!(labels.iter().all(|&l| !l));
        let (_, labels) = generator.generate_labelled(20, 1.0).unwrap();
        assert!(labels.iter().all(|&l| l));
    }

    #[test]
    fn test_sequential_ids_and_days() {
        let mut generator = TransactionGenerator::new(5);
        let first = generator.generate_legitimate().unwrap();
        let second = generator.generate_legitimate().unwrap();

        assert_eq!(first.transaction_id(), "tx_000000000001");
        assert_eq!(second.transaction_id(), "tx_000000000002");
        assert_eq!(second.timestamp() - first.timestamp(), Duration::days(1));
    }
}

//! Batch scoring pipeline
//!
//! Scores many transactions against one shared, immutable policy on Tokio's
//! blocking pool, at most `workers` at a time.

use crate::error::ScoringError;
use crate::metrics::ScoringMetrics;
use crate::scorer::{RiskScorer, ScoringPolicy};
use crate::types::alert::{FraudAlert, RiskLevelThresholds};
use crate::types::transaction::Transaction;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::{debug, error, info, warn};

/// A transaction that could not be scored
#[derive(Debug, Clone, PartialEq)]
pub struct ScoringFailure {
    pub transaction_id: String,
    pub error: ScoringError,
}

/// Outcome of scoring one batch
#[derive(Debug, Default)]
pub struct BatchReport {
    pub processed: usize,
    /// Alerts for fraudulent transactions, sorted by transaction id
    pub alerts: Vec<FraudAlert>,
    pub failures: Vec<ScoringFailure>,
}

impl BatchReport {
    pub fn flagged(&self) -> usize {
        self.alerts.len()
    }
}

enum TaskOutcome {
    Legitimate,
    Flagged(FraudAlert),
    Failed(ScoringFailure),
}

/// Concurrent scorer for batches of transactions
pub struct ScoringPipeline {
    scorer: Arc<RiskScorer>,
    policy: Arc<ScoringPolicy>,
    thresholds: Arc<RiskLevelThresholds>,
    metrics: Arc<ScoringMetrics>,
    workers: usize,
}

impl ScoringPipeline {
    pub fn new(
        scorer: Arc<RiskScorer>,
        policy: Arc<ScoringPolicy>,
        thresholds: RiskLevelThresholds,
        metrics: Arc<ScoringMetrics>,
        workers: usize,
    ) -> Self {
        Self {
            scorer,
            policy,
            thresholds: Arc::new(thresholds),
            metrics,
            workers: workers.max(1),
        }
    }

    pub fn metrics(&self) -> &Arc<ScoringMetrics> {
        &self.metrics
    }

    /// Score every transaction and collect alerts and failures.
    pub async fn run(&self, transactions: Vec<Transaction>) -> BatchReport {
        info!(
            transactions = transactions.len(),
            workers = self.workers,
            policy = ?self.policy.kind(),
            "Starting batch scoring"
        );

        let semaphore = Arc::new(Semaphore::new(self.workers));
        let processed_count = Arc::new(AtomicU64::new(0));
        let mut tasks = JoinSet::new();

        for transaction in transactions {
            // The semaphore is never closed, so acquire only fails after shutdown
            let permit = match semaphore.clone().acquire_owned().await {
                Ok(permit) => permit,
                Err(e) => {
                    error!(error = %e, "Worker semaphore closed, stopping batch");
                    break;
                }
            };

            let scorer = self.scorer.clone();
            let policy = self.policy.clone();
            let thresholds = self.thresholds.clone();
            let metrics = self.metrics.clone();
            let processed_count = processed_count.clone();

            tasks.spawn_blocking(move || {
                let start_time = Instant::now();
                let outcome = match scorer.score(&transaction, &policy) {
                    Ok(verdict) => {
                        let scoring_time = start_time.elapsed();
                        metrics.record_score(scoring_time, verdict.fraud, verdict.fraud_probability);

                        if verdict.fraud {
                            let alert = FraudAlert::from_verdict(&transaction, &verdict, &thresholds);
                            metrics.record_alert(alert.risk_level);
                            info!(
                                transaction_id = %alert.transaction_id,
                                amount = alert.amount,
                                risk_level = ?alert.risk_level,
                                scoring_time_us = scoring_time.as_micros(),
                                "Fraud alert raised"
                            );
                            TaskOutcome::Flagged(alert)
                        } else {
                            debug!(
                                transaction_id = %transaction.transaction_id(),
                                scoring_time_us = scoring_time.as_micros(),
                                "Transaction legitimate"
                            );
                            TaskOutcome::Legitimate
                        }
                    }
                    Err(e) => {
                        metrics.record_failure();
                        warn!(
                            transaction_id = %transaction.transaction_id(),
                            error = %e,
                            "Scoring failed"
                        );
                        TaskOutcome::Failed(ScoringFailure {
                            transaction_id: transaction.transaction_id().to_string(),
                            error: e,
                        })
                    }
                };

                let count = processed_count.fetch_add(1, Ordering::Relaxed) + 1;
                if count % 100 == 0 {
                    let stats = metrics.get_processing_stats();
                    info!(
                        processed = count,
                        throughput = format!("{:.1} tx/s", metrics.get_throughput()),
                        avg_latency_us = stats.mean_us,
                        "Scoring milestone"
                    );
                }

                drop(permit);
                outcome
            });
        }

        let mut report = BatchReport::default();
        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok(outcome) => {
                    report.processed += 1;
                    match outcome {
                        TaskOutcome::Legitimate => {}
                        TaskOutcome::Flagged(alert) => report.alerts.push(alert),
                        TaskOutcome::Failed(failure) => report.failures.push(failure),
                    }
                }
                Err(e) => error!(error = %e, "Scoring task panicked"),
            }
        }

        report
            .alerts
            .sort_by(|a, b| a.transaction_id.cmp(&b.transaction_id));
        report
            .failures
            .sort_by(|a, b| a.transaction_id.cmp(&b.transaction_id));

        info!(
            processed = report.processed,
            flagged = report.flagged(),
            failed = report.failures.len(),
            "Batch scoring complete"
        );
        report
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{FeatureConfig, ForestConfig};
    use crate::synthetic::TransactionGenerator;
    use crate::types::alert::RiskLevel;

    fn pipeline(policy: ScoringPolicy, scorer: RiskScorer, workers: usize) -> ScoringPipeline {
        ScoringPipeline::new(
            Arc::new(scorer),
            Arc::new(policy),
            RiskLevelThresholds::default(),
            Arc::new(ScoringMetrics::new()),
            workers,
        )
    }

    #[tokio::test]
    async fn test_threshold_batch_matches_sequential() {
        let scorer = RiskScorer::default();
        let (transactions, _) = TransactionGenerator::new(11)
            .generate_labelled(200, 0.1)
            .unwrap();

        let expected: Vec<String> = transactions
            .iter()
            .filter(|tx| tx.amount() > 9_000.0)
            .map(|tx| tx.transaction_id().to_string())
            .collect();

        let policy = scorer.configure_threshold(9_000.0).unwrap();
        let pipeline = pipeline(policy, scorer, 4);
        let report = pipeline.run(transactions).await;

        let flagged: Vec<String> = report
            .alerts
            .iter()
            .map(|a| a.transaction_id.clone())
            .collect();
        assert_eq!(report.processed, 200);
        assert!(report.failures.is_empty());
        assert_eq!(flagged, expected);
        assert!(report.alerts.iter().all(|a| a.risk_level == RiskLevel::High));
        assert_eq!(
            pipeline.metrics().frauds_flagged.load(Ordering::Relaxed),
            expected.len() as u64
        );
    }

    #[tokio::test]
    async fn test_failures_are_reported() {
        let scorer = RiskScorer::new(
            ForestConfig {
                n_trees: 10,
                ..ForestConfig::default()
            },
            FeatureConfig::default(),
        )
        .unwrap();
        // Two-dimensional raw vectors; transactions only yield one feature
        let policy = scorer
            .train(&[vec![1.0, 0.0], vec![9.0, 1.0]], &[false, true])
            .unwrap();
        let tx = Transaction::builder(5.0)
            .transaction_id("tx_bad")
            .build()
            .unwrap();

        let report = pipeline(policy, scorer, 2).run(vec![tx]).await;

        assert_eq!(report.processed, 1);
        assert_eq!(
            report.failures,
            vec![ScoringFailure {
                transaction_id: "tx_bad".to_string(),
                error: ScoringError::DimensionMismatch {
                    expected: 2,
                    actual: 1
                },
            }]
        );
    }

    #[tokio::test]
    async fn test_empty_batch() {
        let scorer = RiskScorer::default();
        let policy = scorer.configure_threshold(1.0).unwrap();
        let report = pipeline(policy, scorer, 1).run(Vec::new()).await;
        assert_eq!(report.processed, 0);
        assert_eq!(report.flagged(), 0);
    }
}

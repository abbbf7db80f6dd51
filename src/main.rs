//! Fraud Risk Scorer - Demo Entry Point
//!
//! Runs the rule-based and model-based scoring scenarios, then scores a
//! synthetic batch with the configured policy.

use anyhow::{Context, Result};
use fraud_risk_scorer::{
    config::{AppConfig, LoggingConfig, PolicyKind},
    metrics::ScoringMetrics,
    pipeline::ScoringPipeline,
    synthetic::TransactionGenerator,
    RiskScorer, Transaction,
};
use std::sync::Arc;
use tracing::info;

fn init_logging(logging: &LoggingConfig) -> Result<()> {
    let filter = tracing_subscriber::EnvFilter::from_default_env()
        .add_directive(format!("fraud_risk_scorer={}", logging.level).parse()?);

    if logging.format == "json" {
        tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).init();
    }
    Ok(())
}

/// Rule-based scenario: flag anything above the configured amount.
fn run_rule_scenario(scorer: &RiskScorer, threshold: f64) -> Result<()> {
    let policy = scorer.configure_threshold(threshold)?;

    let large = Transaction::builder(15_000.0).account_id("12345").build()?;
    let small = Transaction::builder(9_999.0).account_id("12345").build()?;

    for tx in [&large, &small] {
        let verdict = scorer.score(tx, &policy)?;
        info!(
            amount = tx.amount(),
            fraud = verdict.fraud,
            explanation = verdict.explanation.as_deref().unwrap_or_default(),
            "Rule-based verdict"
        );
    }
    Ok(())
}

/// Model-based scenario: train on a handful of labelled amounts.
fn run_model_scenario(scorer: &RiskScorer) -> Result<()> {
    let features = vec![vec![5000.0], vec![15000.0], vec![300.0], vec![7000.0]];
    let labels = vec![false, true, false, false];
    let policy = scorer.train(&features, &labels)?;

    let verdict = scorer.score(&[12000.0], &policy)?;
    info!(
        amount = 12000.0,
        fraud = verdict.fraud,
        explanation = verdict.explanation.as_deref().unwrap_or_default(),
        "Model-based verdict"
    );
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration
    let config = match std::env::args().nth(1) {
        Some(path) => AppConfig::load_from_path(&path)
            .with_context(|| format!("Failed to load configuration from {}", path))?,
        None => AppConfig::load()?,
    };

    init_logging(&config.logging)?;
    info!("Starting Fraud Risk Scorer");
    info!(
        "Policy: {:?}, threshold: {:.2}, alert levels: low<{:.2}, medium<{:.2}, high<{:.2}",
        config.scoring.policy,
        config.scoring.threshold,
        config.scoring.risk_levels.low,
        config.scoring.risk_levels.medium,
        config.scoring.risk_levels.high
    );

    let scorer = Arc::new(RiskScorer::from_config(&config)?);

    run_rule_scenario(&scorer, config.scoring.threshold)?;
    run_model_scenario(&scorer)?;

    // Synthetic batch
    let mut generator = TransactionGenerator::new(config.demo.seed);
    let (transactions, labels) =
        generator.generate_labelled(config.demo.transactions, config.demo.fraud_rate)?;
    info!(
        transactions = transactions.len(),
        labelled_fraud = labels.iter().filter(|&&l| l).count(),
        "Synthetic transactions generated"
    );

    let policy = match config.scoring.policy {
        PolicyKind::Threshold => scorer.configure_threshold(config.scoring.threshold)?,
        PolicyKind::Trained => scorer
            .train_on_transactions(&transactions, &labels)
            .context("Failed to train scoring policy")?,
    };

    let metrics = Arc::new(ScoringMetrics::new());
    let pipeline = ScoringPipeline::new(
        scorer.clone(),
        Arc::new(policy),
        config.scoring.risk_levels.clone(),
        metrics.clone(),
        config.pipeline.workers,
    );

    let report = pipeline.run(transactions).await;

    for alert in report.alerts.iter().take(5) {
        info!(alert = %serde_json::to_string(alert)?, "Sample alert");
    }

    info!("Scoring finished");
    metrics.print_summary();

    Ok(())
}

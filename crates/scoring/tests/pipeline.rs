//! End-to-end scoring from raw market records to a batch report.

use implied_dist_core::{AnalysisConfig, MarketDataSource};
use implied_dist_scoring::{BatchEvaluator, BatchInput, ReportFormatter, SkipReason};

const BUNDLE: &str = r#"{
  "markets": [
    {"ticker": "KXCPI-25JAN-T0.1", "event_ticker": "KXCPI-25JAN", "threshold": 0.1,
     "strike_type": "greater",
     "prices": [{"timestamp": "2025-02-12T13:00:00Z", "price": 0.88},
                {"timestamp": "2025-02-12T13:25:00Z", "price": 0.90}]},
    {"ticker": "KXCPI-25JAN-T0.2", "event_ticker": "KXCPI-25JAN", "threshold": "0.2",
     "strike_type": "greater",
     "prices": [{"timestamp": "2025-02-12T13:00:00Z", "price": 0.55},
                {"timestamp": "2025-02-12T13:25:00Z", "price": 0.60}]},
    {"ticker": "KXCPI-25JAN-T0.3", "event_ticker": "KXCPI-25JAN", "threshold": 0.3,
     "strike_type": "greater_or_equal",
     "prices": [{"timestamp": "2025-02-12T13:00:00Z", "price": 0.58},
                {"timestamp": "2025-02-12T13:25:00Z", "price": 0.20}]},

    {"ticker": "KXCPI-25FEB-T0.2", "event_ticker": "KXCPI-25FEB", "threshold": 0.2,
     "strike_type": "greater",
     "prices": [{"timestamp": "2025-03-12T12:00:00Z", "price": 0.7}]},
    {"ticker": "KXCPI-25FEB-T0.3", "event_ticker": "KXCPI-25FEB", "threshold": "TBD",
     "strike_type": "greater",
     "prices": [{"timestamp": "2025-03-12T12:00:00Z", "price": 0.4}]},

    {"ticker": "KXPAYROLLS-25JAN-T100", "event_ticker": "KXPAYROLLS-25JAN", "threshold": 100,
     "strike_type": "greater",
     "prices": [{"timestamp": "2025-02-07T13:00:00Z", "price": 0.8}]},
    {"ticker": "KXPAYROLLS-25JAN-T200", "event_ticker": "KXPAYROLLS-25JAN", "threshold": 200,
     "strike_type": "greater",
     "prices": [{"timestamp": "2025-02-07T13:00:00Z", "price": 0.3}]}
  ],
  "outcomes": {
    "KXCPI-25JAN": "0.25",
    "KXCPI-25FEB": 0.2,
    "KXPAYROLLS-25JAN": "not yet released"
  },
  "history": {
    "KXCPI-25JAN": [0.1, 0.2, 0.2, 0.3, 0.4]
  }
}"#;

fn load_bundle() -> BatchInput {
    serde_json::from_str(BUNDLE).expect("bundle should deserialize")
}

#[test]
fn bundle_round_trips_through_data_source() {
    let input = load_bundle();
    assert_eq!(input.markets().len(), 7);
    assert_eq!(
        input.realized_outcome("KXCPI-25JAN").and_then(|o| o.parse()),
        Some(0.25)
    );
    assert!(input.historical_sample("KXPAYROLLS-25JAN").is_empty());
}

#[test]
fn full_pipeline_scores_and_accounts_for_skips() {
    let input = load_bundle();
    let evaluator = BatchEvaluator::new(&AnalysisConfig::default()).unwrap();

    let report = evaluator.evaluate(&input);

    // one scored event, one with a single usable strike, one unsettled
    assert_eq!(report.scores.len(), 1);
    assert_eq!(report.dropped_markets, 1);
    assert_eq!(report.skip_counts.insufficient_strikes, 1);
    assert_eq!(report.skip_counts.unparsable_outcome, 1);
    assert_eq!(report.skip_counts.insufficient_snapshots, 0);
    assert_eq!(report.skip_counts.scoring_failed, 0);
    assert!(report
        .skipped
        .iter()
        .any(|s| s.event_ticker == "KXCPI-25FEB" && s.reason == SkipReason::InsufficientStrikes));

    let score = &report.scores[0];
    assert_eq!(score.event_ticker, "KXCPI-25JAN");
    assert!(score.is_monotonic);
    assert_eq!(score.market.cdf.len(), 3);
    assert!((score.market.crps - 0.073 / 3.0).abs() < 1e-12);
    assert!(score.historical.is_some());
    assert!(score.uniform.crps > 0.0);

    // the 13:00 ladder is inverted between 0.2 and 0.3, and fixed by 13:25
    assert_eq!(report.violations.violating_snapshots, 1);
    assert_eq!(report.violations.reversion_rate, Some(1.0));

    let text = ReportFormatter::format(&report);
    assert!(text.contains("Events Scored:         1"));
}

#[test]
fn report_serializes_to_json() {
    let input = load_bundle();
    let report = BatchEvaluator::new(&AnalysisConfig::default())
        .unwrap()
        .evaluate(&input);

    let json = serde_json::to_value(&report).unwrap();

    assert_eq!(json["skip_counts"]["unparsable_outcome"], 1);
    assert_eq!(json["scores"][0]["market"]["kind"], "market_implied");
    assert_eq!(json["skipped"][0]["reason"], "insufficient_strikes");
    assert!(json["skipped"][0].get("detail").is_none());
}

#[tokio::test]
async fn parallel_evaluation_matches_sequential() {
    let input = load_bundle();
    let evaluator = BatchEvaluator::new(&AnalysisConfig::default()).unwrap();

    let sequential = evaluator.evaluate(&input);
    let parallel = evaluator.evaluate_parallel(&input).await.unwrap();

    assert_eq!(sequential, parallel);
}

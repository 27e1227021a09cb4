//! Batch scoring of many events.
//!
//! Each event is reconstructed and scored independently. Events that cannot
//! be scored for lack of data are skipped and counted by reason so callers
//! can see how much statistical power was lost. An event whose numbers
//! cannot be scored is skipped too, so one bad event never costs the rest of
//! the batch.

use std::collections::BTreeMap;
use std::fmt;

use anyhow::Context;
use chrono::{DateTime, Utc};
use implied_dist_core::{
    AnalysisConfig, MarketDataSource, MarketRecord, RawNumber, ScoringConfig, SnapshotSelection,
};
use implied_dist_reconstruct::{
    group_markets, CdfSnapshot, Event, EventGrouping, PdfSummary, SnapshotBuilder,
    ViolationAnalyzer, ViolationReport,
};
use serde::{Deserialize, Serialize};
use tokio::task::JoinSet;
use tracing::{debug, info, warn};

use crate::benchmarks::{
    compute_historical_crps, compute_point_crps, compute_uniform_crps_with_points,
};
use crate::crps::{compute_crps, CrpsResult, MIN_CRPS_POINTS};
use crate::error::{Result, ScoringError};

// =============================================================================
// Input
// =============================================================================

/// An in-memory bundle of everything a batch needs.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BatchInput {
    pub markets: Vec<MarketRecord>,
    /// Realized outcome per event ticker.
    #[serde(default)]
    pub outcomes: BTreeMap<String, RawNumber>,
    /// Past realized values per event ticker.
    #[serde(default)]
    pub history: BTreeMap<String, Vec<f64>>,
}

impl MarketDataSource for BatchInput {
    fn markets(&self) -> Vec<MarketRecord> {
        self.markets.clone()
    }

    fn realized_outcome(&self, event_ticker: &str) -> Option<RawNumber> {
        self.outcomes.get(event_ticker).cloned()
    }

    fn historical_sample(&self, event_ticker: &str) -> Vec<f64> {
        self.history.get(event_ticker).cloned().unwrap_or_default()
    }
}

// =============================================================================
// Skips
// =============================================================================

/// Why an event was left out of scoring.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SkipReason {
    /// Fewer than two distinct usable strikes.
    InsufficientStrikes,
    /// No realized value, or one that does not parse as a number.
    UnparsableOutcome,
    /// No timestamp with at least two concurrent prices.
    InsufficientSnapshots,
    /// A CRPS computation rejected the event's numbers.
    ScoringFailed,
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::InsufficientStrikes => "insufficient strikes",
            Self::UnparsableOutcome => "unparsable outcome",
            Self::InsufficientSnapshots => "insufficient snapshots",
            Self::ScoringFailed => "scoring failed",
        };
        f.write_str(label)
    }
}

/// A skipped event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SkippedEvent {
    pub event_ticker: String,
    pub reason: SkipReason,
    /// Error text for [`SkipReason::ScoringFailed`].
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
}

/// Skipped-event counts by reason.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SkipCounts {
    pub insufficient_strikes: usize,
    pub unparsable_outcome: usize,
    pub insufficient_snapshots: usize,
    pub scoring_failed: usize,
}

impl SkipCounts {
    #[must_use]
    pub fn from_skipped(skipped: &[SkippedEvent]) -> Self {
        let mut counts = Self::default();
        for s in skipped {
            match s.reason {
                SkipReason::InsufficientStrikes => counts.insufficient_strikes += 1,
                SkipReason::UnparsableOutcome => counts.unparsable_outcome += 1,
                SkipReason::InsufficientSnapshots => counts.insufficient_snapshots += 1,
                SkipReason::ScoringFailed => counts.scoring_failed += 1,
            }
        }
        counts
    }

    #[must_use]
    pub fn total(&self) -> usize {
        self.insufficient_strikes
            + self.unparsable_outcome
            + self.insufficient_snapshots
            + self.scoring_failed
    }
}

// =============================================================================
// Scores
// =============================================================================

/// Scores of one event at its selected snapshot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventScore {
    pub event_ticker: String,
    /// Timestamp of the scored snapshot.
    pub timestamp: DateTime<Utc>,
    pub realized: f64,
    /// Snapshots available for the event.
    pub snapshot_count: usize,
    /// Whether the scored snapshot was arbitrage-free before clipping.
    pub is_monotonic: bool,
    pub violation_count: usize,
    pub summary: PdfSummary,
    pub market: CrpsResult,
    pub uniform: CrpsResult,
    /// Present only when a historical sample was supplied.
    pub historical: Option<CrpsResult>,
    /// Point mass at the interior implied mean.
    pub point_interior: CrpsResult,
    /// Point mass at the tail-aware implied mean.
    pub point_tail_aware: CrpsResult,
}

impl EventScore {
    /// `1 - CRPS_market / CRPS_uniform`; positive when the market beats uniform.
    #[must_use]
    pub fn skill_vs_uniform(&self) -> Option<f64> {
        skill(&self.market, &self.uniform)
    }

    /// `1 - CRPS_market / CRPS_historical`.
    #[must_use]
    pub fn skill_vs_historical(&self) -> Option<f64> {
        self.historical.as_ref().and_then(|h| skill(&self.market, h))
    }
}

fn skill(forecast: &CrpsResult, reference: &CrpsResult) -> Option<f64> {
    (reference.crps > 0.0).then(|| 1.0 - forecast.crps / reference.crps)
}

/// Means over all scored events.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AggregateScores {
    pub events_scored: usize,
    /// Events that also had a historical benchmark.
    pub events_with_history: usize,
    pub mean_market_crps: Option<f64>,
    pub mean_uniform_crps: Option<f64>,
    pub mean_historical_crps: Option<f64>,
    pub mean_point_interior_crps: Option<f64>,
    pub mean_point_tail_aware_crps: Option<f64>,
    /// Mean of `CRPS_market - CRPS_uniform`; negative favors the market.
    pub mean_market_minus_uniform: Option<f64>,
    /// Mean of `CRPS_market - CRPS_historical` over events with history.
    pub mean_market_minus_historical: Option<f64>,
}

impl AggregateScores {
    #[must_use]
    pub fn from_scores(scores: &[EventScore]) -> Self {
        let with_history: Vec<(&EventScore, &CrpsResult)> = scores
            .iter()
            .filter_map(|s| s.historical.as_ref().map(|h| (s, h)))
            .collect();

        Self {
            events_scored: scores.len(),
            events_with_history: with_history.len(),
            mean_market_crps: mean(scores.iter().map(|s| s.market.crps)),
            mean_uniform_crps: mean(scores.iter().map(|s| s.uniform.crps)),
            mean_historical_crps: mean(with_history.iter().map(|(_, h)| h.crps)),
            mean_point_interior_crps: mean(scores.iter().map(|s| s.point_interior.crps)),
            mean_point_tail_aware_crps: mean(scores.iter().map(|s| s.point_tail_aware.crps)),
            mean_market_minus_uniform: mean(scores.iter().map(|s| s.market.crps - s.uniform.crps)),
            mean_market_minus_historical: mean(
                with_history.iter().map(|(s, h)| s.market.crps - h.crps),
            ),
        }
    }
}

fn mean(values: impl Iterator<Item = f64>) -> Option<f64> {
    let (sum, n) = values.fold((0.0, 0usize), |(sum, n), v| (sum + v, n + 1));
    (n > 0).then(|| sum / n as f64)
}

/// Everything a batch run produces.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BatchReport {
    /// Scored events in event-ticker order.
    pub scores: Vec<EventScore>,
    /// Skipped events in event-ticker order.
    pub skipped: Vec<SkippedEvent>,
    pub skip_counts: SkipCounts,
    /// Market records dropped for unusable strikes.
    pub dropped_markets: usize,
    /// Market records dropped as duplicate strikes.
    pub duplicate_strikes: usize,
    /// Monotonicity diagnostics across every grouped event.
    pub violations: ViolationReport,
    pub aggregate: AggregateScores,
}

// =============================================================================
// Evaluator
// =============================================================================

enum Verdict {
    Scored(Box<EventScore>),
    Skipped(SkipReason),
    Failed(ScoringError),
}

struct EventEvaluation {
    event_ticker: String,
    snapshots: Vec<CdfSnapshot>,
    verdict: Verdict,
}

/// Reconstructs and scores every event of a [`MarketDataSource`].
#[derive(Debug, Clone)]
pub struct BatchEvaluator {
    scoring: ScoringConfig,
    builder: SnapshotBuilder,
}

impl BatchEvaluator {
    /// Creates an evaluator after validating the scoring parameters.
    ///
    /// # Errors
    ///
    /// Returns an error if the tail extension or historical margin is
    /// negative or non-finite, or the uniform grid has fewer than two points.
    pub fn new(config: &AnalysisConfig) -> Result<Self> {
        let scoring = config.scoring.clone();
        if !scoring.tail_extension.is_finite() || scoring.tail_extension < 0.0 {
            return Err(ScoringError::invalid_margin(
                "tail_extension",
                scoring.tail_extension,
            ));
        }
        if !scoring.historical_margin.is_finite() || scoring.historical_margin < 0.0 {
            return Err(ScoringError::invalid_margin(
                "historical_margin",
                scoring.historical_margin,
            ));
        }
        if scoring.uniform_points < MIN_CRPS_POINTS {
            return Err(ScoringError::too_few_points(
                scoring.uniform_points,
                MIN_CRPS_POINTS,
            ));
        }

        Ok(Self {
            scoring,
            builder: SnapshotBuilder::from_config(&config.snapshot),
        })
    }

    #[must_use]
    pub fn scoring_config(&self) -> &ScoringConfig {
        &self.scoring
    }

    /// Scores every event sequentially.
    ///
    /// Data gaps and scoring failures are reported as skips.
    pub fn evaluate<S>(&self, source: &S) -> BatchReport
    where
        S: MarketDataSource + ?Sized,
    {
        let grouping = group_markets(source.markets());
        let evaluations = grouping
            .events
            .values()
            .map(|event| {
                self.evaluate_event(
                    event,
                    source.realized_outcome(&event.event_ticker),
                    source.historical_sample(&event.event_ticker),
                )
            })
            .collect();

        assemble(grouping, evaluations)
    }

    /// Scores each event on the blocking thread pool.
    ///
    /// Produces the same report as [`Self::evaluate`].
    ///
    /// # Errors
    ///
    /// Returns an error if a scoring task panics.
    pub async fn evaluate_parallel<S>(&self, source: &S) -> anyhow::Result<BatchReport>
    where
        S: MarketDataSource + ?Sized,
    {
        let grouping = group_markets(source.markets());
        let mut tasks = JoinSet::new();

        for event in grouping.events.values() {
            let evaluator = self.clone();
            let event = event.clone();
            let outcome = source.realized_outcome(&event.event_ticker);
            let history = source.historical_sample(&event.event_ticker);
            tasks.spawn_blocking(move || evaluator.evaluate_event(&event, outcome, history));
        }

        let mut evaluations = Vec::with_capacity(grouping.events.len());
        while let Some(joined) = tasks.join_next().await {
            evaluations.push(joined.context("event scoring task failed")?);
        }
        evaluations.sort_by(|a, b| a.event_ticker.cmp(&b.event_ticker));

        Ok(assemble(grouping, evaluations))
    }

    /// Scores one snapshot of an event against its realized value.
    ///
    /// Non-finite entries in `history` are discarded; an empty remainder
    /// leaves the historical benchmark unset.
    ///
    /// # Errors
    ///
    /// Returns an error if the snapshot or realized value is malformed.
    pub fn score_snapshot(
        &self,
        event_ticker: &str,
        snapshot: &CdfSnapshot,
        realized: f64,
        history: &[f64],
    ) -> Result<EventScore> {
        let summary = PdfSummary::from_snapshot(snapshot);
        let market = compute_crps(
            &snapshot.strikes,
            &snapshot.survival,
            realized,
            self.scoring.tail_extension,
        )?;

        let (Some(&lower), Some(&upper)) = (snapshot.strikes.first(), snapshot.strikes.last())
        else {
            return Err(ScoringError::too_few_points(0, MIN_CRPS_POINTS));
        };
        let uniform =
            compute_uniform_crps_with_points(lower, upper, realized, self.scoring.uniform_points)?;

        let sample: Vec<f64> = history.iter().copied().filter(|v| v.is_finite()).collect();
        if sample.len() < history.len() {
            warn!(
                event = %event_ticker,
                discarded = history.len() - sample.len(),
                "Discarding non-finite historical values"
            );
        }
        let historical = if sample.is_empty() {
            None
        } else {
            Some(compute_historical_crps(
                &sample,
                realized,
                self.scoring.historical_margin,
            )?)
        };

        let point_interior = compute_point_crps(summary.implied_mean_interior, realized)?;
        let point_tail_aware = compute_point_crps(summary.implied_mean_tail_aware, realized)?;

        Ok(EventScore {
            event_ticker: event_ticker.to_string(),
            timestamp: snapshot.timestamp,
            realized,
            snapshot_count: 1,
            is_monotonic: snapshot.is_monotonic,
            violation_count: snapshot.violations.len(),
            summary,
            market,
            uniform,
            historical,
            point_interior,
            point_tail_aware,
        })
    }

    fn evaluate_event(
        &self,
        event: &Event,
        outcome: Option<RawNumber>,
        history: Vec<f64>,
    ) -> EventEvaluation {
        let snapshots = self.builder.build(event);

        let verdict = match outcome.as_ref().and_then(RawNumber::parse) {
            None => Verdict::Skipped(SkipReason::UnparsableOutcome),
            Some(realized) => match self.select(&snapshots) {
                None => Verdict::Skipped(SkipReason::InsufficientSnapshots),
                Some(snapshot) => {
                    match self.score_snapshot(&event.event_ticker, snapshot, realized, &history) {
                        Ok(mut score) => {
                            score.snapshot_count = snapshots.len();
                            Verdict::Scored(Box::new(score))
                        }
                        Err(err) => Verdict::Failed(err),
                    }
                }
            },
        };

        EventEvaluation {
            event_ticker: event.event_ticker.clone(),
            snapshots,
            verdict,
        }
    }

    fn select<'a>(&self, snapshots: &'a [CdfSnapshot]) -> Option<&'a CdfSnapshot> {
        match self.scoring.snapshot_selection {
            SnapshotSelection::Latest => snapshots.last(),
            SnapshotSelection::Earliest => snapshots.first(),
        }
    }
}

fn assemble(grouping: EventGrouping, evaluations: Vec<EventEvaluation>) -> BatchReport {
    let violations = ViolationAnalyzer::analyze(
        evaluations
            .iter()
            .map(|e| (e.event_ticker.as_str(), e.snapshots.as_slice())),
    );

    let mut skipped: Vec<SkippedEvent> = grouping
        .rejected
        .into_iter()
        .map(|r| SkippedEvent {
            event_ticker: r.event_ticker,
            reason: SkipReason::InsufficientStrikes,
            detail: None,
        })
        .collect();
    let mut scores = Vec::with_capacity(evaluations.len());

    for evaluation in evaluations {
        match evaluation.verdict {
            Verdict::Scored(score) => scores.push(*score),
            Verdict::Skipped(reason) => {
                debug!(event = %evaluation.event_ticker, %reason, "Skipping event");
                skipped.push(SkippedEvent {
                    event_ticker: evaluation.event_ticker,
                    reason,
                    detail: None,
                });
            }
            Verdict::Failed(err) => {
                warn!(
                    event = %evaluation.event_ticker,
                    error = %err,
                    shape_error = err.is_shape_error(),
                    "Event could not be scored"
                );
                skipped.push(SkippedEvent {
                    event_ticker: evaluation.event_ticker,
                    reason: SkipReason::ScoringFailed,
                    detail: Some(err.to_string()),
                });
            }
        }
    }
    skipped.sort_by(|a, b| a.event_ticker.cmp(&b.event_ticker));

    let skip_counts = SkipCounts::from_skipped(&skipped);
    let aggregate = AggregateScores::from_scores(&scores);

    info!(
        scored = scores.len(),
        skipped = skip_counts.total(),
        insufficient_strikes = skip_counts.insufficient_strikes,
        unparsable_outcome = skip_counts.unparsable_outcome,
        insufficient_snapshots = skip_counts.insufficient_snapshots,
        scoring_failed = skip_counts.scoring_failed,
        dropped_markets = grouping.dropped_markets,
        "Batch scoring complete"
    );

    BatchReport {
        scores,
        skipped,
        skip_counts,
        dropped_markets: grouping.dropped_markets,
        duplicate_strikes: grouping.duplicate_strikes,
        violations,
        aggregate,
    }
}

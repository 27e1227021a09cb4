//! Time-aligned survival-function snapshots.
//!
//! For every timestamp observed by any market of an event, the snapshot
//! collects the markets priced at that instant and orders them by strike.
//! Prices are kept raw: a ladder that fails no-arbitrage monotonicity is
//! flagged and its violations recorded, but nothing is corrected.

use std::collections::BTreeSet;

use chrono::{DateTime, Duration, Utc};
use implied_dist_core::SnapshotConfig;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::grouper::Event;

/// Minimum concurrent prices for a snapshot to define a distribution.
pub const MIN_SNAPSHOT_POINTS: usize = 2;

/// An adjacent strike pair whose survival value increased with the strike.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Violation {
    /// Index of the lower strike within the snapshot.
    pub index: usize,
    pub lower_strike: f64,
    pub upper_strike: f64,
    pub lower_survival: f64,
    pub upper_survival: f64,
    /// `upper_survival - lower_survival`, always positive.
    pub magnitude: f64,
}

/// Survival function of one event at one timestamp.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CdfSnapshot {
    pub timestamp: DateTime<Utc>,
    /// Strictly ascending strikes.
    pub strikes: Vec<f64>,
    /// Raw market prices, `P(X > strike)`, aligned with `strikes`.
    pub survival: Vec<f64>,
    /// True iff `violations` is empty.
    pub is_monotonic: bool,
    pub violations: Vec<Violation>,
}

impl CdfSnapshot {
    /// Builds a snapshot from unordered `(strike, survival)` points.
    ///
    /// Returns `None` when fewer than [`MIN_SNAPSHOT_POINTS`] points are given.
    #[must_use]
    pub fn from_points(timestamp: DateTime<Utc>, mut points: Vec<(f64, f64)>) -> Option<Self> {
        if points.len() < MIN_SNAPSHOT_POINTS {
            return None;
        }
        points.sort_by(|a, b| a.0.total_cmp(&b.0));

        let (strikes, survival): (Vec<f64>, Vec<f64>) = points.into_iter().unzip();
        let violations = find_violations(&strikes, &survival);

        Some(Self {
            timestamp,
            is_monotonic: violations.is_empty(),
            strikes,
            survival,
            violations,
        })
    }

    /// Number of strikes in the snapshot.
    #[must_use]
    pub fn len(&self) -> usize {
        self.strikes.len()
    }

    /// True when the snapshot holds no strikes.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.strikes.is_empty()
    }

    /// Survival value quoted at exactly `strike`, if that strike is present.
    #[must_use]
    pub fn survival_at(&self, strike: f64) -> Option<f64> {
        self.strikes
            .iter()
            .position(|s| *s == strike)
            .map(|i| self.survival[i])
    }
}

/// Lists every adjacent pair where survival failed to be non-increasing.
///
/// `strikes` must be ascending and the same length as `survival`.
#[must_use]
pub fn find_violations(strikes: &[f64], survival: &[f64]) -> Vec<Violation> {
    strikes
        .windows(2)
        .zip(survival.windows(2))
        .enumerate()
        .filter(|(_, (_, s))| s[0] < s[1])
        .map(|(index, (k, s))| Violation {
            index,
            lower_strike: k[0],
            upper_strike: k[1],
            lower_survival: s[0],
            upper_survival: s[1],
            magnitude: s[1] - s[0],
        })
        .collect()
}

/// Builds the snapshot series for an event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SnapshotBuilder {
    max_lookback: Duration,
}

impl Default for SnapshotBuilder {
    fn default() -> Self {
        Self::exact()
    }
}

impl SnapshotBuilder {
    /// Only prices observed at exactly the snapshot timestamp are used.
    #[must_use]
    pub fn exact() -> Self {
        Self {
            max_lookback: Duration::zero(),
        }
    }

    /// Carries a market's last price forward up to `tolerance_secs` seconds.
    ///
    /// Negative tolerances are treated as zero.
    #[must_use]
    pub fn with_tolerance_secs(tolerance_secs: i64) -> Self {
        Self {
            max_lookback: Duration::seconds(tolerance_secs.max(0)),
        }
    }

    #[must_use]
    pub fn from_config(config: &SnapshotConfig) -> Self {
        Self::with_tolerance_secs(config.alignment_tolerance_secs)
    }

    /// Returns one snapshot per timestamp, in ascending time order.
    ///
    /// Timestamps where fewer than two markets have a usable price are skipped.
    #[must_use]
    pub fn build(&self, event: &Event) -> Vec<CdfSnapshot> {
        let timestamps: BTreeSet<DateTime<Utc>> = event
            .markets
            .iter()
            .flat_map(|m| m.prices.iter().map(|p| p.timestamp))
            .collect();

        let mut skipped = 0usize;
        let snapshots: Vec<CdfSnapshot> = timestamps
            .into_iter()
            .filter_map(|ts| {
                let points: Vec<(f64, f64)> = event
                    .markets
                    .iter()
                    .filter_map(|m| m.price_as_of(ts, self.max_lookback).map(|p| (m.strike, p)))
                    .collect();
                let snapshot = CdfSnapshot::from_points(ts, points);
                if snapshot.is_none() {
                    skipped += 1;
                }
                snapshot
            })
            .collect();

        debug!(
            event = %event.event_ticker,
            snapshots = snapshots.len(),
            skipped,
            "Built CDF snapshots"
        );
        snapshots
    }
}

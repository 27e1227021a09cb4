//! Aggregate no-arbitrage diagnostics across snapshots.
//!
//! Besides how often ladders violate monotonicity and by how much, the
//! analyzer checks whether a violation between a given strike pair is gone
//! by the next snapshot (reverts) or is still there (persists). Quickly
//! reverting violations point at stale or misaligned prints rather than at
//! a standing mispricing.
//!
//! This is reporting only. Nothing here feeds back into scoring.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::snapshot::CdfSnapshot;

/// Per-event violation counts.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventViolationStats {
    pub snapshots: usize,
    pub violating_snapshots: usize,
    pub violations: usize,
    pub reverted: usize,
    pub persisted: usize,
}

/// Violation statistics across every analyzed event.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ViolationReport {
    /// Snapshots analyzed.
    pub total_snapshots: usize,
    /// Snapshots with at least one violation.
    pub violating_snapshots: usize,
    /// `violating_snapshots / total_snapshots`, zero when there are no snapshots.
    pub violation_rate: f64,
    /// Individual adjacent-pair violations.
    pub total_violations: usize,
    pub mean_magnitude: Option<f64>,
    pub median_magnitude: Option<f64>,
    pub max_magnitude: Option<f64>,
    /// Violations absent from the next snapshot.
    pub reverted: usize,
    /// Violations still present in the next snapshot.
    pub persisted: usize,
    /// `reverted / (reverted + persisted)`; `None` when nothing was evaluable.
    pub reversion_rate: Option<f64>,
    pub per_event: BTreeMap<String, EventViolationStats>,
}

/// Computes a [`ViolationReport`].
pub struct ViolationAnalyzer;

impl ViolationAnalyzer {
    /// Analyzes each event's snapshots, which must be in ascending time order.
    ///
    /// A violation is evaluable for reversion only if a following snapshot
    /// exists and quotes both of its strikes. Unevaluable violations count
    /// toward the magnitude statistics but not toward the reversion rate.
    #[must_use]
    pub fn analyze<'a, I>(events: I) -> ViolationReport
    where
        I: IntoIterator<Item = (&'a str, &'a [CdfSnapshot])>,
    {
        let mut report = ViolationReport::default();
        let mut magnitudes: Vec<f64> = Vec::new();

        for (event_ticker, snapshots) in events {
            let mut stats = EventViolationStats {
                snapshots: snapshots.len(),
                ..EventViolationStats::default()
            };

            for (i, snapshot) in snapshots.iter().enumerate() {
                if snapshot.violations.is_empty() {
                    continue;
                }
                stats.violating_snapshots += 1;
                stats.violations += snapshot.violations.len();
                magnitudes.extend(snapshot.violations.iter().map(|v| v.magnitude));

                let Some(next) = snapshots.get(i + 1) else {
                    continue;
                };
                for v in &snapshot.violations {
                    match (
                        next.survival_at(v.lower_strike),
                        next.survival_at(v.upper_strike),
                    ) {
                        (Some(lower), Some(upper)) if lower < upper => stats.persisted += 1,
                        (Some(_), Some(_)) => stats.reverted += 1,
                        _ => {}
                    }
                }
            }

            report.total_snapshots += stats.snapshots;
            report.violating_snapshots += stats.violating_snapshots;
            report.total_violations += stats.violations;
            report.reverted += stats.reverted;
            report.persisted += stats.persisted;
            report.per_event.insert(event_ticker.to_string(), stats);
        }

        if report.total_snapshots > 0 {
            report.violation_rate =
                report.violating_snapshots as f64 / report.total_snapshots as f64;
        }

        let evaluable = report.reverted + report.persisted;
        if evaluable > 0 {
            report.reversion_rate = Some(report.reverted as f64 / evaluable as f64);
        }

        if !magnitudes.is_empty() {
            magnitudes.sort_by(f64::total_cmp);
            let n = magnitudes.len();
            report.mean_magnitude = Some(magnitudes.iter().sum::<f64>() / n as f64);
            report.median_magnitude = Some(if n % 2 == 1 {
                magnitudes[n / 2]
            } else {
                (magnitudes[n / 2 - 1] + magnitudes[n / 2]) / 2.0
            });
            report.max_magnitude = magnitudes.last().copied();
        }

        report
    }
}

//! Binned density and implied means of a survival snapshot.
//!
//! Two implied-mean conventions are produced and neither is preferred:
//!
//! - **interior**: probability-weighted bin midpoints, renormalized over the
//!   mass between the outermost strikes. Tail mass is ignored.
//! - **tail-aware**: `E[X] = k_0 + ∫ S(x) dx` over `[k_0, k_n]` with `S`
//!   linearly interpolated. Equivalent to placing the lower tail at `k_0` and
//!   the upper tail at `k_n`.
//!
//! For a monotonic snapshot the two differ by exactly
//! `tail_below * (k_0 - interior) + tail_above * (k_n - interior)`, so they
//! coincide when both tails are empty.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::snapshot::CdfSnapshot;

/// Density view of one [`CdfSnapshot`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PdfSummary {
    pub timestamp: DateTime<Utc>,
    /// The snapshot's strikes.
    pub bin_edges: Vec<f64>,
    /// Mass between consecutive edges, negative differences clipped to zero.
    pub bin_probabilities: Vec<f64>,
    /// `1 - S(k_0)`.
    pub tail_below: f64,
    /// `S(k_n)`.
    pub tail_above: f64,
    pub implied_mean_interior: f64,
    pub implied_mean_tail_aware: f64,
}

impl PdfSummary {
    #[must_use]
    pub fn from_snapshot(snapshot: &CdfSnapshot) -> Self {
        let (tail_below, tail_above) = match (snapshot.survival.first(), snapshot.survival.last())
        {
            (Some(first), Some(last)) => (1.0 - first, *last),
            _ => (0.0, 0.0),
        };

        Self {
            timestamp: snapshot.timestamp,
            bin_edges: snapshot.strikes.clone(),
            bin_probabilities: interior_pdf(&snapshot.survival),
            tail_below,
            tail_above,
            implied_mean_interior: implied_mean_interior(snapshot),
            implied_mean_tail_aware: implied_mean_tail_aware(snapshot),
        }
    }

    /// Total mass assigned to finite bins.
    #[must_use]
    pub fn interior_mass(&self) -> f64 {
        self.bin_probabilities.iter().sum()
    }
}

/// Finite-difference bin masses `max(S_i - S_{i+1}, 0)`.
#[must_use]
pub fn interior_pdf(survival: &[f64]) -> Vec<f64> {
    survival.windows(2).map(|s| (s[0] - s[1]).max(0.0)).collect()
}

/// Mean of the interior density, renormalized to the interior mass.
///
/// Falls back to the middle of the strike range when no interior mass exists.
#[must_use]
pub fn implied_mean_interior(snapshot: &CdfSnapshot) -> f64 {
    let strikes = &snapshot.strikes;
    let pdf = interior_pdf(&snapshot.survival);
    let total: f64 = pdf.iter().sum();

    if total <= 0.0 {
        return match (strikes.first(), strikes.last()) {
            (Some(lo), Some(hi)) => (lo + hi) / 2.0,
            _ => 0.0,
        };
    }

    let weighted: f64 = strikes
        .windows(2)
        .zip(&pdf)
        .map(|(k, p)| (k[0] + k[1]) / 2.0 * p)
        .sum();
    weighted / total
}

/// `k_0 + ∫ S(x) dx` with trapezoidal segments between strikes.
///
/// Uses raw survival values.
#[must_use]
pub fn implied_mean_tail_aware(snapshot: &CdfSnapshot) -> f64 {
    let Some(first) = snapshot.strikes.first() else {
        return 0.0;
    };

    let area: f64 = snapshot
        .strikes
        .windows(2)
        .zip(snapshot.survival.windows(2))
        .map(|(k, s)| (k[1] - k[0]) * (s[0] + s[1]) / 2.0)
        .sum();
    first + area
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn snap(points: &[(f64, f64)]) -> CdfSnapshot {
        let t = Utc.with_ymd_and_hms(2025, 1, 10, 12, 0, 0).unwrap();
        CdfSnapshot::from_points(t, points.to_vec()).unwrap()
    }

    #[test]
    fn pdf_and_tails_from_monotonic_snapshot() {
        let summary = PdfSummary::from_snapshot(&snap(&[(0.1, 0.9), (0.2, 0.6), (0.3, 0.2)]));

        assert_eq!(summary.bin_edges, vec![0.1, 0.2, 0.3]);
        assert_eq!(summary.bin_probabilities.len(), 2);
        assert!((summary.bin_probabilities[0] - 0.3).abs() < 1e-12);
        assert!((summary.bin_probabilities[1] - 0.4).abs() < 1e-12);
        assert!((summary.tail_below - 0.1).abs() < 1e-12);
        assert!((summary.tail_above - 0.2).abs() < 1e-12);
        assert!((summary.interior_mass() + summary.tail_below + summary.tail_above - 1.0).abs() < 1e-12);
    }

    #[test]
    fn negative_mass_is_clipped_to_zero() {
        let summary = PdfSummary::from_snapshot(&snap(&[(1.0, 0.4), (2.0, 0.5), (3.0, 0.1)]));

        assert_eq!(summary.bin_probabilities[0], 0.0);
        assert!((summary.bin_probabilities[1] - 0.4).abs() < 1e-12);
    }

    #[test]
    fn interior_mean_renormalizes() {
        // mass 0.3 at 0.15, 0.4 at 0.25
        let s = snap(&[(0.1, 0.9), (0.2, 0.6), (0.3, 0.2)]);
        let expected = (0.15 * 0.3 + 0.25 * 0.4) / 0.7;
        assert!((implied_mean_interior(&s) - expected).abs() < 1e-12);
    }

    #[test]
    fn interior_mean_falls_back_to_range_midpoint() {
        let s = snap(&[(2.0, 0.3), (4.0, 0.3), (6.0, 0.5)]);
        assert!((implied_mean_interior(&s) - 4.0).abs() < 1e-12);
    }

    #[test]
    fn tail_aware_mean_integrates_survival() {
        let s = snap(&[(0.0, 0.9), (10.0, 0.5)]);
        // 0 + 10 * 0.7
        assert!((implied_mean_tail_aware(&s) - 7.0).abs() < 1e-12);
        assert!((implied_mean_interior(&s) - 5.0).abs() < 1e-12);
    }

    #[test]
    fn means_coincide_without_tail_mass() {
        let s = snap(&[(1.0, 1.0), (2.0, 0.7), (4.0, 0.2), (5.0, 0.0)]);
        let summary = PdfSummary::from_snapshot(&s);

        assert!(summary.tail_below.abs() < 1e-12);
        assert!(summary.tail_above.abs() < 1e-12);
        assert!((summary.implied_mean_interior - summary.implied_mean_tail_aware).abs() < 1e-12);
    }

    #[test]
    fn means_differ_by_tail_weighted_offsets() {
        let s = snap(&[(1.0, 0.8), (2.0, 0.7), (4.0, 0.2), (5.0, 0.05)]);
        let summary = PdfSummary::from_snapshot(&s);
        let lo = 1.0;
        let hi = 5.0;
        let interior = summary.implied_mean_interior;
        let expected_gap = summary.tail_below * (lo - interior) + summary.tail_above * (hi - interior);

        let gap = summary.implied_mean_tail_aware - interior;
        assert!(gap.abs() > 1e-6);
        assert!((gap - expected_gap).abs() < 1e-12);
    }
}

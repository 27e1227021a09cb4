//! Exact CRPS for piecewise-linear CDFs.
//!
//! ```text
//! CRPS(F, y) = ∫ (F(x) - 1{x >= y})^2 dx
//! ```
//!
//! Between consecutive breakpoints (the knots of `F` plus `y` itself) the
//! integrand is the square of a linear function, so each piece integrates in
//! closed form:
//!
//! ```text
//! ∫_0^w (a + (b - a) t / w)^2 dt = w (a^2 + a b + b^2) / 3
//! ```
//!
//! The result carries no discretization error.

use serde::{Deserialize, Serialize};

use crate::error::{Result, ScoringError};

/// Minimum points for a strike ladder to define a distribution.
pub const MIN_CRPS_POINTS: usize = 2;

/// Which forecast distribution a score belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ForecastKind {
    /// The market-implied piecewise-linear CDF.
    MarketImplied,
    /// Uniform over the strike range.
    Uniform,
    /// Empirical CDF of past realized values.
    Historical,
    /// Point mass at an implied mean.
    PointForecast,
}

/// A CRPS value and the inputs that produced it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CrpsResult {
    pub kind: ForecastKind,
    /// Score in the units of the strikes. Lower is better.
    pub crps: f64,
    /// Support points of the forecast CDF.
    pub strikes: Vec<f64>,
    /// CDF values at `strikes`, after clipping to [0, 1].
    pub cdf: Vec<f64>,
    pub realized: f64,
    /// Ramp width beyond the outermost strikes (integration margin for the
    /// historical benchmark).
    pub tail_extension: f64,
}

/// Scores a market-implied survival ladder against a realized value.
///
/// `survival[i]` is `P(X > strikes[i])`. It is converted to `F = 1 - S` and
/// clipped to [0, 1]. Outside the ladder, `F` ramps linearly from 0 at
/// `strikes[0] - tail_extension` and up to 1 at `strikes[n-1] + tail_extension`;
/// with a zero extension the tails are jumps at the outermost strikes.
///
/// # Errors
///
/// Returns an error if the arrays differ in length, hold fewer than two
/// points, contain non-finite values, or if strikes are not ascending or the
/// tail extension is negative.
pub fn compute_crps(
    strikes: &[f64],
    survival: &[f64],
    realized: f64,
    tail_extension: f64,
) -> Result<CrpsResult> {
    validate_ladder(strikes, survival)?;
    if !realized.is_finite() {
        return Err(ScoringError::NonFinite("realized"));
    }
    if !tail_extension.is_finite() || tail_extension < 0.0 {
        return Err(ScoringError::invalid_margin("tail_extension", tail_extension));
    }

    let cdf: Vec<f64> = survival.iter().map(|s| (1.0 - s).clamp(0.0, 1.0)).collect();

    let mut knots = Vec::with_capacity(strikes.len() + 2);
    knots.push((strikes[0] - tail_extension, 0.0));
    knots.extend(strikes.iter().copied().zip(cdf.iter().copied()));
    knots.push((strikes[strikes.len() - 1] + tail_extension, 1.0));

    Ok(CrpsResult {
        kind: ForecastKind::MarketImplied,
        crps: integrate_piecewise_linear(&knots, realized),
        strikes: strikes.to_vec(),
        cdf,
        realized,
        tail_extension,
    })
}

/// Integrates `(F(x) - 1{x >= y})^2` over the real line for the CDF that
/// interpolates `knots` linearly, is 0 left of the first knot, and 1 right of
/// the last one.
///
/// Knots must be sorted by `x`. Repeated `x` values encode jumps.
pub(crate) fn integrate_piecewise_linear(knots: &[(f64, f64)], realized: f64) -> f64 {
    let (Some(&(first, _)), Some(&(last, _))) = (knots.first(), knots.last()) else {
        return 0.0;
    };

    let mut total = 0.0;

    // outside the knots F is 0 (left) or 1 (right), so only the gap to y counts
    if realized < first {
        total += first - realized;
    }
    if realized > last {
        total += realized - last;
    }

    for pair in knots.windows(2) {
        let (x0, f0) = pair[0];
        let (x1, f1) = pair[1];
        let width = x1 - x0;
        if width <= 0.0 {
            continue;
        }

        if realized <= x0 {
            total += linear_square_integral(width, f0 - 1.0, f1 - 1.0);
        } else if realized >= x1 {
            total += linear_square_integral(width, f0, f1);
        } else {
            let left = realized - x0;
            let f_y = f0 + (f1 - f0) * left / width;
            total += linear_square_integral(left, f0, f_y);
            total += linear_square_integral(x1 - realized, f_y - 1.0, f1 - 1.0);
        }
    }

    total
}

/// `∫` over a segment of width `w` of the square of the line from `a` to `b`.
#[inline]
fn linear_square_integral(width: f64, a: f64, b: f64) -> f64 {
    width * (a * a + a * b + b * b) / 3.0
}

pub(crate) fn validate_ladder(strikes: &[f64], values: &[f64]) -> Result<()> {
    if strikes.len() != values.len() {
        return Err(ScoringError::length_mismatch(strikes.len(), values.len()));
    }
    if strikes.len() < MIN_CRPS_POINTS {
        return Err(ScoringError::too_few_points(strikes.len(), MIN_CRPS_POINTS));
    }
    if strikes.iter().any(|k| !k.is_finite()) {
        return Err(ScoringError::NonFinite("strikes"));
    }
    if values.iter().any(|v| !v.is_finite()) {
        return Err(ScoringError::NonFinite("survival"));
    }
    if let Some(index) = strikes.windows(2).position(|k| k[1] < k[0]) {
        return Err(ScoringError::UnsortedStrikes { index: index + 1 });
    }
    Ok(())
}

//! Reference distributions scored on the same CRPS scale as the market.
//!
//! - uniform over the strike range, through the market integrator
//! - empirical CDF of past realized values, integrated exactly as a step function
//! - point mass at an implied mean, where CRPS reduces to absolute error

use tracing::debug;

use crate::crps::{compute_crps, CrpsResult, ForecastKind, MIN_CRPS_POINTS};
use crate::error::{Result, ScoringError};

/// Grid size for [`compute_uniform_crps`].
pub const DEFAULT_UNIFORM_POINTS: usize = 50;

/// CRPS of `U(lower, upper)` using a [`DEFAULT_UNIFORM_POINTS`]-point grid.
///
/// # Errors
///
/// Returns an error for non-finite inputs or `upper < lower`.
pub fn compute_uniform_crps(lower: f64, upper: f64, realized: f64) -> Result<CrpsResult> {
    compute_uniform_crps_with_points(lower, upper, realized, DEFAULT_UNIFORM_POINTS)
}

/// CRPS of `U(lower, upper)` discretized on `points` evenly spaced strikes.
///
/// The uniform CDF is linear, so the discretization is exact for any grid
/// size of at least two. No tail extension is applied: the distribution has
/// no mass outside its bounds.
///
/// # Errors
///
/// Returns an error for non-finite inputs, `upper < lower`, or fewer than two
/// grid points.
pub fn compute_uniform_crps_with_points(
    lower: f64,
    upper: f64,
    realized: f64,
    points: usize,
) -> Result<CrpsResult> {
    if !lower.is_finite() || !upper.is_finite() {
        return Err(ScoringError::NonFinite("uniform bounds"));
    }
    if upper < lower {
        return Err(ScoringError::InvalidBounds { lower, upper });
    }
    if points < MIN_CRPS_POINTS {
        return Err(ScoringError::too_few_points(points, MIN_CRPS_POINTS));
    }

    let last = (points - 1) as f64;
    let strikes: Vec<f64> = (0..points)
        .map(|i| lower + (upper - lower) * i as f64 / last)
        .collect();
    let survival: Vec<f64> = (0..points).map(|i| 1.0 - i as f64 / last).collect();

    let mut result = compute_crps(&strikes, &survival, realized, 0.0)?;
    result.kind = ForecastKind::Uniform;
    Ok(result)
}

/// CRPS of the empirical CDF of `sample`, `F(x) = #{v <= x} / n`.
///
/// The step function is integrated exactly between order statistics over
/// `[min(sample, y) - margin, max(sample, y) + margin]`.
///
/// # Errors
///
/// Returns [`ScoringError::EmptyHistory`] for an empty sample, and an error
/// for non-finite values or a negative margin.
pub fn compute_historical_crps(sample: &[f64], realized: f64, margin: f64) -> Result<CrpsResult> {
    if sample.is_empty() {
        return Err(ScoringError::EmptyHistory);
    }
    if sample.iter().any(|v| !v.is_finite()) {
        return Err(ScoringError::NonFinite("historical sample"));
    }
    if !realized.is_finite() {
        return Err(ScoringError::NonFinite("realized"));
    }
    if !margin.is_finite() || margin < 0.0 {
        return Err(ScoringError::invalid_margin("historical_margin", margin));
    }

    let mut sorted = sample.to_vec();
    sorted.sort_by(f64::total_cmp);
    let n = sorted.len() as f64;
    let fraction_at_or_below = |x: f64| sorted.partition_point(|v| *v <= x) as f64 / n;

    let lower = sorted[0].min(realized) - margin;
    let upper = sorted[sorted.len() - 1].max(realized) + margin;

    let mut breakpoints = Vec::with_capacity(sorted.len() + 3);
    breakpoints.push(lower);
    breakpoints.extend_from_slice(&sorted);
    breakpoints.push(realized);
    breakpoints.push(upper);
    breakpoints.sort_by(f64::total_cmp);
    breakpoints.dedup();

    let crps: f64 = breakpoints
        .windows(2)
        .map(|b| {
            let width = b[1] - b[0];
            let heaviside = if b[0] >= realized { 1.0 } else { 0.0 };
            let diff = fraction_at_or_below(b[0]) - heaviside;
            width * diff * diff
        })
        .sum();

    let mut support = sorted.clone();
    support.dedup();
    let cdf: Vec<f64> = support.iter().map(|v| fraction_at_or_below(*v)).collect();

    debug!(n = sorted.len(), crps, "Scored historical benchmark");
    Ok(CrpsResult {
        kind: ForecastKind::Historical,
        crps,
        strikes: support,
        cdf,
        realized,
        tail_extension: margin,
    })
}

/// CRPS of a point mass at `value`: `|value - realized|`.
///
/// # Errors
///
/// Returns an error for non-finite inputs.
pub fn compute_point_crps(value: f64, realized: f64) -> Result<CrpsResult> {
    if !value.is_finite() {
        return Err(ScoringError::NonFinite("point forecast"));
    }
    if !realized.is_finite() {
        return Err(ScoringError::NonFinite("realized"));
    }

    Ok(CrpsResult {
        kind: ForecastKind::PointForecast,
        crps: (value - realized).abs(),
        strikes: vec![value],
        cdf: vec![1.0],
        realized,
        tail_extension: 0.0,
    })
}

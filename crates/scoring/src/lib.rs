//! CRPS evaluation of market-implied distributions.
//!
//! This crate provides:
//! - exact CRPS for piecewise-linear CDFs built from strike ladders
//! - uniform, historical, and point-forecast benchmarks on the same scale
//! - batch scoring with per-reason skip accounting
//!
//! # Example
//!
//! ```
//! use implied_dist_scoring::{compute_crps, compute_uniform_crps};
//!
//! // P(X > k) for k = 0.1, 0.2, 0.3; realized 0.25
//! let market = compute_crps(&[0.1, 0.2, 0.3], &[0.9, 0.6, 0.2], 0.25, 0.0)?;
//! let uniform = compute_uniform_crps(0.1, 0.3, 0.25)?;
//! assert!(market.crps < uniform.crps);
//! # Ok::<(), implied_dist_scoring::ScoringError>(())
//! ```

pub mod batch;
pub mod benchmarks;
pub mod crps;
pub mod error;
pub mod report;

pub use batch::{
    AggregateScores, BatchEvaluator, BatchInput, BatchReport, EventScore, SkipCounts, SkipReason,
    SkippedEvent,
};
pub use benchmarks::{
    compute_historical_crps, compute_point_crps, compute_uniform_crps,
    compute_uniform_crps_with_points, DEFAULT_UNIFORM_POINTS,
};
pub use crps::{compute_crps, CrpsResult, ForecastKind, MIN_CRPS_POINTS};
pub use error::{Result, ScoringError};
pub use report::ReportFormatter;

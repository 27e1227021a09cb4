//! Reconstruction of market-implied probability distributions.
//!
//! A Kalshi strike ladder is a family of binary markets "outcome > k" for a
//! set of strikes `k`. Read together at one instant, their prices trace the
//! survival function of the outcome. This crate:
//!
//! - groups validated markets into events ([`group_markets`])
//! - aligns their price histories into per-timestamp survival snapshots
//!   ([`SnapshotBuilder`])
//! - reports no-arbitrage monotonicity violations and whether they revert
//!   ([`ViolationAnalyzer`])
//! - derives a binned density and two implied means per snapshot
//!   ([`PdfSummary`])
//!
//! Violations are data here, never errors. Nothing in this crate clips or
//! repairs survival values except the explicit zero-clipping of negative bin
//! mass in [`PdfSummary`].

pub mod grouper;
pub mod snapshot;
pub mod summary;
pub mod violations;

pub use grouper::{group_markets, Event, EventGrouping, RejectedEvent};
pub use snapshot::{find_violations, CdfSnapshot, SnapshotBuilder, Violation};
pub use summary::{implied_mean_interior, implied_mean_tail_aware, interior_pdf, PdfSummary};
pub use violations::{EventViolationStats, ViolationAnalyzer, ViolationReport};

//! Core types, configuration, and data-source traits shared across the
//! implied-distribution workspace.
//!
//! Nothing in this crate performs I/O beyond configuration loading. Market
//! price histories and realized outcomes arrive already materialized through
//! [`MarketDataSource`].

pub mod config;
pub mod config_loader;
pub mod market;
pub mod traits;

pub use config::{AnalysisConfig, ScoringConfig, SnapshotConfig, SnapshotSelection};
pub use config_loader::ConfigLoader;
pub use market::{Market, MarketRecord, PricePoint, RawNumber, StrikeType};
pub use traits::MarketDataSource;

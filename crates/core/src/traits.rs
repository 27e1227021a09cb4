use crate::market::{MarketRecord, RawNumber};

/// Already-materialized market data handed to the analysis core.
///
/// Implementations own fetching, pagination, and caching. The core only reads.
pub trait MarketDataSource {
    /// Every strike market in scope, across all events.
    fn markets(&self) -> Vec<MarketRecord>;

    /// The settled value of an event, if it has settled.
    fn realized_outcome(&self, event_ticker: &str) -> Option<RawNumber>;

    /// Past realized values of the same series, used by the historical
    /// benchmark. Empty when none are available.
    fn historical_sample(&self, event_ticker: &str) -> Vec<f64>;
}

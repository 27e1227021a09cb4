//! Partitioning of strike markets into events.
//!
//! An event is every market sharing an event ticker. Only events with at
//! least two distinct usable strikes carry distributional information; the
//! rest are reported as rejected so batch callers can account for them.

use std::collections::BTreeMap;

use implied_dist_core::{Market, MarketRecord};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

/// Minimum number of distinct strikes for an event to define a distribution.
pub const MIN_DISTINCT_STRIKES: usize = 2;

/// A group of strike markets forecasting one scalar outcome.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Event {
    /// Shared event ticker.
    pub event_ticker: String,
    /// Member markets, strictly ascending by strike.
    pub markets: Vec<Market>,
}

impl Event {
    /// Strikes of the member markets in ascending order.
    #[must_use]
    pub fn strikes(&self) -> Vec<f64> {
        self.markets.iter().map(|m| m.strike).collect()
    }
}

/// An event excluded for having too few usable strikes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RejectedEvent {
    /// Event ticker.
    pub event_ticker: String,
    /// Distinct strikes that survived validation.
    pub usable_strikes: usize,
}

/// Output of [`group_markets`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EventGrouping {
    /// Usable events keyed by event ticker.
    pub events: BTreeMap<String, Event>,
    /// Events with fewer than [`MIN_DISTINCT_STRIKES`] usable strikes.
    pub rejected: Vec<RejectedEvent>,
    /// Records dropped for an unparseable threshold or a non-survival strike type.
    pub dropped_markets: usize,
    /// Markets dropped because another market of the event had the same strike.
    pub duplicate_strikes: usize,
}

/// Groups market records into events sorted by strike.
///
/// Records whose threshold does not parse, or whose strike type is not a
/// "greater" condition, are dropped silently. When two markets of an event
/// share a strike, the one with the lexicographically smaller ticker is kept.
#[must_use]
pub fn group_markets(records: impl IntoIterator<Item = MarketRecord>) -> EventGrouping {
    let mut buckets: BTreeMap<String, Vec<Market>> = BTreeMap::new();
    let mut grouping = EventGrouping::default();

    for record in records {
        let event_ticker = record.event_ticker.clone();
        let ticker = record.ticker.clone();
        let bucket = buckets.entry(event_ticker).or_default();
        match record.into_market() {
            Some(market) => bucket.push(market),
            None => {
                debug!(%ticker, "Dropping market with unusable strike");
                grouping.dropped_markets += 1;
            }
        }
    }

    for (event_ticker, mut markets) in buckets {
        markets.sort_by(|a, b| a.ticker.cmp(&b.ticker));
        markets.sort_by(|a, b| a.strike.total_cmp(&b.strike));

        let before = markets.len();
        markets.dedup_by(|later, kept| {
            let duplicate = later.strike == kept.strike;
            if duplicate {
                warn!(
                    event = %event_ticker,
                    kept = %kept.ticker,
                    dropped = %later.ticker,
                    strike = kept.strike,
                    "Duplicate strike in event"
                );
            }
            duplicate
        });
        grouping.duplicate_strikes += before - markets.len();

        if markets.len() < MIN_DISTINCT_STRIKES {
            debug!(event = %event_ticker, strikes = markets.len(), "Rejecting event");
            grouping.rejected.push(RejectedEvent {
                event_ticker,
                usable_strikes: markets.len(),
            });
            continue;
        }

        grouping.events.insert(
            event_ticker.clone(),
            Event {
                event_ticker,
                markets,
            },
        );
    }

    grouping
}
